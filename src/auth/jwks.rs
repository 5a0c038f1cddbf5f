// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Cache lifecycle
//!
//! - The key set is fetched lazily on first use and cached with a TTL
//! - A fetched set is converted once into a [`SigningKeySet`] and shared
//!   behind an `Arc`; it is never mutated, only replaced
//! - The HTTP fetch runs outside the lock, so a failed refresh leaves the
//!   cached set untouched
//! - If the TTL has lapsed and the endpoint is unreachable, the stale set
//!   keeps being served and the endpoint is not tried again for
//!   [`DEFAULT_STALE_RETRY`]; a forced [`JwksManager::refresh`] never falls back
//! - Forced refreshes for unknown key ids can be rate limited with
//!   [`JwksManager::with_refresh_cooldown`]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default upper bound on a single JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait before re-trying an endpoint that failed to refresh an expired set.
pub const DEFAULT_STALE_RETRY: Duration = Duration::from_secs(30);

/// Public key material for one `kid`.
#[derive(Clone)]
pub struct SigningKey {
    pub decoding_key: DecodingKey,
    /// Algorithm the issuer published this key for, if it said.
    pub algorithm: Option<Algorithm>,
}

/// Issuer signing keys indexed by key id.
#[derive(Clone, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, SigningKey>,
}

impl SigningKeySet {
    /// Build from a JWKS document. Keys without a `kid` or of an
    /// unsupported type are skipped.
    pub fn from_jwks(jwks: &JwkSet) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("Skipping JWKS entry without a key id");
                continue;
            };
            match jwk_to_signing_key(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(reason) => {
                    tracing::warn!(kid = %kid, %reason, "Skipping unusable JWKS entry");
                }
            }
        }
        Self { keys }
    }

    pub fn insert(&mut self, kid: impl Into<String>, key: SigningKey) {
        self.keys.insert(kid.into(), key);
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for SigningKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        kids.sort_unstable();
        f.debug_struct("SigningKeySet").field("kids", &kids).finish()
    }
}

/// JWKS cache entry.
struct CacheEntry {
    keys: Arc<SigningKeySet>,
    /// Time of the last successful fetch.
    fetched_at: Instant,
    /// Set after a failed re-fetch of an expired set; the stale set is
    /// served without another fetch until then.
    retry_after: Option<Instant>,
}

impl CacheEntry {
    fn new(keys: Arc<SigningKeySet>) -> Self {
        Self {
            keys,
            fetched_at: Instant::now(),
            retry_after: None,
        }
    }

    fn is_usable(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
            || self.retry_after.is_some_and(|at| Instant::now() < at)
    }
}

enum KeySource {
    Remote { url: String, client: reqwest::Client },
    Static(Arc<SigningKeySet>),
}

/// JWKS manager with caching.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct JwksManager {
    source: Arc<KeySource>,
    /// Cache TTL
    cache_ttl: Duration,
    /// Wait before re-fetching once an expired set could not be refreshed
    stale_retry: Duration,
    /// Minimum age of the cached set before an unknown `kid` may force a fetch
    refresh_cooldown: Duration,
    /// Cached key set
    cache: Arc<RwLock<Option<CacheEntry>>>,
}

impl JwksManager {
    /// Create a manager fetching from `jwks_url`
    /// (e.g. `https://your-tenant.auth0.com/.well-known/jwks.json`).
    ///
    /// Every fetch is bounded by `fetch_timeout`.
    pub fn new(jwks_url: impl Into<String>, fetch_timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AuthError::KeyFetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            source: Arc::new(KeySource::Remote {
                url: jwks_url.into(),
                client,
            }),
            cache_ttl: DEFAULT_CACHE_TTL,
            stale_retry: DEFAULT_STALE_RETRY,
            refresh_cooldown: Duration::ZERO,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a manager that always serves `keys` and never touches the network.
    pub fn from_key_set(keys: SigningKeySet) -> Self {
        let keys = Arc::new(keys);
        Self {
            source: Arc::new(KeySource::Static(Arc::clone(&keys))),
            cache_ttl: DEFAULT_CACHE_TTL,
            stale_retry: DEFAULT_STALE_RETRY,
            refresh_cooldown: Duration::ZERO,
            cache: Arc::new(RwLock::new(Some(CacheEntry::new(keys)))),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// How long an expired set keeps being served after a failed re-fetch
    /// before the endpoint is tried again.
    pub fn with_stale_retry(mut self, backoff: Duration) -> Self {
        self.stale_retry = backoff;
        self
    }

    /// Skip forced refreshes for unknown key ids while the cached set is
    /// younger than `cooldown`. Zero refreshes on every miss.
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// The JWKS URL, or `None` for a static key set.
    pub fn jwks_url(&self) -> Option<&str> {
        match self.source.as_ref() {
            KeySource::Remote { url, .. } => Some(url),
            KeySource::Static(_) => None,
        }
    }

    /// Current signing keys, fetching when the cache is empty or stale.
    pub async fn signing_keys(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let stale = {
            let cache = self.cache.read().await;
            match &*cache {
                Some(entry) if entry.is_usable(self.cache_ttl) => {
                    return Ok(Arc::clone(&entry.keys));
                }
                Some(entry) => Some(Arc::clone(&entry.keys)),
                None => None,
            }
        };

        match self.fetch_and_store().await {
            Ok(keys) => Ok(keys),
            Err(e) => match stale {
                Some(keys) => {
                    tracing::warn!(
                        error = ?e,
                        retry_in_secs = self.stale_retry.as_secs(),
                        "JWKS refresh failed, serving stale signing keys"
                    );
                    self.defer_retry(&keys).await;
                    Ok(keys)
                }
                None => Err(e),
            },
        }
    }

    /// Force refresh the JWKS cache.
    ///
    /// On failure the previously cached set (if any) is kept as is.
    pub async fn refresh(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let keys = self.fetch_and_store().await?;
        tracing::info!(keys = keys.len(), "Signing keys refreshed");
        Ok(keys)
    }

    /// Refresh for a token whose `kid` is not in the cached set, unless the
    /// cached set is younger than the refresh cooldown.
    pub async fn refresh_for_unknown_kid(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.refresh_cooldown {
                    tracing::debug!("Signing keys fetched recently, skipping forced refresh");
                    return Ok(Arc::clone(&entry.keys));
                }
            }
        }
        self.refresh().await
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }

    async fn defer_retry(&self, stale: &Arc<SigningKeySet>) {
        let mut cache = self.cache.write().await;
        if let Some(entry) = cache.as_mut() {
            // Another task may have stored a fresh set meanwhile.
            if Arc::ptr_eq(&entry.keys, stale) {
                entry.retry_after = Some(Instant::now() + self.stale_retry);
            }
        }
    }

    async fn fetch_and_store(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let keys = self.fetch_key_set().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry::new(Arc::clone(&keys)));

        Ok(keys)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_key_set(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let (url, client) = match self.source.as_ref() {
            KeySource::Remote { url, client } => (url, client),
            KeySource::Static(keys) => return Ok(Arc::clone(keys)),
        };

        tracing::debug!(url = %url, "Fetching JWKS");

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        Ok(Arc::new(SigningKeySet::from_jwks(&jwks)))
    }
}

/// Convert a JWK to a signing key.
fn jwk_to_signing_key(jwk: &Jwk) -> Result<SigningKey, String> {
    let decoding_key = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| format!("invalid RSA key: {e}"))?,
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
            .map_err(|e| format!("invalid EC key: {e}"))?,
        _ => return Err("unsupported key type".to_string()),
    };

    Ok(SigningKey {
        decoding_key,
        algorithm: jwk.common.key_algorithm.and_then(signing_algorithm),
    })
}

fn signing_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        _ => None,
    }
}
