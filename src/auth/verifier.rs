// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT structure, signature and standard claim verification.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. three non-empty segments with a decodable header carrying a `kid`
//! 2. header algorithm allowed, and consistent with the key's published one
//! 3. `kid` present in the signing key set
//! 4. signature, then payload shape (integer `exp` required)
//! 5. `exp` / `nbf` against the clock
//! 6. issuer and audience
//!
//! The `permissions` claim is not looked at here.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Header, Validation};

use super::claims::Claims;
use super::error::{AuthError, HeaderFault};
use super::jwks::SigningKeySet;

/// Verifies bearer tokens against a signing key set.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    audience: String,
    issuer: String,
    algorithms: Vec<Algorithm>,
    /// Clock skew tolerance in seconds, applied to `exp` and `nbf`.
    leeway: u64,
}

impl TokenVerifier {
    pub fn new(
        audience: impl Into<String>,
        issuer: impl Into<String>,
        algorithms: Vec<Algorithm>,
    ) -> Self {
        Self {
            audience: audience.into(),
            issuer: issuer.into(),
            algorithms,
            leeway: 0,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway = leeway_secs;
        self
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Key id from the token's unverified header.
    pub fn key_id(token: &str) -> Result<String, AuthError> {
        unverified_header(token)?
            .kid
            .ok_or(AuthError::InvalidHeader(HeaderFault::Malformed))
    }

    /// Verify `token` against `keys` using the current time.
    pub fn verify(&self, token: &str, keys: &SigningKeySet) -> Result<Claims, AuthError> {
        self.verify_at(token, keys, Utc::now().timestamp())
    }

    /// Verify `token` against `keys` as of `now` (Unix seconds).
    pub fn verify_at(
        &self,
        token: &str,
        keys: &SigningKeySet,
        now: i64,
    ) -> Result<Claims, AuthError> {
        let header = unverified_header(token)?;
        let kid = header
            .kid
            .as_deref()
            .ok_or(AuthError::InvalidHeader(HeaderFault::Malformed))?;

        if !self.algorithms.contains(&header.alg) {
            tracing::debug!(alg = ?header.alg, "Token signed with a disallowed algorithm");
            return Err(AuthError::InvalidHeader(HeaderFault::Unparseable));
        }

        let key = keys
            .get(kid)
            .ok_or(AuthError::InvalidHeader(HeaderFault::NoMatchingKey))?;

        if key.algorithm.is_some_and(|published| published != header.alg) {
            tracing::debug!(kid, alg = ?header.alg, "Token algorithm differs from the key's");
            return Err(AuthError::InvalidHeader(HeaderFault::Unparseable));
        }

        // Signature and algorithm only; claim checks below keep their own order.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, &key.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => {
                    tracing::debug!(error = %e, "Token could not be decoded");
                    AuthError::InvalidHeader(HeaderFault::Unparseable)
                }
            }
        })?;

        self.validate_claims(&token_data.claims, now)?;
        Ok(token_data.claims)
    }

    fn validate_claims(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);

        if claims.exp.saturating_add(leeway) <= now {
            return Err(AuthError::TokenExpired);
        }

        if claims.nbf.is_some_and(|nbf| nbf.saturating_sub(leeway) > now) {
            return Err(AuthError::IncorrectClaims);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(AuthError::IncorrectClaims);
        }

        let audience_ok = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.audience));
        if !audience_ok {
            return Err(AuthError::IncorrectClaims);
        }

        Ok(())
    }
}

fn unverified_header(token: &str) -> Result<Header, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(AuthError::InvalidHeader(HeaderFault::Malformed));
    }

    decode_header(token).map_err(|_| AuthError::InvalidHeader(HeaderFault::Malformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::SigningKey;
    use crate::auth::testutil::{
        claims, jwks, sign, token, verifier, KEY_A_KID, KEY_A_N, KEY_A_PEM, KEY_B_PEM,
        TEST_ISSUER,
    };
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{encode, DecodingKey, EncodingKey};
    use serde_json::json;

    fn keys() -> SigningKeySet {
        SigningKeySet::from_jwks(&jwks(&[(KEY_A_KID, KEY_A_N)]))
    }

    fn malformed() -> AuthError {
        AuthError::InvalidHeader(HeaderFault::Malformed)
    }

    #[test]
    fn valid_token_yields_payload() {
        let payload = claims(Some(&["get:drinks-detail", "post:drinks"]));
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        let decoded = verifier().verify(&token, &keys()).unwrap();

        assert_eq!(serde_json::to_value(&decoded).unwrap(), payload);
        assert_eq!(
            decoded.permissions,
            Some(vec!["get:drinks-detail".to_string(), "post:drinks".to_string()])
        );
    }

    #[test]
    fn token_without_permissions_is_accepted() {
        let decoded = verifier().verify(&token(None), &keys()).unwrap();
        assert!(decoded.permissions.is_none());
    }

    #[test]
    fn rejects_tokens_without_three_segments() {
        for raw in ["", "abc", "abc.def", "a.b.c.d", "abc..ghi", "abc.def."] {
            assert_eq!(verifier().verify(raw, &keys()), Err(malformed()), "token {raw:?}");
        }
    }

    #[test]
    fn rejects_undecodable_header() {
        assert_eq!(verifier().verify("abc.def.ghi", &keys()), Err(malformed()));
    }

    #[test]
    fn rejects_header_without_algorithm() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","kid":"coffee-key-1"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1}"#);
        let raw = format!("{header}.{payload}.c2ln");
        assert_eq!(verifier().verify(&raw, &keys()), Err(malformed()));
    }

    #[test]
    fn rejects_missing_kid() {
        let token = sign(None, KEY_A_PEM, &claims(None));
        assert_eq!(verifier().verify(&token, &keys()), Err(malformed()));
        assert_eq!(TokenVerifier::key_id(&token), Err(malformed()));
    }

    #[test]
    fn key_id_reads_unverified_header() {
        assert_eq!(TokenVerifier::key_id(&token(None)).unwrap(), KEY_A_KID);
    }

    #[test]
    fn rejects_disallowed_algorithm() {
        let mut header = jsonwebtoken::Header::new(Algorithm::HS256);
        header.kid = Some(KEY_A_KID.to_string());
        let token = encode(&header, &claims(None), &EncodingKey::from_secret(b"secret")).unwrap();

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::InvalidHeader(HeaderFault::Unparseable))
        );
    }

    #[test]
    fn rejects_algorithm_the_key_was_not_published_for() {
        let mut keys = SigningKeySet::default();
        keys.insert(
            KEY_A_KID,
            SigningKey {
                decoding_key: DecodingKey::from_rsa_components(KEY_A_N, "AQAB").unwrap(),
                algorithm: Some(Algorithm::RS384),
            },
        );
        let verifier = TokenVerifier::new(
            "coffee",
            TEST_ISSUER,
            vec![Algorithm::RS256, Algorithm::RS384],
        );

        assert_eq!(
            verifier.verify(&token(None), &keys),
            Err(AuthError::InvalidHeader(HeaderFault::Unparseable))
        );
    }

    #[test]
    fn unknown_kid_is_reported() {
        let token = sign(Some("retired-key"), KEY_A_PEM, &claims(None));
        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::InvalidHeader(HeaderFault::NoMatchingKey))
        );
    }

    #[test]
    fn signature_from_another_key_is_rejected() {
        let token = sign(Some(KEY_A_KID), KEY_B_PEM, &claims(None));
        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = token(Some(&["get:drinks-detail"]));
        let mut forged_claims = claims(Some(&["get:drinks-detail", "delete:drinks"]));
        forged_claims["sub"] = json!("auth0|intruder");
        let forged_payload = URL_SAFE_NO_PAD.encode(forged_claims.to_string());

        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            verifier().verify(&forged, &keys()),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn payload_without_exp_is_unparseable() {
        let mut payload = claims(None);
        payload.as_object_mut().unwrap().remove("exp");
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::InvalidHeader(HeaderFault::Unparseable))
        );
    }

    #[test]
    fn exp_equal_to_now_is_expired() {
        let payload = claims(None);
        let exp = payload["exp"].as_i64().unwrap();
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify_at(&token, &keys(), exp),
            Err(AuthError::TokenExpired)
        );
        assert!(verifier().verify_at(&token, &keys(), exp - 1).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut payload = claims(None);
        payload["exp"] = json!(Utc::now().timestamp() - 30);
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::TokenExpired)
        );
        assert!(verifier().with_leeway(60).verify(&token, &keys()).is_ok());
    }

    #[test]
    fn expiry_is_checked_before_audience() {
        let mut payload = claims(None);
        payload["exp"] = json!(Utc::now().timestamp() - 30);
        payload["aud"] = json!("tea");
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let mut payload = claims(None);
        payload["nbf"] = json!(Utc::now().timestamp() + 600);
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::IncorrectClaims)
        );
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut payload = claims(None);
        payload["aud"] = json!("tea");
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::IncorrectClaims)
        );
    }

    #[test]
    fn missing_audience_is_rejected() {
        let mut payload = claims(None);
        payload.as_object_mut().unwrap().remove("aud");
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::IncorrectClaims)
        );
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let mut payload = claims(None);
        payload["iss"] = json!("https://evil.example.com/");
        let token = sign(Some(KEY_A_KID), KEY_A_PEM, &payload);

        assert_eq!(
            verifier().verify(&token, &keys()),
            Err(AuthError::IncorrectClaims)
        );
    }
}
