// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authorization: bearer extraction, key lookup, verification and
//! permission check, in that order.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::claims::Claims;
use super::error::{AuthError, HeaderFault};
use super::jwks::JwksManager;
use super::permissions::check_permission;
use super::verifier::TokenVerifier;

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader(HeaderFault::NotBearerToken))?;

    let parts: Vec<&str> = auth_header.split(' ').collect();

    if parts[0] != "Bearer" {
        return Err(AuthError::InvalidHeader(HeaderFault::MissingBearerScheme));
    }

    match parts.as_slice() {
        [_] | [_, ""] => Err(AuthError::InvalidHeader(HeaderFault::TokenNotFound)),
        [_, token] => Ok(*token),
        _ => Err(AuthError::InvalidHeader(HeaderFault::NotBearerToken)),
    }
}

/// Key provider plus verifier, shared by every protected route.
#[derive(Clone)]
pub struct Authenticator {
    keys: JwksManager,
    verifier: TokenVerifier,
}

impl Authenticator {
    pub fn new(keys: JwksManager, verifier: TokenVerifier) -> Self {
        Self { keys, verifier }
    }

    pub fn keys(&self) -> &JwksManager {
        &self.keys
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Verify `token`, refreshing the key set once if its `kid` is unknown
    /// (subject to the key provider's refresh cooldown).
    pub async fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let kid = TokenVerifier::key_id(token)?;

        let mut keys = self.keys.signing_keys().await?;
        if !keys.contains(&kid) {
            tracing::info!(kid = %kid, "Unknown signing key id, refreshing key set");
            keys = self.keys.refresh_for_unknown_kid().await?;
        }

        self.verifier.verify(token, &keys)
    }

    /// Authenticate the request and require `permission`.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        permission: &str,
    ) -> Result<Claims, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.authenticate(token).await?;
        check_permission(&claims, permission)?;
        Ok(claims)
    }
}
