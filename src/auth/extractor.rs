// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for permission-gated routes.
//!
//! Put `RequirePermission<P>` first in a handler's argument list; the handler
//! body only runs once the bearer token is verified and carries `P::NAME`:
//!
//! ```rust,ignore
//! async fn create_drink(
//!     RequirePermission { claims, .. }: RequirePermission<PostDrinks>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<DrinkDetailResponse>, ApiError> {
//!     // claims.sub is the caller
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::Claims;
use super::error::AuthError;
use super::permissions::Permission;
use crate::state::AppState;

/// Verified claims of a caller holding permission `P`.
pub struct RequirePermission<P: Permission> {
    pub claims: Claims,
    _permission: PhantomData<P>,
}

impl<P: Permission> RequirePermission<P> {
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

impl<P: Permission> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.auth.authorize(&parts.headers, P::NAME).await {
            Ok(claims) => {
                tracing::debug!(
                    subject = %claims.subject(),
                    permission = P::NAME,
                    "Request authorized"
                );
                Ok(Self {
                    claims,
                    _permission: PhantomData,
                })
            }
            Err(err) => {
                tracing::warn!(
                    code = err.error_code(),
                    permission = P::NAME,
                    description = %err,
                    "Request rejected"
                );
                Err(err)
            }
        }
    }
}
