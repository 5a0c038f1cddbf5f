// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Auth0 bearer-token authentication and permission checks for the drinks API.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with Auth0 and receives an access token
//! 2. Frontend sends `Authorization: Bearer <access token>`
//! 3. Server:
//!    - Reads the `kid` from the token header
//!    - Looks it up in the tenant JWKS (cached, refreshed on unknown `kid`)
//!    - Verifies the RS256 signature, `exp`, `iss` and `aud`
//!    - Requires the route's permission in the `permissions` claim
//!
//! ## Failures
//!
//! Every failure is answered with `{"success": false, "code", "description"}`
//! and the status from [`AuthError::status_code`]. Routes without a
//! permission (the public menu, health) never consult this module.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use claims::{Audience, Claims};
pub use error::{AuthError, AuthErrorBody, HeaderFault};
pub use extractor::RequirePermission;
pub use gate::{bearer_token, Authenticator};
pub use jwks::{JwksManager, SigningKey, SigningKeySet};
pub use permissions::{
    check_permission, DeleteDrinks, GetDrinksDetail, PatchDrinks, Permission, PostDrinks,
};
pub use verifier::TokenVerifier;
