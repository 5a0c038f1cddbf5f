// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission scopes for authorization.
//!
//! Auth0 RBAC puts granted scopes in the `permissions` claim. Each
//! protected route names the one scope it needs through a marker type.
//!
//! | Marker | Scope | Granted to |
//! |--------|-------|------------|
//! | [`GetDrinksDetail`] | `get:drinks-detail` | Barista, Manager |
//! | [`PostDrinks`] | `post:drinks` | Manager |
//! | [`PatchDrinks`] | `patch:drinks` | Manager |
//! | [`DeleteDrinks`] | `delete:drinks` | Manager |

use super::claims::Claims;
use super::error::AuthError;

/// A scope a route requires.
pub trait Permission: Send + Sync + 'static {
    const NAME: &'static str;
}

/// View drinks with full recipes.
pub struct GetDrinksDetail;

/// Create drinks.
pub struct PostDrinks;

/// Edit drinks.
pub struct PatchDrinks;

/// Remove drinks.
pub struct DeleteDrinks;

impl Permission for GetDrinksDetail {
    const NAME: &'static str = "get:drinks-detail";
}

impl Permission for PostDrinks {
    const NAME: &'static str = "post:drinks";
}

impl Permission for PatchDrinks {
    const NAME: &'static str = "patch:drinks";
}

impl Permission for DeleteDrinks {
    const NAME: &'static str = "delete:drinks";
}

/// Check that `claims` grant `required`.
pub fn check_permission(claims: &Claims, required: &str) -> Result<(), AuthError> {
    let permissions = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::PermissionsMissing)?;

    if permissions.iter().any(|granted| granted == required) {
        Ok(())
    } else {
        Err(AuthError::PermissionNotFound)
    }
}
