// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::storage::DrinkDatabase;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DrinkDatabase>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(db: DrinkDatabase, auth: Authenticator) -> Self {
        Self {
            db: Arc::new(db),
            auth: Arc::new(auth),
        }
    }
}
