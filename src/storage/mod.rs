// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Drinks are kept in a single embedded redb file (`DATABASE_PATH`).
//! All writes go through one ACID write transaction each, so a failed
//! insert or update never leaves the title index out of sync.

pub mod drinks;

pub use drinks::{DrinkDatabase, DrinkDbError, DrinkDbResult, SEED_DRINK_TITLE};
