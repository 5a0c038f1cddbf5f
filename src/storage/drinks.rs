// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded drinks database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `drinks`: id → serialized Drink (JSON bytes)
//! - `drink_titles`: title → id (uniqueness index)
//! - `meta`: key → value (`next_id`)

use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};

use crate::models::{Drink, Ingredient};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: id → serialized Drink (JSON bytes).
const DRINKS: TableDefinition<u64, &[u8]> = TableDefinition::new("drinks");

/// Index: title → id. Enforces unique titles.
const DRINK_TITLES: TableDefinition<&str, u64> = TableDefinition::new("drink_titles");

/// Counters.
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DrinkDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("drink {0} not found")]
    NotFound(u64),

    #[error("drink title already exists: {0}")]
    DuplicateTitle(String),
}

pub type DrinkDbResult<T> = Result<T, DrinkDbError>;

/// Title of the drink seeded by [`DrinkDatabase::reset`].
pub const SEED_DRINK_TITLE: &str = "water";

// =============================================================================
// DrinkDatabase
// =============================================================================

/// Embedded ACID drinks database.
pub struct DrinkDatabase {
    db: Database,
}

impl DrinkDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DrinkDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DRINKS)?;
            let _ = write_txn.open_table(DRINK_TITLES)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Drop every drink and seed the sample drink. Ids restart at 1.
    pub fn reset(&self) -> DrinkDbResult<Drink> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(DRINKS)?;
        write_txn.delete_table(DRINK_TITLES)?;
        write_txn.delete_table(META)?;
        let seeded = insert_drink(
            &write_txn,
            SEED_DRINK_TITLE,
            vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        )?;
        write_txn.commit()?;

        tracing::info!(id = seeded.id, "Drinks database reset");
        Ok(seeded)
    }

    /// All drinks in ascending id order.
    pub fn list(&self) -> DrinkDbResult<Vec<Drink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;

        let mut drinks = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            drinks.push(serde_json::from_slice(value.value())?);
        }
        Ok(drinks)
    }

    /// Look up a single drink by id.
    pub fn get(&self, id: u64) -> DrinkDbResult<Option<Drink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Number of stored drinks.
    pub fn count(&self) -> DrinkDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        Ok(table.len()?)
    }

    /// Store a new drink. Fails with `DuplicateTitle` if the title is taken.
    pub fn insert(&self, title: &str, recipe: Vec<Ingredient>) -> DrinkDbResult<Drink> {
        let write_txn = self.db.begin_write()?;
        let drink = insert_drink(&write_txn, title, recipe)?;
        write_txn.commit()?;
        Ok(drink)
    }

    /// Apply the given changes to drink `id`.
    pub fn update(
        &self,
        id: u64,
        title: Option<String>,
        recipe: Option<Vec<Ingredient>>,
    ) -> DrinkDbResult<Drink> {
        let write_txn = self.db.begin_write()?;
        let drink = {
            let mut drinks = write_txn.open_table(DRINKS)?;
            let mut titles = write_txn.open_table(DRINK_TITLES)?;

            let existing_bytes = {
                let existing = drinks.get(id)?.ok_or(DrinkDbError::NotFound(id))?;
                existing.value().to_vec()
            };
            let mut drink: Drink = serde_json::from_slice(&existing_bytes)?;

            if let Some(title) = title {
                if title != drink.title {
                    if titles.get(title.as_str())?.is_some() {
                        return Err(DrinkDbError::DuplicateTitle(title));
                    }
                    titles.remove(drink.title.as_str())?;
                    titles.insert(title.as_str(), id)?;
                    drink.title = title;
                }
            }

            if let Some(recipe) = recipe {
                drink.recipe = recipe;
            }

            let json = serde_json::to_vec(&drink)?;
            drinks.insert(id, json.as_slice())?;
            drink
        };
        write_txn.commit()?;
        Ok(drink)
    }

    /// Remove drink `id`.
    pub fn delete(&self, id: u64) -> DrinkDbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut drinks = write_txn.open_table(DRINKS)?;
            let removed_bytes = {
                let removed = drinks.remove(id)?.ok_or(DrinkDbError::NotFound(id))?;
                removed.value().to_vec()
            };
            let drink: Drink = serde_json::from_slice(&removed_bytes)?;

            let mut titles = write_txn.open_table(DRINK_TITLES)?;
            titles.remove(drink.title.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

fn insert_drink(
    write_txn: &WriteTransaction,
    title: &str,
    recipe: Vec<Ingredient>,
) -> DrinkDbResult<Drink> {
    let mut titles = write_txn.open_table(DRINK_TITLES)?;
    if titles.get(title)?.is_some() {
        return Err(DrinkDbError::DuplicateTitle(title.to_string()));
    }

    let mut meta = write_txn.open_table(META)?;
    let id = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
    meta.insert(NEXT_ID_KEY, id + 1)?;

    let drink = Drink {
        id,
        title: title.to_string(),
        recipe,
    };
    let json = serde_json::to_vec(&drink)?;

    let mut drinks = write_txn.open_table(DRINKS)?;
    drinks.insert(id, json.as_slice())?;
    titles.insert(title, id)?;

    Ok(drink)
}
