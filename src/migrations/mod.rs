//! Versioned database setup, run by the `migrate` binary.
//!
//! Each migration is a unit struct implementing [`MigrationTrait`]; the
//! [`Migrator`] lists them in order and records every applied name in the
//! `migrations` collection.

mod m001_init_collections_and_indexes;
mod m002_seed_admin_user;
mod m003_seed_categories_and_locations;

use std::collections::HashSet;
use std::str::FromStr;

use log::info;
use mongodb::Database;
use mongodb::bson::{DateTime, doc};
use mongodb::options::{FindOneOptions, IndexOptions};
use mongodb::IndexModel;
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::services::PasswordError;

pub const MIGRATIONS: &str = "migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("No migration named {0} is known")]
    Unknown(String),
}

#[rocket::async_trait]
pub trait MigrationTrait: Send + Sync {
    fn name(&self) -> &'static str;

    async fn up(&self, db: &Database, config: &Config) -> Result<(), MigrationError>;

    async fn down(&self, db: &Database, config: &Config) -> Result<(), MigrationError>;
}

/// Bookkeeping row in the `migrations` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub name: String,
    pub applied_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Up,
    Down,
}

impl FromStr for Command {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(Command::Status),
            "up" => Ok(Command::Up),
            "down" => Ok(Command::Down),
            other => Err(MigrationError::UnknownCommand(other.to_string())),
        }
    }
}

pub struct Migrator;

impl Migrator {
    pub fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_init_collections_and_indexes::Migration),
            Box::new(m002_seed_admin_user::Migration),
            Box::new(m003_seed_categories_and_locations::Migration),
        ]
    }

    /// Migrations not yet in `applied`, in declaration order.
    pub fn pending<'a>(
        migrations: &'a [Box<dyn MigrationTrait>],
        applied: &HashSet<String>,
    ) -> Vec<&'a dyn MigrationTrait> {
        migrations
            .iter()
            .filter(|m| !applied.contains(m.name()))
            .map(|m| m.as_ref())
            .collect()
    }

    async fn prepare(db: &Database) -> Result<(), MigrationError> {
        let existing = db.list_collection_names(None).await?;
        if !existing.iter().any(|name| name == MIGRATIONS) {
            db.create_collection(MIGRATIONS, None).await?;
        }

        db.collection::<MigrationRecord>(MIGRATIONS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }

    async fn applied(db: &Database) -> Result<HashSet<String>, MigrationError> {
        let records: Vec<MigrationRecord> = db
            .collection::<MigrationRecord>(MIGRATIONS)
            .find(None, None)
            .await?
            .try_collect()
            .await?;

        Ok(records.into_iter().map(|r| r.name).collect())
    }

    /// Every known migration paired with whether it has been applied.
    pub async fn status(db: &Database) -> Result<Vec<(&'static str, bool)>, MigrationError> {
        Self::prepare(db).await?;
        let applied = Self::applied(db).await?;

        Ok(Self::migrations()
            .iter()
            .map(|m| (m.name(), applied.contains(m.name())))
            .collect())
    }

    /// Applies pending migrations in order and returns their names.
    pub async fn up(db: &Database, config: &Config) -> Result<Vec<&'static str>, MigrationError> {
        Self::prepare(db).await?;
        let applied = Self::applied(db).await?;
        let migrations = Self::migrations();
        let records = db.collection::<MigrationRecord>(MIGRATIONS);

        let mut done = Vec::new();
        for migration in Self::pending(&migrations, &applied) {
            info!("Applying: {}", migration.name());
            migration.up(db, config).await?;

            records
                .insert_one(
                    MigrationRecord {
                        name: migration.name().to_string(),
                        applied_at: DateTime::now(),
                    },
                    None,
                )
                .await?;
            done.push(migration.name());
        }
        Ok(done)
    }

    /// Reverts the most recently applied migration, if any.
    pub async fn down(db: &Database, config: &Config) -> Result<Option<&'static str>, MigrationError> {
        Self::prepare(db).await?;
        let records = db.collection::<MigrationRecord>(MIGRATIONS);

        let latest = records
            .find_one(
                None,
                FindOneOptions::builder()
                    .sort(doc! { "appliedAt": -1, "_id": -1 })
                    .build(),
            )
            .await?;

        let Some(latest) = latest else {
            return Ok(None);
        };

        let migrations = Self::migrations();
        let migration = migrations
            .iter()
            .find(|m| m.name() == latest.name)
            .ok_or_else(|| MigrationError::Unknown(latest.name.clone()))?;

        info!("Reverting: {}", migration.name());
        migration.down(db, config).await?;
        records
            .delete_one(doc! { "name": migration.name() }, None)
            .await?;

        Ok(Some(migration.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered_and_unique() {
        let names: Vec<_> = Migrator::migrations().iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            [
                "001_init_collections_and_indexes",
                "002_seed_admin_user",
                "003_seed_categories_and_locations",
            ]
        );

        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, names);
    }

    #[test]
    fn pending_skips_applied() {
        let migrations = Migrator::migrations();

        let none: HashSet<String> = HashSet::new();
        assert_eq!(Migrator::pending(&migrations, &none).len(), 3);

        let applied: HashSet<String> = ["001_init_collections_and_indexes".to_string()].into();
        let pending: Vec<_> = Migrator::pending(&migrations, &applied)
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(pending, ["002_seed_admin_user", "003_seed_categories_and_locations"]);

        let all: HashSet<String> = migrations.iter().map(|m| m.name().to_string()).collect();
        assert!(Migrator::pending(&migrations, &all).is_empty());
    }

    #[test]
    fn commands() {
        assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
        assert_eq!("up".parse::<Command>().unwrap(), Command::Up);
        assert_eq!("down".parse::<Command>().unwrap(), Command::Down);

        let err = "redo".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: redo");
    }
}
