//! Persistence layer for subnets and their address inventories.
//!
//! The engine talks to storage only through the [`Store`] trait, so tests
//! run against an isolated in-memory backend while deployments use SQLite.
//! Both backends uphold two guarantees the engine relies on:
//!
//! - subnet creation and deletion are all-or-nothing across the subnet and
//!   its address set;
//! - [`Store::claim_address`] flips `reserved` from false to true
//!   atomically, so two concurrent callers can never claim the same
//!   address.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Address, Subnet};

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("invalid stored data: {0}")]
    InvalidData(String),

    #[error("lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Backend-agnostic storage interface.
///
/// All methods are async for parity across local and networked backends.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persists a subnet together with its full inventory as one unit.
    /// Partial state is never observable.
    async fn insert_subnet_with_addresses(
        &self,
        subnet: Subnet,
        addresses: Vec<Address>,
    ) -> Result<Subnet>;

    /// Subnet lookup by id.
    async fn get_subnet(&self, id: Uuid) -> Result<Option<Subnet>>;

    /// All stored subnets.
    async fn list_subnets(&self) -> Result<Vec<Subnet>>;

    /// Deletes a subnet and every address it owns, atomically.
    /// Returns true if the subnet existed.
    async fn delete_subnet_cascade(&self, id: Uuid) -> Result<bool>;

    /// Address lookup by id.
    async fn get_address(&self, id: Uuid) -> Result<Option<Address>>;

    /// Addresses owned by a subnet, ascending by address value,
    /// optionally filtered by reservation state.
    async fn list_addresses(
        &self,
        subnet_id: Uuid,
        reserved: Option<bool>,
    ) -> Result<Vec<Address>>;

    /// Every stored address across all subnets, ascending by address
    /// value, optionally filtered by reservation state.
    async fn list_all_addresses(&self, reserved: Option<bool>) -> Result<Vec<Address>>;

    /// Atomically flips an unreserved address to reserved.
    ///
    /// Returns the updated record, or `None` when the address is missing
    /// or already reserved — in the reserve race that means another caller
    /// won, and the engine re-selects.
    async fn claim_address(&self, id: Uuid) -> Result<Option<Address>>;

    /// Unconditionally sets the reserved flag, leaving the description
    /// untouched. Last writer wins. Returns `None` for an unknown id.
    async fn set_address_reserved(&self, id: Uuid, reserved: bool) -> Result<Option<Address>>;
}

/// Storage backend selection, as it appears in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-memory storage (development and tests; nothing survives restart).
    Memory,

    /// SQLite database file.
    Sqlite { path: String },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite {
            path: "ipam.db".to_string(),
        }
    }
}

/// Creates a store from configuration.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Sqlite { path } => {
            let store = SqliteStore::open(path).await?;
            Ok(Arc::new(store))
        }
    }
}
