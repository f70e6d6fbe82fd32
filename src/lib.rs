//! # ipamd
//!
//! An IP address management (IPAM) service: tracks subnets (CIDR blocks)
//! and the individually addressable hosts within them, and coordinates
//! reservation and release of those hosts over a REST API.
//!
//! ## Features
//!
//! - Subnet creation materializes the complete host inventory atomically,
//!   with the gateway pre-reserved
//! - Deterministic lowest-address-first allocation, race-safe under
//!   concurrent callers
//! - Guarded subnet deletion: refused while reservations exist unless
//!   forced
//! - IPv4 and IPv6 prefixes handled uniformly
//! - Pluggable persistence: SQLite for deployments, in-memory for tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use ipamd::server::{self, AppState};
//! use ipamd::store::{self, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> ipamd::Result<()> {
//!     let backend = store::create_store(&StoreConfig::Memory).await?;
//!     let state = AppState::new(backend);
//!     server::run("127.0.0.1:8000".parse().expect("address"), state).await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`net`] - CIDR and host-address arithmetic (pure functions)
//! - [`inventory`] - expands a subnet definition into its address set
//! - [`store`] - persistence behind the [`Store`] trait
//! - [`subnet`] - subnet lifecycle (validated create, guarded delete)
//! - [`alloc`] - address reservation and release
//! - [`server`] - the HTTP API
//! - [`config`] - JSON configuration file handling

pub mod alloc;
pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod net;
pub mod server;
pub mod store;
pub mod subnet;

pub use alloc::AllocationManager;
pub use config::Config;
pub use error::{Error, Result};
pub use model::{Address, Subnet, SubnetRequest};
pub use server::AppState;
pub use store::{MemoryStore, SqliteStore, Store, StoreConfig};
pub use subnet::SubnetManager;
