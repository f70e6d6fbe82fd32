//! SQLite storage backend.
//!
//! Uses WAL journal mode for concurrent reads with serialized writes.
//! Subnet creation and deletion run inside a transaction so the subnet and
//! its inventory appear and disappear together. The reserve race is
//! resolved with a conditional update: `UPDATE … WHERE id = ? AND
//! reserved = 0` affects zero rows when another caller got there first.

use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use ipnet::IpNet;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::{Result, Store, StoreError};
use crate::model::{Address, Subnet};
use crate::net;

/// SQLite storage backend.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens or creates a SQLite database at the given path.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path_str))
            .map_err(db_err)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.create_tables().await?;
        info!("SQLite store opened at {}", path_str);
        Ok(store)
    }

    /// Opens a private in-memory database (used by tests).
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_err)?;

        // A single connection: each in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subnets (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                network TEXT NOT NULL,
                gateway TEXT,
                nameserver TEXT,
                description TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS addresses (
                id TEXT PRIMARY KEY,
                subnet_id TEXT NOT NULL REFERENCES subnets(id),
                address TEXT NOT NULL,
                sort_key TEXT NOT NULL,
                reserved INTEGER NOT NULL DEFAULT 0,
                description TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_addresses_subnet ON addresses(subnet_id)")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_addresses_reserved ON addresses(subnet_id, reserved)",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}

fn db_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Fixed-width text key that sorts lexicographically in numeric address
/// order, IPv4 before IPv6.
fn sort_key(address: IpAddr) -> String {
    let (family, value) = net::numeric_key(address);
    format!("{}:{:032x}", family, value)
}

fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| StoreError::InvalidData(format!("uuid {:?}: {}", text, e)))
}

fn subnet_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Subnet> {
    let network: String = row.get("network");
    let gateway: Option<String> = row.get("gateway");
    let nameserver: Option<String> = row.get("nameserver");
    Ok(Subnet {
        id: parse_uuid(row.get("id"))?,
        name: row.get("name"),
        network: IpNet::from_str(&network)
            .map_err(|e| StoreError::InvalidData(format!("network {:?}: {}", network, e)))?,
        gateway: gateway.map(|g| parse_ip(&g)).transpose()?,
        nameserver: nameserver.map(|n| parse_ip(&n)).transpose()?,
        description: row.get("description"),
    })
}

fn parse_ip(text: &str) -> Result<IpAddr> {
    IpAddr::from_str(text)
        .map_err(|e| StoreError::InvalidData(format!("address {:?}: {}", text, e)))
}

fn address_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Address> {
    let address: String = row.get("address");
    Ok(Address {
        id: parse_uuid(row.get("id"))?,
        address: parse_ip(&address)?,
        reserved: row.get("reserved"),
        description: row.get("description"),
        subnet_id: parse_uuid(row.get("subnet_id"))?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_subnet_with_addresses(
        &self,
        subnet: Subnet,
        addresses: Vec<Address>,
    ) -> Result<Subnet> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO subnets (id, name, network, gateway, nameserver, description) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(subnet.id.to_string())
        .bind(&subnet.name)
        .bind(subnet.network.to_string())
        .bind(subnet.gateway.map(|g| g.to_string()))
        .bind(subnet.nameserver.map(|n| n.to_string()))
        .bind(&subnet.description)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for address in &addresses {
            sqlx::query(
                "INSERT INTO addresses (id, subnet_id, address, sort_key, reserved, description) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(address.id.to_string())
            .bind(address.subnet_id.to_string())
            .bind(address.address.to_string())
            .bind(sort_key(address.address))
            .bind(address.reserved)
            .bind(&address.description)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(subnet)
    }

    async fn get_subnet(&self, id: Uuid) -> Result<Option<Subnet>> {
        let row = sqlx::query("SELECT * FROM subnets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(subnet_from_row).transpose()
    }

    async fn list_subnets(&self) -> Result<Vec<Subnet>> {
        let rows = sqlx::query("SELECT * FROM subnets ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(subnet_from_row).collect()
    }

    async fn delete_subnet_cascade(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM addresses WHERE subnet_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let result = sqlx::query("DELETE FROM subnets WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
        let row = sqlx::query("SELECT * FROM addresses WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(address_from_row).transpose()
    }

    async fn list_addresses(
        &self,
        subnet_id: Uuid,
        reserved: Option<bool>,
    ) -> Result<Vec<Address>> {
        let rows = match reserved {
            Some(reserved) => {
                sqlx::query(
                    "SELECT * FROM addresses WHERE subnet_id = ? AND reserved = ? \
                     ORDER BY sort_key",
                )
                .bind(subnet_id.to_string())
                .bind(reserved)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM addresses WHERE subnet_id = ? ORDER BY sort_key")
                    .bind(subnet_id.to_string())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;
        rows.iter().map(address_from_row).collect()
    }

    async fn list_all_addresses(&self, reserved: Option<bool>) -> Result<Vec<Address>> {
        let rows = match reserved {
            Some(reserved) => {
                sqlx::query("SELECT * FROM addresses WHERE reserved = ? ORDER BY sort_key")
                    .bind(reserved)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM addresses ORDER BY sort_key")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;
        rows.iter().map(address_from_row).collect()
    }

    async fn claim_address(&self, id: Uuid) -> Result<Option<Address>> {
        let result = sqlx::query("UPDATE addresses SET reserved = 1 WHERE id = ? AND reserved = 0")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            // Lost the race, or no such address.
            return Ok(None);
        }
        self.get_address(id).await
    }

    async fn set_address_reserved(&self, id: Uuid, reserved: bool) -> Result<Option<Address>> {
        let result = sqlx::query("UPDATE addresses SET reserved = ? WHERE id = ?")
            .bind(reserved)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_address(id).await
    }
}
