//! In-memory storage backend.
//!
//! Used by tests and the `memory` config backend. A single `RwLock` over
//! the whole state keeps multi-record operations (insert with inventory,
//! cascade delete, conditional claim) atomic without extra machinery.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Result, Store, StoreError};
use crate::model::{Address, Subnet};
use crate::net;

#[derive(Default)]
struct State {
    subnets: HashMap<Uuid, Subnet>,
    addresses: HashMap<Uuid, Address>,
    /// subnet id -> ids of its addresses
    by_subnet: HashMap<Uuid, HashSet<Uuid>>,
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::Lock(format!("read lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| StoreError::Lock(format!("write lock poisoned: {}", e)))
    }
}

fn sorted(mut addresses: Vec<Address>) -> Vec<Address> {
    addresses.sort_by_key(|a| net::numeric_key(a.address));
    addresses
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_subnet_with_addresses(
        &self,
        subnet: Subnet,
        addresses: Vec<Address>,
    ) -> Result<Subnet> {
        let mut state = self.write()?;
        let ids: HashSet<Uuid> = addresses.iter().map(|a| a.id).collect();
        for address in addresses {
            state.addresses.insert(address.id, address);
        }
        state.by_subnet.insert(subnet.id, ids);
        state.subnets.insert(subnet.id, subnet.clone());
        Ok(subnet)
    }

    async fn get_subnet(&self, id: Uuid) -> Result<Option<Subnet>> {
        let state = self.read()?;
        Ok(state.subnets.get(&id).cloned())
    }

    async fn list_subnets(&self) -> Result<Vec<Subnet>> {
        let state = self.read()?;
        Ok(state.subnets.values().cloned().collect())
    }

    async fn delete_subnet_cascade(&self, id: Uuid) -> Result<bool> {
        let mut state = self.write()?;
        if state.subnets.remove(&id).is_none() {
            return Ok(false);
        }
        if let Some(ids) = state.by_subnet.remove(&id) {
            for address_id in ids {
                state.addresses.remove(&address_id);
            }
        }
        Ok(true)
    }

    async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
        let state = self.read()?;
        Ok(state.addresses.get(&id).cloned())
    }

    async fn list_addresses(
        &self,
        subnet_id: Uuid,
        reserved: Option<bool>,
    ) -> Result<Vec<Address>> {
        let state = self.read()?;
        let matching = state
            .addresses
            .values()
            .filter(|a| a.subnet_id == subnet_id)
            .filter(|a| reserved.map_or(true, |r| a.reserved == r))
            .cloned()
            .collect();
        Ok(sorted(matching))
    }

    async fn list_all_addresses(&self, reserved: Option<bool>) -> Result<Vec<Address>> {
        let state = self.read()?;
        let matching = state
            .addresses
            .values()
            .filter(|a| reserved.map_or(true, |r| a.reserved == r))
            .cloned()
            .collect();
        Ok(sorted(matching))
    }

    async fn claim_address(&self, id: Uuid) -> Result<Option<Address>> {
        let mut state = self.write()?;
        match state.addresses.get_mut(&id) {
            Some(address) if !address.reserved => {
                address.reserved = true;
                Ok(Some(address.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_address_reserved(&self, id: Uuid, reserved: bool) -> Result<Option<Address>> {
        let mut state = self.write()?;
        match state.addresses.get_mut(&id) {
            Some(address) => {
                address.reserved = reserved;
                Ok(Some(address.clone()))
            }
            None => Ok(None),
        }
    }
}
