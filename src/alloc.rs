//! Address allocation: deterministic reserve and release against the store.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::Address;
use crate::store::Store;

/// Reserves and frees individual addresses within a subnet's inventory.
#[derive(Clone)]
pub struct AllocationManager {
    store: Arc<dyn Store>,
}

impl AllocationManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Reserves the numerically lowest unreserved address in the subnet.
    ///
    /// Selection is an optimistic loop: scan the free list in ascending
    /// order and claim the first entry with a conditional update. A claim
    /// that affects no row means another caller won the race for that
    /// address, so the next candidate is tried; when a whole scan comes up
    /// empty the subnet is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubnetNotFound`] for an unknown subnet and
    /// [`Error::NoAvailableAddress`] when every address is reserved.
    pub async fn reserve(&self, subnet_id: Uuid) -> Result<Address> {
        if self.store.get_subnet(subnet_id).await?.is_none() {
            return Err(Error::SubnetNotFound(subnet_id));
        }
        loop {
            let free = self.store.list_addresses(subnet_id, Some(false)).await?;
            if free.is_empty() {
                return Err(Error::NoAvailableAddress(subnet_id));
            }
            for candidate in free {
                if let Some(address) = self.store.claim_address(candidate.id).await? {
                    debug!(subnet_id = %subnet_id, address = %address.address, "reserved address");
                    return Ok(address);
                }
                // Claimed by someone else between the scan and the update
            }
        }
    }

    /// Clears the reserved flag on an address.
    ///
    /// The description is left untouched, so a freed gateway address keeps
    /// its "gateway" label until something overwrites it. Last writer wins
    /// on the flag.
    pub async fn release(&self, address_id: Uuid) -> Result<()> {
        match self.store.set_address_reserved(address_id, false).await? {
            Some(address) => {
                debug!(address = %address.address, "released address");
                Ok(())
            }
            None => Err(Error::AddressNotFound(address_id)),
        }
    }

    /// Addresses owned by a subnet, optionally filtered by reservation
    /// state.
    pub async fn list_by_subnet(
        &self,
        subnet_id: Uuid,
        reserved: Option<bool>,
    ) -> Result<Vec<Address>> {
        if self.store.get_subnet(subnet_id).await?.is_none() {
            return Err(Error::SubnetNotFound(subnet_id));
        }
        Ok(self.store.list_addresses(subnet_id, reserved).await?)
    }

    /// Every address across all subnets, optionally filtered by
    /// reservation state.
    pub async fn list_all(&self, reserved: Option<bool>) -> Result<Vec<Address>> {
        Ok(self.store.list_all_addresses(reserved).await?)
    }
}
