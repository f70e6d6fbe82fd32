//! Subnet lifecycle: validated creation with full inventory, guarded delete.
//!
//! All validation happens up front; nothing is persisted until the payload
//! has passed every check, and the store then commits the subnet together
//! with its inventory as one unit. A subnet's prefix is never updated in
//! place — callers delete and recreate instead, which keeps the
//! one-record-per-host invariant trivially true.

use std::net::IpAddr;
use std::sync::Arc;

use ipnet::IpNet;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::inventory;
use crate::model::{Subnet, SubnetRequest};
use crate::net;
use crate::store::Store;

/// Creates and destroys subnets along with their address inventories.
#[derive(Clone)]
pub struct SubnetManager {
    store: Arc<dyn Store>,
}

impl SubnetManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a subnet and its complete host inventory.
    ///
    /// The gateway, when given, is materialized as an already-reserved
    /// address record; every other host starts unreserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNetwork`], [`Error::InvalidAddress`], or
    /// [`Error::Validation`] when the payload is rejected. No partial
    /// state is ever persisted.
    pub async fn create(&self, request: SubnetRequest) -> Result<Subnet> {
        let validated = validate(&request)?;
        let subnet = Subnet {
            id: Uuid::new_v4(),
            name: validated.name,
            network: validated.network,
            gateway: validated.gateway,
            nameserver: validated.nameserver,
            description: request.description,
        };
        let addresses = inventory::build(subnet.id, &subnet.network, subnet.gateway);
        info!(
            subnet = %subnet.network,
            hosts = addresses.len(),
            "creating subnet"
        );
        let subnet = self
            .store
            .insert_subnet_with_addresses(subnet, addresses)
            .await?;
        Ok(subnet)
    }

    /// Returns the subnet with the given id.
    pub async fn get(&self, id: Uuid) -> Result<Subnet> {
        self.store
            .get_subnet(id)
            .await?
            .ok_or(Error::SubnetNotFound(id))
    }

    /// Returns all subnets.
    pub async fn list(&self) -> Result<Vec<Subnet>> {
        Ok(self.store.list_subnets().await?)
    }

    /// Deletes a subnet and its entire inventory.
    ///
    /// Without `force`, the delete is refused while any owned address is
    /// reserved, and nothing is mutated.
    pub async fn delete(&self, id: Uuid, force: bool) -> Result<()> {
        if self.store.get_subnet(id).await?.is_none() {
            return Err(Error::SubnetNotFound(id));
        }
        if !force {
            let reserved = self.store.list_addresses(id, Some(true)).await?;
            if !reserved.is_empty() {
                return Err(Error::HasReservedAddresses(id));
            }
        }
        self.store.delete_subnet_cascade(id).await?;
        info!(subnet_id = %id, force, "deleted subnet");
        Ok(())
    }
}

struct ValidatedSubnet {
    name: String,
    network: IpNet,
    gateway: Option<IpAddr>,
    nameserver: Option<IpAddr>,
}

/// Checks the whole payload before any persistence happens.
fn validate(request: &SubnetRequest) -> Result<ValidatedSubnet> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("name must not be empty".to_string()));
    }

    let network = net::parse_network(&request.network)?;

    let gateway = match &request.gateway {
        Some(text) => {
            let gateway = net::parse_address(text)?;
            if !net::contains(&network, gateway)
                || net::is_network_or_broadcast(&network, gateway)
            {
                return Err(Error::Validation(format!(
                    "gateway {} is not usable in network {}",
                    gateway, network
                )));
            }
            Some(gateway)
        }
        None => None,
    };

    // No containment requirement; a nameserver can live anywhere.
    let nameserver = match &request.nameserver {
        Some(text) => Some(net::parse_address(text)?),
        None => None,
    };

    Ok(ValidatedSubnet {
        name: name.to_string(),
        network,
        gateway,
        nameserver,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> (SubnetManager, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        (SubnetManager::new(store.clone()), store)
    }

    fn request(network: &str, gateway: Option<&str>) -> SubnetRequest {
        SubnetRequest {
            name: "lab".to_string(),
            network: network.to_string(),
            gateway: gateway.map(str::to_string),
            nameserver: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_materializes_inventory() {
        let (manager, store) = manager();
        let subnet = manager.create(request("192.168.1.0/29", None)).await.unwrap();

        let addresses = store.list_addresses(subnet.id, None).await.unwrap();
        assert_eq!(addresses.len(), 6);
        assert!(addresses.iter().all(|a| !a.reserved));
        assert_eq!(addresses[0].address, "192.168.1.1".parse::<IpAddr>().unwrap());
        assert_eq!(addresses[5].address, "192.168.1.6".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_create_reserves_gateway() {
        let (manager, store) = manager();
        let subnet = manager
            .create(request("192.168.1.0/29", Some("192.168.1.1")))
            .await
            .unwrap();

        let reserved = store.list_addresses(subnet.id, Some(true)).await.unwrap();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].address, subnet.gateway.unwrap());
        assert_eq!(reserved[0].description.as_deref(), Some("gateway"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_gateways() {
        let (manager, store) = manager();

        // Network address
        let err = manager
            .create(request("10.0.0.0/30", Some("10.0.0.0")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Broadcast address
        let err = manager
            .create(request("10.0.0.0/30", Some("10.0.0.3")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Outside the network
        let err = manager
            .create(request("10.0.0.0/30", Some("10.0.1.1")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Unparseable
        let err = manager
            .create(request("10.0.0.0/30", Some("not-an-ip")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));

        // Nothing was persisted by any rejected attempt
        assert!(store.list_subnets().await.unwrap().is_empty());
        assert!(store.list_all_addresses(None).await.unwrap().is_empty());

        // The first usable host is fine
        manager
            .create(request("10.0.0.0/30", Some("10.0.0.1")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_bad_network() {
        let (manager, _) = manager();
        let err = manager.create(request("10.0.0.1/24", None)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidNetwork(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let (manager, _) = manager();
        let mut req = request("10.0.0.0/29", None);
        req.name = "   ".to_string();
        let err = manager.create(req).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_nameserver_needs_no_containment() {
        let (manager, _) = manager();
        let mut req = request("10.0.0.0/29", None);
        req.nameserver = Some("1.1.1.1".to_string());
        let subnet = manager.create(req).await.unwrap();
        assert_eq!(subnet.nameserver, Some("1.1.1.1".parse().unwrap()));

        let mut req = request("10.0.1.0/29", None);
        req.nameserver = Some("not-an-ip".to_string());
        let err = manager.create(req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_delete_guard() {
        let (manager, store) = manager();
        let subnet = manager
            .create(request("192.168.1.0/29", Some("192.168.1.1")))
            .await
            .unwrap();

        // Gateway is reserved, so a plain delete is refused with no mutation
        let err = manager.delete(subnet.id, false).await.unwrap_err();
        assert!(matches!(err, Error::HasReservedAddresses(_)));
        assert!(store.get_subnet(subnet.id).await.unwrap().is_some());
        assert_eq!(store.list_addresses(subnet.id, None).await.unwrap().len(), 6);

        // Force removes everything
        manager.delete(subnet.id, true).await.unwrap();
        assert!(store.get_subnet(subnet.id).await.unwrap().is_none());
        assert!(store.list_all_addresses(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_reservations() {
        let (manager, store) = manager();
        let subnet = manager.create(request("10.0.0.0/29", None)).await.unwrap();
        manager.delete(subnet.id, false).await.unwrap();
        assert!(store.list_subnets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_subnet() {
        let (manager, _) = manager();
        let err = manager.delete(Uuid::new_v4(), false).await.unwrap_err();
        assert!(matches!(err, Error::SubnetNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_missing_subnet() {
        let (manager, _) = manager();
        let err = manager.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::SubnetNotFound(_)));
    }
}
