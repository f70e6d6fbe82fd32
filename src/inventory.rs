//! Inventory expansion: a subnet definition to its complete address set.

use std::net::IpAddr;

use ipnet::IpNet;
use uuid::Uuid;

use crate::model::Address;
use crate::net;

/// Description recorded on the gateway's pre-reserved address.
pub const GATEWAY_DESCRIPTION: &str = "gateway";

/// Builds the full address inventory for a subnet.
///
/// One record per usable host address, in ascending address order. The
/// record matching `gateway` is created already reserved with the
/// "gateway" description; everything else starts unreserved.
///
/// The gateway is validated before this point. A prefix with no usable
/// hosts yields an empty inventory, which is legal.
pub fn build(subnet_id: Uuid, network: &IpNet, gateway: Option<IpAddr>) -> Vec<Address> {
    net::hosts(network)
        .map(|host| {
            let mut record = Address::new(subnet_id, host);
            if gateway == Some(host) {
                record.reserved = true;
                record.description = Some(GATEWAY_DESCRIPTION.to_string());
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_completeness() {
        let id = Uuid::new_v4();
        let network = net::parse_network("192.168.1.0/29").unwrap();
        let inventory = build(id, &network, None);

        assert_eq!(inventory.len(), 6);
        for record in &inventory {
            assert_eq!(record.subnet_id, id);
            assert!(!record.reserved);
            assert!(record.description.is_none());
            assert!(net::contains(&network, record.address));
            assert!(!net::is_network_or_broadcast(&network, record.address));
        }
    }

    #[test]
    fn test_inventory_ascending_and_distinct() {
        let network = net::parse_network("10.0.0.0/28").unwrap();
        let inventory = build(Uuid::new_v4(), &network, None);

        assert_eq!(inventory.len(), 14);
        for pair in inventory.windows(2) {
            assert!(net::numeric_key(pair[0].address) < net::numeric_key(pair[1].address));
        }
    }

    #[test]
    fn test_gateway_pre_reserved() {
        let network = net::parse_network("192.168.1.0/29").unwrap();
        let gateway: IpAddr = "192.168.1.1".parse().unwrap();
        let inventory = build(Uuid::new_v4(), &network, Some(gateway));

        let reserved: Vec<&Address> = inventory.iter().filter(|a| a.reserved).collect();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].address, gateway);
        assert_eq!(reserved[0].description.as_deref(), Some(GATEWAY_DESCRIPTION));
    }

    #[test]
    fn test_ids_are_unique() {
        let network = net::parse_network("10.0.0.0/29").unwrap();
        let inventory = build(Uuid::new_v4(), &network, None);
        let mut ids: Vec<Uuid> = inventory.iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), inventory.len());
    }
}
