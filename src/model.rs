//! Subnet and address records.
//!
//! These shapes are the serialization contract shared by the HTTP layer and
//! the storage backends: a subnet is `(id, name, network, gateway,
//! nameserver, description)` and an address is `(id, address, reserved,
//! description, subnet_id)`.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A managed CIDR block and its optional gateway/nameserver settings.
///
/// A subnet owns its full address inventory: every usable host address of
/// `network` has exactly one [`Address`] record, created in the same
/// transaction as the subnet and destroyed with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// Opaque identity, assigned at creation.
    pub id: Uuid,
    pub name: String,
    pub network: IpNet,
    /// Pre-reserved routing address inside `network`, if any.
    pub gateway: Option<IpAddr>,
    pub nameserver: Option<IpAddr>,
    pub description: Option<String>,
}

/// A single host address within a subnet's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Opaque identity, assigned at creation.
    pub id: Uuid,
    pub address: IpAddr,
    /// Whether the address is currently assigned.
    pub reserved: bool,
    /// Reason for a reservation, e.g. "gateway".
    pub description: Option<String>,
    /// Owning subnet.
    pub subnet_id: Uuid,
}

impl Address {
    /// Creates an unreserved address record owned by `subnet_id`.
    pub fn new(subnet_id: Uuid, address: IpAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            reserved: false,
            description: None,
            subnet_id,
        }
    }
}

/// Subnet creation payload as accepted over the wire.
///
/// All address fields are raw text; [`SubnetManager::create`] validates
/// them fully before anything is persisted.
///
/// [`SubnetManager::create`]: crate::subnet::SubnetManager::create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetRequest {
    pub name: String,
    pub network: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub nameserver: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
