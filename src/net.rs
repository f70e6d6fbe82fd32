//! CIDR prefix and host-address arithmetic.
//!
//! Pure functions over [`IpNet`] shared by validation, inventory expansion,
//! and allocation ordering. IPv4 and IPv6 prefixes are handled uniformly;
//! anything accepted by standard CIDR parsing is accepted here.

use std::net::{IpAddr, Ipv6Addr};

use ipnet::{IpNet, Ipv4AddrRange, Ipv6AddrRange};

use crate::error::{Error, Result};

/// Parses CIDR notation into a network.
///
/// Parsing is strict: text with host bits set below the prefix length
/// (e.g. `10.0.0.1/24`) is rejected along with malformed or out-of-range
/// input.
pub fn parse_network(text: &str) -> Result<IpNet> {
    let network: IpNet = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidNetwork(text.to_string()))?;
    if network.addr() != network.network() {
        return Err(Error::InvalidNetwork(text.to_string()));
    }
    Ok(network)
}

/// Parses a single dotted/colon-form IP address.
pub fn parse_address(text: &str) -> Result<IpAddr> {
    text.trim()
        .parse()
        .map_err(|_| Error::InvalidAddress(text.to_string()))
}

/// Membership test: is `address` inside `network`?
///
/// Always false when the families differ.
pub fn contains(network: &IpNet, address: IpAddr) -> bool {
    network.contains(&address)
}

/// True when `address` is the network address or the last (broadcast)
/// address of the prefix.
pub fn is_network_or_broadcast(network: &IpNet, address: IpAddr) -> bool {
    address == network.network() || address == network.broadcast()
}

/// Iterator over the usable host addresses of a prefix, ascending.
///
/// IPv4 excludes the network and broadcast addresses, except for /31 and
/// /32 where every address is usable. IPv6 excludes the subnet-router
/// anycast (network) address, except for /127 and /128.
#[derive(Debug, Clone)]
pub enum Hosts {
    V4(Ipv4AddrRange),
    V6(Ipv6AddrRange),
}

impl Iterator for Hosts {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        match self {
            Hosts::V4(range) => range.next().map(IpAddr::V4),
            Hosts::V6(range) => range.next().map(IpAddr::V6),
        }
    }
}

/// Enumerates the usable host addresses of `network` in ascending order.
///
/// The iterator is lazy and can be restarted by calling this again.
pub fn hosts(network: &IpNet) -> Hosts {
    match network {
        IpNet::V4(net) => Hosts::V4(net.hosts()),
        IpNet::V6(net) => {
            if net.prefix_len() >= 127 {
                Hosts::V6(net.hosts())
            } else {
                let first = Ipv6Addr::from(u128::from(net.network()) + 1);
                Hosts::V6(Ipv6AddrRange::new(first, net.broadcast()))
            }
        }
    }
}

/// Total ordering key for addresses; IPv4 sorts below IPv6.
pub fn numeric_key(address: IpAddr) -> (u8, u128) {
    match address {
        IpAddr::V4(v4) => (0, u32::from(v4) as u128),
        IpAddr::V6(v6) => (1, u128::from(v6)),
    }
}
