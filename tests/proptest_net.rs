use std::net::{IpAddr, Ipv4Addr};

use ipnet::{IpNet, Ipv4Net};
use proptest::prelude::*;

use ipamd::net;

/// Masks random bits down to a valid network base for the prefix length.
fn network_for(bits: u32, prefix_len: u8) -> IpNet {
    let mask = if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_len)
    };
    let base = Ipv4Addr::from(bits & mask);
    IpNet::V4(Ipv4Net::new(base, prefix_len).expect("valid prefix length"))
}

proptest! {
    #[test]
    fn parse_never_panics_on_arbitrary_text(text: String) {
        let _ = net::parse_network(&text);
        let _ = net::parse_address(&text);
    }

    #[test]
    fn host_count_matches_prefix_size(bits in any::<u32>(), prefix_len in 22u8..=30) {
        let network = network_for(bits, prefix_len);
        let expected = (1u32 << (32 - prefix_len)) - 2;
        prop_assert_eq!(net::hosts(&network).count(), expected as usize);
    }

    #[test]
    fn hosts_are_ascending_members_excluding_boundaries(
        bits in any::<u32>(),
        prefix_len in 24u8..=30,
    ) {
        let network = network_for(bits, prefix_len);
        let mut previous: Option<IpAddr> = None;
        for host in net::hosts(&network) {
            prop_assert!(net::contains(&network, host));
            prop_assert!(!net::is_network_or_broadcast(&network, host));
            if let Some(previous) = previous {
                prop_assert!(net::numeric_key(previous) < net::numeric_key(host));
            }
            previous = Some(host);
        }
    }

    #[test]
    fn parse_roundtrips_display(bits in any::<u32>(), prefix_len in 0u8..=32) {
        let network = network_for(bits, prefix_len);
        let reparsed = net::parse_network(&network.to_string()).unwrap();
        prop_assert_eq!(reparsed, network);
    }

    #[test]
    fn address_parse_roundtrips_display(bits in any::<u32>()) {
        let address = IpAddr::V4(Ipv4Addr::from(bits));
        let reparsed = net::parse_address(&address.to_string()).unwrap();
        prop_assert_eq!(reparsed, address);
    }

    #[test]
    fn host_bits_below_prefix_are_rejected(bits in any::<u32>(), prefix_len in 1u8..=31) {
        let mask = u32::MAX << (32 - prefix_len);
        // Bit 0 is a host bit for any prefix shorter than /32
        let addr = Ipv4Addr::from((bits & mask) | 1);
        let text = format!("{}/{}", addr, prefix_len);
        prop_assert!(net::parse_network(&text).is_err());
    }
}
