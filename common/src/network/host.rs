use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use crate::network::mac;

/// A host that answered an ARP request during a sweep.
///
/// Hosts are never mutated after they are recorded; `order` is the position
/// at which the host was first seen and stays stable for paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveredHost {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub order: usize,
}

impl DiscoveredHost {
    pub fn new(ip: Ipv4Addr, mac: MacAddr, order: usize) -> Self {
        Self { ip, mac, order }
    }

    pub fn mac_string(&self) -> String {
        mac::to_colon_hex(self.mac)
    }
}

impl fmt::Display for DiscoveredHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ip, self.mac_string())
    }
}
