use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

use crate::config;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Addresses of the range in ascending order, both ends included.
    pub fn to_iter(&self) -> impl Iterator<Item = Ipv4Addr> {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn len(&self) -> usize {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        if end < start {
            0
        } else {
            (end - start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The whole network `ip/prefix` belongs to, network and broadcast included.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, ValidationError> {
    let network = Ipv4Network::new(ip, prefix).map_err(|_| ValidationError::Prefix(prefix))?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// The host addresses to probe around `ip`.
///
/// Network and broadcast addresses are stripped; /31 and /32 have nothing to
/// strip and are swept whole.
pub fn sweep_range(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, ValidationError> {
    let prefix = config::validate_prefix(prefix)?;
    let full = cidr_range(ip, prefix)?;
    if prefix >= 31 {
        return Ok(full);
    }

    let start = u32::from(full.start_addr) + 1;
    let end = u32::from(full.end_addr) - 1;
    Ok(Ipv4Range::new(Ipv4Addr::from(start), Ipv4Addr::from(end)))
}
