use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;
use tracing::debug;

use crate::error::ScanError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    IsLoopback,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP).
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no IPv4 address outside of 127.0.0.0/8.
    NoIpv4,
}

/// Everything a sweep needs to know about the local end of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEndpoint {
    pub name: String,
    pub mac: MacAddr,
    pub ipv4: Ipv4Network,
}

impl LinkEndpoint {
    pub fn ip(&self) -> Ipv4Addr {
        self.ipv4.ip()
    }
}

/// Picks the interface to scan on and describes its local end.
///
/// With a `name` only that interface is considered; otherwise the best LAN
/// candidate is chosen (wired before wireless, then the first viable one).
pub fn resolve(name: Option<&str>) -> Result<(NetworkInterface, LinkEndpoint), ScanError> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    debug!("Identified {} network interface(s)", interfaces.len());
    resolve_from(interfaces, name, is_wired)
}

fn resolve_from(
    interfaces: Vec<NetworkInterface>,
    name: Option<&str>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Result<(NetworkInterface, LinkEndpoint), ScanError> {
    let interface: NetworkInterface = match name {
        Some(name) => {
            let interface = interfaces
                .into_iter()
                .find(|interface| interface.name == name)
                .ok_or_else(|| ScanError::Interface(format!("interface {name} does not exist")))?;
            is_viable_lan_interface(&interface).map_err(|reason| {
                ScanError::Interface(format!("{name} cannot be scanned: {reason:?}"))
            })?;
            interface
        }
        None => {
            let candidates: Vec<NetworkInterface> = interfaces
                .into_iter()
                .filter(|interface| is_viable_lan_interface(interface).is_ok())
                .collect();
            select_best_lan_interface(candidates, is_wired).ok_or_else(|| {
                ScanError::Interface("no interfaces available for LAN discovery".to_string())
            })?
        }
    };

    let endpoint = to_endpoint(&interface)?;
    debug!(
        "Selected {} ({} / {})",
        endpoint.name, endpoint.ipv4, endpoint.mac
    );
    Ok((interface, endpoint))
}

/// First IPv4 network on the interface that is not a loopback address.
pub fn local_ipv4(interface: &NetworkInterface) -> Option<Ipv4Network> {
    interface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) if !v4.ip().is_loopback() => Some(*v4),
        _ => None,
    })
}

fn to_endpoint(interface: &NetworkInterface) -> Result<LinkEndpoint, ScanError> {
    let mac = interface
        .mac
        .filter(|mac| *mac != MacAddr::zero())
        .ok_or_else(|| ScanError::Interface(format!("{} has no MAC address", interface.name)))?;
    let ipv4 = local_ipv4(interface).ok_or_else(|| {
        ScanError::Interface(format!("{} has no non-loopback IPv4 address", interface.name))
    })?;

    Ok(LinkEndpoint {
        name: interface.name.clone(),
        mac,
        ipv4,
    })
}

fn is_viable_lan_interface(interface: &NetworkInterface) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() {
        return Err(ViabilityError::IsLoopback);
    }
    if interface.mac.is_none_or(|mac| mac == MacAddr::zero()) {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    if local_ipv4(interface).is_none() {
        return Err(ViabilityError::NoIpv4);
    }

    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    match interfaces.len() {
        0 => None,
        1 => interfaces.into_iter().next(),
        _ => {
            let wired = interfaces.iter().position(&is_wired).unwrap_or(0);
            interfaces.into_iter().nth(wired)
        }
    }
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
fn is_physical(interface: &NetworkInterface) -> bool {
    std::path::Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
}

#[cfg(target_os = "linux")]
fn is_wireless(interface: &NetworkInterface) -> bool {
    std::path::Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
}

// Without sysfs, fall back to the usual naming convention for wired ports.
#[cfg(not(target_os = "linux"))]
fn is_physical(interface: &NetworkInterface) -> bool {
    interface.name.starts_with("en") || interface.name.starts_with("eth")
}

#[cfg(not(target_os = "linux"))]
fn is_wireless(_interface: &NetworkInterface) -> bool {
    false
}
