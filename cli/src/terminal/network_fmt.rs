use colored::*;
use netdeck_common::network::host::DiscoveredHost;
use netdeck_common::network::interface::LinkEndpoint;
use netdeck_common::network::mac;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;

use crate::terminal::{colors, print};

fn ipv6_kind(network: &pnet::ipnetwork::Ipv6Network) -> &'static str {
    let ip = network.ip();
    let first_byte = ip.octets()[0];
    if (0x20..=0x3f).contains(&first_byte) {
        "GUA"
    } else if ip.is_unique_local() {
        "ULA"
    } else if ip.is_unicast_link_local() {
        "LLA"
    } else {
        "IPv6"
    }
}

pub fn to_key_value_pair_net(ip_net: &[IpNetwork]) -> Vec<(String, ColoredString)> {
    ip_net
        .iter()
        .map(|ip_network| match ip_network {
            IpNetwork::V4(ipv4_network) => {
                let address: ColoredString = ipv4_network.ip().to_string().color(colors::IPV4_ADDR);
                let prefix: ColoredString =
                    ipv4_network.prefix().to_string().color(colors::IPV4_PREFIX);
                let result: ColoredString = format!("{address}/{prefix}").color(colors::SEPARATOR);
                ("IPv4".to_string(), result)
            }
            IpNetwork::V6(ipv6_network) => {
                let address: ColoredString = ipv6_network.ip().to_string().color(colors::IPV6_ADDR);
                let prefix: ColoredString =
                    ipv6_network.prefix().to_string().color(colors::IPV6_PREFIX);
                let value: ColoredString = format!("{address}/{prefix}").color(colors::SEPARATOR);
                (ipv6_kind(ipv6_network).to_string(), value)
            }
        })
        .collect()
}

pub fn print_interface(interface: &NetworkInterface, endpoint: &LinkEndpoint, idx: usize) {
    print::tree_head(idx, &interface.name);
    let mut key_value_pair: Vec<(String, ColoredString)> = to_key_value_pair_net(&interface.ips);
    key_value_pair.push((
        "MAC".to_string(),
        mac::to_colon_hex(endpoint.mac).color(colors::MAC_ADDR),
    ));
    key_value_pair.push((
        "Sweep".to_string(),
        endpoint.ip().to_string().color(colors::IPV4_ADDR),
    ));
    print::as_tree_one_level(key_value_pair);
}

pub fn print_host(host: &DiscoveredHost) {
    print::tree_head(host.order, &host.ip.to_string());
    print::as_tree_one_level(vec![(
        "MAC".to_string(),
        host.mac_string().color(colors::MAC_ADDR),
    )]);
}

/// The one-line form printed while a scan is still running.
pub fn host_line(host: &DiscoveredHost) -> String {
    format!(
        "{} {}",
        host.ip.to_string().color(colors::IPV4_ADDR),
        host.mac_string().color(colors::MAC_ADDR)
    )
}
