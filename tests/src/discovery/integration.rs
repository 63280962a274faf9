#![cfg(test)]
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use netdeck_common::config::ScanConfig;
use netdeck_common::network::host::DiscoveredHost;
use netdeck_core::registry::HostRegistry;
use netdeck_core::scanner::SubnetScanner;
use netdeck_protocols::arp;
use pnet::packet::ethernet::{EtherTypes, MutableEthernetPacket};

use crate::utils::{self, SimulatedLan};

/// A full sweep of a simulated /24 finds exactly the hosts that exist on it,
/// in the order they answered.
#[test]
fn sweep_discovers_every_host_on_the_link() {
    let local = Ipv4Addr::new(10, 0, 0, 100);
    let hosts = [
        (Ipv4Addr::new(10, 0, 0, 1), utils::mac(1)),
        (Ipv4Addr::new(10, 0, 0, 5), utils::mac(5)),
        (Ipv4Addr::new(10, 0, 0, 254), utils::mac(254)),
    ];
    let (rx, feed) = utils::feed_receiver();
    let lan = SimulatedLan::new(&hosts, feed);
    let probes = Arc::clone(&lan.probes);

    let mut scanner = SubnetScanner::new(ScanConfig::default());
    let report = scanner
        .start_with_channel(&utils::endpoint("10.0.0.100/24"), Box::new(lan), rx)
        .unwrap()
        .unwrap();
    assert_eq!(report.local, local);
    assert_eq!(probes.lock().unwrap().len(), 254);

    let registry = scanner.registry();
    assert!(utils::wait_until(|| registry.len() == hosts.len()));
    scanner.stop();

    let found: Vec<(Ipv4Addr, usize)> = scanner
        .snapshot()
        .iter()
        .map(|host| (host.ip, host.order))
        .collect();
    assert_eq!(
        found,
        vec![
            (Ipv4Addr::new(10, 0, 0, 1), 0),
            (Ipv4Addr::new(10, 0, 0, 5), 1),
            (Ipv4Addr::new(10, 0, 0, 254), 2),
        ]
    );
    assert_eq!(
        scanner.snapshot()[1].to_string(),
        "10.0.0.5 AA:BB:CC:DD:EE:05"
    );
}

#[test]
fn a_second_sweep_starts_from_an_empty_registry() {
    let endpoint = utils::endpoint("192.168.7.20/28");
    let mut scanner = SubnetScanner::new(ScanConfig::default().with_prefix(28).unwrap());

    let (rx, feed) = utils::feed_receiver();
    let lan = SimulatedLan::new(&[(Ipv4Addr::new(192, 168, 7, 17), utils::mac(17))], feed);
    scanner.start_with_channel(&endpoint, Box::new(lan), rx).unwrap();
    let registry = scanner.registry();
    assert!(utils::wait_until(|| registry.len() == 1));
    scanner.stop();

    let (rx, feed) = utils::feed_receiver();
    let lan = SimulatedLan::new(&[(Ipv4Addr::new(192, 168, 7, 30), utils::mac(30))], feed);
    let probes = Arc::clone(&lan.probes);
    scanner.start_with_channel(&endpoint, Box::new(lan), rx).unwrap();
    assert!(utils::wait_until(|| registry.len() == 1));
    scanner.stop();

    assert_eq!(scanner.snapshot()[0].ip, Ipv4Addr::new(192, 168, 7, 30));
    // 192.168.7.16/28 without network and broadcast.
    let probes = probes.lock().unwrap();
    assert_eq!(probes.first(), Some(&Ipv4Addr::new(192, 168, 7, 17)));
    assert_eq!(probes.last(), Some(&Ipv4Addr::new(192, 168, 7, 30)));
    assert_eq!(probes.len(), 14);
}

#[test]
fn nothing_is_recorded_after_stop_returns() {
    let mut scanner = SubnetScanner::new(ScanConfig::default());
    let (rx, feed) = utils::feed_receiver();
    let (_unused_rx, silent_feed) = utils::feed_receiver();
    let lan = SimulatedLan::new(&[], silent_feed);
    scanner
        .start_with_channel(&utils::endpoint("10.1.0.1/16"), Box::new(lan), rx)
        .unwrap();

    let flood = thread::spawn(move || {
        let local = Ipv4Addr::new(10, 1, 0, 1);
        for n in 2u32.. {
            let ip = Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 1, 0, 0)) + n);
            if feed.send(Ok(utils::reply_frame(ip, utils::mac(9), local))).is_err() {
                break;
            }
            thread::sleep(Duration::from_micros(100));
        }
    });

    let registry = scanner.registry();
    assert!(utils::wait_until(|| registry.len() >= 20));
    scanner.stop();
    let frozen = registry.snapshot();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(registry.snapshot(), frozen);
    assert!(!scanner.is_running());
    flood.join().unwrap();
}

#[test]
fn registry_takes_concurrent_writers_alongside_the_listener() {
    let mut scanner = SubnetScanner::new(ScanConfig::default());
    let (rx, feed) = utils::feed_receiver();
    let lan = SimulatedLan::new(&[(Ipv4Addr::new(10, 0, 0, 2), utils::mac(2))], feed);
    scanner
        .start_with_channel(&utils::endpoint("10.0.0.100/24"), Box::new(lan), rx)
        .unwrap();

    let writers: Vec<_> = [3u8, 4]
        .into_iter()
        .map(|last| {
            let registry: Arc<HostRegistry> = scanner.registry();
            thread::spawn(move || registry.insert(Ipv4Addr::new(10, 0, 0, last), utils::mac(last)))
        })
        .collect();
    for writer in writers {
        assert!(writer.join().unwrap());
    }

    let registry = scanner.registry();
    assert!(utils::wait_until(|| registry.len() == 3));
    scanner.stop();

    let mut ips: Vec<u8> = scanner.snapshot().iter().map(|host| host.ip.octets()[3]).collect();
    ips.sort_unstable();
    assert_eq!(ips, vec![2, 3, 4]);
}

#[test]
fn reply_codec_round_trip() {
    let ip = Ipv4Addr::new(10, 0, 0, 5);
    let mac = pnet::util::MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff);
    let frame = utils::reply_frame(ip, mac, Ipv4Addr::new(10, 0, 0, 1));

    let reply = arp::decode_reply(&frame).unwrap();
    let host = DiscoveredHost::new(reply.sender_ip, reply.sender_mac, 0);
    assert_eq!(host.to_string(), "10.0.0.5 AA:BB:CC:DD:EE:FF");

    let mut wrong = frame.clone();
    MutableEthernetPacket::new(&mut wrong)
        .unwrap()
        .set_ethertype(EtherTypes::Ipv4);
    assert!(arp::parse_reply(&wrong).is_none());

    let request = arp::create_request(mac, ip, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
    assert!(arp::parse_reply(&request).is_none());
}
