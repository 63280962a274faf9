#![cfg(test)]

use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use netdeck_common::network::interface::LinkEndpoint;
use netdeck_protocols::arp;
use pnet::datalink::{DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet::packet::arp::{ArpOperations, MutableArpPacket};
use pnet::packet::ethernet::MutableEthernetPacket;
use pnet::util::MacAddr;

pub const LOCAL_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);

pub type Feed = Sender<io::Result<Vec<u8>>>;

pub fn endpoint(cidr: &str) -> LinkEndpoint {
    LinkEndpoint {
        name: "sim0".to_string(),
        mac: LOCAL_MAC,
        ipv4: cidr.parse().unwrap(),
    }
}

/// An ARP reply from `ip`/`mac` addressed to the local endpoint.
pub fn reply_frame(ip: Ipv4Addr, mac: MacAddr, to: Ipv4Addr) -> Vec<u8> {
    let mut frame = arp::create_request(mac, ip, to).unwrap();
    MutableEthernetPacket::new(&mut frame)
        .unwrap()
        .set_destination(LOCAL_MAC);
    let mut packet = MutableArpPacket::new(&mut frame[14..42]).unwrap();
    packet.set_operation(ArpOperations::Reply);
    packet.set_target_hw_addr(LOCAL_MAC);
    frame
}

pub fn mac(last: u8) -> MacAddr {
    MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, last)
}

pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Receiving half of a simulated link, fed frame by frame through a channel.
pub struct FeedReceiver {
    frames: mpsc::Receiver<io::Result<Vec<u8>>>,
    current: Vec<u8>,
}

pub fn feed_receiver() -> (Box<dyn DataLinkReceiver>, Feed) {
    let (feed, frames) = mpsc::channel();
    let rx = FeedReceiver {
        frames,
        current: Vec::new(),
    };
    (Box::new(rx), feed)
}

impl DataLinkReceiver for FeedReceiver {
    fn next(&mut self) -> io::Result<&[u8]> {
        match self.frames.recv_timeout(Duration::from_millis(5)) {
            Ok(Ok(frame)) => {
                self.current = frame;
                Ok(&self.current)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "no frame")),
        }
    }
}

/// Sending half of a simulated link: every host that owns a probed address
/// answers right away through the receiver's feed.
pub struct SimulatedLan {
    hosts: HashMap<Ipv4Addr, MacAddr>,
    feed: Feed,
    pub probes: Arc<Mutex<Vec<Ipv4Addr>>>,
}

impl SimulatedLan {
    pub fn new(hosts: &[(Ipv4Addr, MacAddr)], feed: Feed) -> Self {
        Self {
            hosts: hosts.iter().copied().collect(),
            feed,
            probes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DataLinkSender for SimulatedLan {
    fn build_and_send(
        &mut self,
        _num_packets: usize,
        _packet_size: usize,
        _func: &mut dyn for<'a> FnMut(&'a mut [u8]),
    ) -> Option<io::Result<()>> {
        Some(Ok(()))
    }

    fn send_to(&mut self, packet: &[u8], _dst: Option<NetworkInterface>) -> Option<io::Result<()>> {
        let request = pnet::packet::arp::ArpPacket::new(&packet[14..])?;
        let target = request.get_target_proto_addr();
        let asker = request.get_sender_proto_addr();
        self.probes.lock().unwrap().push(target);

        if let Some(mac) = self.hosts.get(&target) {
            let _ = self.feed.send(Ok(reply_frame(target, *mac, asker)));
        }
        Some(Ok(()))
    }
}
