use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use netdeck_protocols::arp;
use pnet::datalink::DataLinkReceiver;
use tracing::{debug, error, trace};

use crate::registry::HostRegistry;

/// Why a listener thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// The running flag was cleared.
    Stopped,
    /// The capture channel failed while the scan was live.
    Failed(io::ErrorKind),
}

/// Receives frames on the capture channel and records every ARP reply.
///
/// The receiver is owned by a separate pump thread, so the listener itself
/// only ever waits `poll_interval` for the next frame before checking the
/// running flag again. A receiver that blocks forever (a channel opened
/// without a read timeout) therefore cannot hold up [`ReplyListener::run`];
/// the pump is left behind and exits on its next frame or error.
pub struct ReplyListener {
    rx: Box<dyn DataLinkReceiver>,
    running: Arc<AtomicBool>,
    registry: Arc<HostRegistry>,
    poll_interval: Duration,
}

impl ReplyListener {
    pub fn new(
        rx: Box<dyn DataLinkReceiver>,
        running: Arc<AtomicBool>,
        registry: Arc<HostRegistry>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            rx,
            running,
            registry,
            poll_interval,
        }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<ListenerExit>> {
        thread::Builder::new()
            .name("reply-listener".to_string())
            .spawn(move || self.run())
    }

    pub fn run(self) -> ListenerExit {
        let (feed, frames) = mpsc::channel();
        let rx = self.rx;
        let pump_running = Arc::clone(&self.running);
        if let Err(e) = thread::Builder::new()
            .name("frame-pump".to_string())
            .spawn(move || pump(rx, pump_running, feed))
        {
            error!("Could not start the frame pump: {e}");
            self.running.store(false, Ordering::SeqCst);
            return ListenerExit::Failed(e.kind());
        }

        loop {
            match frames.recv_timeout(self.poll_interval) {
                Ok(Ok(frame)) => record_reply(&frame, &self.registry),
                Ok(Err(_)) if !self.running.load(Ordering::SeqCst) => break,
                Ok(Err(e)) => {
                    error!("Reply listener stopped: {e}");
                    self.running.store(false, Ordering::SeqCst);
                    return ListenerExit::Failed(e.kind());
                }
                Err(RecvTimeoutError::Timeout) if self.running.load(Ordering::SeqCst) => {}
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        ListenerExit::Stopped
    }
}

/// Moves frames from the receiver to the listener until the flag is
/// cleared, the listener is gone, or the receiver fails.
fn pump(
    mut rx: Box<dyn DataLinkReceiver>,
    running: Arc<AtomicBool>,
    feed: Sender<io::Result<Vec<u8>>>,
) {
    while running.load(Ordering::SeqCst) {
        let item = match rx.next() {
            Ok(frame) => Ok(frame.to_vec()),
            Err(e) if is_transient(&e) => continue,
            Err(e) => Err(e),
        };
        let fatal = item.is_err();
        if feed.send(item).is_err() || fatal {
            break;
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn record_reply(frame: &[u8], registry: &HostRegistry) {
    let Some(reply) = arp::parse_reply(frame) else {
        trace!(len = frame.len(), "ignored frame");
        return;
    };
    if registry.insert(reply.sender_ip, reply.sender_mac) {
        debug!("{} is at {}", reply.sender_ip, reply.sender_mac);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;

    use pnet::packet::arp::{ArpHardwareTypes, ArpOperation, ArpOperations, MutableArpPacket};
    use pnet::packet::ethernet::{EtherType, EtherTypes, MutableEthernetPacket};
    use pnet::util::MacAddr;

    const POLL: Duration = Duration::from_millis(5);

    /// Plays back a fixed script of receive results, then reports a closed channel.
    struct ScriptedReceiver {
        script: VecDeque<io::Result<Vec<u8>>>,
        current: Vec<u8>,
        running: Arc<AtomicBool>,
    }

    impl DataLinkReceiver for ScriptedReceiver {
        fn next(&mut self) -> io::Result<&[u8]> {
            match self.script.pop_front() {
                Some(Ok(frame)) => {
                    self.current = frame;
                    Ok(&self.current)
                }
                Some(Err(e)) => Err(e),
                None => {
                    self.running.store(false, Ordering::SeqCst);
                    Err(io::Error::new(io::ErrorKind::TimedOut, "script finished"))
                }
            }
        }
    }

    fn frame(ethertype: EtherType, operation: ArpOperation, ip: Ipv4Addr, mac: MacAddr) -> Vec<u8> {
        let mut buffer = vec![0u8; 42];
        {
            let mut eth = MutableEthernetPacket::new(&mut buffer).unwrap();
            eth.set_destination(MacAddr::broadcast());
            eth.set_source(mac);
            eth.set_ethertype(ethertype);
        }
        let mut arp = MutableArpPacket::new(&mut buffer[14..]).unwrap();
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(6);
        arp.set_proto_addr_len(4);
        arp.set_operation(operation);
        arp.set_sender_hw_addr(mac);
        arp.set_sender_proto_addr(ip);
        buffer
    }

    fn listen(script: Vec<io::Result<Vec<u8>>>) -> (ListenerExit, Arc<HostRegistry>) {
        let running = Arc::new(AtomicBool::new(true));
        let registry = Arc::new(HostRegistry::new());
        let rx = ScriptedReceiver {
            script: script.into(),
            current: Vec::new(),
            running: Arc::clone(&running),
        };
        let exit = ReplyListener::new(Box::new(rx), running, Arc::clone(&registry), POLL).run();
        (exit, registry)
    }

    #[test]
    fn only_arp_replies_are_recorded() {
        let mac = MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff);
        let ip = Ipv4Addr::new(10, 0, 0, 5);
        let (exit, registry) = listen(vec![
            Ok(frame(EtherTypes::Ipv4, ArpOperations::Reply, Ipv4Addr::new(10, 0, 0, 6), mac)),
            Ok(frame(EtherTypes::Arp, ArpOperations::Request, Ipv4Addr::new(10, 0, 0, 7), mac)),
            Ok(vec![0u8; 3]),
            Ok(frame(EtherTypes::Arp, ArpOperations::Reply, ip, mac)),
            Ok(frame(EtherTypes::Arp, ArpOperations::Reply, ip, mac)),
        ]);

        assert_eq!(exit, ListenerExit::Stopped);
        let hosts = registry.snapshot();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].to_string(), "10.0.0.5 AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn transient_errors_keep_listening() {
        let mac = MacAddr::new(0, 1, 2, 3, 4, 5);
        let (exit, registry) = listen(vec![
            Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
            Err(io::Error::new(io::ErrorKind::WouldBlock, "again")),
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(frame(EtherTypes::Arp, ArpOperations::Reply, Ipv4Addr::new(10, 0, 0, 1), mac)),
        ]);
        assert_eq!(exit, ListenerExit::Stopped);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn fatal_error_clears_the_running_flag() {
        let running = Arc::new(AtomicBool::new(true));
        let rx = ScriptedReceiver {
            script: vec![Err(io::Error::other("link went away"))].into(),
            current: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
        };
        let exit = ReplyListener::new(
            Box::new(rx),
            Arc::clone(&running),
            Arc::new(HostRegistry::new()),
            POLL,
        )
        .run();

        assert_eq!(exit, ListenerExit::Failed(io::ErrorKind::Other));
        assert!(!running.load(Ordering::SeqCst));
    }

    #[test]
    fn cleared_flag_ends_the_loop_before_any_receive() {
        let running = Arc::new(AtomicBool::new(false));
        let rx = ScriptedReceiver {
            script: vec![Err(io::Error::other("never read"))].into(),
            current: Vec::new(),
            running: Arc::clone(&running),
        };
        let exit =
            ReplyListener::new(Box::new(rx), running, Arc::new(HostRegistry::new()), POLL).run();
        assert_eq!(exit, ListenerExit::Stopped);
    }
}
