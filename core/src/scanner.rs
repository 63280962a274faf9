//! ARP discovery of the hosts on the local subnet.
//!
//! A [`SubnetScanner`] opens a datalink channel on one interface, starts a
//! [`ReplyListener`] thread on its receiving half and then sends one ARP
//! request per host address of the configured subnet. Replies land in a
//! shared [`HostRegistry`] that the caller reads while the scan runs.
//!
//! Opening raw Layer 2 channels requires **root privileges** (or
//! `CAP_NET_RAW`) on most systems.

use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use netdeck_common::config::{ScanConfig, validate_prefix};
use netdeck_common::error::ScanError;
use netdeck_common::network::host::DiscoveredHost;
use netdeck_common::network::interface::{self, LinkEndpoint};
use netdeck_common::network::range::{Ipv4Range, sweep_range};
use netdeck_protocols::arp;
use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use tracing::{debug, error, warn};

use crate::registry::HostRegistry;

mod listener;

pub use listener::{ListenerExit, ReplyListener};

/// What the request sweep of one `start` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub interface: String,
    pub local: Ipv4Addr,
    /// Requests handed to the channel.
    pub probed: usize,
    /// Requests the channel refused; they are not retried.
    pub failed: usize,
}

struct ScanSession {
    running: Arc<AtomicBool>,
    listener: JoinHandle<ListenerExit>,
    // Kept so the whole channel lives exactly as long as the session.
    _tx: Box<dyn DataLinkSender>,
}

pub struct SubnetScanner {
    config: ScanConfig,
    registry: Arc<HostRegistry>,
    session: Option<ScanSession>,
}

impl SubnetScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            registry: Arc::new(HostRegistry::new()),
            session: None,
        }
    }

    /// Resolves the interface, opens a capture channel on it and starts a sweep.
    ///
    /// Returns `Ok(None)` when a scan is already running. Every error leaves
    /// the scanner idle.
    pub fn start(&mut self) -> Result<Option<SweepReport>, ScanError> {
        if self.is_running() {
            debug!("Scan already running, ignoring start");
            return Ok(None);
        }
        validate_prefix(self.config.prefix)?;

        let (interface, endpoint) = interface::resolve(self.config.interface.as_deref())?;
        let (tx, rx) = open_channel(&interface, &self.config, datalink::channel)?;
        self.start_with_channel(&endpoint, tx, rx)
    }

    /// Starts a sweep on a channel the caller already opened.
    pub fn start_with_channel(
        &mut self,
        endpoint: &LinkEndpoint,
        mut tx: Box<dyn DataLinkSender>,
        rx: Box<dyn DataLinkReceiver>,
    ) -> Result<Option<SweepReport>, ScanError> {
        if self.is_running() {
            debug!("Scan already running, ignoring start");
            return Ok(None);
        }
        // A session whose listener died on its own still has to be joined.
        self.stop();

        let targets = sweep_range(endpoint.ip(), self.config.prefix)?;
        self.registry.reset();

        let running = Arc::new(AtomicBool::new(true));
        let listener = ReplyListener::new(
            rx,
            Arc::clone(&running),
            Arc::clone(&self.registry),
            self.config.read_timeout,
        )
        .spawn()
        .map_err(|source| ScanError::Resource {
            interface: endpoint.name.clone(),
            source,
        })?;

        let report = send_requests(endpoint, &targets, tx.as_mut());
        debug!(
            "Sent {} ARP request(s) on {} ({} failed)",
            report.probed, report.interface, report.failed
        );

        self.session = Some(ScanSession {
            running,
            listener,
            _tx: tx,
        });
        Ok(Some(report))
    }

    /// Ends the scan and waits for the listener thread.
    ///
    /// Once this returns the registry is no longer written to. Stopping an
    /// idle scanner does nothing.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.running.store(false, Ordering::SeqCst);
        match session.listener.join() {
            Ok(exit) => debug!("Reply listener finished: {exit:?}"),
            Err(_) => error!("Reply listener panicked"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.running.load(Ordering::SeqCst))
    }

    pub fn registry(&self) -> Arc<HostRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn snapshot(&self) -> Vec<DiscoveredHost> {
        self.registry.snapshot()
    }
}

impl Drop for SubnetScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn channel_config(config: &ScanConfig) -> datalink::Config {
    datalink::Config {
        read_timeout: Some(config.read_timeout),
        promiscuous: false,
        ..Default::default()
    }
}

/// Opens an Ethernet channel through `channel_opener`.
///
/// The channel always gets the scan's read timeout and is never promiscuous.
pub fn open_channel<F>(
    interface: &NetworkInterface,
    config: &ScanConfig,
    channel_opener: F,
) -> Result<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>), ScanError>
where
    F: FnOnce(&NetworkInterface, datalink::Config) -> io::Result<Channel>,
{
    let channel = channel_opener(interface, channel_config(config))
        .map_err(|e| ScanError::from_channel_error(&interface.name, e))?;
    match channel {
        Channel::Ethernet(tx, rx) => {
            debug!("Opened capture channel on {}", interface.name);
            Ok((tx, rx))
        }
        _ => Err(ScanError::Resource {
            interface: interface.name.clone(),
            source: io::Error::new(io::ErrorKind::Unsupported, "non-ethernet channel"),
        }),
    }
}

fn send_requests(
    endpoint: &LinkEndpoint,
    targets: &Ipv4Range,
    tx: &mut dyn DataLinkSender,
) -> SweepReport {
    let mut report = SweepReport {
        interface: endpoint.name.clone(),
        local: endpoint.ip(),
        probed: 0,
        failed: 0,
    };

    for target in targets.to_iter() {
        report.probed += 1;
        let frame = match arp::create_request(endpoint.mac, endpoint.ip(), target) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping {target}: {e}");
                report.failed += 1;
                continue;
            }
        };
        match tx.send_to(&frame, None) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                warn!("Failed to send ARP request to {target}: {e}");
                report.failed += 1;
            }
            None => {
                warn!("Channel refused ARP request to {target}");
                report.failed += 1;
            }
        }
    }
    report
}
