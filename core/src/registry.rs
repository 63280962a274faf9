//! Thread-safe record of the hosts found by a sweep.
//!
//! The reply listener writes from its own thread while the console reads
//! snapshots on every tick. Each call holds the lock for its own duration
//! only and readers always get an owned copy.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use netdeck_common::network::host::DiscoveredHost;
use pnet::util::MacAddr;

#[derive(Debug, Default)]
struct Entries {
    hosts: Vec<DiscoveredHost>,
    seen: HashSet<(Ipv4Addr, MacAddr)>,
}

#[derive(Debug, Default)]
pub struct HostRegistry {
    entries: Mutex<Entries>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a host unless the same (ip, mac) pair is already known.
    ///
    /// Returns `true` for a new host. Known hosts keep their first-seen order.
    pub fn insert(&self, ip: Ipv4Addr, mac: MacAddr) -> bool {
        let mut entries = self.lock();
        if !entries.seen.insert((ip, mac)) {
            return false;
        }
        let order = entries.hosts.len();
        entries.hosts.push(DiscoveredHost::new(ip, mac, order));
        true
    }

    /// All hosts in the order they were first seen.
    pub fn snapshot(&self) -> Vec<DiscoveredHost> {
        self.lock().hosts.clone()
    }

    /// At most `count` hosts starting at `offset`; empty past the end.
    pub fn page(&self, offset: usize, count: usize) -> Vec<DiscoveredHost> {
        self.lock()
            .hosts
            .iter()
            .skip(offset)
            .take(count)
            .copied()
            .collect()
    }

    pub fn reset(&self) {
        let mut entries = self.lock();
        entries.hosts.clear();
        entries.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().hosts.is_empty()
    }

    // Entries are written whole under the lock, so a panic elsewhere cannot
    // leave them half-updated.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
