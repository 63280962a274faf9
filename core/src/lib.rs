//! Process supervision and local subnet discovery.
//!
//! [`process`] runs external diagnostic tools and collects their output
//! without blocking the caller. [`scanner`] sweeps the local subnet with ARP
//! requests and publishes the hosts that answer to a [`registry`].

#[cfg(unix)]
pub mod process;
pub mod registry;
pub mod scanner;
