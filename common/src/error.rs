//! Error taxonomy shared by the process supervisor and the subnet scanner.
//!
//! Construction-time failures (`start` on either component) are returned to
//! the caller and never retried here. Steady-state faults only end the
//! component instance they happened in.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be located or executed.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The output channel could not be allocated or configured.
    #[error("failed to set up output channel: {0}")]
    Resource(#[source] io::Error),

    /// The supervisor already owns a live process.
    #[error("process {pid} is still running, stop it first")]
    AlreadyRunning { pid: u32 },

    /// Reading the output channel failed with something other than "would block".
    #[error("failed to read process output: {0}")]
    ReadFault(#[source] io::Error),

    #[error("failed to reap process {pid}: {source}")]
    Reap {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// No interface with a usable (non-loopback) IPv4 address.
    #[error("no usable interface: {0}")]
    Interface(String),

    #[error("permission denied opening a raw socket on {interface} (try running as root): {source}")]
    Permission {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open capture channel on {interface}: {source}")]
    Resource {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ScanError {
    /// Sorts a channel-opening failure into permission and resource errors.
    pub fn from_channel_error(interface: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::Permission {
                interface: interface.to_string(),
                source,
            },
            _ => Self::Resource {
                interface: interface.to_string(),
                source,
            },
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ValidationError {
    #[error("expected 4 octets, got {0}")]
    OctetCount(usize),

    #[error("octet {index} is out of range: {value}")]
    OctetOutOfRange { index: usize, value: i64 },

    #[error("octet index {0} is out of range (0..=3)")]
    OctetIndex(usize),

    #[error("prefix /{0} is outside the supported range /16../32")]
    Prefix(u8),
}
