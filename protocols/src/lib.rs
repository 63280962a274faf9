//! Frame codecs for link-layer host discovery.
//!
//! * [`ethernet`]: the Ethernet II header that carries every probe.
//! * [`arp`]: ARP requests for sweeping a subnet and the reply filter used by
//!   the listener.

pub mod arp;
pub mod ethernet;

use pnet::packet::ethernet::EtherType;
use thiserror::Error;

/// Minimum Ethernet frame length without the frame check sequence.
pub const MIN_ETH_FRAME_NO_FCS: usize = 60;
pub const ETH_HDR_LEN: usize = 14;
pub const ARP_LEN: usize = 28;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("buffer too small for an ethernet header")]
    EthernetBuffer,

    #[error("buffer too small for an ARP payload")]
    ArpBuffer,

    #[error("truncated frame ({0} bytes)")]
    Truncated(usize),

    /// Normal traffic noise: the frame does not carry ARP.
    #[error("not an ARP frame (ethertype {0:?})")]
    ProtocolMismatch(EtherType),

    #[error("ARP operation is not a reply")]
    NotReply,
}
