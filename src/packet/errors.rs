use thiserror::Error;

/// Parse/serialize failures at the wire-codec boundary (IPv4, TCP, Ethernet,
/// ARP). These never reach the sender/receiver/connection state machines,
/// which only ever see already-validated values.
#[derive(Error, Debug, PartialEq)]
pub enum HeaderError {
    #[error("buffer too small: expected at least {expected} bytes, found {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("bad checksum in {0} header")]
    BadChecksum(String),

    #[error("unsupported EtherType: {0:#06x}")]
    UnsupportedEtherType(u16),

    #[error("unsupported ARP hardware/protocol combination")]
    UnsupportedArpFormat,
}
