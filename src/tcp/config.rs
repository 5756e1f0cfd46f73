/// Tunables shared by a `TCPSender`/`TCPReceiver` pair inside one `TCPConnection`.
#[derive(Debug, Clone, Copy)]
pub struct TcpConfig {
    /// Capacity of each direction's `ByteStream`, in bytes.
    pub capacity: usize,
    /// Initial retransmission timeout, in milliseconds.
    pub initial_rto_ms: u64,
    /// Consecutive retransmissions after which the connection gives up and resets.
    pub max_retx_attempts: usize,
    /// Fixed initial sequence number, mainly for deterministic tests. `None` picks one at random.
    pub fixed_isn: Option<u32>,
    /// Maximum bytes of payload per outgoing segment.
    pub mss: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            capacity: 64000,
            initial_rto_ms: 1000,
            max_retx_attempts: 8,
            fixed_isn: None,
            mss: 1452,
        }
    }
}
