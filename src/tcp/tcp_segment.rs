use crate::tcp::wrap32::Wrap32;

/// The abstract TCP segment passed between `TCPSender`/`TCPReceiver`/
/// `TCPConnection` and the outside world. Distinct from [`crate::tcp::tcp_header::TcpHeader`],
/// which is the wire-format codec: this type carries only what the state
/// machines need, with no options and no checksum bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment {
    pub seqno: Wrap32,
    pub ackno: Option<Wrap32>,
    pub win: u16,
    pub syn: bool,
    pub fin: bool,
    pub ack: bool,
    pub rst: bool,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    pub fn new(seqno: Wrap32) -> Self {
        TcpSegment {
            seqno,
            ackno: None,
            win: 0,
            syn: false,
            fin: false,
            ack: false,
            rst: false,
            payload: Vec::new(),
        }
    }

    /// Number of absolute sequence numbers this segment occupies: SYN and
    /// FIN each consume one, in addition to the payload bytes.
    pub fn length_in_sequence_space(&self) -> usize {
        self.payload.len() + usize::from(self.syn) + usize::from(self.fin)
    }
}
