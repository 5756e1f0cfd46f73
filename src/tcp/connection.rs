use std::collections::VecDeque;

use rand::Rng;

use crate::tcp::config::TcpConfig;
use crate::tcp::errors::TcpError;
use crate::tcp::receiver::TCPReceiver;
use crate::tcp::sender::TCPSender;
use crate::tcp::tcp_segment::TcpSegment;
use crate::tcp::wrap32::Wrap32;

/// Couples a [`TCPSender`] and [`TCPReceiver`] into one endpoint: lifecycle,
/// RST handling, and the TIME_WAIT-like lingering close.
pub struct TCPConnection {
    sender: TCPSender,
    receiver: TCPReceiver,
    config: TcpConfig,
    segments_out: VecDeque<TcpSegment>,
    time_since_last_segment_received: u64,
    linger_after_streams_finish: bool,
    active: bool,
}

impl TCPConnection {
    pub fn new(config: TcpConfig) -> Self {
        let isn = Wrap32::new(config.fixed_isn.unwrap_or_else(|| rand::thread_rng().gen()));
        TCPConnection {
            sender: TCPSender::new(config.capacity, config.initial_rto_ms, config.mss, isn),
            receiver: TCPReceiver::new(config.capacity),
            config,
            segments_out: VecDeque::new(),
            time_since_last_segment_received: 0,
            linger_after_streams_finish: true,
            active: true,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn segments_out(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.segments_out
    }

    /// Stamp a segment with the current receiver ackno/window before queuing it.
    fn stamp_and_queue(&mut self, mut seg: TcpSegment) {
        if let Some(ackno) = self.receiver.ackno() {
            seg.ack = true;
            seg.ackno = Some(ackno);
        }
        seg.win = self.receiver.window_size();
        self.segments_out.push_back(seg);
    }

    fn drain_sender(&mut self, raw: &mut VecDeque<TcpSegment>) {
        while let Some(seg) = raw.pop_front() {
            self.stamp_and_queue(seg);
        }
    }

    pub fn segment_received(&mut self, seg: &TcpSegment) {
        self.time_since_last_segment_received = 0;

        if seg.rst {
            self.sender.stream_in.set_error();
            self.receiver.reassembler_mut().output_mut().set_error();
            self.active = false;
            return;
        }

        let receiver_input_ended_before = self.receiver.stream_out().input_ended();
        self.receiver.segment_received(seg);
        let receiver_input_ended_after = self.receiver.stream_out().input_ended();

        if !receiver_input_ended_before
            && receiver_input_ended_after
            && !self.sender.stream_in.input_ended()
        {
            self.linger_after_streams_finish = false;
        }

        let mut raw = VecDeque::new();

        if seg.ack && self.receiver.ackno().is_some() {
            self.sender
                .ack_received(seg.ackno.unwrap_or(Wrap32::new(0)), seg.win, &mut raw);
            self.drain_sender(&mut raw);
        }

        if seg.length_in_sequence_space() > 0 {
            let before = self.segments_out.len();
            self.sender.fill_window(&mut raw);
            self.drain_sender(&mut raw);
            if self.segments_out.len() == before {
                self.sender.send_empty_segment(&mut raw);
                self.drain_sender(&mut raw);
            }
        }
    }

    /// `true` once `connect()` has sent the initial SYN.
    fn connected(&self) -> bool {
        self.sender.next_seqno() > 0
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize, TcpError> {
        if !self.connected() {
            return Err(TcpError::NotConnected);
        }
        let n = self.sender.stream_in.write(data);
        let mut raw = VecDeque::new();
        self.sender.fill_window(&mut raw);
        self.drain_sender(&mut raw);
        Ok(n)
    }

    pub fn end_input_stream(&mut self) -> Result<(), TcpError> {
        if self.sender.stream_in.input_ended() {
            return Err(TcpError::AlreadyEnded);
        }
        self.sender.stream_in.end_input();
        let mut raw = VecDeque::new();
        self.sender.fill_window(&mut raw);
        self.drain_sender(&mut raw);
        Ok(())
    }

    pub fn connect(&mut self) -> Result<(), TcpError> {
        if self.connected() {
            return Err(TcpError::AlreadyConnecting);
        }
        let mut raw = VecDeque::new();
        self.sender.fill_window(&mut raw);
        self.drain_sender(&mut raw);
        Ok(())
    }

    fn clean_close(&self) -> bool {
        self.receiver.stream_out().eof()
            && self.sender.stream_in.input_ended()
            && self.sender.fin_sent()
            && self.sender.bytes_in_flight() == 0
    }

    pub fn tick(&mut self, ms: u64) {
        self.time_since_last_segment_received += ms;

        let mut raw = VecDeque::new();
        self.sender.tick(ms, &mut raw);

        let exceeded = self.sender.consecutive_retransmissions() > self.config.max_retx_attempts;

        while let Some(mut seg) = raw.pop_front() {
            if exceeded {
                seg.rst = true;
            }
            self.stamp_and_queue(seg);
        }

        if exceeded {
            self.sender.stream_in.set_error();
            self.receiver.reassembler_mut().output_mut().set_error();
            self.active = false;
            return;
        }

        if self.clean_close() {
            if !self.linger_after_streams_finish {
                self.active = false;
            } else if self.time_since_last_segment_received >= 10 * self.config.initial_rto_ms {
                self.active = false;
            }
        }
    }

    /// Emit a final RST and mark the connection inactive. Call this instead
    /// of relying on drop order, since a dropped value cannot hand segments
    /// back to a driver.
    pub fn abort(&mut self) {
        if self.active {
            self.sender.stream_in.set_error();
            self.receiver.reassembler_mut().output_mut().set_error();
            let mut raw = VecDeque::new();
            self.sender.send_empty_segment(&mut raw);
            while let Some(mut seg) = raw.pop_front() {
                seg.rst = true;
                self.stamp_and_queue(seg);
            }
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TcpConfig {
        TcpConfig {
            capacity: 1000,
            initial_rto_ms: 1000,
            max_retx_attempts: 8,
            fixed_isn: Some(0),
            mss: 1452,
        }
    }

    #[test]
    fn test_connect_emits_syn() {
        let mut conn = TCPConnection::new(config());
        conn.connect().unwrap();
        let segs = conn.segments_out();
        assert_eq!(segs.len(), 1);
        assert!(segs[0].syn);
    }

    #[test]
    fn test_connect_twice_is_rejected() {
        let mut conn = TCPConnection::new(config());
        conn.connect().unwrap();
        assert_eq!(conn.connect(), Err(TcpError::AlreadyConnecting));
    }

    #[test]
    fn test_write_before_connect_is_rejected() {
        let mut conn = TCPConnection::new(config());
        assert_eq!(conn.write(b"hello"), Err(TcpError::NotConnected));
    }

    #[test]
    fn test_end_input_stream_twice_is_rejected() {
        let mut conn = TCPConnection::new(config());
        conn.connect().unwrap();
        conn.end_input_stream().unwrap();
        assert_eq!(conn.end_input_stream(), Err(TcpError::AlreadyEnded));
    }

    #[test]
    fn test_simple_echo_handshake_and_data() {
        let mut conn = TCPConnection::new(config());
        conn.connect().unwrap();
        conn.segments_out().clear();

        // Peer's SYN+ACK.
        let mut synack = TcpSegment::new(Wrap32::new(100));
        synack.syn = true;
        synack.ack = true;
        synack.ackno = Some(Wrap32::new(1));
        synack.win = 1000;
        conn.segment_received(&synack);
        let segs = conn.segments_out();
        assert_eq!(segs.len(), 1);
        assert!(segs[0].ack);
        conn.segments_out().clear();

        conn.write(b"hello").unwrap();
        conn.end_input_stream().unwrap();
        let segs = conn.segments_out();
        // write() drains "hello" immediately (nothing held back waiting for
        // more data), so the FIN that end_input_stream() triggers goes out
        // as a second, empty-payload segment.
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].payload, b"hello");
        assert!(!segs[0].fin);
        assert!(segs[1].payload.is_empty());
        assert!(segs[1].fin);
    }

    #[test]
    fn test_rst_received_sets_error_and_inactive() {
        let mut conn = TCPConnection::new(config());
        conn.connect().unwrap();
        conn.segments_out().clear();

        let mut rst = TcpSegment::new(Wrap32::new(1));
        rst.rst = true;
        conn.segment_received(&rst);
        assert!(!conn.active());
    }

    #[test]
    fn test_excessive_retransmissions_aborts_with_rst() {
        let mut config = config();
        config.max_retx_attempts = 2;
        config.initial_rto_ms = 10;
        let mut conn = TCPConnection::new(config);
        conn.connect().unwrap();
        conn.segments_out().clear();

        conn.tick(10); // retransmit 1, rto->20
        conn.tick(20); // retransmit 2, rto->40
        assert!(conn.active());
        conn.tick(40); // retransmit 3 > max_retx_attempts(2): abort
        assert!(!conn.active());
        let segs = conn.segments_out();
        assert!(segs.iter().any(|s| s.rst));
    }

    #[test]
    fn test_abort_emits_rst_and_marks_inactive() {
        let mut conn = TCPConnection::new(config());
        conn.connect().unwrap();
        conn.segments_out().clear();
        conn.abort();
        assert!(!conn.active());
        assert!(conn.segments_out()[0].rst);
    }
}
