use std::collections::VecDeque;

use crate::tcp::byte_stream::ByteStream;
use crate::tcp::retransmission_timer::RetransmissionTimer;
use crate::tcp::tcp_segment::TcpSegment;
use crate::tcp::wrap32::Wrap32;

/// Outbound half of a TCP endpoint: turns the application's byte stream
/// into segments, tracks what's outstanding, and retransmits on timeout.
pub struct TCPSender {
    pub stream_in: ByteStream,
    isn: Wrap32,
    next_seqno: u64,
    receiver_ack: u64,
    receiver_window_size: u16,
    consecutive_retransmissions: usize,
    fin_sent: bool,
    outstanding_segments: VecDeque<TcpSegment>,
    timer: RetransmissionTimer,
    mss: usize,
}

impl TCPSender {
    pub fn new(capacity: usize, initial_rto_ms: u64, mss: usize, isn: Wrap32) -> Self {
        TCPSender {
            stream_in: ByteStream::new(capacity),
            isn,
            next_seqno: 0,
            receiver_ack: 0,
            receiver_window_size: 1,
            consecutive_retransmissions: 0,
            fin_sent: false,
            outstanding_segments: VecDeque::new(),
            timer: RetransmissionTimer::new(initial_rto_ms),
            mss,
        }
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.next_seqno - self.receiver_ack
    }

    pub fn consecutive_retransmissions(&self) -> usize {
        self.consecutive_retransmissions
    }

    fn make_segment(&self, seqno_abs: u64, syn: bool, fin: bool, payload: Vec<u8>) -> TcpSegment {
        let mut seg = TcpSegment::new(Wrap32::wrap(seqno_abs, self.isn));
        seg.syn = syn;
        seg.fin = fin;
        seg.payload = payload;
        seg
    }

    /// Push segments until the effective window is exhausted, the stream has
    /// nothing left to offer, or FIN has already gone out.
    pub fn fill_window(&mut self, out: &mut VecDeque<TcpSegment>) {
        if self.next_seqno == 0 {
            let seg = self.make_segment(0, true, false, Vec::new());
            self.next_seqno += 1;
            self.outstanding_segments.push_back(seg.clone());
            self.timer.start();
            out.push_back(seg);
            return;
        }

        if self.fin_sent {
            return;
        }

        loop {
            let window = self.receiver_window_size.max(1) as u64;
            let available = window.saturating_sub(self.bytes_in_flight());
            if available == 0 {
                break;
            }

            let len = (available as usize)
                .min(self.stream_in.buffer_size())
                .min(self.mss);
            let payload = self.stream_in.read(len);

            let attach_fin = self.stream_in.eof()
                && !self.fin_sent
                && available as usize >= payload.len() + 1;

            let seg_len = payload.len() + usize::from(attach_fin);
            if seg_len == 0 {
                break;
            }

            if attach_fin {
                self.fin_sent = true;
            }

            let seg = self.make_segment(self.next_seqno, false, attach_fin, payload);
            self.next_seqno += seg_len as u64;
            self.outstanding_segments.push_back(seg.clone());
            self.timer.start();
            out.push_back(seg);

            if attach_fin || self.stream_in.buffer_empty() {
                break;
            }
        }
    }

    pub fn ack_received(&mut self, ackno: Wrap32, window: u16, out: &mut VecDeque<TcpSegment>) {
        let a = ackno.unwrap(self.isn, self.next_seqno);
        if a > self.next_seqno || a < self.receiver_ack {
            return;
        }

        self.receiver_window_size = window;

        let mut removed_any = false;
        while let Some(front) = self.outstanding_segments.front() {
            let seqno_abs = front.seqno.unwrap(self.isn, self.next_seqno);
            let right_edge = seqno_abs + front.length_in_sequence_space() as u64;
            if right_edge <= a {
                self.receiver_ack = right_edge;
                self.outstanding_segments.pop_front();
                removed_any = true;
            } else {
                break;
            }
        }

        if removed_any {
            self.timer.reset();
            self.consecutive_retransmissions = 0;
        }
        if self.outstanding_segments.is_empty() {
            self.timer.stop();
        }

        self.fill_window(out);
    }

    pub fn tick(&mut self, ms: u64, out: &mut VecDeque<TcpSegment>) {
        if !self.timer.tick(ms) {
            return;
        }

        if let Some(oldest) = self.outstanding_segments.front() {
            out.push_back(oldest.clone());
        }

        if self.receiver_window_size == 0 {
            self.timer.reset();
        } else {
            self.timer.handle_expired();
            self.consecutive_retransmissions += 1;
        }
    }

    pub fn send_empty_segment(&self, out: &mut VecDeque<TcpSegment>) {
        out.push_back(self.make_segment(self.next_seqno, false, false, Vec::new()));
    }

    pub fn next_seqno(&self) -> u64 {
        self.next_seqno
    }

    pub fn fin_sent(&self) -> bool {
        self.fin_sent
    }

    pub fn isn(&self) -> Wrap32 {
        self.isn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(capacity: usize) -> TCPSender {
        TCPSender::new(capacity, 1000, 1452, Wrap32::new(0))
    }

    #[test]
    fn test_fill_window_emits_syn_first() {
        let mut s = sender(1000);
        let mut out = VecDeque::new();
        s.fill_window(&mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].syn);
        assert_eq!(s.next_seqno(), 1);
    }

    #[test]
    fn test_fill_window_emits_payload_after_syn_acked() {
        let mut s = sender(1000);
        let mut out = VecDeque::new();
        s.fill_window(&mut out);
        out.clear();

        s.ack_received(Wrap32::new(1), 1000, &mut out);
        out.clear();

        s.stream_in.write(b"hello");
        s.fill_window(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].payload, b"hello");
        assert_eq!(s.next_seqno(), 6);
    }

    #[test]
    fn test_fin_attached_when_stream_ends_and_window_allows() {
        let mut s = sender(1000);
        let mut out = VecDeque::new();
        s.fill_window(&mut out);
        out.clear();
        s.ack_received(Wrap32::new(1), 1000, &mut out);
        out.clear();

        s.stream_in.write(b"hi");
        s.stream_in.end_input();
        s.fill_window(&mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].fin);
        assert!(s.fin_sent());
    }

    #[test]
    fn test_zero_window_probe_is_one_byte_no_backoff() {
        let mut s = sender(1000);
        let mut out = VecDeque::new();
        s.fill_window(&mut out);
        out.clear();
        s.ack_received(Wrap32::new(1), 0, &mut out);
        out.clear();

        s.stream_in.write(b"hello");
        s.fill_window(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].payload.len(), 1);

        let rto_before = 1000;
        out.clear();
        s.tick(rto_before, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(s.consecutive_retransmissions(), 1);
    }

    #[test]
    fn test_ack_removes_fully_covered_segments_only() {
        let mut s = sender(1000);
        let mut out = VecDeque::new();
        s.fill_window(&mut out);
        out.clear();
        s.ack_received(Wrap32::new(1), 1000, &mut out);
        out.clear();

        s.stream_in.write(b"hello");
        s.fill_window(&mut out);
        out.clear();

        // Partial ack (covers only 3 of 5 bytes) must not remove the segment.
        s.ack_received(Wrap32::new(4), 1000, &mut out);
        assert_eq!(s.bytes_in_flight(), 5);
    }

    #[test]
    fn test_stale_ack_ignored() {
        let mut s = sender(1000);
        let mut out = VecDeque::new();
        s.fill_window(&mut out);
        out.clear();
        s.ack_received(Wrap32::new(1), 1000, &mut out);
        let ack_before = s.receiver_ack;
        s.ack_received(Wrap32::new(1), 1000, &mut out);
        assert_eq!(s.receiver_ack, ack_before);
    }

    #[test]
    fn test_retransmission_backoff_sequence() {
        let mut s = TCPSender::new(1000, 100, 1452, Wrap32::new(0));
        let mut out = VecDeque::new();
        s.fill_window(&mut out); // SYN
        out.clear();

        s.tick(100, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(s.consecutive_retransmissions(), 1);

        out.clear();
        s.tick(199, &mut out);
        assert!(out.is_empty());
        s.tick(1, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(s.consecutive_retransmissions(), 2);
    }
}
