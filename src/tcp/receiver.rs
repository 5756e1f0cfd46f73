use crate::tcp::reassembler::StreamReassembler;
use crate::tcp::tcp_segment::TcpSegment;
use crate::tcp::wrap32::Wrap32;

/// Inbound half of a TCP endpoint: turns arriving segments into a byte
/// stream and reports the `ackno`/window the sender side should advertise.
pub struct TCPReceiver {
    reassembler: StreamReassembler,
    isn: Option<Wrap32>,
}

impl TCPReceiver {
    pub fn new(capacity: usize) -> Self {
        TCPReceiver {
            reassembler: StreamReassembler::new(capacity),
            isn: None,
        }
    }

    pub fn segment_received(&mut self, seg: &TcpSegment) {
        if seg.syn && self.isn.is_none() {
            self.isn = Some(seg.seqno);
        }

        let isn = match self.isn {
            Some(isn) => isn,
            None => return,
        };

        let checkpoint = self.reassembler.output().bytes_written() as u64;
        let abs_seqno = seg.seqno.unwrap(isn, checkpoint);
        // The byte right after SYN starts stream index 0; SYN itself consumes
        // one absolute sequence number with no stream byte of its own. Add
        // before subtracting: abs_seqno is 0 on the SYN itself, and a bare
        // `abs_seqno - 1` would underflow before the `if` term ever applied.
        let stream_index = (abs_seqno + if seg.syn { 1 } else { 0 }).saturating_sub(1);

        self.reassembler
            .push_substring(&seg.payload, stream_index as usize, seg.fin);
    }

    /// `None` until the first SYN has been seen.
    pub fn ackno(&self) -> Option<Wrap32> {
        let isn = self.isn?;
        let written = self.reassembler.output().bytes_written() as u64;
        let ended = self.reassembler.output().input_ended();
        Some(Wrap32::wrap(written + 1 + u64::from(ended), isn))
    }

    pub fn window_size(&self) -> u16 {
        self.reassembler
            .output()
            .remaining_capacity()
            .min(u16::MAX as usize) as u16
    }

    pub fn reassembler(&self) -> &StreamReassembler {
        &self.reassembler
    }

    pub fn reassembler_mut(&mut self) -> &mut StreamReassembler {
        &mut self.reassembler
    }

    pub fn stream_out(&self) -> &crate::tcp::byte_stream::ByteStream {
        self.reassembler.output()
    }
}
