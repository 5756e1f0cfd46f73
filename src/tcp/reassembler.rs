use crate::tcp::byte_stream::ByteStream;

/// Reassembles out-of-order byte substrings into an in-order `ByteStream`.
///
/// The window `[next_index, next_index + capacity)` is represented as a
/// physical ring of size `capacity`, indexed by `absolute_index % capacity`,
/// with a parallel "dirty" bitmap as the source of truth for which slots
/// have been filled. This means overlapping retransmissions never get
/// double-counted: a slot is either already dirty (ignore the incoming
/// byte) or not (store it and mark it dirty).
#[derive(Debug)]
pub struct StreamReassembler {
    ring: Vec<u8>,
    dirty: Vec<bool>,
    capacity: usize,
    next_index: usize,
    unassembled: usize,
    should_eof: bool,
    output: ByteStream,
}

impl StreamReassembler {
    pub fn new(capacity: usize) -> Self {
        StreamReassembler {
            ring: vec![0u8; capacity],
            dirty: vec![false; capacity],
            capacity,
            next_index: 0,
            unassembled: 0,
            should_eof: false,
            output: ByteStream::new(capacity),
        }
    }

    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.unassembled
    }

    pub fn empty(&self) -> bool {
        self.unassembled == 0
    }

    /// Accept a substring of the logical stream, possibly out-of-order or
    /// overlapping previously-seen bytes, and assemble any newly contiguous
    /// prefix into `output`.
    pub fn push_substring(&mut self, data: &[u8], index: usize, eof: bool) {
        let window_end = self.next_index + self.capacity;

        // Entirely beyond the window, or entirely before next_index: ignore,
        // except that an empty EOF segment exactly at next_index still
        // sticks should_eof.
        if index >= window_end || index + data.len() <= self.next_index {
            if data.is_empty() && eof && index == self.next_index {
                self.should_eof = true;
                self.try_finish();
            }
            return;
        }

        let start = index.max(self.next_index);
        let stop = (index + data.len()).min(window_end);

        for p in start..stop {
            let slot = p % self.capacity;
            if !self.dirty[slot] {
                self.ring[slot] = data[p - index];
                self.dirty[slot] = true;
                self.unassembled += 1;
            }
        }

        // Only stick should_eof if the segment's real end (not the
        // window-clipped one) landed inside or at the edge of the window.
        if eof && index + data.len() <= window_end {
            self.should_eof = true;
        }

        self.drain_prefix();
        self.try_finish();
    }

    /// Write as much of the contiguous, marked prefix as `output` will accept.
    fn drain_prefix(&mut self) {
        loop {
            let slot = self.next_index % self.capacity;
            if !self.dirty[slot] || self.output.remaining_capacity() == 0 {
                break;
            }

            // Gather a contiguous run of dirty slots starting here, bounded
            // by what the output stream can currently accept.
            let max_run = self.output.remaining_capacity().min(self.unassembled);
            let mut run = Vec::with_capacity(max_run);
            let mut s = slot;
            while run.len() < max_run && self.dirty[s] {
                run.push(self.ring[s]);
                s = (s + 1) % self.capacity;
            }
            if run.is_empty() {
                break;
            }

            let written = self.output.write(&run);
            if written == 0 {
                break;
            }
            for i in 0..written {
                self.dirty[(slot + i) % self.capacity] = false;
            }
            self.next_index += written;
            self.unassembled -= written;

            if written < run.len() {
                break;
            }
        }
    }

    fn try_finish(&mut self) {
        if self.should_eof && self.unassembled == 0 {
            self.output.end_input();
        }
    }
}
