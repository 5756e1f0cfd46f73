use std::collections::VecDeque;

/// A finite, in-memory, flow-controlled FIFO of bytes.
///
/// Writes never block: a write past `remaining_capacity` is simply
/// truncated. Reads and writes on an errored stream are no-ops.
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: usize,
    bytes_written: usize,
    bytes_read: usize,
    input_ended: bool,
    error: bool,
}

impl ByteStream {
    /// New `ByteStream` with the given fixed `capacity` (must be > 0).
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ByteStream capacity must be positive");
        ByteStream {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            bytes_written: 0,
            bytes_read: 0,
            input_ended: false,
            error: false,
        }
    }

    /// Write as many of `data` as fit. Returns the number of bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.error {
            return 0;
        }
        if self.input_ended {
            self.set_error();
            return 0;
        }
        let to_write = data.len().min(self.remaining_capacity());
        self.buffer.extend(&data[..to_write]);
        self.bytes_written += to_write;
        to_write
    }

    /// First `min(n, buffer_size)` buffered bytes, without removing them.
    pub fn peek_output(&self, n: usize) -> Vec<u8> {
        if self.error {
            return Vec::new();
        }
        let to_peek = n.min(self.buffer.len());
        self.buffer.iter().take(to_peek).copied().collect()
    }

    /// Remove up to `n` bytes from the front of the buffer.
    pub fn pop_output(&mut self, n: usize) -> usize {
        if self.error {
            return 0;
        }
        let to_pop = n.min(self.buffer.len());
        self.buffer.drain(..to_pop);
        self.bytes_read += to_pop;
        to_pop
    }

    /// `peek_output` followed by `pop_output` of the same length.
    pub fn read(&mut self, n: usize) -> Vec<u8> {
        let data = self.peek_output(n);
        self.pop_output(data.len());
        data
    }

    pub fn end_input(&mut self) {
        self.input_ended = true;
    }

    pub fn input_ended(&self) -> bool {
        self.input_ended
    }

    pub fn eof(&self) -> bool {
        self.input_ended && self.buffer.is_empty()
    }

    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}
