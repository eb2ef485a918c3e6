use std::collections::VecDeque;
use std::io::{self, Read};

/// An in-order byte stream with bounded capacity
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
    /// New `ByteStream` with capacity `N`
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            bytes_written: 0,
            bytes_read: 0,
            input_ended: false, // It's always the producer's job to end the stream, never the consumer
            error: false,
        }
    }

    /// Append as much of `data` as fits and return the number of bytes accepted.
    /// Returns 0 once the input has ended.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.input_ended {
            return 0;
        }
        let to_write = data.len().min(self.remaining_capacity());
        self.buffer.extend(&data[..to_write]);
        self.bytes_written += to_write;
        to_write
    }

    /// Peek `N` bytes without consuming them and return a new vector of bytes peeked
    pub fn peek_output(&self, len: usize) -> Vec<u8> {
        let to_peek = len.min(self.buffer.len());
        self.buffer.iter().take(to_peek).cloned().collect()
    }

    /// Remove `N` bytes from the byte stream and return the actual number of bytes popped
    pub fn pop_output(&mut self, len: usize) -> usize {
        let to_pop = len.min(self.buffer.len());
        self.buffer.drain(..to_pop);
        self.bytes_read += to_pop;
        to_pop
    }

    /// Peek and pop up to `N` bytes in one step
    pub fn read_output(&mut self, len: usize) -> Vec<u8> {
        let data = self.peek_output(len);
        self.pop_output(data.len());
        data
    }

    /// Signal that the producer is done writing
    pub fn end_input(&mut self) {
        self.input_ended = true;
    }

    /// Has the producer ended the input?
    pub fn input_ended(&self) -> bool {
        self.input_ended
    }

    /// Mark the stream as errored. Sticky.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// The remaining capacity in the byte stream
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.buffer.len())
    }

    /// The length of the buffer (number of bytes not consumed yet)
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Is the byte stream empty?
    pub fn buffer_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Is the end of the byte stream reached?
    pub fn eof(&self) -> bool {
        self.input_ended && self.buffer.is_empty()
    }

    /// The total number of bytes written
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// The total number of bytes read
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let to_read = buf.len().min(self.buffer.len());

        if to_read > 0 {
            // Make ring buffer contiguous if not already
            let contiguous = self.buffer.make_contiguous();
            buf[..to_read].copy_from_slice(&contiguous[..to_read]);
            self.buffer.drain(..to_read);
            self.bytes_read += to_read;
        }
        Ok(to_read)
    }
}

// -- Unit tests --
