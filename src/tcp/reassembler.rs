use crate::tcp::byte_stream::ByteStream;
use std::collections::BTreeMap;

/// Reassembles out-of-order byte substrings into an in-order `ByteStream`.
///
/// Stored substrings are pairwise disjoint and never overwrite bytes that
/// are already buffered. Everything (assembled output + unassembled
/// segments) fits within the output stream's capacity.
#[derive(Debug)]
pub struct StreamReassembler {
    segments: BTreeMap<u64, Vec<u8>>, // Out-of-order segments. key = start index
    output: ByteStream,               // The assembled stream, ready to be read
    next_index: u64,                  // First byte index not yet written to the output
    unassembled_bytes: usize,
    has_eof: bool, // Has any pushed substring carried the EOF marker?
}

impl StreamReassembler {
    /// New `StreamReassembler` writing into a `ByteStream` of capacity `N`
    pub fn new(capacity: usize) -> Self {
        StreamReassembler {
            segments: BTreeMap::new(),
            output: ByteStream::new(capacity),
            next_index: 0,
            unassembled_bytes: 0,
            has_eof: false,
        }
    }

    /// Accept a substring of the logical stream starting at `index`,
    /// possibly out of order, and write any newly contiguous bytes to the
    /// output. `eof` marks the substring that ends the stream.
    pub fn push_substring(&mut self, data: &[u8], index: u64, eof: bool) {
        self.has_eof |= eof;

        let first_unacceptable = self.next_index + self.output.remaining_capacity() as u64;
        let data_end = index + data.len() as u64;

        // Ignore empty, already-assembled, or out-of-window substrings
        if data.is_empty() || data_end <= self.next_index || index >= first_unacceptable {
            self.close_if_done();
            return;
        }

        // Trim to the window [next_index, first_unacceptable)
        let mut start = index.max(self.next_index);
        let mut end = data_end.min(first_unacceptable);

        // A stored segment beginning at or before `start` either covers the
        // whole piece or forces it to begin where that segment ends
        if let Some((&seg_start, seg)) = self.segments.range(..=start).next_back() {
            let seg_end = seg_start + seg.len() as u64;
            if seg_end >= end {
                self.close_if_done();
                return;
            }
            if seg_end > start {
                start = seg_end;
            }
        }

        // Stored segments beginning inside the piece are either fully
        // covered (drop them) or cut the piece short on the right
        let inside: Vec<u64> = self.segments.range(start..end).map(|(&s, _)| s).collect();
        for seg_start in inside {
            let seg_len = self.segments[&seg_start].len();
            if seg_start + seg_len as u64 <= end {
                self.segments.remove(&seg_start);
                self.unassembled_bytes -= seg_len;
            } else {
                end = seg_start;
                break;
            }
        }

        if start < end {
            let lo = (start - index) as usize;
            let hi = (end - index) as usize;
            self.segments.insert(start, data[lo..hi].to_vec());
            self.unassembled_bytes += hi - lo;
        }

        // Write as much as possible to the output stream
        while let Some(seg) = self.segments.remove(&self.next_index) {
            let written = self.output.write(&seg);
            self.unassembled_bytes -= written;
            self.next_index += written as u64;

            if written < seg.len() {
                // Partial write; keep the remainder for later
                self.segments.insert(self.next_index, seg[written..].to_vec());
                break;
            }
        }

        self.close_if_done();
    }

    /// The index of the first byte not yet written to the output
    pub fn first_unassembled(&self) -> u64 {
        self.next_index
    }

    /// The total number of bytes pending reassembly
    pub fn unassembled_bytes(&self) -> usize {
        self.unassembled_bytes
    }

    /// Are there no substrings pending reassembly?
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn stream_out(&self) -> &ByteStream {
        &self.output
    }

    pub fn stream_out_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    fn close_if_done(&mut self) {
        if self.has_eof && self.segments.is_empty() {
            self.output.end_input();
        }
    }
}

// -- Unit tests --
