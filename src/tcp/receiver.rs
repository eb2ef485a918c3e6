use crate::tcp::byte_stream::ByteStream;
use crate::tcp::reassembler::StreamReassembler;
use crate::tcp::segment::TcpSegment;
use crate::tcp::wrap32::Wrap32;

/// The receiving half of a TCP connection.
///
/// Feeds inbound segments into a `StreamReassembler` and derives the
/// acknowledgment number and advertised window from its progress.
#[derive(Debug)]
pub struct TcpReceiver {
    reassembler: StreamReassembler,
    isn: Option<Wrap32>, // Peer's initial seq number, set by the first SYN
    fin_received: bool,
}

impl TcpReceiver {
    pub fn new(capacity: usize) -> Self {
        TcpReceiver {
            reassembler: StreamReassembler::new(capacity),
            isn: None,
            fin_received: false,
        }
    }

    /// Accept an inbound segment. Returns whether the segment was acceptable;
    /// an unacceptable segment should be answered with a bare ACK.
    pub fn segment_received(&mut self, seg: &TcpSegment) -> bool {
        let header = &seg.header;

        // Ignore duplicate SYN or FIN
        if (self.isn.is_some() && header.syn()) || (self.fin_received && header.fin()) {
            return false;
        }

        let isn = match self.isn {
            Some(isn) => isn,
            None => {
                if !header.syn() {
                    // Nothing before the SYN is meaningful
                    return false;
                }
                self.isn = Some(header.seq_no);
                header.seq_no
            }
        };

        if header.fin() {
            self.fin_received = true;
        }

        let checkpoint = self.reassembler.first_unassembled();
        let abs_seqno = header.seq_no.unwrap(isn, checkpoint);
        let len = seg.length_in_sequence_space().max(1);

        // SYN and FIN segments bypass the window check
        let window_start = self.abs_ackno();
        let window_len = self.window_size().max(1) as u64;
        let in_window = abs_seqno < window_start + window_len && abs_seqno + len > window_start;
        if !in_window && !header.syn() && !header.fin() {
            return false;
        }

        // The SYN occupies a sequence number but no stream index
        let stream_index = (abs_seqno + header.syn() as u64).saturating_sub(1);
        self.reassembler.push_substring(&seg.payload, stream_index, header.fin());

        true
    }

    /// The acknowledgment number: one past the last contiguously received
    /// byte, counting the SYN and, once the stream is done, the FIN.
    /// `None` before the SYN has arrived.
    pub fn ackno(&self) -> Option<Wrap32> {
        self.isn.map(|isn| Wrap32::wrap(self.abs_ackno(), isn))
    }

    /// The advertised receive window
    pub fn window_size(&self) -> usize {
        self.reassembler.stream_out().remaining_capacity()
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.reassembler.unassembled_bytes()
    }

    pub fn stream_out(&self) -> &ByteStream {
        self.reassembler.stream_out()
    }

    pub fn stream_out_mut(&mut self) -> &mut ByteStream {
        self.reassembler.stream_out_mut()
    }

    fn abs_ackno(&self) -> u64 {
        let mut ackno = 1 + self.reassembler.first_unassembled();
        if self.fin_received
            && self.reassembler.is_empty()
            && self.reassembler.stream_out().input_ended()
        {
            ackno += 1;
        }
        ackno
    }
}

// -- Unit tests --
