use crate::tcp::byte_stream::ByteStream;
use crate::tcp::config::TcpConfig;
use crate::tcp::segment::TcpSegment;
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::wrap32::Wrap32;
use std::collections::VecDeque;

/// The sending half of a TCP connection.
///
/// Reads from its outbound `ByteStream` and slices it into segments that
/// fit the peer's advertised window, tracking everything in flight for
/// retransmission with exponential backoff.
#[derive(Debug)]
pub struct TcpSender {
    isn: Wrap32,
    stream: ByteStream, // Application bytes waiting to be segmented
    segments_out: VecDeque<TcpSegment>,
    segments_outstanding: VecDeque<TcpSegment>, // Sent but unacknowledged, in send order
    next_seqno: u64,                            // Absolute seqno of the next byte to send
    last_ackno: u64,                            // Highest absolute ackno seen
    window_size: u16,                           // Last advertised by the peer
    outstanding_bytes: u64,
    initial_rto: u64,
    rto: u64,
    timer: Option<u64>, // ms since (re)start; None while stopped
    consecutive_retransmissions: u32,
    fin_sent: bool,
}

impl TcpSender {
    /// New sender. `fixed_isn` pins the initial sequence number for testing;
    /// otherwise one is drawn at random.
    pub fn new(capacity: usize, retx_timeout: u64, fixed_isn: Option<Wrap32>) -> Self {
        TcpSender {
            isn: fixed_isn.unwrap_or_else(|| Wrap32::new(rand::random::<u32>())),
            stream: ByteStream::new(capacity),
            segments_out: VecDeque::new(),
            segments_outstanding: VecDeque::new(),
            next_seqno: 0,
            last_ackno: 0,
            window_size: 1, // Assume one byte of window until the peer says otherwise
            outstanding_bytes: 0,
            initial_rto: retx_timeout,
            rto: retx_timeout,
            timer: None,
            consecutive_retransmissions: 0,
            fin_sent: false,
        }
    }

    /// Slice as much of the stream as the window allows into segments.
    /// A zero window is probed as if it were one byte wide.
    pub fn fill_window(&mut self) {
        let effective_window = self.window_size.max(1) as u64;
        let mut window_capacity = effective_window.saturating_sub(self.outstanding_bytes);

        // Never send anything after the FIN
        while !self.fin_sent && window_capacity > 0 {
            let mut seg = TcpSegment::default();

            if self.next_seqno == 0 {
                // Everything starts with a SYN
                seg.header.flags |= TcpFlags::SYN;
            } else if self.stream.eof() {
                seg.header.flags |= TcpFlags::FIN;
                self.fin_sent = true;
            } else if !self.stream.buffer_empty() {
                let take = window_capacity.min(TcpConfig::MAX_PAYLOAD_SIZE as u64) as usize;
                seg.payload = self.stream.read_output(take);

                // Piggyback the FIN if the window still has a seat for it
                if self.stream.eof() && window_capacity > seg.length_in_sequence_space() {
                    seg.header.flags |= TcpFlags::FIN;
                    self.fin_sent = true;
                }
            } else {
                break;
            }

            seg.header.seq_no = Wrap32::wrap(self.next_seqno, self.isn);

            let len = seg.length_in_sequence_space();
            self.next_seqno += len;
            self.outstanding_bytes += len;
            window_capacity -= len;

            self.segments_outstanding.push_back(seg.clone());
            self.segments_out.push_back(seg);

            if self.timer.is_none() {
                self.timer = Some(0);
            }
        }
    }

    /// Process an acknowledgment from the peer. Returns `false` if the ackno
    /// acknowledges something not sent yet.
    pub fn ack_received(&mut self, ackno: Wrap32, window_size: u16) -> bool {
        let abs_ackno = ackno.unwrap(self.isn, self.last_ackno);
        if abs_ackno > self.next_seqno {
            return false;
        }

        self.window_size = window_size;

        // An ack of already-acknowledged data changes nothing else
        if abs_ackno <= self.last_ackno {
            return true;
        }
        self.last_ackno = abs_ackno;

        while let Some(seg) = self.segments_outstanding.front() {
            let abs_seqno = seg.header.seq_no.unwrap(self.isn, self.last_ackno);
            if abs_seqno + seg.length_in_sequence_space() > abs_ackno {
                break;
            }
            self.outstanding_bytes -= seg.length_in_sequence_space();
            self.segments_outstanding.pop_front();
        }

        // Fresh progress: RTO back to its initial value, restart the timer
        // if anything is still in flight, stop it otherwise
        self.rto = self.initial_rto;
        self.timer = if self.segments_outstanding.is_empty() {
            None
        } else {
            Some(0)
        };
        self.consecutive_retransmissions = 0;

        true
    }

    /// Advance the retransmission timer. On expiry, retransmit the earliest
    /// outstanding segment. A zero advertised window means the expiry was a
    /// persist probe: no backoff, no strike against the connection.
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        let timer = match self.timer.as_mut() {
            Some(timer) => timer,
            None => return,
        };
        *timer += ms_since_last_tick;

        if *timer >= self.rto {
            if let Some(seg) = self.segments_outstanding.front() {
                self.segments_out.push_back(seg.clone());

                if self.window_size != 0 {
                    self.consecutive_retransmissions += 1;
                    self.rto *= 2;
                }
            }
            self.timer = Some(0);
        }
    }

    /// Emit a zero-length segment carrying the current seqno. Useful for
    /// acks and challenge segments; never retransmitted.
    pub fn send_empty_segment(&mut self) {
        let mut seg = TcpSegment::default();
        seg.header.seq_no = Wrap32::wrap(self.next_seqno, self.isn);
        self.segments_out.push_back(seg);
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.outstanding_bytes
    }

    pub fn next_seqno_absolute(&self) -> u64 {
        self.next_seqno
    }

    pub fn next_seqno(&self) -> Wrap32 {
        Wrap32::wrap(self.next_seqno, self.isn)
    }

    pub fn consecutive_retransmissions(&self) -> u32 {
        self.consecutive_retransmissions
    }

    pub fn segments_out_mut(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.segments_out
    }

    pub fn stream_in(&self) -> &ByteStream {
        &self.stream
    }

    pub fn stream_in_mut(&mut self) -> &mut ByteStream {
        &mut self.stream
    }
}

// -- Unit tests --
