use crate::tcp::byte_stream::ByteStream;
use crate::tcp::config::TcpConfig;
use crate::tcp::receiver::TcpReceiver;
use crate::tcp::segment::TcpSegment;
use crate::tcp::sender::TcpSender;
use crate::tcp::tcp_flags::TcpFlags;
use std::collections::VecDeque;

/// A full TCP endpoint: one `TcpSender`, one `TcpReceiver`, and the glue
/// that handshakes, acknowledges, resets, and lingers.
///
/// The owner drives it by feeding segments in, draining `segments_out`,
/// and calling `tick` as time passes. Dropping a still-active connection
/// sends an RST to the peer.
#[derive(Debug)]
pub struct TcpConnection {
    sender: TcpSender,
    receiver: TcpReceiver,
    segments_out: VecDeque<TcpSegment>,
    initial_rto: u64,
    time_since_last_received: u64,
    linger_after_streams_finish: bool,
    syn_sent: bool,
    rst_sent: bool,
    rst_received: bool,
}

impl TcpConnection {
    pub fn new(cfg: &TcpConfig) -> Self {
        TcpConnection {
            sender: TcpSender::new(cfg.send_capacity, cfg.rt_timeout, cfg.fixed_isn),
            receiver: TcpReceiver::new(cfg.recv_capacity),
            segments_out: VecDeque::new(),
            initial_rto: cfg.rt_timeout,
            time_since_last_received: 0,
            linger_after_streams_finish: true,
            syn_sent: false,
            rst_sent: false,
            rst_received: false,
        }
    }

    /// Initiate the handshake by sending our SYN
    pub fn connect(&mut self) {
        self.sender.fill_window();
        self.send_segments();
        self.syn_sent = true;
    }

    pub fn segment_received(&mut self, seg: &TcpSegment) {
        self.time_since_last_received = 0;

        // An RST kills the connection on the spot
        if seg.header.rst() {
            self.receiver.stream_out_mut().set_error();
            self.sender.stream_in_mut().set_error();
            self.rst_received = true;
            return;
        }

        // Nothing before the peer's SYN is meaningful
        if self.receiver.ackno().is_none() && !seg.header.syn() {
            return;
        }

        if seg.header.ack() {
            if self.sender.ack_received(seg.header.ack_no, seg.header.window) {
                self.sender.fill_window();
            } else {
                // The peer acked something we never sent
                self.sender.send_empty_segment();
            }
        }

        let acceptable = self.receiver.segment_received(seg);

        // Step two of the three-way handshake: answer a SYN with SYN-ACK
        if !self.syn_sent {
            self.connect();
            return;
        }

        if acceptable && seg.length_in_sequence_space() > 0 {
            // The segment occupies sequence space, so it deserves an ack
            self.sender.send_empty_segment();
        }

        if !acceptable {
            // Challenge-ack so the peer can resynchronize
            self.sender.send_empty_segment();
        }

        self.send_segments();
    }

    /// Buffer outbound application data and send whatever the window allows.
    /// Returns the number of bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let bytes_written = self.sender.stream_in_mut().write(data);

        self.sender.fill_window();
        self.send_segments();

        bytes_written
    }

    /// Close the outbound stream; the FIN follows once the window allows
    pub fn end_input_stream(&mut self) {
        self.sender.stream_in_mut().end_input();
        self.sender.fill_window();
        self.send_segments();
    }

    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.time_since_last_received += ms_since_last_tick;

        self.sender.tick(ms_since_last_tick);
        self.send_segments();
    }

    /// Is the connection still alive, including the lingering period after
    /// both streams finish?
    pub fn active(&self) -> bool {
        let unclean_shutdown = self.rst_received || self.rst_sent;
        let clean_shutdown = self.receiver.unassembled_bytes() == 0
            && self.receiver.stream_out().eof()
            && self.sender.stream_in().eof()
            && self.sender.bytes_in_flight() == 0
            && (!self.linger_after_streams_finish
                || self.time_since_last_received >= 10 * self.initial_rto);

        !(unclean_shutdown || clean_shutdown)
    }

    pub fn segments_out_mut(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.segments_out
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.sender.bytes_in_flight()
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.receiver.unassembled_bytes()
    }

    pub fn remaining_outbound_capacity(&self) -> usize {
        self.sender.stream_in().remaining_capacity()
    }

    pub fn time_since_last_segment_received(&self) -> u64 {
        self.time_since_last_received
    }

    /// The inbound (peer-to-us) stream, ready to be read
    pub fn inbound_stream_mut(&mut self) -> &mut ByteStream {
        self.receiver.stream_out_mut()
    }

    pub fn inbound_stream(&self) -> &ByteStream {
        self.receiver.stream_out()
    }

    /// Decorate everything the sender produced with ack and window
    /// information and move it to the outbound queue
    fn send_segments(&mut self) {
        // A sender that has retried too long gets the connection aborted
        if self.sender.consecutive_retransmissions() > TcpConfig::MAX_RETX_ATTEMPTS {
            self.send_rst();
            return;
        }

        while let Some(mut seg) = self.sender.segments_out_mut().pop_front() {
            if let Some(ackno) = self.receiver.ackno() {
                seg.header.flags |= TcpFlags::ACK;
                seg.header.ack_no = ackno;
            }
            seg.header.window = self.receiver.window_size().min(u16::MAX as usize) as u16;

            self.segments_out.push_back(seg);
        }

        // The peer closed first; no need to linger once we finish
        if self.receiver.stream_out().input_ended() && !self.sender.stream_in().eof() {
            self.linger_after_streams_finish = false;
        }
    }

    fn send_rst(&mut self) {
        self.receiver.stream_out_mut().set_error();
        self.sender.stream_in_mut().set_error();

        // Make sure the sender has a segment for the RST to ride on
        self.sender.send_empty_segment();
        if let Some(mut seg) = self.sender.segments_out_mut().pop_back() {
            seg.header.flags |= TcpFlags::RST;
            if let Some(ackno) = self.receiver.ackno() {
                seg.header.flags |= TcpFlags::ACK;
                seg.header.ack_no = ackno;
            }
            self.segments_out.push_back(seg);
        }
        self.sender.segments_out_mut().clear();

        self.rst_sent = true;
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        // Tell the peer we are going away mid-conversation
        if self.active() {
            self.send_rst();
        }
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::wrap32::Wrap32;

    const RTO: u64 = 1000;
    const LOCAL_ISN: u32 = 10000;
    const PEER_ISN: u32 = 50000;

    fn make_conn() -> TcpConnection {
        let cfg = TcpConfig {
            recv_capacity: 64,
            send_capacity: 64,
            rt_timeout: RTO,
            fixed_isn: Some(Wrap32::new(LOCAL_ISN)),
        };
        TcpConnection::new(&cfg)
    }

    fn make_segment(seq_no: u32, flags: TcpFlags, payload: &[u8]) -> TcpSegment {
        let mut seg = TcpSegment::default();
        seg.header.seq_no = Wrap32::new(seq_no);
        seg.header.flags = flags;
        seg.payload = payload.to_vec();
        seg
    }

    fn make_ack(seq_no: u32, ack_no: u32, window: u16) -> TcpSegment {
        let mut seg = make_segment(seq_no, TcpFlags::ACK, b"");
        seg.header.ack_no = Wrap32::new(ack_no);
        seg.header.window = window;
        seg
    }

    fn pop_seg(conn: &mut TcpConnection) -> TcpSegment {
        conn.segments_out_mut()
            .pop_front()
            .expect("expected a segment in the outbound queue")
    }

    /// Drive a connection through the client side of the handshake
    fn established_client() -> TcpConnection {
        let mut conn = make_conn();
        conn.connect();
        let syn = pop_seg(&mut conn);
        assert!(syn.header.syn());

        let mut synack = make_ack(PEER_ISN, LOCAL_ISN + 1, 64);
        synack.header.flags |= TcpFlags::SYN;
        conn.segment_received(&synack);

        let ack = pop_seg(&mut conn);
        assert!(ack.header.ack());
        assert_eq!(ack.header.ack_no, Wrap32::new(PEER_ISN) + 1);
        conn
    }

    #[test]
    fn test_active_close_handshake() {
        let mut conn = make_conn();
        assert!(conn.active());
        conn.connect();

        let syn = pop_seg(&mut conn);
        assert!(syn.header.syn());
        assert!(!syn.header.ack());
        assert_eq!(syn.header.seq_no, Wrap32::new(LOCAL_ISN));
        assert_eq!(conn.bytes_in_flight(), 1);
    }

    #[test]
    fn test_passive_open_sends_synack() {
        let mut conn = make_conn();
        conn.segment_received(&make_segment(PEER_ISN, TcpFlags::SYN, b""));

        let synack = pop_seg(&mut conn);
        assert!(synack.header.syn());
        assert!(synack.header.ack());
        assert_eq!(synack.header.ack_no, Wrap32::new(PEER_ISN) + 1);
    }

    #[test]
    fn test_segment_before_syn_ignored() {
        let mut conn = make_conn();
        conn.segment_received(&make_segment(PEER_ISN, TcpFlags::empty(), b"early"));
        assert!(conn.segments_out_mut().is_empty());
        assert!(conn.active());
    }

    #[test]
    fn test_data_exchange_acks_decorated() {
        let mut conn = established_client();

        conn.segment_received(&{
            let mut seg = make_ack(PEER_ISN + 1, LOCAL_ISN + 1, 64);
            seg.payload = b"hello".to_vec();
            seg
        });

        // Inbound data lands on the stream and provokes an ack
        assert_eq!(conn.inbound_stream_mut().read_output(16), b"hello");
        let ack = pop_seg(&mut conn);
        assert!(ack.header.ack());
        assert_eq!(ack.header.ack_no, Wrap32::new(PEER_ISN) + 6);
        assert_eq!(ack.length_in_sequence_space(), 0);
    }

    #[test]
    fn test_write_sends_data() {
        let mut conn = established_client();

        let n = conn.write(b"ping");
        assert_eq!(n, 4);

        let seg = pop_seg(&mut conn);
        assert_eq!(seg.payload, b"ping");
        assert_eq!(seg.header.seq_no, Wrap32::new(LOCAL_ISN) + 1);
        assert!(seg.header.ack());
        assert_eq!(conn.bytes_in_flight(), 4);
    }

    #[test]
    fn test_unacceptable_segment_draws_challenge_ack() {
        let mut conn = established_client();

        // Way out of the receive window
        conn.segment_received(&{
            let mut seg = make_ack(PEER_ISN + 5000, LOCAL_ISN + 1, 64);
            seg.payload = b"zz".to_vec();
            seg
        });

        let challenge = pop_seg(&mut conn);
        assert_eq!(challenge.length_in_sequence_space(), 0);
        assert!(challenge.header.ack());
        assert_eq!(challenge.header.ack_no, Wrap32::new(PEER_ISN) + 1);
    }

    #[test]
    fn test_invalid_ackno_draws_empty_segment() {
        let mut conn = established_client();

        // Acks a seqno we have not reached yet
        conn.segment_received(&make_ack(PEER_ISN + 1, LOCAL_ISN + 999, 64));

        let reply = pop_seg(&mut conn);
        assert_eq!(reply.length_in_sequence_space(), 0);
        assert!(reply.header.ack());
    }

    #[test]
    fn test_rst_received_kills_connection() {
        let mut conn = established_client();

        conn.segment_received(&make_segment(PEER_ISN + 1, TcpFlags::RST, b""));
        assert!(!conn.active());
        assert!(conn.inbound_stream().has_error());
    }

    #[test]
    fn test_rst_sent_after_too_many_retransmissions() {
        let mut conn = established_client();
        conn.write(b"x");
        pop_seg(&mut conn);

        // Exhaust every retransmission attempt
        let mut elapsed = 0u64;
        while conn.active() {
            conn.tick(RTO * 64);
            conn.segments_out_mut().clear();
            elapsed += RTO * 64;
            assert!(elapsed < RTO * 64 * 64, "connection never gave up");
        }

        // The last thing out the door is an RST
        conn.tick(RTO * 64);
        let last = conn.segments_out_mut().pop_back();
        assert!(last.map_or(true, |seg| seg.header.rst()) );
        assert!(!conn.active());
    }

    #[test]
    fn test_clean_shutdown_with_linger() {
        let mut conn = established_client();

        // We close first
        conn.end_input_stream();
        let fin = pop_seg(&mut conn);
        assert!(fin.header.fin());

        // Peer acks our FIN, then sends its own
        conn.segment_received(&make_ack(PEER_ISN + 1, LOCAL_ISN + 2, 64));
        let mut peer_fin = make_ack(PEER_ISN + 1, LOCAL_ISN + 2, 64);
        peer_fin.header.flags |= TcpFlags::FIN;
        conn.segment_received(&peer_fin);

        // We ack their FIN and linger
        let ack = pop_seg(&mut conn);
        assert_eq!(ack.header.ack_no, Wrap32::new(PEER_ISN) + 2);
        assert!(conn.active());

        conn.tick(10 * RTO - 1);
        assert!(conn.active());
        conn.tick(1);
        assert!(!conn.active());
    }

    #[test]
    fn test_passive_close_skips_linger() {
        let mut conn = established_client();

        // Peer closes first
        let mut peer_fin = make_ack(PEER_ISN + 1, LOCAL_ISN + 1, 64);
        peer_fin.header.flags |= TcpFlags::FIN;
        conn.segment_received(&peer_fin);
        pop_seg(&mut conn);
        assert!(conn.active());

        // Now we close; once the peer acks our FIN there is nothing to wait for
        conn.end_input_stream();
        let fin = pop_seg(&mut conn);
        assert!(fin.header.fin());
        conn.segment_received(&make_ack(PEER_ISN + 2, LOCAL_ISN + 2, 64));

        assert!(!conn.active());
    }

    #[test]
    fn test_active_never_flips_back_on() {
        let mut conn = established_client();
        conn.segment_received(&make_segment(PEER_ISN + 1, TcpFlags::RST, b""));
        assert!(!conn.active());

        // More traffic cannot resurrect the connection
        conn.segment_received(&make_ack(PEER_ISN + 1, LOCAL_ISN + 1, 64));
        conn.tick(RTO);
        assert!(!conn.active());
    }
}
