use crate::packet::errors::HeaderError;
use crate::tcp::tcp_header::TcpHeader;
use std::net::Ipv4Addr;

/// A TCP segment: header plus payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TcpSegment {
    pub header: TcpHeader,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    /// The number of sequence numbers this segment occupies.
    /// SYN and FIN each take one slot in sequence space; payload bytes take one each.
    pub fn length_in_sequence_space(&self) -> u64 {
        self.payload.len() as u64 + self.header.syn() as u64 + self.header.fin() as u64
    }

    /// Serialize header and payload, then patch in the checksum computed
    /// over the IPv4 pseudo-header
    pub fn serialize(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<Vec<u8>, HeaderError> {
        let header_len = self.header.header_len();
        let mut buf = vec![0u8; header_len + self.payload.len()];

        self.header.serialize(&mut buf[..header_len])?;
        buf[header_len..].copy_from_slice(&self.payload);

        let checksum = Self::checksum(&buf, src_ip, dst_ip);
        buf[16..18].copy_from_slice(&checksum.to_be_bytes());

        Ok(buf)
    }

    /// Parse a segment and verify its checksum against the pseudo-header
    pub fn parse(buf: &[u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<Self, HeaderError> {
        let header = TcpHeader::parse(buf)?;

        if Self::checksum(buf, src_ip, dst_ip) != 0 {
            return Err(HeaderError::BadChecksum("TCP".to_string()));
        }

        let payload = buf[header.header_len()..].to_vec();
        Ok(TcpSegment { header, payload })
    }

    /// Internet checksum over the IPv4 pseudo-header, TCP header, and payload
    fn checksum(data: &[u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> u16 {
        let mut sum: u32 = 0;

        // Pseudo-header
        let src = src_ip.octets();
        let dst = dst_ip.octets();
        sum += ((src[0] as u32) << 8) | (src[1] as u32);
        sum += ((src[2] as u32) << 8) | (src[3] as u32);
        sum += ((dst[0] as u32) << 8) | (dst[1] as u32);
        sum += ((dst[2] as u32) << 8) | (dst[3] as u32);
        sum += 6; // protocol number for TCP
        sum += data.len() as u32;

        // TCP header and payload
        for i in (0..data.len().saturating_sub(1)).step_by(2) {
            sum += ((data[i] as u32) << 8) | (data[i + 1] as u32);
        }

        // If odd length, the last byte is padded on the right
        if data.len() % 2 != 0 {
            sum += (data[data.len() - 1] as u32) << 8;
        }

        // Fold the carry bits
        while sum >> 16 != 0 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::tcp_flags::TcpFlags;
    use crate::tcp::wrap32::Wrap32;

    fn addrs() -> (Ipv4Addr, Ipv4Addr) {
        (Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
    }

    #[test]
    fn test_length_in_sequence_space() {
        let mut seg = TcpSegment::default();
        assert_eq!(seg.length_in_sequence_space(), 0);

        seg.header.flags |= TcpFlags::SYN;
        assert_eq!(seg.length_in_sequence_space(), 1);

        seg.payload = b"hello".to_vec();
        assert_eq!(seg.length_in_sequence_space(), 6);

        seg.header.flags |= TcpFlags::FIN;
        assert_eq!(seg.length_in_sequence_space(), 7);
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let (src, dst) = addrs();
        let mut seg = TcpSegment::default();
        seg.header.src_port = 4242;
        seg.header.dst_port = 80;
        seg.header.seq_no = Wrap32::new(12345);
        seg.header.ack_no = Wrap32::new(67890);
        seg.header.flags = TcpFlags::ACK | TcpFlags::PSH;
        seg.header.window = 65535;
        seg.payload = b"riptide".to_vec();

        let bytes = seg.serialize(src, dst).unwrap();
        let parsed = TcpSegment::parse(&bytes, src, dst).unwrap();

        assert_eq!(parsed.payload, seg.payload);
        assert_eq!(parsed.header.seq_no, seg.header.seq_no);
        assert_eq!(parsed.header.flags, seg.header.flags);

        // The wire checksum verifies to zero
        assert_eq!(TcpSegment::checksum(&bytes, src, dst), 0);
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let (src, dst) = addrs();
        let mut seg = TcpSegment::default();
        seg.header.flags = TcpFlags::ACK;
        seg.payload = b"abcdef".to_vec();

        let mut bytes = seg.serialize(src, dst).unwrap();
        bytes[22] ^= 0xff; // Flip a payload byte

        let err = TcpSegment::parse(&bytes, src, dst).unwrap_err();
        assert_eq!(err, HeaderError::BadChecksum("TCP".to_string()));
    }

    #[test]
    fn test_odd_length_payload_checksum() {
        let (src, dst) = addrs();
        let mut seg = TcpSegment::default();
        seg.header.flags = TcpFlags::ACK | TcpFlags::PSH;
        seg.payload = b"odd".to_vec();

        let bytes = seg.serialize(src, dst).unwrap();
        assert!(TcpSegment::parse(&bytes, src, dst).is_ok());
    }

    #[test]
    fn test_parse_rejects_wrong_pseudo_header() {
        let (src, dst) = addrs();
        let seg = TcpSegment::default();
        let bytes = seg.serialize(src, dst).unwrap();

        // Same bytes, different addresses: checksum no longer matches
        let other = Ipv4Addr::new(192, 168, 1, 1);
        assert!(TcpSegment::parse(&bytes, other, dst).is_err());
    }
}
