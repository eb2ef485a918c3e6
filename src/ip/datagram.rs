use crate::ip::ip_header::Ipv4Header;
use crate::packet::errors::HeaderError;
use std::net::Ipv4Addr;

/// An IPv4 datagram: header plus payload
#[derive(Debug, Clone, PartialEq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    /// New datagram addressed from `src_ip` to `dst_ip` carrying `payload`
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, payload: Vec<u8>) -> Self {
        let mut header = Ipv4Header::default();
        header.src_ip = src_ip;
        header.dst_ip = dst_ip;
        Ipv4Datagram { header, payload }
    }

    /// Serialize into wire format, fixing up total_len and the header
    /// checksum. Always emits an option-free 20-byte header.
    pub fn serialize(&self) -> Result<Vec<u8>, HeaderError> {
        let mut header = self.header.clone();
        header.ihl = 5;
        header.total_len = (20 + self.payload.len()) as u16;

        let mut buf = vec![0u8; 20 + self.payload.len()];
        header.serialize(&mut buf[..20])?;
        buf[20..].copy_from_slice(&self.payload);

        Ok(buf)
    }

    /// Parse from wire format. The payload is bounded by total_len and
    /// starts after the options, if any.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        let header = Ipv4Header::parse(buf)?;

        let header_len = header.ihl as usize * 4;
        let total_len = header.total_len as usize;
        if total_len < header_len || buf.len() < total_len {
            return Err(HeaderError::BufferTooSmall {
                expected: total_len.max(header_len),
                found: buf.len(),
            });
        }

        let payload = buf[header_len..total_len].to_vec();
        Ok(Ipv4Datagram { header, payload })
    }
}

// -- Unit tests --
