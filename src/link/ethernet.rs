use crate::packet::errors::HeaderError;
use std::fmt;

/// EtherType for IPv4 payloads
pub const TYPE_IPV4: u16 = 0x0800;
/// EtherType for ARP payloads
pub const TYPE_ARP: u16 = 0x0806;

/// Ethernet header size in bytes
pub const ETHERNET_HEADER_LEN: usize = 14;

/// A 6-byte Ethernet (hardware) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetAddress(pub [u8; 6]);

/// The broadcast address (FF:FF:FF:FF:FF:FF)
pub const ETHERNET_BROADCAST: EthernetAddress = EthernetAddress([0xff; 6]);

/// The all-zero address (00:00:00:00:00:00).
/// RFC 5227, 2.1.1: the target hardware address of an ARP request SHOULD be all zeroes.
pub const ETHERNET_ZERO: EthernetAddress = EthernetAddress([0x00; 6]);

impl fmt::Display for EthernetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ethertype: u16,
}

impl EthernetHeader {
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, HeaderError> {
        if buf.len() < ETHERNET_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: ETHERNET_HEADER_LEN,
                found: buf.len(),
            });
        }

        buf[0..6].copy_from_slice(&self.dst.0);
        buf[6..12].copy_from_slice(&self.src.0);
        buf[12..14].copy_from_slice(&self.ethertype.to_be_bytes());

        Ok(ETHERNET_HEADER_LEN)
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < ETHERNET_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: ETHERNET_HEADER_LEN,
                found: buf.len(),
            });
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);

        Ok(EthernetHeader {
            dst: EthernetAddress(dst),
            src: EthernetAddress(src),
            ethertype: u16::from_be_bytes([buf[12], buf[13]]),
        })
    }
}

/// An Ethernet frame: header plus payload
#[derive(Debug, Clone, PartialEq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn serialize(&self) -> Result<Vec<u8>, HeaderError> {
        let mut buf = vec![0u8; ETHERNET_HEADER_LEN + self.payload.len()];
        self.header.serialize(&mut buf[..ETHERNET_HEADER_LEN])?;
        buf[ETHERNET_HEADER_LEN..].copy_from_slice(&self.payload);
        Ok(buf)
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        let header = EthernetHeader::parse(buf)?;
        let payload = buf[ETHERNET_HEADER_LEN..].to_vec();
        Ok(EthernetFrame { header, payload })
    }
}

// -- Unit tests --
