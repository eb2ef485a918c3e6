use crate::link::ethernet::EthernetAddress;
use crate::packet::errors::HeaderError;
use std::net::Ipv4Addr;

pub const OPCODE_REQUEST: u16 = 1;
pub const OPCODE_REPLY: u16 = 2;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const ARP_MESSAGE_LEN: usize = 28;

/// An ARP message for the Ethernet/IPv4 binding
#[derive(Debug, Clone, PartialEq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_ethernet: EthernetAddress,
    pub sender_ip: Ipv4Addr,
    pub target_ethernet: EthernetAddress, // All zeroes in requests
    pub target_ip: Ipv4Addr,
}

impl ArpMessage {
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ARP_MESSAGE_LEN];

        buf[0..2].copy_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        buf[2..4].copy_from_slice(&PTYPE_IPV4.to_be_bytes());
        buf[4] = 6; // Hardware address length
        buf[5] = 4; // Protocol address length
        buf[6..8].copy_from_slice(&self.opcode.to_be_bytes());
        buf[8..14].copy_from_slice(&self.sender_ethernet.0);
        buf[14..18].copy_from_slice(&self.sender_ip.octets());
        buf[18..24].copy_from_slice(&self.target_ethernet.0);
        buf[24..28].copy_from_slice(&self.target_ip.octets());

        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < ARP_MESSAGE_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: ARP_MESSAGE_LEN,
                found: buf.len(),
            });
        }

        let htype = u16::from_be_bytes([buf[0], buf[1]]);
        if htype != HTYPE_ETHERNET {
            return Err(HeaderError::Unsupported {
                proto: "ARP",
                field: "htype",
                value: htype,
            });
        }

        let ptype = u16::from_be_bytes([buf[2], buf[3]]);
        if ptype != PTYPE_IPV4 {
            return Err(HeaderError::Unsupported {
                proto: "ARP",
                field: "ptype",
                value: ptype,
            });
        }

        if buf[4] != 6 || buf[5] != 4 {
            return Err(HeaderError::Unsupported {
                proto: "ARP",
                field: "address lengths",
                value: u16::from_be_bytes([buf[4], buf[5]]),
            });
        }

        let mut sender_ethernet = [0u8; 6];
        let mut target_ethernet = [0u8; 6];
        sender_ethernet.copy_from_slice(&buf[8..14]);
        target_ethernet.copy_from_slice(&buf[18..24]);

        Ok(ArpMessage {
            opcode: u16::from_be_bytes([buf[6], buf[7]]),
            sender_ethernet: EthernetAddress(sender_ethernet),
            sender_ip: Ipv4Addr::new(buf[14], buf[15], buf[16], buf[17]),
            target_ethernet: EthernetAddress(target_ethernet),
            target_ip: Ipv4Addr::new(buf[24], buf[25], buf[26], buf[27]),
        })
    }
}

// -- Unit tests --
