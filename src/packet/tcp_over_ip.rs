use crate::ip::datagram::Ipv4Datagram;
use crate::ip::ip_header::PROTO_TCP;
use crate::packet::errors::HeaderError;
use crate::tcp::segment::TcpSegment;
use std::net::Ipv4Addr;

/// Wrap a TCP segment in an IPv4 datagram. The TCP checksum is computed
/// against the pseudo-header built from `src_ip` and `dst_ip`.
pub fn encapsulate(
    seg: &TcpSegment,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
) -> Result<Ipv4Datagram, HeaderError> {
    let payload = seg.serialize(src_ip, dst_ip)?;
    Ok(Ipv4Datagram::new(src_ip, dst_ip, payload))
}

/// Unwrap a TCP segment from an IPv4 datagram, verifying protocol and
/// checksum against the datagram's own addresses
pub fn decapsulate(dgram: &Ipv4Datagram) -> Result<TcpSegment, HeaderError> {
    if dgram.header.protocol != PROTO_TCP {
        return Err(HeaderError::Unsupported {
            proto: "IP",
            field: "protocol",
            value: dgram.header.protocol as u16,
        });
    }

    TcpSegment::parse(&dgram.payload, dgram.header.src_ip, dgram.header.dst_ip)
}

// -- Unit tests --
