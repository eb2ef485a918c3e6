pub mod datagram;
pub mod ip_flags;
pub mod ip_header;

// -- Re-export structs for more concise usage

pub use datagram::Ipv4Datagram;
pub use ip_flags::IpFlags;
pub use ip_header::{Ipv4Header, PROTO_TCP};
