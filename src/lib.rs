pub mod ip;
pub mod link;
pub mod packet;
pub mod router;
pub mod tcp;

// -- Re-export the main types for more concise usage

pub use ip::Ipv4Datagram;
pub use link::NetworkInterface;
pub use router::Router;
pub use tcp::{ByteStream, StreamReassembler, TcpConfig, TcpConnection, TcpReceiver, TcpSender};
