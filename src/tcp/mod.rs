pub mod byte_stream;
pub mod config;
pub mod connection;
pub mod reassembler;
pub mod receiver;
pub mod segment;
pub mod sender;
pub mod tcp_flags;
pub mod tcp_header;
pub mod wrap32;

// -- Re-export structs for more concise usage

pub use byte_stream::ByteStream;
pub use config::TcpConfig;
pub use connection::TcpConnection;
pub use reassembler::StreamReassembler;
pub use receiver::TcpReceiver;
pub use segment::TcpSegment;
pub use sender::TcpSender;
pub use tcp_flags::TcpFlags;
pub use tcp_header::TcpHeader;
pub use wrap32::Wrap32;
