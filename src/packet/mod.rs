pub mod errors;
pub mod tcp_over_ip;

// -- Re-export structs for more concise usage

pub use errors::HeaderError;
pub use tcp_over_ip::{decapsulate, encapsulate};
