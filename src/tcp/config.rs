use crate::tcp::wrap32::Wrap32;

/// Tunables for a TCP connection endpoint
#[derive(Debug, Clone)]
pub struct TcpConfig {
    pub recv_capacity: usize,     // Receive-side stream capacity in bytes
    pub send_capacity: usize,     // Send-side stream capacity in bytes
    pub rt_timeout: u64,          // Initial retransmission timeout in ms
    pub fixed_isn: Option<Wrap32>, // Fixed ISN, for testing; random otherwise
}

impl TcpConfig {
    /// Max payload carried by one segment (Ethernet MTU minus headers)
    pub const MAX_PAYLOAD_SIZE: usize = 1452;

    /// Retransmissions tolerated before the connection gives up
    pub const MAX_RETX_ATTEMPTS: u32 = 8;

    /// Default stream capacity in bytes
    pub const DEFAULT_CAPACITY: usize = 64000;

    /// Default initial retransmission timeout in ms
    pub const TIMEOUT_DFLT: u64 = 1000;
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            recv_capacity: Self::DEFAULT_CAPACITY,
            send_capacity: Self::DEFAULT_CAPACITY,
            rt_timeout: Self::TIMEOUT_DFLT,
            fixed_isn: None,
        }
    }
}
