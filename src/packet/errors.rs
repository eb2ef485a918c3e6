use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum HeaderError {
    #[error("Buffer too small: expected at least {expected} bytes, actual {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("Bad {0} checksum")]
    BadChecksum(String),

    #[error("Unsupported {proto} {field}: {value:#06x}")]
    Unsupported {
        proto: &'static str,
        field: &'static str,
        value: u16,
    },
}
