use std::fmt;
use std::ops::{Add, Sub};

/// A 32-bit sequence number, modulo 2^32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    /// The raw 32-bit value
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute `seq_no` given an `initial seq_no`
    pub fn wrap(n: u64, isn: Wrap32) -> Self {
        Wrap32::new(isn.value.wrapping_add((n & 0xFFFF_FFFF) as u32))
    }

    /// Unwrap into the absolute `seq_no` closest to the `checkpoint`.
    /// Ties break toward the larger candidate.
    pub fn unwrap(&self, isn: Wrap32, checkpoint: u64) -> u64 {
        let wrap_size: u64 = 1 << 32;
        let half_wrap: u64 = wrap_size / 2;

        // Offset of this value from the ISN
        let relative = self.value.wrapping_sub(isn.value) as u64;

        // Number of full wraps `k` that lands `relative + k * 2^32` closest to checkpoint
        let k = (checkpoint + half_wrap).saturating_sub(relative) / wrap_size;

        relative + k * wrap_size
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(rhs))
    }
}

impl Sub for Wrap32 {
    type Output = i32;

    /// The signed distance between two nearby sequence numbers
    fn sub(self, other: Wrap32) -> i32 {
        self.value.wrapping_sub(other.value) as i32
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// -- Unit tests --
