//! Limits applied by the decoder and the validator.

use crate::wire::OFPP_MAX;

/// Internal-list ceiling for [`Decoder`](crate::decode::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest internal action list (in bytes, padding and sentinel included) a single
    /// decode may produce before failing with `TooManyActions`.
    pub max_ofpacts_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits { max_ofpacts_len: u16::MAX as usize }
    }
}

/// Bounds used by [`check_with`](crate::check::check_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckLimits {
    /// Ports `0..max_ports` are physical ports; reserved logical ports are accepted separately.
    pub max_ports: u16,
    /// Tables `0..n_tables` exist. Table 255 always means "the current table".
    pub n_tables: u8,
}

impl CheckLimits {
    pub fn new(max_ports: u16) -> Self {
        CheckLimits { max_ports, n_tables: 255 }
    }
}

impl Default for CheckLimits {
    fn default() -> Self {
        CheckLimits::new(OFPP_MAX)
    }
}
