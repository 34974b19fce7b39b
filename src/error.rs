//! Errors returned by the decoder and the validator.

use crate::registry::ActionKind;

/// Reason an action (or an action list) was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OfpactError {
    #[error("unknown action type")]
    UnknownAction,
    #[error("unknown vendor id")]
    BadVendor,
    #[error("bad action length")]
    BadActionLength,
    #[error("bad action argument")]
    BadArgument,
    #[error("bad output port")]
    BadOutPort,
    #[error("too many actions")]
    TooManyActions,
}

/// Decoder failure, pointing at the wire entry that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("action {index} at offset {offset}: {error}")]
pub struct DecodeError {
    /// Index of the wire entry within the action list.
    pub index: usize,
    /// Byte offset of the entry's first byte.
    pub offset: usize,
    #[source]
    pub error: OfpactError,
}

/// Validator failure, pointing at the internal record that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("action {index} ({}): {error}", .kind.name())]
pub struct CheckError {
    pub index: usize,
    pub kind: ActionKind,
    #[source]
    pub error: OfpactError,
}
