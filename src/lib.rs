//! # ofpacts: OpenFlow action lists
//!
//! Decode, validate, compare, re-encode and print the action lists attached to flow
//! table entries. Wire input is OpenFlow 1.0 actions plus the Nicira vendor extensions;
//! internally every list is one packed buffer of 8-byte-aligned records.
//!
//! ## Pipeline
//!
//! - **Decode**: [`decode`] turns wire bytes into an [`Ofpacts`], checking every length
//!   and argument that can be checked without context. All or nothing.
//! - **Check**: [`check`] validates a list against a [`FlowContext`] (field widths and
//!   prerequisites) and the datapath's port bound.
//! - **Encode**: [`encode`] / [`to_openflow`] write the list back out. Only kinds with two
//!   wire forms consult the record's `compat` tag.
//! - **Compare and print**: [`equal`] (also `==`) and [`format`] (also `Display`).
//!
//! ## Building lists
//!
//! [`OfpactBuf`] appends records, either whole from a typed [`Action`] or field by field
//! with [`OfpactBuf::begin`] and [`OfpactBuf::fix_length`].
//!
//! ## Example
//!
//! ```
//! use ofpacts::{decode, to_openflow};
//!
//! // OFPAT10_OUTPUT to port 5
//! let wire = [0x00, 0x00, 0x00, 0x08, 0x00, 0x05, 0x00, 0x00];
//! let list = decode(&wire, wire.len()).unwrap();
//! assert_eq!(list.to_string(), "output:5");
//! assert_eq!(to_openflow(&list), wire);
//! ```

pub mod action;
pub mod builder;
pub mod check;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod field;
pub mod format;
mod layout;
pub mod record;
pub mod registry;
pub mod wire;

pub use action::Action;
pub use builder::{OfpactBuf, RecordHandle};
pub use check::{check, check_with};
pub use config::{CheckLimits, DecodeLimits};
pub use decode::{decode, Decoder};
pub use encode::{encode, to_openflow};
pub use error::{CheckError, DecodeError, OfpactError};
pub use field::{Flow, FlowContext, MfField, Subfield};
pub use format::format;
pub use record::{equal, Iter, Ofpacts, Record, RecordHeader};
pub use registry::{ActionKind, Layout, WireCode};
