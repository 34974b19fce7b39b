//! Packed action lists.
//!
//! An [`Ofpacts`] owns a byte buffer of records laid out back to back. Every record
//! starts on an 8-byte boundary with a 4-byte [`RecordHeader`] (`kind u8, compat u8,
//! len u16`, native byte order), followed by the kind's body. `len` covers header and
//! body but not the zero padding up to the next boundary. The list always ends with
//! exactly one `End` record.
//!
//! There is no offset table: [`Iter`] walks the buffer from the first byte, advancing by
//! each record's padded length and checking bounds on every step. Lists can only be
//! produced by [`OfpactBuf::finish`](crate::builder::OfpactBuf::finish), which verifies
//! the whole layout, so iteration over an `Ofpacts` never meets a malformed record.

use crate::action::Action;
use crate::builder::OfpactBuf;
use crate::layout;
use crate::registry::{ActionKind, WireCode};
use crate::wire::{self, round_up, ACTION_ALIGN};
use byteorder::{ByteOrder, NativeEndian};
use std::fmt;

/// Bytes of [`RecordHeader`] at the start of every record.
pub const RECORD_HEADER_LEN: usize = 4;

/// Common header of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: ActionKind,
    /// Wire form the record was decoded from. Informational only; never used to pick
    /// the body layout.
    pub compat: WireCode,
    /// Header plus body, excluding padding.
    pub len: u16,
}

impl RecordHeader {
    pub(crate) fn write(&self, out: &mut [u8]) {
        out[0] = self.kind as u8;
        out[1] = self.compat as u8;
        NativeEndian::write_u16(&mut out[2..4], self.len);
    }

    pub(crate) fn read(data: &[u8]) -> Option<RecordHeader> {
        if data.len() < RECORD_HEADER_LEN {
            return None;
        }
        Some(RecordHeader {
            kind: ActionKind::from_u8(data[0])?,
            compat: WireCode::from_u8(data[1])?,
            len: NativeEndian::read_u16(&data[2..4]),
        })
    }

    /// Bytes the record occupies, padding included.
    pub fn padded_len(&self) -> usize {
        round_up(self.len as usize, ACTION_ALIGN)
    }
}

/// Checks that `data` is a well-formed list: aligned records, consistent lengths and
/// element counts, zero padding, and a single trailing `End`.
pub(crate) fn verify_layout(data: &[u8]) -> Result<(), String> {
    let mut pos = 0;
    loop {
        let header = RecordHeader::read(&data[pos.min(data.len())..])
            .ok_or_else(|| format!("offset {}: bad record header", pos))?;
        let len = header.len as usize;
        if len < header.kind.raw_size() {
            return Err(format!("offset {}: {} record shorter than its fixed part", pos, header.kind.name()));
        }
        let padded = header.padded_len();
        if pos + padded > data.len() {
            return Err(format!("offset {}: {} record overruns the list", pos, header.kind.name()));
        }
        if data[pos + len..pos + padded].iter().any(|&b| b != 0) {
            return Err(format!("offset {}: nonzero padding", pos));
        }
        if header.kind == ActionKind::End {
            if pos + padded != data.len() {
                return Err(format!("offset {}: data after end of list", pos));
            }
            return Ok(());
        }
        layout::read_action(header.kind, &data[pos + RECORD_HEADER_LEN..pos + len])
            .map_err(|e| format!("offset {}: {}", pos, e))?;
        pos += padded;
    }
}

/// One record of an [`Ofpacts`], borrowed from it.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    header: RecordHeader,
    index: usize,
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn kind(&self) -> ActionKind {
        self.header.kind
    }

    pub fn compat(&self) -> WireCode {
        self.header.compat
    }

    pub fn header(&self) -> RecordHeader {
        self.header
    }

    /// Position among the list's non-sentinel records.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the record within the list; always a multiple of 8.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Record length, header included, padding excluded.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// The kind's fixed part followed by any trailing elements.
    pub fn body(&self) -> &'a [u8] {
        &self.bytes[RECORD_HEADER_LEN..]
    }

    /// Typed view of the record.
    ///
    /// # Panics
    ///
    /// Never for records of an [`Ofpacts`]; their layout was verified when the list was
    /// finished.
    pub fn action(&self) -> Action {
        match layout::read_action(self.header.kind, self.body()) {
            Ok(action) => action,
            Err(e) => panic!("action list corrupted at offset {}: {}", self.offset, e),
        }
    }
}

impl<'a> fmt::Debug for Record<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Record")
            .field("offset", &self.offset)
            .field("compat", &self.header.compat)
            .field("action", &self.action())
            .finish()
    }
}

/// Cursor over the records of an [`Ofpacts`], stopping at the `End` sentinel.
#[derive(Clone)]
pub struct Iter<'a> {
    data: &'a [u8],
    pos: usize,
    index: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        let header = match RecordHeader::read(self.data.get(self.pos..)?) {
            Some(h) => h,
            None => panic!("action list corrupted at offset {}", self.pos),
        };
        if header.kind == ActionKind::End {
            return None;
        }
        let end = self.pos + header.len as usize;
        let next = self.pos + header.padded_len();
        if next > self.data.len() {
            panic!("action list corrupted at offset {}", self.pos);
        }
        let record = Record { header, index: self.index, offset: self.pos, bytes: &self.data[self.pos..end] };
        self.pos = next;
        self.index += 1;
        Some(record)
    }
}

/// An immutable, validated action list.
#[derive(Clone)]
pub struct Ofpacts {
    buf: Vec<u8>,
}

impl Ofpacts {
    /// Wraps a buffer already checked by [`verify_layout`].
    pub(crate) fn from_verified(buf: Vec<u8>) -> Self {
        Ofpacts { buf }
    }

    /// The empty list (just the sentinel); equivalent to `drop`.
    pub fn new() -> Self {
        OfpactBuf::new().finish()
    }

    pub fn from_actions<'a, I>(actions: I) -> Self
    where
        I: IntoIterator<Item = &'a Action>,
    {
        let mut buf = OfpactBuf::new();
        for a in actions {
            buf.push(a);
        }
        buf.finish()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { data: &self.buf, pos: 0, index: 0 }
    }

    /// Number of actions, not counting the sentinel.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// The packed records, sentinel and padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn actions(&self) -> Vec<Action> {
        self.iter().map(|r| r.action()).collect()
    }

    /// True if some action sends packets to `port`.
    pub fn outputs_to_port(&self, port: u16) -> bool {
        self.iter().any(|r| match r.action() {
            Action::Output(o) => o.port == port,
            Action::Enqueue(e) => e.port == port,
            Action::Controller(_) => port == wire::OFPP_CONTROLLER,
            _ => false,
        })
    }

    /// Structural comparison: same kinds and bodies in the same order. The `compat` tag
    /// and padding are ignored.
    pub fn equal(&self, other: &Ofpacts) -> bool {
        let mut a = self.iter();
        let mut b = other.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if x.kind() != y.kind() || x.body() != y.body() {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl Default for Ofpacts {
    fn default() -> Self {
        Ofpacts::new()
    }
}

impl PartialEq for Ofpacts {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for Ofpacts {}

impl fmt::Debug for Ofpacts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|r| r.action())).finish()
    }
}

impl<'a> IntoIterator for &'a Ofpacts {
    type Item = Record<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl<'a> FromIterator<&'a Action> for Ofpacts {
    fn from_iter<I: IntoIterator<Item = &'a Action>>(iter: I) -> Self {
        Ofpacts::from_actions(iter)
    }
}

/// Structural equality of two lists; see [`Ofpacts::equal`].
pub fn equal(a: &Ofpacts, b: &Ofpacts) -> bool {
    a.equal(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Bundle, BundleAlgorithm, HashFields};

    fn sample() -> Vec<Action> {
        vec![
            Action::output(1),
            Action::Bundle(Bundle {
                algorithm: BundleAlgorithm::Hrw,
                fields: HashFields::EthSrc,
                basis: 0,
                dst: None,
                slaves: vec![1, 2, 3],
            }),
            Action::Note(vec![1, 2, 3, 4, 5]),
            Action::DecTtl,
        ]
    }

    #[test]
    fn records_start_on_alignment_boundaries() {
        let list = Ofpacts::from_actions(&sample());
        assert_eq!(list.len(), 4);
        for r in list.iter() {
            assert_eq!(r.offset() % ACTION_ALIGN, 0);
            assert!(r.len() <= round_up(r.len(), ACTION_ALIGN));
            assert!(r.len() >= r.kind().raw_size());
        }
        assert_eq!(list.as_bytes().len() % ACTION_ALIGN, 0);
        assert!(verify_layout(list.as_bytes()).is_ok());
    }

    #[test]
    fn empty_list_is_just_the_sentinel() {
        let list = Ofpacts::new();
        assert!(list.is_empty());
        assert_eq!(list.as_bytes().len(), ActionKind::End.size());
        assert_eq!(RecordHeader::read(list.as_bytes()).map(|h| h.kind), Some(ActionKind::End));
    }

    #[test]
    fn iteration_is_restartable() {
        let list = Ofpacts::from_actions(&sample());
        let first: Vec<_> = list.iter().map(|r| r.offset()).collect();
        let second: Vec<_> = list.iter().map(|r| r.offset()).collect();
        assert_eq!(first, second);
        assert_eq!(list.actions(), sample());
    }

    #[test]
    fn verify_rejects_trailing_garbage_and_bad_padding() {
        let list = Ofpacts::from_actions(&sample());
        let mut extra = list.as_bytes().to_vec();
        extra.extend_from_slice(&[0u8; 8]);
        assert!(verify_layout(&extra).is_err());

        // Header, count and five data bytes: the record is 11 bytes, padded to 16.
        let note = Ofpacts::from_actions(&[Action::Note(vec![9; 5])]);
        let mut bad = note.as_bytes().to_vec();
        bad[12] = 0xff;
        assert!(verify_layout(&bad).is_err());
    }

    #[test]
    fn verify_rejects_count_mismatch() {
        let list = Ofpacts::from_actions(&[Action::Note(vec![1, 2, 3])]);
        let mut bad = list.as_bytes().to_vec();
        NativeEndian::write_u16(&mut bad[RECORD_HEADER_LEN..RECORD_HEADER_LEN + 2], 2);
        assert!(verify_layout(&bad).is_err());
    }

    #[test]
    fn outputs_to_port() {
        let list = Ofpacts::from_actions(&sample());
        assert!(list.outputs_to_port(1));
        assert!(!list.outputs_to_port(2));
    }
}
