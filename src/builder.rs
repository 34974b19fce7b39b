//! Incremental construction of action lists.
//!
//! [`OfpactBuf`] appends records one at a time. [`OfpactBuf::begin`] pads the buffer to
//! the next 8-byte boundary and appends a header plus a zeroed fixed part; the caller
//! fills the fixed part through [`OfpactBuf::fixed_mut`], appends trailing elements with
//! [`OfpactBuf::put`], then calls [`OfpactBuf::fix_length`] so the header covers
//! everything written since `begin`.
//!
//! Appending can reallocate the buffer, so a record is addressed by its [`RecordHandle`]
//! (an offset), never by a reference held across appends. Starting the next record or
//! finishing the list while the open record's length is stale is a programming error and
//! panics.

use crate::action::Action;
use crate::layout;
use crate::record::{verify_layout, Ofpacts, RecordHeader, RECORD_HEADER_LEN};
use crate::registry::{ActionKind, WireCode};
use crate::wire::{round_up, ACTION_ALIGN};
use byteorder::{ByteOrder, NativeEndian};

/// Position of a record inside an [`OfpactBuf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHandle {
    offset: usize,
}

impl RecordHandle {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Growable buffer of records under construction.
#[derive(Debug, Default)]
pub struct OfpactBuf {
    buf: Vec<u8>,
    open: Option<RecordHandle>,
}

impl OfpactBuf {
    pub fn new() -> Self {
        OfpactBuf::default()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Starts a record of `kind`. Its length is initially the kind's raw size.
    pub fn begin(&mut self, kind: ActionKind) -> RecordHandle {
        self.close_open();
        self.pad();
        let offset = self.buf.len();
        let raw_size = kind.raw_size();
        self.buf.resize(offset + raw_size, 0);
        let header = RecordHeader { kind, compat: WireCode::None, len: raw_size as u16 };
        header.write(&mut self.buf[offset..offset + RECORD_HEADER_LEN]);
        let handle = RecordHandle { offset };
        self.open = Some(handle);
        handle
    }

    /// Records the wire form the action came from.
    pub fn set_compat(&mut self, handle: RecordHandle, compat: WireCode) {
        self.buf[handle.offset + 1] = compat as u8;
    }

    /// The fixed part of the record at `handle`.
    pub fn fixed_mut(&mut self, handle: RecordHandle) -> &mut [u8] {
        let kind = self.kind_at(handle);
        let start = handle.offset + RECORD_HEADER_LEN;
        &mut self.buf[start..start + kind.fixed_len()]
    }

    /// Appends trailing bytes to the open record.
    pub fn put(&mut self, bytes: &[u8]) {
        assert!(self.open.is_some(), "put with no open record");
        self.buf.extend_from_slice(bytes);
    }

    /// Sets the length of the record at `handle` to cover everything appended since it
    /// began.
    ///
    /// # Panics
    ///
    /// If the record would exceed the 16-bit length field.
    pub fn fix_length(&mut self, handle: RecordHandle) {
        let len = self.buf.len() - handle.offset;
        assert!(len <= u16::MAX as usize, "record at offset {} is {} bytes long", handle.offset, len);
        NativeEndian::write_u16(&mut self.buf[handle.offset + 2..handle.offset + 4], len as u16);
    }

    /// Current length recorded in the header at `handle`.
    pub fn record_len(&self, handle: RecordHandle) -> usize {
        NativeEndian::read_u16(&self.buf[handle.offset + 2..handle.offset + 4]) as usize
    }

    /// Appends `action` as a complete record.
    pub fn push(&mut self, action: &Action) -> RecordHandle {
        self.push_with_compat(action, WireCode::None)
    }

    pub(crate) fn push_with_compat(&mut self, action: &Action, compat: WireCode) -> RecordHandle {
        let handle = self.begin(action.kind());
        self.set_compat(handle, compat);
        let mut fixed = Vec::with_capacity(action.kind().fixed_len());
        layout::write_fixed(action, &mut fixed);
        self.fixed_mut(handle).copy_from_slice(&fixed);
        let mut trailer = Vec::new();
        layout::write_trailer(action, &mut trailer);
        if !trailer.is_empty() {
            self.put(&trailer);
        }
        self.fix_length(handle);
        handle
    }

    /// Pads, appends the `End` sentinel and verifies the finished list.
    ///
    /// # Panics
    ///
    /// If the open record's length is stale or a record written through
    /// [`fixed_mut`](Self::fixed_mut) does not decode.
    pub fn finish(mut self) -> Ofpacts {
        self.begin(ActionKind::End);
        self.open = None;
        self.pad();
        if let Err(e) = verify_layout(&self.buf) {
            panic!("malformed action list: {}", e);
        }
        Ofpacts::from_verified(self.buf)
    }

    fn kind_at(&self, handle: RecordHandle) -> ActionKind {
        match ActionKind::from_u8(self.buf[handle.offset]) {
            Some(kind) => kind,
            None => panic!("no record at offset {}", handle.offset),
        }
    }

    fn close_open(&mut self) {
        if let Some(handle) = self.open.take() {
            let extent = self.buf.len() - handle.offset;
            let recorded = self.record_len(handle);
            assert_eq!(
                recorded, extent,
                "record at offset {} has stale length (fix_length not called)",
                handle.offset
            );
        }
    }

    fn pad(&mut self) {
        let padded = round_up(self.buf.len(), ACTION_ALIGN);
        self.buf.resize(padded, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Output;

    #[test]
    fn push_pads_between_records() {
        let mut buf = OfpactBuf::new();
        let a = buf.push(&Action::Note(vec![1, 2, 3]));
        let b = buf.push(&Action::output(7));
        assert_eq!(a.offset(), 0);
        assert_eq!(buf.record_len(a), RECORD_HEADER_LEN + 2 + 3);
        assert_eq!(b.offset(), 16);
        let list = buf.finish();
        assert_eq!(list.as_bytes().len(), 16 + 8 + 8);
        assert_eq!(list.actions(), vec![Action::Note(vec![1, 2, 3]), Action::output(7)]);
    }

    #[test]
    fn manual_record_with_fix_length() {
        let mut buf = OfpactBuf::new();
        let h = buf.begin(ActionKind::Note);
        NativeEndian::write_u16(&mut buf.fixed_mut(h)[0..2], 4);
        buf.put(&[0xde, 0xad]);
        buf.put(&[0xbe, 0xef]);
        buf.fix_length(h);
        assert_eq!(buf.record_len(h), RECORD_HEADER_LEN + 2 + 4);
        let list = buf.finish();
        assert_eq!(list.actions(), vec![Action::Note(vec![0xde, 0xad, 0xbe, 0xef])]);
    }

    #[test]
    fn fixed_record_needs_no_fixup() {
        let mut buf = OfpactBuf::new();
        let h = buf.begin(ActionKind::Output);
        NativeEndian::write_u16(&mut buf.fixed_mut(h)[0..2], 3);
        let list = buf.finish();
        assert_eq!(list.actions(), vec![Action::Output(Output { port: 3, max_len: 0 })]);
    }

    #[test]
    #[should_panic(expected = "stale length")]
    fn begin_rejects_stale_length() {
        let mut buf = OfpactBuf::new();
        let h = buf.begin(ActionKind::Note);
        NativeEndian::write_u16(&mut buf.fixed_mut(h)[0..2], 1);
        buf.put(&[1]);
        buf.begin(ActionKind::Exit);
    }

    #[test]
    #[should_panic(expected = "stale length")]
    fn finish_rejects_stale_length() {
        let mut buf = OfpactBuf::new();
        buf.begin(ActionKind::Note);
        buf.put(&[1, 2]);
        buf.finish();
    }

    #[test]
    fn compat_is_kept_but_ignored_by_equality() {
        let mut tagged = OfpactBuf::new();
        tagged.push_with_compat(&Action::SetTunnel(5), WireCode::NxSetTunnel64);
        let tagged = tagged.finish();
        let plain = Ofpacts::from_actions(&[Action::SetTunnel(5)]);
        assert_eq!(tagged.iter().next().map(|r| r.compat()), Some(WireCode::NxSetTunnel64));
        assert_eq!(tagged, plain);
    }
}
