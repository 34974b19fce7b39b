//! Wire decoder: OpenFlow 1.0 and Nicira action entries to an [`Ofpacts`].
//!
//! Every entry is length-checked before anything inside it is trusted, so a bad length
//! never desynchronizes the walk. Decoding is all or nothing: the first bad entry aborts
//! and the partial list is dropped.

use crate::action::*;
use crate::builder::OfpactBuf;
use crate::config::DecodeLimits;
use crate::error::{DecodeError, OfpactError};
use crate::field::{MfField, Subfield};
use crate::layout;
use crate::record::Ofpacts;
use crate::registry::{ActionKind, WireCode, WireLen};
use crate::wire::*;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::io::Cursor;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// Decodes wire action lists under a set of [`DecodeLimits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    limits: DecodeLimits,
}

/// Decodes the first `actions_len` bytes of `wire` with default limits.
pub fn decode(wire: &[u8], actions_len: usize) -> Result<Ofpacts, DecodeError> {
    Decoder::default().decode(wire, actions_len)
}

impl Decoder {
    pub fn new(limits: DecodeLimits) -> Self {
        Decoder { limits }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Decodes the first `actions_len` bytes of `wire` as a sequence of action entries.
    pub fn decode(&self, wire: &[u8], actions_len: usize) -> Result<Ofpacts, DecodeError> {
        if actions_len % ACTION_ALIGN != 0 || actions_len > wire.len() {
            debug!(actions_len, available = wire.len(), "action list length is not a multiple of 8 or overruns input");
            return Err(DecodeError { index: 0, offset: 0, error: OfpactError::BadActionLength });
        }
        let data = &wire[..actions_len];
        let mut out = OfpactBuf::new();
        let mut offset = 0;
        let mut index = 0;
        while offset < data.len() {
            let fail = |error: OfpactError| {
                debug!(index, offset, %error, "rejecting action list");
                DecodeError { index, offset, error }
            };
            let entry = split_entry(&data[offset..]).map_err(fail)?;
            let (code, action) = decode_entry(entry).map_err(fail)?;
            let record_len = layout::record_len(&action);
            let total = round_up(out.len(), ACTION_ALIGN)
                + round_up(record_len, ACTION_ALIGN)
                + ActionKind::End.size();
            if record_len > u16::MAX as usize || total > self.limits.max_ofpacts_len {
                return Err(fail(OfpactError::TooManyActions));
            }
            trace!(index, offset, len = entry.len(), ?code, "decoded action");
            out.push_with_compat(&action, code);
            offset += entry.len();
            index += 1;
        }
        Ok(out.finish())
    }
}

/// Splits the next entry off `rest`, checking its declared length.
fn split_entry(rest: &[u8]) -> Result<&[u8], OfpactError> {
    if rest.len() < ACTION_HEADER_LEN {
        return Err(OfpactError::BadActionLength);
    }
    let len = BigEndian::read_u16(&rest[2..4]) as usize;
    if len < ACTION_HEADER_LEN || len % ACTION_ALIGN != 0 || len > rest.len() {
        return Err(OfpactError::BadActionLength);
    }
    Ok(&rest[..len])
}

/// Identifies an entry and checks its length against the wire table.
fn wire_code(entry: &[u8]) -> Result<WireCode, OfpactError> {
    let type_ = BigEndian::read_u16(&entry[0..2]);
    let code = if type_ == OFPAT10_VENDOR {
        if entry.len() < NX_HEADER_LEN {
            return Err(OfpactError::BadActionLength);
        }
        if BigEndian::read_u32(&entry[4..8]) != NX_VENDOR_ID {
            return Err(OfpactError::BadVendor);
        }
        WireCode::from_nx_subtype(BigEndian::read_u16(&entry[8..10])).ok_or(OfpactError::UnknownAction)?
    } else {
        WireCode::from_ofpat10(type_).ok_or(OfpactError::UnknownAction)?
    };
    let len_ok = match code.wire_len() {
        WireLen::Exactly(n) => entry.len() == n,
        WireLen::AtLeast(n) => entry.len() >= n,
    };
    if !len_ok {
        return Err(OfpactError::BadActionLength);
    }
    Ok(code)
}

/// Big-endian reader over one entry. Short reads are length errors.
struct WireReader<'a> {
    cur: Cursor<&'a [u8]>,
}

impl<'a> WireReader<'a> {
    fn at(entry: &'a [u8], pos: usize) -> Self {
        let mut cur = Cursor::new(entry);
        cur.set_position(pos as u64);
        WireReader { cur }
    }

    fn position(&self) -> usize {
        self.cur.position() as usize
    }

    fn remaining(&self) -> usize {
        self.cur.get_ref().len().saturating_sub(self.position())
    }

    fn u8(&mut self) -> Result<u8, OfpactError> {
        self.cur.read_u8().map_err(|_| OfpactError::BadActionLength)
    }

    fn u16(&mut self) -> Result<u16, OfpactError> {
        self.cur.read_u16::<BigEndian>().map_err(|_| OfpactError::BadActionLength)
    }

    fn u32(&mut self) -> Result<u32, OfpactError> {
        self.cur.read_u32::<BigEndian>().map_err(|_| OfpactError::BadActionLength)
    }

    fn u64(&mut self) -> Result<u64, OfpactError> {
        self.cur.read_u64::<BigEndian>().map_err(|_| OfpactError::BadActionLength)
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], OfpactError> {
        let data: &'a [u8] = *self.cur.get_ref();
        let pos = self.position();
        if n > self.remaining() {
            return Err(OfpactError::BadActionLength);
        }
        self.cur.set_position((pos + n) as u64);
        Ok(&data[pos..pos + n])
    }

    fn skip(&mut self, n: usize) -> Result<(), OfpactError> {
        self.bytes(n).map(|_| ())
    }

    /// Reads `n` bytes that must all be zero.
    fn zeros(&mut self, n: usize) -> Result<(), OfpactError> {
        if self.bytes(n)?.iter().any(|&b| b != 0) {
            return Err(OfpactError::BadArgument);
        }
        Ok(())
    }

    fn rest(&mut self) -> &'a [u8] {
        let data: &'a [u8] = *self.cur.get_ref();
        let pos = self.position().min(data.len());
        self.cur.set_position(data.len() as u64);
        &data[pos..]
    }
}

/// Resolves an NXM header and bit range, checking the range fits the field.
fn subfield(header: u32, ofs: u16, n_bits: u16, writable: bool) -> Result<Subfield, OfpactError> {
    let field = MfField::from_header(header).ok_or(OfpactError::BadArgument)?;
    let sf = Subfield::new(field, ofs, n_bits);
    if !sf.fits(field.n_bits()) || (writable && !field.is_writable()) {
        return Err(OfpactError::BadArgument);
    }
    Ok(sf)
}

fn subfield_ofs_nbits(header: u32, ofs_nbits: u16, writable: bool) -> Result<Subfield, OfpactError> {
    let (ofs, n_bits) = decode_ofs_nbits(ofs_nbits);
    subfield(header, ofs, n_bits, writable)
}

fn check_output_port(port: u16) -> Result<(), OfpactError> {
    if port < OFPP_MAX || is_reserved_output_port(port) {
        Ok(())
    } else {
        Err(OfpactError::BadOutPort)
    }
}

/// Bits needed to number `n` links.
fn min_bits_for_links(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}

fn decode_entry(entry: &[u8]) -> Result<(WireCode, Action), OfpactError> {
    let code = wire_code(entry)?;
    let body_start = if BigEndian::read_u16(&entry[0..2]) == OFPAT10_VENDOR { 10 } else { 4 };
    let mut r = WireReader::at(entry, body_start);
    let action = match code {
        WireCode::None => return Err(OfpactError::UnknownAction),
        WireCode::Output10 => {
            let port = r.u16()?;
            let max_len = r.u16()?;
            check_output_port(port)?;
            Action::Output(Output { port, max_len })
        }
        WireCode::SetVlanVid10 => {
            let vid = r.u16()?;
            if vid & !0x0fff != 0 {
                return Err(OfpactError::BadArgument);
            }
            Action::SetVlanVid(vid)
        }
        WireCode::SetVlanPcp10 => {
            let pcp = r.u8()?;
            if pcp & !0x07 != 0 {
                return Err(OfpactError::BadArgument);
            }
            Action::SetVlanPcp(pcp)
        }
        WireCode::StripVlan10 => Action::StripVlan,
        WireCode::SetDlSrc10 | WireCode::SetDlDst10 => {
            let mut mac = [0u8; 6];
            mac.copy_from_slice(r.bytes(6)?);
            if code == WireCode::SetDlSrc10 {
                Action::SetEthSrc(mac)
            } else {
                Action::SetEthDst(mac)
            }
        }
        WireCode::SetNwSrc10 => Action::SetIpv4Src(Ipv4Addr::from(r.u32()?)),
        WireCode::SetNwDst10 => Action::SetIpv4Dst(Ipv4Addr::from(r.u32()?)),
        WireCode::SetNwTos10 => {
            let tos = r.u8()?;
            // The ECN bits are not ours to set.
            if tos & 0x03 != 0 {
                return Err(OfpactError::BadArgument);
            }
            Action::SetIpv4Dscp(tos)
        }
        WireCode::SetTpSrc10 => Action::SetL4SrcPort(r.u16()?),
        WireCode::SetTpDst10 => Action::SetL4DstPort(r.u16()?),
        WireCode::Enqueue10 => {
            let port = r.u16()?;
            r.skip(6)?;
            let queue = r.u32()?;
            if port >= OFPP_MAX && port != OFPP_IN_PORT && port != OFPP_LOCAL {
                return Err(OfpactError::BadOutPort);
            }
            Action::Enqueue(Enqueue { port, queue })
        }
        WireCode::NxResubmit => {
            let in_port = r.u16()?;
            Action::Resubmit(Resubmit { in_port, table_id: 255 })
        }
        WireCode::NxResubmitTable => {
            let in_port = r.u16()?;
            let table_id = r.u8()?;
            r.zeros(3)?;
            Action::Resubmit(Resubmit { in_port, table_id })
        }
        WireCode::NxSetTunnel => {
            r.skip(2)?;
            Action::SetTunnel(r.u32()? as u64)
        }
        WireCode::NxSetTunnel64 => {
            r.skip(6)?;
            Action::SetTunnel(r.u64()?)
        }
        WireCode::NxSetQueue => {
            r.skip(2)?;
            Action::SetQueue(r.u32()?)
        }
        WireCode::NxPopQueue => Action::PopQueue,
        WireCode::NxExit => Action::Exit,
        WireCode::NxDecTtl => Action::DecTtl,
        WireCode::NxRegMove => {
            let n_bits = r.u16()?;
            let src_ofs = r.u16()?;
            let dst_ofs = r.u16()?;
            let src = r.u32()?;
            let dst = r.u32()?;
            Action::RegMove(RegMove {
                src: subfield(src, src_ofs, n_bits, false)?,
                dst: subfield(dst, dst_ofs, n_bits, true)?,
            })
        }
        WireCode::NxRegLoad => {
            let ofs_nbits = r.u16()?;
            let dst = subfield_ofs_nbits(r.u32()?, ofs_nbits, true)?;
            let value = r.u64()?;
            if dst.n_bits < 64 && value >> dst.n_bits != 0 {
                return Err(OfpactError::BadArgument);
            }
            Action::RegLoad(RegLoad { dst, value })
        }
        WireCode::NxNote => Action::Note(r.rest().to_vec()),
        WireCode::NxMultipath => {
            let fields = HashFields::from_u16(r.u16()?).ok_or(OfpactError::BadArgument)?;
            let basis = r.u16()?;
            r.skip(2)?;
            let algorithm = MultipathAlgorithm::from_u16(r.u16()?).ok_or(OfpactError::BadArgument)?;
            let max_link = r.u16()?;
            let arg = r.u32()?;
            r.skip(2)?;
            let ofs_nbits = r.u16()?;
            let dst = subfield_ofs_nbits(r.u32()?, ofs_nbits, true)?;
            if (dst.n_bits as u32) < min_bits_for_links(max_link as u32 + 1) {
                return Err(OfpactError::BadArgument);
            }
            Action::Multipath(Multipath { fields, basis, algorithm, max_link, arg, dst })
        }
        WireCode::NxAutopath => {
            let ofs_nbits = r.u16()?;
            let dst = subfield_ofs_nbits(r.u32()?, ofs_nbits, true)?;
            let port = r.u32()?;
            if dst.n_bits < 16 {
                return Err(OfpactError::BadArgument);
            }
            Action::Autopath(Autopath { dst, port })
        }
        WireCode::NxBundle | WireCode::NxBundleLoad => decode_bundle(code, &mut r)?,
        WireCode::NxOutputReg => {
            let ofs_nbits = r.u16()?;
            let src = subfield_ofs_nbits(r.u32()?, ofs_nbits, false)?;
            let max_len = r.u16()?;
            r.zeros(6)?;
            Action::OutputReg(OutputReg { src, max_len })
        }
        WireCode::NxLearn => decode_learn(&mut r)?,
        WireCode::NxFinTimeout => Action::FinTimeout(FinTimeout {
            fin_idle_timeout: r.u16()?,
            fin_hard_timeout: r.u16()?,
        }),
        WireCode::NxController => {
            let max_len = r.u16()?;
            let controller_id = r.u16()?;
            let reason = PacketInReason::from_u8(r.u8()?).ok_or(OfpactError::BadArgument)?;
            Action::Controller(Controller { max_len, controller_id, reason })
        }
    };
    Ok((code, action))
}

fn decode_bundle(code: WireCode, r: &mut WireReader) -> Result<Action, OfpactError> {
    let algorithm = BundleAlgorithm::from_u16(r.u16()?).ok_or(OfpactError::BadArgument)?;
    let fields = HashFields::from_u16(r.u16()?).ok_or(OfpactError::BadArgument)?;
    let basis = r.u16()?;
    let slave_type = r.u32()?;
    let n_slaves = r.u16()? as usize;
    let ofs_nbits = r.u16()?;
    let dst_header = r.u32()?;
    r.zeros(4)?;

    if slave_type != MfField::InPort.header() || n_slaves > BUNDLE_MAX_SLAVES {
        return Err(OfpactError::BadArgument);
    }
    let dst = if code == WireCode::NxBundleLoad {
        Some(subfield_ofs_nbits(dst_header, ofs_nbits, true)?)
    } else {
        if ofs_nbits != 0 || dst_header != 0 {
            return Err(OfpactError::BadArgument);
        }
        None
    };
    if n_slaves * 2 > r.remaining() {
        return Err(OfpactError::BadActionLength);
    }
    let mut slaves = Vec::with_capacity(n_slaves);
    for _ in 0..n_slaves {
        let port = r.u16()?;
        check_output_port(port)?;
        // A slave cannot carry a max_len, so the controller is not a usable slave.
        if port == OFPP_CONTROLLER {
            return Err(OfpactError::BadOutPort);
        }
        slaves.push(port);
    }
    Ok(Action::Bundle(Bundle { algorithm, fields, basis, dst, slaves }))
}

fn decode_learn(r: &mut WireReader) -> Result<Action, OfpactError> {
    let idle_timeout = r.u16()?;
    let hard_timeout = r.u16()?;
    let priority = r.u16()?;
    let cookie = r.u64()?;
    let flags = r.u16()?;
    let table_id = r.u8()?;
    r.zeros(1)?;
    let fin_idle_timeout = r.u16()?;
    let fin_hard_timeout = r.u16()?;
    if table_id == 0xff || flags & !OFPFF_SEND_FLOW_REM != 0 {
        return Err(OfpactError::BadArgument);
    }

    let mut specs = Vec::new();
    while r.remaining() >= 2 {
        let header = r.u16()?;
        if header == 0 {
            break;
        }
        specs.push(decode_learn_spec(header, r)?);
    }
    if r.rest().iter().any(|&b| b != 0) {
        return Err(OfpactError::BadArgument);
    }
    Ok(Action::Learn(Learn {
        idle_timeout,
        hard_timeout,
        priority,
        cookie,
        flags,
        table_id,
        fin_idle_timeout,
        fin_hard_timeout,
        specs,
    }))
}

fn decode_learn_spec(header: u16, r: &mut WireReader) -> Result<LearnSpec, OfpactError> {
    let n_bits = header & NX_LEARN_N_BITS_MASK;
    let src_type = header & NX_LEARN_SRC_MASK;
    let dst_type = header & NX_LEARN_DST_MASK;
    if header & !(NX_LEARN_N_BITS_MASK | NX_LEARN_SRC_MASK | NX_LEARN_DST_MASK) != 0
        || n_bits == 0
        || dst_type == NX_LEARN_DST_RESERVED
        || (src_type == NX_LEARN_SRC_IMMEDIATE && (dst_type == NX_LEARN_DST_OUTPUT || n_bits > 128))
    {
        return Err(OfpactError::BadArgument);
    }

    let src_len = if src_type == NX_LEARN_SRC_FIELD { 6 } else { learn_imm_len(n_bits) };
    let dst_len = if dst_type == NX_LEARN_DST_OUTPUT { 0 } else { 6 };
    if r.remaining() < src_len + dst_len {
        return Err(OfpactError::BadActionLength);
    }

    let src = if src_type == NX_LEARN_SRC_FIELD {
        let header = r.u32()?;
        let ofs = r.u16()?;
        LearnSrc::Field(subfield(header, ofs, n_bits, false)?)
    } else {
        let imm = r.bytes(src_len)?.iter().fold(0u128, |v, &b| (v << 8) | b as u128);
        LearnSrc::Immediate(imm)
    };

    let dst = match dst_type {
        NX_LEARN_DST_OUTPUT => LearnDst::Output,
        _ => {
            let header = r.u32()?;
            let ofs = r.u16()?;
            if dst_type == NX_LEARN_DST_MATCH {
                LearnDst::Match(subfield(header, ofs, n_bits, false)?)
            } else {
                LearnDst::Load(subfield(header, ofs, n_bits, true)?)
            }
        }
    };
    Ok(LearnSpec { n_bits, src, dst })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn entry_lengths_are_checked_before_use() {
        assert_eq!(split_entry(&[0, 0, 0]), Err(OfpactError::BadActionLength));
        assert_eq!(split_entry(&[0, 0, 0, 4, 0, 0, 0, 0]), Err(OfpactError::BadActionLength));
        assert_eq!(split_entry(&[0, 0, 0, 12, 0, 0, 0, 0, 0, 0, 0, 0]), Err(OfpactError::BadActionLength));
        assert_eq!(split_entry(&[0, 0, 0, 16, 0, 0, 0, 0]), Err(OfpactError::BadActionLength));
        assert_eq!(split_entry(&[0, 0, 0, 8, 0, 1, 0, 0, 9]).map(|e| e.len()), Ok(8));
    }

    #[test]
    fn link_bits() {
        assert_eq!(min_bits_for_links(1), 0);
        assert_eq!(min_bits_for_links(2), 1);
        assert_eq!(min_bits_for_links(3), 2);
        assert_eq!(min_bits_for_links(4), 2);
        assert_eq!(min_bits_for_links(65536), 16);
    }

    #[test]
    fn vendor_entries_need_a_full_header() {
        let entry = [0xff, 0xff, 0, 8, 0, 0, 0x23, 0x20];
        assert_eq!(wire_code(&entry), Err(OfpactError::BadActionLength));
        let mut other = [0u8; 16];
        other[0..4].copy_from_slice(&[0xff, 0xff, 0, 16]);
        other[4..8].copy_from_slice(&0x1234u32.to_be_bytes());
        assert_eq!(wire_code(&other), Err(OfpactError::BadVendor));
    }

    #[test]
    fn immediate_is_right_aligned() {
        // n_bits 12, immediate -> match on NXM_OF_VLAN_TCI[0..11]
        let mut bytes = vec![0x0a, 0xbc];
        bytes.extend_from_slice(&MfField::VlanTci.header().to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        let mut r = WireReader::at(&bytes, 0);
        let spec = decode_learn_spec(NX_LEARN_SRC_IMMEDIATE | 12, &mut r).unwrap();
        assert_eq!(spec.src, LearnSrc::Immediate(0x0abc));
        assert_eq!(spec.dst, LearnDst::Match(Subfield::new(MfField::VlanTci, 0, 12)));
    }

    #[test]
    #[traced_test]
    fn rejection_is_logged() {
        let wire = [0x00, 0xee, 0x00, 0x08, 0, 0, 0, 0];
        let err = decode(&wire, wire.len()).unwrap_err();
        assert_eq!(err.error, OfpactError::UnknownAction);
        assert!(logs_contain("rejecting action list"));
    }

    #[test]
    #[traced_test]
    fn accepted_entries_are_traced() {
        let wire = [0x00, 0x00, 0x00, 0x08, 0x00, 0x01, 0x00, 0x00];
        assert!(decode(&wire, wire.len()).is_ok());
        assert!(logs_contain("decoded action"));
    }
}
