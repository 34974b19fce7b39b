//! Host-native layout of record bodies.
//!
//! A record body is the kind's fixed part (exactly [`ActionKind::fixed_len`] bytes) followed,
//! for variable-length kinds, by the trailing elements. Scalars are stored in native byte
//! order with no inner padding. Subfields take 8 bytes: NXM header (0 when absent), offset,
//! width.

use crate::action::*;
use crate::field::{MfField, Subfield};
use crate::registry::{ActionKind, LEARN_SPEC_SIZE};
use byteorder::{ByteOrder, NativeEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::net::Ipv4Addr;

#[derive(Debug, thiserror::Error)]
pub(crate) enum LayoutError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt {0} record")]
    Corrupt(&'static str),
}

const LEARN_SRC_FIELD: u8 = 0;
const LEARN_SRC_IMMEDIATE: u8 = 1;
const LEARN_DST_MATCH: u8 = 0;
const LEARN_DST_LOAD: u8 = 1;
const LEARN_DST_OUTPUT: u8 = 2;

fn put_u8(w: &mut Vec<u8>, v: u8) {
    w.push(v);
}

fn put_u16(w: &mut Vec<u8>, v: u16) {
    let mut b = [0u8; 2];
    NativeEndian::write_u16(&mut b, v);
    w.extend_from_slice(&b);
}

fn put_u32(w: &mut Vec<u8>, v: u32) {
    let mut b = [0u8; 4];
    NativeEndian::write_u32(&mut b, v);
    w.extend_from_slice(&b);
}

fn put_u64(w: &mut Vec<u8>, v: u64) {
    let mut b = [0u8; 8];
    NativeEndian::write_u64(&mut b, v);
    w.extend_from_slice(&b);
}

fn put_u128(w: &mut Vec<u8>, v: u128) {
    let mut b = [0u8; 16];
    NativeEndian::write_u128(&mut b, v);
    w.extend_from_slice(&b);
}

fn put_subfield(w: &mut Vec<u8>, sf: Option<&Subfield>) {
    match sf {
        Some(sf) => {
            put_u32(w, sf.field.header());
            put_u16(w, sf.ofs);
            put_u16(w, sf.n_bits);
        }
        None => w.extend_from_slice(&[0u8; 8]),
    }
}

/// Appends the fixed part of `action`.
pub(crate) fn write_fixed(action: &Action, w: &mut Vec<u8>) {
    match action {
        Action::Output(o) => {
            put_u16(w, o.port);
            put_u16(w, o.max_len);
        }
        Action::Controller(c) => {
            put_u16(w, c.max_len);
            put_u16(w, c.controller_id);
            put_u8(w, c.reason as u8);
        }
        Action::Enqueue(e) => {
            put_u16(w, e.port);
            put_u32(w, e.queue);
        }
        Action::OutputReg(o) => {
            put_subfield(w, Some(&o.src));
            put_u16(w, o.max_len);
        }
        Action::Bundle(b) => {
            put_u16(w, b.algorithm as u16);
            put_u16(w, b.fields as u16);
            put_u16(w, b.basis);
            put_subfield(w, b.dst.as_ref());
            put_u16(w, b.slaves.len() as u16);
        }
        Action::SetVlanVid(vid) => put_u16(w, *vid),
        Action::SetVlanPcp(pcp) => put_u8(w, *pcp),
        Action::SetEthSrc(mac) | Action::SetEthDst(mac) => w.extend_from_slice(mac),
        Action::SetIpv4Src(ip) | Action::SetIpv4Dst(ip) => put_u32(w, u32::from(*ip)),
        Action::SetIpv4Dscp(dscp) => put_u8(w, *dscp),
        Action::SetL4SrcPort(port) | Action::SetL4DstPort(port) => put_u16(w, *port),
        Action::RegMove(m) => {
            put_subfield(w, Some(&m.src));
            put_subfield(w, Some(&m.dst));
        }
        Action::RegLoad(l) => {
            put_subfield(w, Some(&l.dst));
            put_u64(w, l.value);
        }
        Action::SetTunnel(tun_id) => put_u64(w, *tun_id),
        Action::SetQueue(queue) => put_u32(w, *queue),
        Action::FinTimeout(t) => {
            put_u16(w, t.fin_idle_timeout);
            put_u16(w, t.fin_hard_timeout);
        }
        Action::Resubmit(r) => {
            put_u16(w, r.in_port);
            put_u8(w, r.table_id);
        }
        Action::Learn(l) => {
            put_u16(w, l.idle_timeout);
            put_u16(w, l.hard_timeout);
            put_u16(w, l.priority);
            put_u64(w, l.cookie);
            put_u16(w, l.flags);
            put_u8(w, l.table_id);
            put_u16(w, l.fin_idle_timeout);
            put_u16(w, l.fin_hard_timeout);
            put_u16(w, l.specs.len() as u16);
        }
        Action::Multipath(m) => {
            put_u16(w, m.fields as u16);
            put_u16(w, m.basis);
            put_u16(w, m.algorithm as u16);
            put_u16(w, m.max_link);
            put_u32(w, m.arg);
            put_subfield(w, Some(&m.dst));
        }
        Action::Autopath(a) => {
            put_subfield(w, Some(&a.dst));
            put_u32(w, a.port);
        }
        Action::Note(data) => put_u16(w, data.len() as u16),
        Action::StripVlan | Action::DecTtl | Action::PopQueue | Action::Exit => {}
    }
}

/// Appends the trailing elements of a variable-length `action`; no-op for fixed kinds.
pub(crate) fn write_trailer(action: &Action, w: &mut Vec<u8>) {
    match action {
        Action::Bundle(b) => {
            for slave in &b.slaves {
                put_u16(w, *slave);
            }
        }
        Action::Learn(l) => {
            for spec in &l.specs {
                write_learn_spec(spec, w);
            }
        }
        Action::Note(data) => w.extend_from_slice(data),
        _ => {}
    }
}

/// Unpadded record length `action` needs, header included.
pub(crate) fn record_len(action: &Action) -> usize {
    let trailer = match action {
        Action::Bundle(b) => b.slaves.len() * 2,
        Action::Learn(l) => l.specs.len() * LEARN_SPEC_SIZE,
        Action::Note(data) => data.len(),
        _ => 0,
    };
    action.kind().raw_size() + trailer
}

/// Appends one learn spec element (`LEARN_SPEC_SIZE` bytes). Both subfields keep their
/// own width so a spec whose source and destination disagree survives the round trip.
pub(crate) fn write_learn_spec(spec: &LearnSpec, w: &mut Vec<u8>) {
    let (src_type, src_sf, imm) = match spec.src {
        LearnSrc::Field(sf) => (LEARN_SRC_FIELD, Some(sf), 0),
        LearnSrc::Immediate(v) => (LEARN_SRC_IMMEDIATE, None, v),
    };
    let (dst_type, dst_sf) = match spec.dst {
        LearnDst::Match(sf) => (LEARN_DST_MATCH, Some(sf)),
        LearnDst::Load(sf) => (LEARN_DST_LOAD, Some(sf)),
        LearnDst::Output => (LEARN_DST_OUTPUT, None),
    };
    put_u16(w, spec.n_bits);
    put_u8(w, src_type);
    put_u8(w, dst_type);
    put_subfield(w, src_sf.as_ref());
    put_subfield(w, dst_sf.as_ref());
    w.extend_from_slice(&[0u8; 4]);
    put_u128(w, imm);
}

fn get_subfield(r: &mut Cursor<&[u8]>) -> Result<Option<Subfield>, LayoutError> {
    let header = r.read_u32::<NativeEndian>()?;
    let ofs = r.read_u16::<NativeEndian>()?;
    let n_bits = r.read_u16::<NativeEndian>()?;
    if header == 0 {
        return Ok(None);
    }
    let field = MfField::from_header(header).ok_or(LayoutError::Corrupt("subfield"))?;
    Ok(Some(Subfield { field, ofs, n_bits }))
}

fn get_required_subfield(r: &mut Cursor<&[u8]>) -> Result<Subfield, LayoutError> {
    get_subfield(r)?.ok_or(LayoutError::Corrupt("subfield"))
}

fn get_learn_spec(r: &mut Cursor<&[u8]>) -> Result<LearnSpec, LayoutError> {
    let n_bits = r.read_u16::<NativeEndian>()?;
    let src_type = r.read_u8()?;
    let dst_type = r.read_u8()?;
    let src_sf = get_subfield(r)?;
    let dst_sf = get_subfield(r)?;
    r.read_u32::<NativeEndian>()?;
    let imm = r.read_u128::<NativeEndian>()?;
    let corrupt = || LayoutError::Corrupt("learn");
    let src = match src_type {
        LEARN_SRC_FIELD => LearnSrc::Field(src_sf.ok_or_else(corrupt)?),
        LEARN_SRC_IMMEDIATE => LearnSrc::Immediate(imm),
        _ => return Err(corrupt()),
    };
    let dst = match dst_type {
        LEARN_DST_MATCH => LearnDst::Match(dst_sf.ok_or_else(corrupt)?),
        LEARN_DST_LOAD => LearnDst::Load(dst_sf.ok_or_else(corrupt)?),
        LEARN_DST_OUTPUT => LearnDst::Output,
        _ => return Err(corrupt()),
    };
    Ok(LearnSpec { n_bits, src, dst })
}

/// Rebuilds the typed action of a record body. `body` excludes the record header and padding.
pub(crate) fn read_action(kind: ActionKind, body: &[u8]) -> Result<Action, LayoutError> {
    let fixed_len = kind.fixed_len();
    if body.len() < fixed_len {
        return Err(LayoutError::Corrupt(kind.name()));
    }
    let trailer = &body[fixed_len..];
    if !kind.is_variable() && !trailer.is_empty() {
        return Err(LayoutError::Corrupt(kind.name()));
    }
    let mut r = Cursor::new(&body[..fixed_len]);
    let action = match kind {
        ActionKind::End => return Err(LayoutError::Corrupt(kind.name())),
        ActionKind::Output => Action::Output(Output {
            port: r.read_u16::<NativeEndian>()?,
            max_len: r.read_u16::<NativeEndian>()?,
        }),
        ActionKind::Controller => {
            let max_len = r.read_u16::<NativeEndian>()?;
            let controller_id = r.read_u16::<NativeEndian>()?;
            let reason = PacketInReason::from_u8(r.read_u8()?).ok_or(LayoutError::Corrupt(kind.name()))?;
            Action::Controller(Controller { max_len, controller_id, reason })
        }
        ActionKind::Enqueue => Action::Enqueue(Enqueue {
            port: r.read_u16::<NativeEndian>()?,
            queue: r.read_u32::<NativeEndian>()?,
        }),
        ActionKind::OutputReg => Action::OutputReg(OutputReg {
            src: get_required_subfield(&mut r)?,
            max_len: r.read_u16::<NativeEndian>()?,
        }),
        ActionKind::Bundle => {
            let corrupt = || LayoutError::Corrupt("BUNDLE");
            let algorithm = BundleAlgorithm::from_u16(r.read_u16::<NativeEndian>()?).ok_or_else(corrupt)?;
            let fields = HashFields::from_u16(r.read_u16::<NativeEndian>()?).ok_or_else(corrupt)?;
            let basis = r.read_u16::<NativeEndian>()?;
            let dst = get_subfield(&mut r)?;
            let n_slaves = r.read_u16::<NativeEndian>()? as usize;
            if trailer.len() != n_slaves * 2 {
                return Err(corrupt());
            }
            let mut t = Cursor::new(trailer);
            let mut slaves = Vec::with_capacity(n_slaves);
            for _ in 0..n_slaves {
                slaves.push(t.read_u16::<NativeEndian>()?);
            }
            Action::Bundle(Bundle { algorithm, fields, basis, dst, slaves })
        }
        ActionKind::SetVlanVid => Action::SetVlanVid(r.read_u16::<NativeEndian>()?),
        ActionKind::SetVlanPcp => Action::SetVlanPcp(r.read_u8()?),
        ActionKind::StripVlan => Action::StripVlan,
        ActionKind::SetEthSrc | ActionKind::SetEthDst => {
            let mut mac = [0u8; 6];
            r.read_exact(&mut mac)?;
            if kind == ActionKind::SetEthSrc {
                Action::SetEthSrc(mac)
            } else {
                Action::SetEthDst(mac)
            }
        }
        ActionKind::SetIpv4Src => Action::SetIpv4Src(Ipv4Addr::from(r.read_u32::<NativeEndian>()?)),
        ActionKind::SetIpv4Dst => Action::SetIpv4Dst(Ipv4Addr::from(r.read_u32::<NativeEndian>()?)),
        ActionKind::SetIpv4Dscp => Action::SetIpv4Dscp(r.read_u8()?),
        ActionKind::SetL4SrcPort => Action::SetL4SrcPort(r.read_u16::<NativeEndian>()?),
        ActionKind::SetL4DstPort => Action::SetL4DstPort(r.read_u16::<NativeEndian>()?),
        ActionKind::RegMove => Action::RegMove(RegMove {
            src: get_required_subfield(&mut r)?,
            dst: get_required_subfield(&mut r)?,
        }),
        ActionKind::RegLoad => Action::RegLoad(RegLoad {
            dst: get_required_subfield(&mut r)?,
            value: r.read_u64::<NativeEndian>()?,
        }),
        ActionKind::DecTtl => Action::DecTtl,
        ActionKind::SetTunnel => Action::SetTunnel(r.read_u64::<NativeEndian>()?),
        ActionKind::SetQueue => Action::SetQueue(r.read_u32::<NativeEndian>()?),
        ActionKind::PopQueue => Action::PopQueue,
        ActionKind::FinTimeout => Action::FinTimeout(FinTimeout {
            fin_idle_timeout: r.read_u16::<NativeEndian>()?,
            fin_hard_timeout: r.read_u16::<NativeEndian>()?,
        }),
        ActionKind::Resubmit => Action::Resubmit(Resubmit {
            in_port: r.read_u16::<NativeEndian>()?,
            table_id: r.read_u8()?,
        }),
        ActionKind::Learn => {
            let idle_timeout = r.read_u16::<NativeEndian>()?;
            let hard_timeout = r.read_u16::<NativeEndian>()?;
            let priority = r.read_u16::<NativeEndian>()?;
            let cookie = r.read_u64::<NativeEndian>()?;
            let flags = r.read_u16::<NativeEndian>()?;
            let table_id = r.read_u8()?;
            let fin_idle_timeout = r.read_u16::<NativeEndian>()?;
            let fin_hard_timeout = r.read_u16::<NativeEndian>()?;
            let n_specs = r.read_u16::<NativeEndian>()? as usize;
            if trailer.len() != n_specs * LEARN_SPEC_SIZE {
                return Err(LayoutError::Corrupt("LEARN"));
            }
            let mut t = Cursor::new(trailer);
            let mut specs = Vec::with_capacity(n_specs);
            for _ in 0..n_specs {
                specs.push(get_learn_spec(&mut t)?);
            }
            Action::Learn(Learn {
                idle_timeout,
                hard_timeout,
                priority,
                cookie,
                flags,
                table_id,
                fin_idle_timeout,
                fin_hard_timeout,
                specs,
            })
        }
        ActionKind::Multipath => {
            let corrupt = || LayoutError::Corrupt("MULTIPATH");
            let fields = HashFields::from_u16(r.read_u16::<NativeEndian>()?).ok_or_else(corrupt)?;
            let basis = r.read_u16::<NativeEndian>()?;
            let algorithm = MultipathAlgorithm::from_u16(r.read_u16::<NativeEndian>()?).ok_or_else(corrupt)?;
            let max_link = r.read_u16::<NativeEndian>()?;
            let arg = r.read_u32::<NativeEndian>()?;
            let dst = get_required_subfield(&mut r)?;
            Action::Multipath(Multipath { fields, basis, algorithm, max_link, arg, dst })
        }
        ActionKind::Autopath => Action::Autopath(Autopath {
            dst: get_required_subfield(&mut r)?,
            port: r.read_u32::<NativeEndian>()?,
        }),
        ActionKind::Note => {
            let length = r.read_u16::<NativeEndian>()? as usize;
            if trailer.len() != length {
                return Err(LayoutError::Corrupt("NOTE"));
            }
            Action::Note(trailer.to_vec())
        }
        ActionKind::Exit => Action::Exit,
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Layout;

    fn one_of_each() -> Vec<Action> {
        let reg = Subfield::whole(MfField::Reg(0));
        vec![
            Action::output(1),
            Action::Controller(Controller { max_len: 1, controller_id: 2, reason: PacketInReason::NoMatch }),
            Action::Enqueue(Enqueue { port: 1, queue: 2 }),
            Action::OutputReg(OutputReg { src: reg, max_len: 0 }),
            Action::Bundle(Bundle {
                algorithm: BundleAlgorithm::Hrw,
                fields: HashFields::EthSrc,
                basis: 0,
                dst: Some(reg),
                slaves: vec![1, 2],
            }),
            Action::SetVlanVid(1),
            Action::SetVlanPcp(1),
            Action::StripVlan,
            Action::SetEthSrc([1; 6]),
            Action::SetEthDst([2; 6]),
            Action::SetIpv4Src(Ipv4Addr::new(1, 2, 3, 4)),
            Action::SetIpv4Dst(Ipv4Addr::new(4, 3, 2, 1)),
            Action::SetIpv4Dscp(4),
            Action::SetL4SrcPort(1),
            Action::SetL4DstPort(2),
            Action::RegMove(RegMove { src: reg, dst: Subfield::whole(MfField::Reg(1)) }),
            Action::RegLoad(RegLoad { dst: reg, value: 7 }),
            Action::DecTtl,
            Action::SetTunnel(9),
            Action::SetQueue(3),
            Action::PopQueue,
            Action::FinTimeout(FinTimeout { fin_idle_timeout: 1, fin_hard_timeout: 2 }),
            Action::Resubmit(Resubmit { in_port: 1, table_id: 2 }),
            Action::Learn(Learn {
                specs: vec![LearnSpec { n_bits: 32, src: LearnSrc::Immediate(5), dst: LearnDst::Load(reg) }],
                ..Learn::default()
            }),
            Action::Multipath(Multipath {
                fields: HashFields::SymmetricL4,
                basis: 1,
                algorithm: MultipathAlgorithm::Hrw,
                max_link: 1,
                arg: 0,
                dst: reg,
            }),
            Action::Autopath(Autopath { dst: reg, port: 1 }),
            Action::Note(vec![1, 2, 3]),
            Action::Exit,
        ]
    }

    #[test]
    fn writers_match_registry_sizes() {
        let actions = one_of_each();
        assert_eq!(actions.len(), ActionKind::ALL.len() - 1);
        for action in &actions {
            let kind = action.kind();
            let mut fixed = Vec::new();
            write_fixed(action, &mut fixed);
            assert_eq!(fixed.len(), kind.fixed_len(), "{}", kind.name());

            let mut trailer = Vec::new();
            write_trailer(action, &mut trailer);
            match kind.layout() {
                Layout::Fixed => assert!(trailer.is_empty(), "{}", kind.name()),
                Layout::Variable { elem_size } => assert_eq!(trailer.len() % elem_size, 0, "{}", kind.name()),
            }
            assert_eq!(record_len(action), kind.raw_size() + trailer.len());
        }
    }

    #[test]
    fn bodies_read_back() {
        for action in one_of_each() {
            let mut body = Vec::new();
            write_fixed(&action, &mut body);
            write_trailer(&action, &mut body);
            assert_eq!(read_action(action.kind(), &body).unwrap(), action);
        }
    }

    #[test]
    fn learn_spec_keeps_both_widths() {
        let spec = LearnSpec {
            n_bits: 16,
            src: LearnSrc::Field(Subfield::whole(MfField::InPort)),
            dst: LearnDst::Match(Subfield::new(MfField::Reg(0), 0, 8)),
        };
        let mut elem = Vec::new();
        write_learn_spec(&spec, &mut elem);
        assert_eq!(elem.len(), LEARN_SPEC_SIZE);

        let learn = Action::Learn(Learn { specs: vec![spec], ..Learn::default() });
        let mut body = Vec::new();
        write_fixed(&learn, &mut body);
        write_trailer(&learn, &mut body);
        assert_eq!(read_action(ActionKind::Learn, &body).unwrap(), learn);
    }

    #[test]
    fn unknown_subfield_header_is_corrupt() {
        let mut body = Vec::new();
        write_fixed(&Action::RegLoad(RegLoad { dst: Subfield::whole(MfField::Reg(0)), value: 1 }), &mut body);
        body[0..4].copy_from_slice(&0xdead_beefu32.to_ne_bytes());
        assert!(read_action(ActionKind::RegLoad, &body).is_err());
    }
}
