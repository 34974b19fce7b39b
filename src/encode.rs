//! Wire encoder: [`Ofpacts`] back to OpenFlow 1.0 and Nicira action entries.
//!
//! The wire form is chosen from the record's kind. The `compat` tag only matters for kinds
//! with more than one wire form (tunnel id width, resubmit with or without a table).

use crate::action::*;
use crate::field::{MfField, Subfield};
use crate::record::Ofpacts;
use crate::registry::{WireCode, WireType};
use crate::wire::*;
use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

/// Appends the wire encoding of every action in `ofpacts` to `out`. The sentinel is not
/// emitted.
///
/// # Panics
///
/// If an action was built with values no wire entry can carry (a note or learn action
/// longer than 64 KiB).
pub fn encode(ofpacts: &Ofpacts, out: &mut Vec<u8>) {
    for record in ofpacts {
        let action = record.action();
        let code = wire_code(&action, record.compat());
        let start = out.len();
        encode_action(&action, code, out);
        trace!(index = record.index(), ?code, len = out.len() - start, "encoded action");
    }
}

/// Encodes `ofpacts` into a fresh buffer.
pub fn to_openflow(ofpacts: &Ofpacts) -> Vec<u8> {
    let mut out = Vec::new();
    encode(ofpacts, &mut out);
    out
}

/// Wire form used for `action`, given the form it was decoded from.
pub fn wire_code(action: &Action, compat: WireCode) -> WireCode {
    match action {
        Action::Output(_) => WireCode::Output10,
        Action::Controller(_) => WireCode::NxController,
        Action::Enqueue(_) => WireCode::Enqueue10,
        Action::OutputReg(_) => WireCode::NxOutputReg,
        Action::Bundle(b) => {
            if b.dst.is_some() {
                WireCode::NxBundleLoad
            } else {
                WireCode::NxBundle
            }
        }
        Action::SetVlanVid(_) => WireCode::SetVlanVid10,
        Action::SetVlanPcp(_) => WireCode::SetVlanPcp10,
        Action::StripVlan => WireCode::StripVlan10,
        Action::SetEthSrc(_) => WireCode::SetDlSrc10,
        Action::SetEthDst(_) => WireCode::SetDlDst10,
        Action::SetIpv4Src(_) => WireCode::SetNwSrc10,
        Action::SetIpv4Dst(_) => WireCode::SetNwDst10,
        Action::SetIpv4Dscp(_) => WireCode::SetNwTos10,
        Action::SetL4SrcPort(_) => WireCode::SetTpSrc10,
        Action::SetL4DstPort(_) => WireCode::SetTpDst10,
        Action::RegMove(_) => WireCode::NxRegMove,
        Action::RegLoad(_) => WireCode::NxRegLoad,
        Action::DecTtl => WireCode::NxDecTtl,
        Action::SetTunnel(tun_id) => {
            if *tun_id <= u32::MAX as u64 && compat != WireCode::NxSetTunnel64 {
                WireCode::NxSetTunnel
            } else {
                WireCode::NxSetTunnel64
            }
        }
        Action::SetQueue(_) => WireCode::NxSetQueue,
        Action::PopQueue => WireCode::NxPopQueue,
        Action::FinTimeout(_) => WireCode::NxFinTimeout,
        Action::Resubmit(r) => {
            if r.table_id == 255 && compat != WireCode::NxResubmitTable {
                WireCode::NxResubmit
            } else {
                WireCode::NxResubmitTable
            }
        }
        Action::Learn(_) => WireCode::NxLearn,
        Action::Multipath(_) => WireCode::NxMultipath,
        Action::Autopath(_) => WireCode::NxAutopath,
        Action::Note(_) => WireCode::NxNote,
        Action::Exit => WireCode::NxExit,
    }
}

/// One wire entry being written. The length field is patched by [`Entry::finish`].
struct Entry<'a> {
    out: &'a mut Vec<u8>,
    start: usize,
}

// Writes into a Vec<u8> cannot fail.
impl<'a> Entry<'a> {
    fn begin(out: &'a mut Vec<u8>, code: WireCode) -> Self {
        let start = out.len();
        let mut entry = Entry { out, start };
        match code.wire_type() {
            Some(WireType::Ofpat10(type_)) => {
                entry.u16(type_);
                entry.u16(0);
            }
            Some(WireType::Nx(subtype)) => {
                entry.u16(OFPAT10_VENDOR);
                entry.u16(0);
                entry.u32(NX_VENDOR_ID);
                entry.u16(subtype);
            }
            None => unreachable!("no wire form for {:?}", code),
        }
        entry
    }

    fn u8(&mut self, v: u8) {
        self.out.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.out.extend_from_slice(b);
    }

    fn zeros(&mut self, n: usize) {
        self.out.resize(self.out.len() + n, 0);
    }

    /// `ofs_nbits` followed by the field header.
    fn ofs_nbits_and_header(&mut self, sf: &Subfield) {
        self.u16(encode_ofs_nbits(sf.ofs, sf.n_bits));
        self.u32(sf.field.header());
    }

    fn finish(self) {
        let padded = round_up(self.out.len(), ACTION_ALIGN);
        self.out.resize(padded, 0);
        let len = padded - self.start;
        assert!(len <= u16::MAX as usize, "action entry of {} bytes does not fit the wire", len);
        BigEndian::write_u16(&mut self.out[self.start + 2..self.start + 4], len as u16);
    }
}

fn encode_action(action: &Action, code: WireCode, out: &mut Vec<u8>) {
    let mut e = Entry::begin(out, code);
    match action {
        Action::Output(o) => {
            e.u16(o.port);
            e.u16(o.max_len);
        }
        Action::Controller(c) => {
            e.u16(c.max_len);
            e.u16(c.controller_id);
            e.u8(c.reason as u8);
            e.zeros(1);
        }
        Action::Enqueue(q) => {
            e.u16(q.port);
            e.zeros(6);
            e.u32(q.queue);
        }
        Action::OutputReg(o) => {
            e.ofs_nbits_and_header(&o.src);
            e.u16(o.max_len);
            e.zeros(6);
        }
        Action::Bundle(b) => {
            e.u16(b.algorithm as u16);
            e.u16(b.fields as u16);
            e.u16(b.basis);
            e.u32(MfField::InPort.header());
            e.u16(b.slaves.len() as u16);
            match &b.dst {
                Some(dst) => e.ofs_nbits_and_header(dst),
                None => {
                    e.u16(0);
                    e.u32(0);
                }
            }
            e.zeros(4);
            for &slave in &b.slaves {
                e.u16(slave);
            }
        }
        Action::SetVlanVid(vid) => {
            e.u16(*vid);
            e.zeros(2);
        }
        Action::SetVlanPcp(pcp) => {
            e.u8(*pcp);
            e.zeros(3);
        }
        Action::StripVlan => e.zeros(4),
        Action::SetEthSrc(mac) | Action::SetEthDst(mac) => {
            e.bytes(mac);
            e.zeros(6);
        }
        Action::SetIpv4Src(ip) | Action::SetIpv4Dst(ip) => e.u32(u32::from(*ip)),
        Action::SetIpv4Dscp(tos) => {
            e.u8(*tos);
            e.zeros(3);
        }
        Action::SetL4SrcPort(port) | Action::SetL4DstPort(port) => {
            e.u16(*port);
            e.zeros(2);
        }
        Action::RegMove(m) => {
            e.u16(m.dst.n_bits);
            e.u16(m.src.ofs);
            e.u16(m.dst.ofs);
            e.u32(m.src.field.header());
            e.u32(m.dst.field.header());
        }
        Action::RegLoad(l) => {
            e.ofs_nbits_and_header(&l.dst);
            e.u64(l.value);
        }
        Action::SetTunnel(tun_id) => {
            if code == WireCode::NxSetTunnel {
                e.zeros(2);
                e.u32(*tun_id as u32);
            } else {
                e.zeros(6);
                e.u64(*tun_id);
            }
        }
        Action::SetQueue(queue) => {
            e.zeros(2);
            e.u32(*queue);
        }
        Action::FinTimeout(t) => {
            e.u16(t.fin_idle_timeout);
            e.u16(t.fin_hard_timeout);
            e.zeros(2);
        }
        Action::Resubmit(r) => {
            e.u16(r.in_port);
            if code == WireCode::NxResubmitTable {
                e.u8(r.table_id);
                e.zeros(3);
            } else {
                e.zeros(4);
            }
        }
        Action::Learn(l) => {
            e.u16(l.idle_timeout);
            e.u16(l.hard_timeout);
            e.u16(l.priority);
            e.u64(l.cookie);
            e.u16(l.flags);
            e.u8(l.table_id);
            e.zeros(1);
            e.u16(l.fin_idle_timeout);
            e.u16(l.fin_hard_timeout);
            for spec in &l.specs {
                encode_learn_spec(spec, &mut e);
            }
        }
        Action::Multipath(m) => {
            e.u16(m.fields as u16);
            e.u16(m.basis);
            e.zeros(2);
            e.u16(m.algorithm as u16);
            e.u16(m.max_link);
            e.u32(m.arg);
            e.zeros(2);
            e.ofs_nbits_and_header(&m.dst);
        }
        Action::Autopath(a) => {
            e.ofs_nbits_and_header(&a.dst);
            e.u32(a.port);
            e.zeros(4);
        }
        Action::Note(data) => e.bytes(data),
        Action::DecTtl | Action::PopQueue | Action::Exit => e.zeros(6),
    }
    e.finish();
}

fn encode_learn_spec(spec: &LearnSpec, e: &mut Entry) {
    let src_type = match spec.src {
        LearnSrc::Field(_) => NX_LEARN_SRC_FIELD,
        LearnSrc::Immediate(_) => NX_LEARN_SRC_IMMEDIATE,
    };
    let dst_type = match spec.dst {
        LearnDst::Match(_) => NX_LEARN_DST_MATCH,
        LearnDst::Load(_) => NX_LEARN_DST_LOAD,
        LearnDst::Output => NX_LEARN_DST_OUTPUT,
    };
    e.u16((spec.n_bits & NX_LEARN_N_BITS_MASK) | src_type | dst_type);
    match spec.src {
        LearnSrc::Field(sf) => {
            e.u32(sf.field.header());
            e.u16(sf.ofs);
        }
        LearnSrc::Immediate(value) => {
            let len = learn_imm_len(spec.n_bits);
            let bytes = value.to_be_bytes();
            if len > bytes.len() {
                e.zeros(len - bytes.len());
                e.bytes(&bytes);
            } else {
                e.bytes(&bytes[bytes.len() - len..]);
            }
        }
    }
    match spec.dst {
        LearnDst::Match(sf) | LearnDst::Load(sf) => {
            e.u32(sf.field.header());
            e.u16(sf.ofs);
        }
        LearnDst::Output => {}
    }
}
