//! Human-readable rendering of action lists, in the `ovs-ofctl` action syntax.
//!
//! Output is stable and meant for logs and test assertions; nothing parses it back.

use crate::action::*;
use crate::record::Ofpacts;
use crate::registry::WireCode;
use crate::wire::{self, OFPFF_SEND_FLOW_REM, OFPP_CONTROLLER, OFPP_IN_PORT, OFPP_MAX, OFP_DEFAULT_PRIORITY};
use std::fmt::{self, Write};

/// Renders `ofpacts` as comma-separated actions, or `drop` if it is empty.
pub fn format(ofpacts: &Ofpacts) -> String {
    ofpacts.to_string()
}

impl fmt::Display for Ofpacts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("drop");
        }
        for (i, record) in self.iter().enumerate() {
            if i > 0 {
                f.write_char(',')?;
            }
            format_action(&record.action(), record.compat(), f)?;
        }
        Ok(())
    }
}

/// A port number, or the name of a reserved port.
struct Port(u16);

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match wire::port_name(self.0) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

struct Mac<'a>(&'a EthAddr);

impl fmt::Display for Mac<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let m = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

/// Writes `name(` then the non-empty `parts` joined by commas, then `)`.
fn write_call(f: &mut dyn Write, name: &str, parts: &[String]) -> fmt::Result {
    write!(f, "{}({})", name, parts.join(","))
}

/// Writes one action. `compat` only affects the tunnel id form.
pub fn format_action(action: &Action, compat: WireCode, f: &mut dyn Write) -> fmt::Result {
    match action {
        Action::Output(o) => {
            if o.port < OFPP_MAX {
                write!(f, "output:{}", o.port)
            } else if o.port == OFPP_CONTROLLER {
                write!(f, "CONTROLLER:{}", o.max_len)
            } else {
                write!(f, "{}", Port(o.port))
            }
        }
        Action::Controller(c) => {
            if c.reason == PacketInReason::Action && c.controller_id == 0 {
                return write!(f, "CONTROLLER:{}", c.max_len);
            }
            let mut parts = Vec::new();
            if c.reason != PacketInReason::Action {
                parts.push(format!("reason={}", c.reason.name()));
            }
            if c.max_len != u16::MAX {
                parts.push(format!("max_len={}", c.max_len));
            }
            if c.controller_id != 0 {
                parts.push(format!("id={}", c.controller_id));
            }
            write_call(f, "controller", &parts)
        }
        Action::Enqueue(e) => write!(f, "enqueue:{}:{}", Port(e.port), e.queue),
        Action::OutputReg(o) => write!(f, "output:{}", o.src),
        Action::Bundle(b) => {
            let name = if b.dst.is_some() { "bundle_load" } else { "bundle" };
            write!(f, "{}({},{},{},ofport,", name, b.fields.name(), b.basis, b.algorithm.name())?;
            if let Some(dst) = &b.dst {
                write!(f, "{},", dst)?;
            }
            f.write_str("slaves:")?;
            for (i, slave) in b.slaves.iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                write!(f, "{}", Port(*slave))?;
            }
            f.write_char(')')
        }
        Action::SetVlanVid(vid) => write!(f, "mod_vlan_vid:{}", vid),
        Action::SetVlanPcp(pcp) => write!(f, "mod_vlan_pcp:{}", pcp),
        Action::StripVlan => f.write_str("strip_vlan"),
        Action::SetEthSrc(mac) => write!(f, "mod_dl_src:{}", Mac(mac)),
        Action::SetEthDst(mac) => write!(f, "mod_dl_dst:{}", Mac(mac)),
        Action::SetIpv4Src(ip) => write!(f, "mod_nw_src:{}", ip),
        Action::SetIpv4Dst(ip) => write!(f, "mod_nw_dst:{}", ip),
        Action::SetIpv4Dscp(tos) => write!(f, "mod_nw_tos:{}", tos),
        Action::SetL4SrcPort(port) => write!(f, "mod_tp_src:{}", port),
        Action::SetL4DstPort(port) => write!(f, "mod_tp_dst:{}", port),
        Action::RegMove(m) => write!(f, "move:{}->{}", m.src, m.dst),
        Action::RegLoad(l) => write!(f, "load:{:#x}->{}", l.value, l.dst),
        Action::DecTtl => f.write_str("dec_ttl"),
        Action::SetTunnel(tun_id) => {
            let wide = *tun_id > u32::MAX as u64 || compat == WireCode::NxSetTunnel64;
            write!(f, "set_tunnel{}:{:#x}", if wide { "64" } else { "" }, tun_id)
        }
        Action::SetQueue(queue) => write!(f, "set_queue:{}", queue),
        Action::PopQueue => f.write_str("pop_queue"),
        Action::FinTimeout(t) => {
            let mut parts = Vec::new();
            if t.fin_idle_timeout != 0 {
                parts.push(format!("idle_timeout={}", t.fin_idle_timeout));
            }
            if t.fin_hard_timeout != 0 {
                parts.push(format!("hard_timeout={}", t.fin_hard_timeout));
            }
            write_call(f, "fin_timeout", &parts)
        }
        Action::Resubmit(r) => {
            if r.in_port != OFPP_IN_PORT && r.table_id == 255 {
                return write!(f, "resubmit:{}", Port(r.in_port));
            }
            f.write_str("resubmit(")?;
            if r.in_port != OFPP_IN_PORT {
                write!(f, "{}", Port(r.in_port))?;
            }
            f.write_char(',')?;
            if r.table_id != 255 {
                write!(f, "{}", r.table_id)?;
            }
            f.write_char(')')
        }
        Action::Learn(l) => format_learn(l, f),
        Action::Multipath(m) => write!(
            f,
            "multipath({},{},{},{},{},{})",
            m.fields.name(),
            m.basis,
            m.algorithm.name(),
            m.max_link as u32 + 1,
            m.arg,
            m.dst
        ),
        Action::Autopath(a) => write!(f, "autopath({},{})", a.port, a.dst),
        Action::Note(data) => {
            f.write_str("note:")?;
            for (i, b) in data.iter().enumerate() {
                if i > 0 {
                    f.write_char('.')?;
                }
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        }
        Action::Exit => f.write_str("exit"),
    }
}

fn format_learn(l: &Learn, f: &mut dyn Write) -> fmt::Result {
    write!(f, "learn(table={}", l.table_id)?;
    if l.idle_timeout != wire::OFP_FLOW_PERMANENT {
        write!(f, ",idle_timeout={}", l.idle_timeout)?;
    }
    if l.hard_timeout != wire::OFP_FLOW_PERMANENT {
        write!(f, ",hard_timeout={}", l.hard_timeout)?;
    }
    if l.fin_idle_timeout != 0 {
        write!(f, ",fin_idle_timeout={}", l.fin_idle_timeout)?;
    }
    if l.fin_hard_timeout != 0 {
        write!(f, ",fin_hard_timeout={}", l.fin_hard_timeout)?;
    }
    if l.priority != OFP_DEFAULT_PRIORITY {
        write!(f, ",priority={}", l.priority)?;
    }
    if l.flags & OFPFF_SEND_FLOW_REM != 0 {
        f.write_str(",OFPFF_SEND_FLOW_REM")?;
    }
    if l.cookie != 0 {
        write!(f, ",cookie={:#x}", l.cookie)?;
    }
    for spec in &l.specs {
        f.write_char(',')?;
        match (spec.src, spec.dst) {
            (LearnSrc::Immediate(v), LearnDst::Match(dst)) => write!(f, "{}={:#x}", dst, v)?,
            (LearnSrc::Field(src), LearnDst::Match(dst)) => {
                write!(f, "{}", dst)?;
                if src.field != dst.field || src.ofs != dst.ofs {
                    write!(f, "={}", src)?;
                }
            }
            (LearnSrc::Immediate(v), LearnDst::Load(dst)) => write!(f, "load:{:#x}->{}", v, dst)?,
            (LearnSrc::Field(src), LearnDst::Load(dst)) => write!(f, "load:{}->{}", src, dst)?,
            (LearnSrc::Field(src), LearnDst::Output) => write!(f, "output:{}", src)?,
            (LearnSrc::Immediate(v), LearnDst::Output) => write!(f, "output:{:#x}", v)?,
        }
    }
    f.write_char(')')
}
