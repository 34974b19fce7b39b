//! Validation of decoded action lists against the flow they will be attached to.
//!
//! The decoder only checks what can be checked without context. This pass adds the port
//! bound of the datapath, the tables it has, and the fields the flow actually provides.
//! It never modifies the list and stops at the first violation.

use crate::action::*;
use crate::config::CheckLimits;
use crate::error::{CheckError, OfpactError};
use crate::field::{prerequisites_ok, FlowContext, Subfield};
use crate::record::Ofpacts;
use crate::wire::{is_reserved_output_port, OFPP_CONTROLLER, OFPP_IN_PORT, OFPP_LOCAL};
use tracing::debug;

/// Checks `ofpacts` against `flow`, with ports `0..max_ports` valid.
pub fn check(ofpacts: &Ofpacts, flow: &dyn FlowContext, max_ports: u16) -> Result<(), CheckError> {
    check_with(ofpacts, flow, &CheckLimits::new(max_ports))
}

pub fn check_with(ofpacts: &Ofpacts, flow: &dyn FlowContext, limits: &CheckLimits) -> Result<(), CheckError> {
    for record in ofpacts {
        if let Err(error) = check_action(&record.action(), flow, limits) {
            debug!(index = record.index(), kind = record.kind().name(), %error, "action failed validation");
            return Err(CheckError { index: record.index(), kind: record.kind(), error });
        }
    }
    Ok(())
}

/// Physical ports below `max_ports` and the reserved logical ports are valid targets.
pub fn check_output_port(port: u16, max_ports: u16) -> Result<(), OfpactError> {
    if port < max_ports || is_reserved_output_port(port) {
        Ok(())
    } else {
        Err(OfpactError::BadOutPort)
    }
}

fn subfield_ok(sf: &Subfield, flow: &dyn FlowContext) -> bool {
    match flow.field_width(sf.field) {
        Some(width) => sf.fits(width) && prerequisites_ok(sf.field, flow),
        None => false,
    }
}

fn check_src(sf: &Subfield, flow: &dyn FlowContext) -> Result<(), OfpactError> {
    if subfield_ok(sf, flow) {
        Ok(())
    } else {
        Err(OfpactError::BadArgument)
    }
}

fn check_dst(sf: &Subfield, flow: &dyn FlowContext) -> Result<(), OfpactError> {
    if subfield_ok(sf, flow) && flow.is_writable(sf.field) {
        Ok(())
    } else {
        Err(OfpactError::BadArgument)
    }
}

fn check_action(action: &Action, flow: &dyn FlowContext, limits: &CheckLimits) -> Result<(), OfpactError> {
    match action {
        Action::Output(o) => check_output_port(o.port, limits.max_ports),
        Action::Enqueue(e) => {
            if e.port < limits.max_ports || e.port == OFPP_IN_PORT || e.port == OFPP_LOCAL {
                Ok(())
            } else {
                Err(OfpactError::BadOutPort)
            }
        }
        Action::OutputReg(o) => check_src(&o.src, flow),
        Action::Bundle(b) => {
            for &slave in &b.slaves {
                check_output_port(slave, limits.max_ports)?;
                if slave == OFPP_CONTROLLER {
                    return Err(OfpactError::BadOutPort);
                }
            }
            match &b.dst {
                Some(dst) => check_dst(dst, flow),
                None => Ok(()),
            }
        }
        Action::RegMove(m) => {
            if m.src.n_bits != m.dst.n_bits {
                return Err(OfpactError::BadArgument);
            }
            check_src(&m.src, flow)?;
            check_dst(&m.dst, flow)
        }
        Action::RegLoad(l) => {
            check_dst(&l.dst, flow)?;
            if l.dst.n_bits < 64 && l.value >> l.dst.n_bits != 0 {
                return Err(OfpactError::BadArgument);
            }
            Ok(())
        }
        Action::Resubmit(r) => {
            if r.table_id == 255 || r.table_id < limits.n_tables {
                Ok(())
            } else {
                Err(OfpactError::BadArgument)
            }
        }
        Action::Learn(l) => l.specs.iter().try_for_each(|spec| check_learn_spec(spec, flow)),
        Action::Multipath(m) => check_dst(&m.dst, flow),
        Action::Autopath(a) => check_dst(&a.dst, flow),
        Action::Controller(_)
        | Action::SetVlanVid(_)
        | Action::SetVlanPcp(_)
        | Action::StripVlan
        | Action::SetEthSrc(_)
        | Action::SetEthDst(_)
        | Action::SetIpv4Src(_)
        | Action::SetIpv4Dst(_)
        | Action::SetIpv4Dscp(_)
        | Action::SetL4SrcPort(_)
        | Action::SetL4DstPort(_)
        | Action::DecTtl
        | Action::SetTunnel(_)
        | Action::SetQueue(_)
        | Action::PopQueue
        | Action::FinTimeout(_)
        | Action::Note(_)
        | Action::Exit => Ok(()),
    }
}

fn check_learn_spec(spec: &LearnSpec, flow: &dyn FlowContext) -> Result<(), OfpactError> {
    if spec.n_bits == 0 {
        return Err(OfpactError::BadArgument);
    }
    match spec.src {
        LearnSrc::Field(sf) => {
            if sf.n_bits != spec.n_bits {
                return Err(OfpactError::BadArgument);
            }
            check_src(&sf, flow)?;
        }
        LearnSrc::Immediate(value) => {
            if spec.n_bits > 128 || (spec.n_bits < 128 && value >> spec.n_bits != 0) {
                return Err(OfpactError::BadArgument);
            }
        }
    }
    match spec.dst {
        LearnDst::Match(sf) | LearnDst::Load(sf) if sf.n_bits != spec.n_bits => Err(OfpactError::BadArgument),
        LearnDst::Match(sf) => check_src(&sf, flow),
        LearnDst::Load(sf) => check_dst(&sf, flow),
        LearnDst::Output => match spec.src {
            LearnSrc::Field(_) => Ok(()),
            LearnSrc::Immediate(_) => Err(OfpactError::BadArgument),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Flow, MfField};

    #[test]
    fn reserved_ports_bypass_the_bound() {
        assert_eq!(check_output_port(crate::wire::OFPP_FLOOD, 1), Ok(()));
        assert_eq!(check_output_port(crate::wire::OFPP_NONE, 1), Err(OfpactError::BadOutPort));
        assert_eq!(check_output_port(0, 0), Err(OfpactError::BadOutPort));
    }

    #[test]
    fn immediate_must_fit_its_width() {
        let flow = Flow::new();
        let spec = LearnSpec {
            n_bits: 12,
            src: LearnSrc::Immediate(0x1000),
            dst: LearnDst::Match(Subfield::new(MfField::VlanTci, 0, 12)),
        };
        assert_eq!(check_learn_spec(&spec, &flow), Err(OfpactError::BadArgument));
        let spec = LearnSpec { src: LearnSrc::Immediate(0xfff), ..spec };
        assert_eq!(check_learn_spec(&spec, &flow), Ok(()));
    }
}
