//! Validator tests: port bounds, subfield widths and prerequisites, resubmit tables, learn.

use ofpacts::action::*;
use ofpacts::wire::{OFPP_CONTROLLER, OFPP_IN_PORT, OFPP_LOCAL, OFPP_MAX, OFPP_NORMAL};
use ofpacts::{check, check_with, Action, ActionKind, CheckLimits, Flow, FlowContext, MfField, OfpactError, Ofpacts, Subfield};

fn run(actions: &[Action], flow: &dyn FlowContext, max_ports: u16) -> Result<(), OfpactError> {
    check(&Ofpacts::from_actions(actions), flow, max_ports).map_err(|e| e.error)
}

/// A context where every register is 16 bits wide.
struct NarrowRegs;

impl FlowContext for NarrowRegs {
    fn field_width(&self, field: MfField) -> Option<u32> {
        match field {
            MfField::Reg(_) => Some(16),
            f => Some(f.n_bits()),
        }
    }

    fn field_value(&self, _field: MfField) -> Option<u64> {
        None
    }
}

#[test]
fn test_port_bound() {
    let flow = Flow::new();
    assert_eq!(run(&[Action::output(9)], &flow, 10), Ok(()));
    assert_eq!(run(&[Action::output(10)], &flow, 10), Err(OfpactError::BadOutPort));
    for reserved in [OFPP_IN_PORT, OFPP_NORMAL, OFPP_CONTROLLER, OFPP_LOCAL] {
        assert_eq!(run(&[Action::output(reserved)], &flow, 10), Ok(()));
    }
}

#[test]
fn test_enqueue_ports() {
    let flow = Flow::new();
    let enqueue = |port| Action::Enqueue(Enqueue { port, queue: 1 });
    assert_eq!(run(&[enqueue(3)], &flow, 4), Ok(()));
    assert_eq!(run(&[enqueue(OFPP_IN_PORT)], &flow, 4), Ok(()));
    assert_eq!(run(&[enqueue(OFPP_LOCAL)], &flow, 4), Ok(()));
    assert_eq!(run(&[enqueue(4)], &flow, 4), Err(OfpactError::BadOutPort));
    assert_eq!(run(&[enqueue(OFPP_NORMAL)], &flow, 4), Err(OfpactError::BadOutPort));
}

#[test]
fn test_error_names_the_record() {
    let flow = Flow::new();
    let list = Ofpacts::from_actions(&[Action::output(1), Action::DecTtl, Action::output(50)]);
    let err = check(&list, &flow, 10).unwrap_err();
    assert_eq!(err.index, 2);
    assert_eq!(err.kind, ActionKind::Output);
    assert_eq!(err.error, OfpactError::BadOutPort);
    assert_eq!(err.to_string(), "action 2 (OUTPUT): bad output port");
}

#[test]
fn test_subfield_widths() {
    let load = |ofs, n_bits| {
        Action::RegLoad(RegLoad { dst: Subfield::new(MfField::Reg(2), ofs, n_bits), value: 1 })
    };
    assert_eq!(run(&[load(0, 32)], &Flow::new(), 1), Ok(()));
    assert_eq!(run(&[load(16, 16)], &Flow::new(), 1), Ok(()));
    assert_eq!(run(&[load(16, 16)], &NarrowRegs, 1), Err(OfpactError::BadArgument));
    assert_eq!(run(&[load(0, 16)], &NarrowRegs, 1), Ok(()));
    assert_eq!(run(&[load(0, 0)], &Flow::new(), 1), Err(OfpactError::BadArgument));
}

#[test]
fn test_unavailable_field() {
    let mut flow = Flow::new();
    flow.unavailable.insert(MfField::TunId);
    let mv = Action::RegMove(RegMove {
        src: Subfield::new(MfField::TunId, 0, 32),
        dst: Subfield::whole(MfField::Reg(0)),
    });
    assert_eq!(run(&[mv.clone()], &Flow::new(), 1), Ok(()));
    assert_eq!(run(&[mv], &flow, 1), Err(OfpactError::BadArgument));
}

#[test]
fn test_prerequisites() {
    let to_tcp = Action::RegMove(RegMove {
        src: Subfield::new(MfField::Reg(0), 0, 16),
        dst: Subfield::whole(MfField::TcpDst),
    });
    assert_eq!(run(&[to_tcp.clone()], &Flow::ipv4(Some(6)), 1), Ok(()));
    assert_eq!(run(&[to_tcp.clone()], &Flow::ipv4(Some(17)), 1), Err(OfpactError::BadArgument));
    assert_eq!(run(&[to_tcp], &Flow::new(), 1), Err(OfpactError::BadArgument));
}

#[test]
fn test_read_only_destination() {
    let mv = Action::RegMove(RegMove {
        src: Subfield::new(MfField::Reg(0), 0, 16),
        dst: Subfield::whole(MfField::EthType),
    });
    assert_eq!(run(&[mv], &Flow::new(), 1), Err(OfpactError::BadArgument));
}

#[test]
fn test_multipath_and_autopath_destinations() {
    let flow = Flow::new();
    let mp = |dst| {
        Action::Multipath(Multipath {
            fields: HashFields::SymmetricL4,
            basis: 0,
            algorithm: MultipathAlgorithm::ModuloN,
            max_link: 1,
            arg: 0,
            dst,
        })
    };
    assert_eq!(run(&[mp(Subfield::new(MfField::Reg(0), 0, 4))], &flow, 1), Ok(()));
    assert_eq!(run(&[mp(Subfield::new(MfField::Reg(0), 30, 4))], &flow, 1), Err(OfpactError::BadArgument));
    let ap = Action::Autopath(Autopath { dst: Subfield::new(MfField::Reg(0), 20, 16), port: 1 });
    assert_eq!(run(&[ap], &flow, 1), Err(OfpactError::BadArgument));
}

#[test]
fn test_bundle_slaves() {
    let flow = Flow::new();
    let bundle = |slaves: Vec<u16>| {
        Action::Bundle(Bundle {
            algorithm: BundleAlgorithm::ActiveBackup,
            fields: HashFields::EthSrc,
            basis: 0,
            dst: None,
            slaves,
        })
    };
    assert_eq!(run(&[bundle(vec![1, 2, OFPP_LOCAL])], &flow, 3), Ok(()));
    assert_eq!(run(&[bundle(vec![1, 3])], &flow, 3), Err(OfpactError::BadOutPort));
    assert_eq!(run(&[bundle(vec![OFPP_CONTROLLER])], &flow, 3), Err(OfpactError::BadOutPort));
}

#[test]
fn test_resubmit_tables() {
    let flow = Flow::new();
    let list = |table_id| Ofpacts::from_actions(&[Action::Resubmit(Resubmit { in_port: 1, table_id })]);
    let limits = CheckLimits { max_ports: 4, n_tables: 8 };
    assert!(check_with(&list(7), &flow, &limits).is_ok());
    assert!(check_with(&list(255), &flow, &limits).is_ok());
    assert_eq!(check_with(&list(8), &flow, &limits).unwrap_err().error, OfpactError::BadArgument);
    assert!(check(&list(254), &flow, 4).is_ok());
}

#[test]
fn test_default_limits() {
    let flow = Flow::new();
    let limits = CheckLimits::default();
    assert_eq!(limits, CheckLimits { max_ports: OFPP_MAX, n_tables: 255 });
    let list = Ofpacts::from_actions(&[
        Action::output(OFPP_MAX - 1),
        Action::Resubmit(Resubmit { in_port: 1, table_id: 254 }),
    ]);
    assert!(check_with(&list, &flow, &limits).is_ok());
    let list = Ofpacts::from_actions(&[Action::output(OFPP_MAX)]);
    assert_eq!(check_with(&list, &flow, &limits).unwrap_err().error, OfpactError::BadOutPort);
}

fn learn(specs: Vec<LearnSpec>) -> Action {
    Action::Learn(Learn { specs, ..Learn::default() })
}

#[test]
fn test_learn_specs() {
    let flow = Flow::new();
    let eth = LearnSpec {
        n_bits: 48,
        src: LearnSrc::Field(Subfield::whole(MfField::EthSrc)),
        dst: LearnDst::Match(Subfield::whole(MfField::EthDst)),
    };
    let out = LearnSpec {
        n_bits: 16,
        src: LearnSrc::Field(Subfield::whole(MfField::InPort)),
        dst: LearnDst::Output,
    };
    let load = LearnSpec {
        n_bits: 12,
        src: LearnSrc::Immediate(0x123),
        dst: LearnDst::Load(Subfield::new(MfField::Reg(1), 4, 12)),
    };
    assert_eq!(run(&[learn(vec![eth, out, load])], &flow, 1), Ok(()));

    // source and destination widths disagree
    let mismatch = LearnSpec {
        n_bits: 16,
        src: LearnSrc::Field(Subfield::whole(MfField::InPort)),
        dst: LearnDst::Match(Subfield::new(MfField::Reg(0), 0, 8)),
    };
    let list = Ofpacts::from_actions(&[learn(vec![mismatch])]);
    assert_eq!(list.actions(), vec![learn(vec![mismatch])]);
    assert_eq!(check(&list, &flow, 1).map_err(|e| e.error), Err(OfpactError::BadArgument));
    let matched = LearnSpec { dst: LearnDst::Match(Subfield::new(MfField::Reg(0), 0, 16)), ..mismatch };
    assert_ne!(list, Ofpacts::from_actions(&[learn(vec![matched])]));

    // immediate wider than its spec
    let wide = LearnSpec { src: LearnSrc::Immediate(0x1000), ..load };
    assert_eq!(run(&[learn(vec![wide])], &flow, 1), Err(OfpactError::BadArgument));

    // destination range runs past the end of its field
    let too_big = LearnSpec {
        n_bits: 20,
        src: LearnSrc::Immediate(1),
        dst: LearnDst::Match(Subfield::new(MfField::VlanTci, 0, 20)),
    };
    assert_eq!(run(&[learn(vec![too_big])], &flow, 1), Err(OfpactError::BadArgument));

    // loads need a writable destination
    let read_only = LearnSpec {
        n_bits: 16,
        src: LearnSrc::Immediate(0x800),
        dst: LearnDst::Load(Subfield::whole(MfField::EthType)),
    };
    assert_eq!(run(&[learn(vec![read_only])], &flow, 1), Err(OfpactError::BadArgument));
}

#[test]
fn test_decoded_list_validates() {
    // OFPAT10_OUTPUT:2, NXAST_DEC_TTL
    let wire = [
        0x00, 0x00, 0x00, 0x08, 0x00, 0x02, 0x00, 0x00, //
        0xff, 0xff, 0x00, 0x10, 0x00, 0x00, 0x23, 0x20, 0x00, 0x12, 0, 0, 0, 0, 0, 0,
    ];
    let list = ofpacts::decode(&wire, wire.len()).expect("decode");
    assert!(check(&list, &Flow::new(), 3).is_ok());
    assert_eq!(check(&list, &Flow::new(), 2).unwrap_err().error, OfpactError::BadOutPort);
}
