//! Formatter tests: one expected string per action form, plus list-level rendering.

use ofpacts::action::*;
use ofpacts::wire::{OFPFF_SEND_FLOW_REM, OFPP_CONTROLLER, OFPP_IN_PORT, OFPP_LOCAL};
use ofpacts::{format, Action, MfField, Ofpacts, Subfield};
use std::net::Ipv4Addr;

fn fmt(actions: &[Action]) -> String {
    format(&Ofpacts::from_actions(actions))
}

#[test]
fn test_empty_list_is_drop() {
    assert_eq!(format(&Ofpacts::new()), "drop");
}

#[test]
fn test_list_is_comma_separated() {
    assert_eq!(fmt(&[Action::StripVlan, Action::output(2), Action::Exit]), "strip_vlan,output:2,exit");
}

#[test]
fn test_outputs() {
    assert_eq!(fmt(&[Action::output(OFPP_IN_PORT)]), "IN_PORT");
    assert_eq!(fmt(&[Action::Output(Output { port: OFPP_CONTROLLER, max_len: 65535 })]), "CONTROLLER:65535");
    assert_eq!(fmt(&[Action::Enqueue(Enqueue { port: 1, queue: 2 })]), "enqueue:1:2");
    assert_eq!(fmt(&[Action::Enqueue(Enqueue { port: OFPP_LOCAL, queue: 0 })]), "enqueue:LOCAL:0");
    assert_eq!(
        fmt(&[Action::OutputReg(OutputReg { src: Subfield::new(MfField::Reg(1), 0, 16), max_len: 0 })]),
        "output:NXM_NX_REG1[0..15]"
    );
}

#[test]
fn test_controller() {
    let c = |max_len, controller_id, reason| Action::Controller(Controller { max_len, controller_id, reason });
    assert_eq!(fmt(&[c(128, 0, PacketInReason::Action)]), "CONTROLLER:128");
    assert_eq!(fmt(&[c(65535, 3, PacketInReason::Action)]), "controller(id=3)");
    assert_eq!(fmt(&[c(100, 0, PacketInReason::NoMatch)]), "controller(reason=no_match,max_len=100)");
    assert_eq!(fmt(&[c(65535, 0, PacketInReason::InvalidTtl)]), "controller(reason=invalid_ttl)");
}

#[test]
fn test_header_rewrites() {
    let actions = [
        Action::SetVlanVid(10),
        Action::SetVlanPcp(3),
        Action::SetEthSrc([0x00, 0x0a, 0x0b, 0xcc, 0xdd, 0xef]),
        Action::SetEthDst([0xff; 6]),
        Action::SetIpv4Src(Ipv4Addr::new(10, 1, 2, 3)),
        Action::SetIpv4Dst(Ipv4Addr::new(192, 168, 0, 1)),
        Action::SetIpv4Dscp(0x28),
        Action::SetL4SrcPort(80),
        Action::SetL4DstPort(8080),
    ];
    assert_eq!(
        fmt(&actions),
        "mod_vlan_vid:10,mod_vlan_pcp:3,mod_dl_src:00:0a:0b:cc:dd:ef,mod_dl_dst:ff:ff:ff:ff:ff:ff,\
         mod_nw_src:10.1.2.3,mod_nw_dst:192.168.0.1,mod_nw_tos:40,mod_tp_src:80,mod_tp_dst:8080"
    );
}

#[test]
fn test_register_actions() {
    let mv = Action::RegMove(RegMove {
        src: Subfield::new(MfField::InPort, 0, 16),
        dst: Subfield::new(MfField::Reg(0), 0, 16),
    });
    assert_eq!(fmt(&[mv]), "move:NXM_OF_IN_PORT[]->NXM_NX_REG0[0..15]");
    let load = Action::RegLoad(RegLoad { dst: Subfield::new(MfField::Reg(3), 5, 1), value: 1 });
    assert_eq!(fmt(&[load]), "load:0x1->NXM_NX_REG3[5]");
    let tun = Action::RegLoad(RegLoad { dst: Subfield::whole(MfField::TunId), value: 0xabcd });
    assert_eq!(fmt(&[tun]), "load:0xabcd->NXM_NX_TUN_ID[]");
}

#[test]
fn test_misc_nicira_actions() {
    assert_eq!(fmt(&[Action::DecTtl, Action::PopQueue, Action::SetQueue(5)]), "dec_ttl,pop_queue,set_queue:5");
    assert_eq!(fmt(&[Action::SetTunnel(0x1f)]), "set_tunnel:0x1f");
    assert_eq!(fmt(&[Action::SetTunnel(0x1_0000_0000)]), "set_tunnel64:0x100000000");
    assert_eq!(
        fmt(&[Action::FinTimeout(FinTimeout { fin_idle_timeout: 10, fin_hard_timeout: 0 })]),
        "fin_timeout(idle_timeout=10)"
    );
    assert_eq!(
        fmt(&[Action::FinTimeout(FinTimeout { fin_idle_timeout: 10, fin_hard_timeout: 20 })]),
        "fin_timeout(idle_timeout=10,hard_timeout=20)"
    );
    assert_eq!(fmt(&[Action::Note(vec![0xde, 0xad, 0x01])]), "note:de.ad.01");
    assert_eq!(
        fmt(&[Action::Autopath(Autopath { dst: Subfield::whole(MfField::Reg(0)), port: 7 })]),
        "autopath(7,NXM_NX_REG0[])"
    );
}

#[test]
fn test_resubmit() {
    let r = |in_port, table_id| Action::Resubmit(Resubmit { in_port, table_id });
    assert_eq!(fmt(&[r(3, 255)]), "resubmit:3");
    assert_eq!(fmt(&[r(3, 1)]), "resubmit(3,1)");
    assert_eq!(fmt(&[r(OFPP_IN_PORT, 2)]), "resubmit(,2)");
    assert_eq!(fmt(&[r(OFPP_IN_PORT, 255)]), "resubmit(,)");
    assert_eq!(fmt(&[r(OFPP_LOCAL, 255)]), "resubmit:LOCAL");
}

#[test]
fn test_bundle() {
    let mut b = Bundle {
        algorithm: BundleAlgorithm::Hrw,
        fields: HashFields::SymmetricL4,
        basis: 50,
        dst: None,
        slaves: vec![1, 2, OFPP_LOCAL],
    };
    assert_eq!(fmt(&[Action::Bundle(b.clone())]), "bundle(symmetric_l4,50,hrw,ofport,slaves:1,2,LOCAL)");
    b.algorithm = BundleAlgorithm::ActiveBackup;
    b.dst = Some(Subfield::new(MfField::Reg(0), 0, 16));
    assert_eq!(
        fmt(&[Action::Bundle(b)]),
        "bundle_load(symmetric_l4,50,active_backup,ofport,NXM_NX_REG0[0..15],slaves:1,2,LOCAL)"
    );
}

#[test]
fn test_multipath() {
    let mp = Multipath {
        fields: HashFields::EthSrc,
        basis: 50,
        algorithm: MultipathAlgorithm::IterHash,
        max_link: 3,
        arg: 7,
        dst: Subfield::new(MfField::Reg(0), 0, 2),
    };
    assert_eq!(fmt(&[Action::Multipath(mp)]), "multipath(eth_src,50,iter_hash,4,7,NXM_NX_REG0[0..1])");
}

#[test]
fn test_learn() {
    let plain = Learn::default();
    assert_eq!(fmt(&[Action::Learn(plain)]), "learn(table=1)");

    let full = Learn {
        idle_timeout: 10,
        hard_timeout: 20,
        priority: 100,
        cookie: 0x99,
        flags: OFPFF_SEND_FLOW_REM,
        table_id: 2,
        fin_idle_timeout: 5,
        fin_hard_timeout: 6,
        specs: vec![
            LearnSpec {
                n_bits: 12,
                src: LearnSrc::Field(Subfield::new(MfField::VlanTci, 0, 12)),
                dst: LearnDst::Match(Subfield::new(MfField::VlanTci, 0, 12)),
            },
            LearnSpec {
                n_bits: 48,
                src: LearnSrc::Field(Subfield::whole(MfField::EthSrc)),
                dst: LearnDst::Match(Subfield::whole(MfField::EthDst)),
            },
            LearnSpec {
                n_bits: 16,
                src: LearnSrc::Immediate(0x800),
                dst: LearnDst::Match(Subfield::whole(MfField::EthType)),
            },
            LearnSpec {
                n_bits: 32,
                src: LearnSrc::Immediate(0x5),
                dst: LearnDst::Load(Subfield::whole(MfField::Reg(0))),
            },
            LearnSpec {
                n_bits: 16,
                src: LearnSrc::Field(Subfield::whole(MfField::InPort)),
                dst: LearnDst::Load(Subfield::new(MfField::Reg(1), 0, 16)),
            },
            LearnSpec {
                n_bits: 16,
                src: LearnSrc::Field(Subfield::whole(MfField::InPort)),
                dst: LearnDst::Output,
            },
        ],
    };
    assert_eq!(
        fmt(&[Action::Learn(full)]),
        "learn(table=2,idle_timeout=10,hard_timeout=20,fin_idle_timeout=5,fin_hard_timeout=6,\
         priority=100,OFPFF_SEND_FLOW_REM,cookie=0x99,\
         NXM_OF_VLAN_TCI[0..11],\
         NXM_OF_ETH_DST[]=NXM_OF_ETH_SRC[],\
         NXM_OF_ETH_TYPE[]=0x800,\
         load:0x5->NXM_NX_REG0[],\
         load:NXM_OF_IN_PORT[]->NXM_NX_REG1[0..15],\
         output:NXM_OF_IN_PORT[])"
    );
}

#[test]
fn test_display_matches_format() {
    let list = Ofpacts::from_actions(&[Action::output(1), Action::Note(vec![1])]);
    assert_eq!(list.to_string(), format(&list));
    assert_eq!(format!("{}", list), "output:1,note:01");
}
