//! Benchmark: decode, check, encode and format a mixed action list of the kind a
//! learning switch installs (header rewrites, register moves, a learn action, a bundle).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ofpacts::action::*;
use ofpacts::{check, decode, format, to_openflow, Action, Flow, MfField, Ofpacts, Subfield};
use std::net::Ipv4Addr;

fn sample() -> Ofpacts {
    let reg0 = Subfield::whole(MfField::Reg(0));
    let actions = vec![
        Action::SetVlanVid(10),
        Action::SetEthSrc([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
        Action::SetIpv4Dst(Ipv4Addr::new(10, 0, 0, 1)),
        Action::RegMove(RegMove { src: Subfield::new(MfField::InPort, 0, 16), dst: Subfield::new(MfField::Reg(1), 0, 16) }),
        Action::RegLoad(RegLoad { dst: reg0, value: 0xdead }),
        Action::Learn(Learn {
            idle_timeout: 60,
            specs: vec![
                LearnSpec {
                    n_bits: 48,
                    src: LearnSrc::Field(Subfield::whole(MfField::EthSrc)),
                    dst: LearnDst::Match(Subfield::whole(MfField::EthDst)),
                },
                LearnSpec {
                    n_bits: 16,
                    src: LearnSrc::Field(Subfield::whole(MfField::InPort)),
                    dst: LearnDst::Output,
                },
            ],
            ..Learn::default()
        }),
        Action::Bundle(Bundle {
            algorithm: BundleAlgorithm::Hrw,
            fields: HashFields::SymmetricL4,
            basis: 0,
            dst: None,
            slaves: (1..=8).collect(),
        }),
        Action::Note(b"bench".to_vec()),
        Action::output(2),
    ];
    Ofpacts::from_actions(&actions)
}

fn bench_codec(c: &mut Criterion) {
    let list = sample();
    let wire = to_openflow(&list);
    let flow = Flow::new();

    c.bench_function("decode", |b| b.iter(|| decode(black_box(&wire), wire.len())));
    c.bench_function("decode_check", |b| {
        b.iter(|| {
            let l = decode(black_box(&wire), wire.len()).ok()?;
            check(&l, &flow, 64).ok()
        })
    });
    c.bench_function("encode", |b| b.iter(|| to_openflow(black_box(&list))));
    c.bench_function("format", |b| b.iter(|| format(black_box(&list))));
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
