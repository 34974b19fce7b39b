//! Typed actions.
//!
//! [`Action`] is the owned, strongly typed form of one record of an action list. Variable
//! length kinds carry their trailing elements in a `Vec` next to the fixed fields; the two
//! are only packed together when the action is appended to an
//! [`OfpactBuf`](crate::builder::OfpactBuf).

use crate::field::Subfield;
use crate::registry::ActionKind;
use std::net::Ipv4Addr;

/// An Ethernet address.
pub type EthAddr = [u8; 6];

/// Fields hashed by bundle and multipath actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum HashFields {
    EthSrc = 0,
    SymmetricL4 = 1,
}

impl HashFields {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(HashFields::EthSrc),
            1 => Some(HashFields::SymmetricL4),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashFields::EthSrc => "eth_src",
            HashFields::SymmetricL4 => "symmetric_l4",
        }
    }
}

/// Slave selection algorithm of a bundle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BundleAlgorithm {
    ActiveBackup = 0,
    Hrw = 1,
}

impl BundleAlgorithm {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(BundleAlgorithm::ActiveBackup),
            1 => Some(BundleAlgorithm::Hrw),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BundleAlgorithm::ActiveBackup => "active_backup",
            BundleAlgorithm::Hrw => "hrw",
        }
    }
}

/// Link selection algorithm of a multipath action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MultipathAlgorithm {
    ModuloN = 0,
    HashThreshold = 1,
    Hrw = 2,
    IterHash = 3,
}

impl MultipathAlgorithm {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(MultipathAlgorithm::ModuloN),
            1 => Some(MultipathAlgorithm::HashThreshold),
            2 => Some(MultipathAlgorithm::Hrw),
            3 => Some(MultipathAlgorithm::IterHash),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MultipathAlgorithm::ModuloN => "modulo_n",
            MultipathAlgorithm::HashThreshold => "hash_threshold",
            MultipathAlgorithm::Hrw => "hrw",
            MultipathAlgorithm::IterHash => "iter_hash",
        }
    }
}

/// Reason reported in packet-ins generated by a controller action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketInReason {
    NoMatch = 0,
    Action = 1,
    InvalidTtl = 2,
}

impl PacketInReason {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(PacketInReason::NoMatch),
            1 => Some(PacketInReason::Action),
            2 => Some(PacketInReason::InvalidTtl),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PacketInReason::NoMatch => "no_match",
            PacketInReason::Action => "action",
            PacketInReason::InvalidTtl => "invalid_ttl",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub port: u16,
    /// Bytes of the packet to send when `port` is the controller.
    pub max_len: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controller {
    pub max_len: u16,
    pub controller_id: u16,
    pub reason: PacketInReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueue {
    pub port: u16,
    pub queue: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputReg {
    pub src: Subfield,
    pub max_len: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub algorithm: BundleAlgorithm,
    pub fields: HashFields,
    /// Universal hash parameter.
    pub basis: u16,
    /// Where `bundle_load` stores the chosen slave; `None` for plain `bundle`.
    pub dst: Option<Subfield>,
    pub slaves: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegMove {
    pub src: Subfield,
    pub dst: Subfield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegLoad {
    pub dst: Subfield,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinTimeout {
    pub fin_idle_timeout: u16,
    pub fin_hard_timeout: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resubmit {
    pub in_port: u16,
    /// 255 resubmits into the current table.
    pub table_id: u8,
}

/// Source of a learn spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnSrc {
    Field(Subfield),
    /// Right-aligned immediate value of the spec's `n_bits`.
    Immediate(u128),
}

/// Destination of a learn spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnDst {
    /// Match on the subfield in the learned flow.
    Match(Subfield),
    /// Load into the subfield when the learned flow is hit.
    Load(Subfield),
    /// Output to the port given by the source.
    Output,
}

/// One field-copy spec of a learn action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnSpec {
    pub n_bits: u16,
    pub src: LearnSrc,
    pub dst: LearnDst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Learn {
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub cookie: u64,
    pub flags: u16,
    pub table_id: u8,
    pub fin_idle_timeout: u16,
    pub fin_hard_timeout: u16,
    pub specs: Vec<LearnSpec>,
}

impl Default for Learn {
    fn default() -> Self {
        Learn {
            idle_timeout: crate::wire::OFP_FLOW_PERMANENT,
            hard_timeout: crate::wire::OFP_FLOW_PERMANENT,
            priority: crate::wire::OFP_DEFAULT_PRIORITY,
            cookie: 0,
            flags: 0,
            table_id: 1,
            fin_idle_timeout: 0,
            fin_hard_timeout: 0,
            specs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multipath {
    pub fields: HashFields,
    pub basis: u16,
    pub algorithm: MultipathAlgorithm,
    /// Number of links minus one.
    pub max_link: u16,
    pub arg: u32,
    pub dst: Subfield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autopath {
    pub dst: Subfield,
    pub port: u32,
}

/// One action, in typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Output(Output),
    Controller(Controller),
    Enqueue(Enqueue),
    OutputReg(OutputReg),
    Bundle(Bundle),
    SetVlanVid(u16),
    SetVlanPcp(u8),
    StripVlan,
    SetEthSrc(EthAddr),
    SetEthDst(EthAddr),
    SetIpv4Src(Ipv4Addr),
    SetIpv4Dst(Ipv4Addr),
    /// DSCP in the high six bits.
    SetIpv4Dscp(u8),
    SetL4SrcPort(u16),
    SetL4DstPort(u16),
    RegMove(RegMove),
    RegLoad(RegLoad),
    DecTtl,
    SetTunnel(u64),
    SetQueue(u32),
    PopQueue,
    FinTimeout(FinTimeout),
    Resubmit(Resubmit),
    Learn(Learn),
    Multipath(Multipath),
    Autopath(Autopath),
    Note(Vec<u8>),
    Exit,
}

impl Action {
    pub fn output(port: u16) -> Action {
        Action::Output(Output { port, max_len: 0 })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Output(_) => ActionKind::Output,
            Action::Controller(_) => ActionKind::Controller,
            Action::Enqueue(_) => ActionKind::Enqueue,
            Action::OutputReg(_) => ActionKind::OutputReg,
            Action::Bundle(_) => ActionKind::Bundle,
            Action::SetVlanVid(_) => ActionKind::SetVlanVid,
            Action::SetVlanPcp(_) => ActionKind::SetVlanPcp,
            Action::StripVlan => ActionKind::StripVlan,
            Action::SetEthSrc(_) => ActionKind::SetEthSrc,
            Action::SetEthDst(_) => ActionKind::SetEthDst,
            Action::SetIpv4Src(_) => ActionKind::SetIpv4Src,
            Action::SetIpv4Dst(_) => ActionKind::SetIpv4Dst,
            Action::SetIpv4Dscp(_) => ActionKind::SetIpv4Dscp,
            Action::SetL4SrcPort(_) => ActionKind::SetL4SrcPort,
            Action::SetL4DstPort(_) => ActionKind::SetL4DstPort,
            Action::RegMove(_) => ActionKind::RegMove,
            Action::RegLoad(_) => ActionKind::RegLoad,
            Action::DecTtl => ActionKind::DecTtl,
            Action::SetTunnel(_) => ActionKind::SetTunnel,
            Action::SetQueue(_) => ActionKind::SetQueue,
            Action::PopQueue => ActionKind::PopQueue,
            Action::FinTimeout(_) => ActionKind::FinTimeout,
            Action::Resubmit(_) => ActionKind::Resubmit,
            Action::Learn(_) => ActionKind::Learn,
            Action::Multipath(_) => ActionKind::Multipath,
            Action::Autopath(_) => ActionKind::Autopath,
            Action::Note(_) => ActionKind::Note,
            Action::Exit => ActionKind::Exit,
        }
    }
}
