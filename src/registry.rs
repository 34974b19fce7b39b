//! Action type registry.
//!
//! [`ActionKind`] enumerates the internal action kinds and answers, for each one, whether
//! its record is fixed or variable length and how large its fixed part is.
//! [`WireCode`] enumerates the wire forms the decoder understands and maps each one onto
//! the kind it decodes to. Both tables are exhaustive matches, so adding a variant without
//! a registry entry does not compile.

use crate::record::RECORD_HEADER_LEN;
use crate::wire::{self, round_up, ACTION_ALIGN};

/// Whether a record kind carries trailing elements after its fixed part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Fixed,
    /// Trailing elements of `elem_size` bytes each follow the fixed part.
    Variable { elem_size: usize },
}

/// Internal action kind. The discriminant is what records store in their header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ActionKind {
    /// Sentinel terminating every action list.
    End = 0,
    Output,
    Controller,
    Enqueue,
    OutputReg,
    Bundle,
    SetVlanVid,
    SetVlanPcp,
    StripVlan,
    SetEthSrc,
    SetEthDst,
    SetIpv4Src,
    SetIpv4Dst,
    SetIpv4Dscp,
    SetL4SrcPort,
    SetL4DstPort,
    RegMove,
    RegLoad,
    DecTtl,
    SetTunnel,
    SetQueue,
    PopQueue,
    FinTimeout,
    Resubmit,
    Learn,
    Multipath,
    Autopath,
    Note,
    Exit,
}

/// Size of one learn spec element in an internal record.
pub const LEARN_SPEC_SIZE: usize = 40;

impl ActionKind {
    pub const ALL: [ActionKind; 29] = [
        ActionKind::End,
        ActionKind::Output,
        ActionKind::Controller,
        ActionKind::Enqueue,
        ActionKind::OutputReg,
        ActionKind::Bundle,
        ActionKind::SetVlanVid,
        ActionKind::SetVlanPcp,
        ActionKind::StripVlan,
        ActionKind::SetEthSrc,
        ActionKind::SetEthDst,
        ActionKind::SetIpv4Src,
        ActionKind::SetIpv4Dst,
        ActionKind::SetIpv4Dscp,
        ActionKind::SetL4SrcPort,
        ActionKind::SetL4DstPort,
        ActionKind::RegMove,
        ActionKind::RegLoad,
        ActionKind::DecTtl,
        ActionKind::SetTunnel,
        ActionKind::SetQueue,
        ActionKind::PopQueue,
        ActionKind::FinTimeout,
        ActionKind::Resubmit,
        ActionKind::Learn,
        ActionKind::Multipath,
        ActionKind::Autopath,
        ActionKind::Note,
        ActionKind::Exit,
    ];

    pub fn from_u8(v: u8) -> Option<ActionKind> {
        ActionKind::ALL.get(v as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::End => "END",
            ActionKind::Output => "OUTPUT",
            ActionKind::Controller => "CONTROLLER",
            ActionKind::Enqueue => "ENQUEUE",
            ActionKind::OutputReg => "OUTPUT_REG",
            ActionKind::Bundle => "BUNDLE",
            ActionKind::SetVlanVid => "SET_VLAN_VID",
            ActionKind::SetVlanPcp => "SET_VLAN_PCP",
            ActionKind::StripVlan => "STRIP_VLAN",
            ActionKind::SetEthSrc => "SET_ETH_SRC",
            ActionKind::SetEthDst => "SET_ETH_DST",
            ActionKind::SetIpv4Src => "SET_IPV4_SRC",
            ActionKind::SetIpv4Dst => "SET_IPV4_DST",
            ActionKind::SetIpv4Dscp => "SET_IPV4_DSCP",
            ActionKind::SetL4SrcPort => "SET_L4_SRC_PORT",
            ActionKind::SetL4DstPort => "SET_L4_DST_PORT",
            ActionKind::RegMove => "REG_MOVE",
            ActionKind::RegLoad => "REG_LOAD",
            ActionKind::DecTtl => "DEC_TTL",
            ActionKind::SetTunnel => "SET_TUNNEL",
            ActionKind::SetQueue => "SET_QUEUE",
            ActionKind::PopQueue => "POP_QUEUE",
            ActionKind::FinTimeout => "FIN_TIMEOUT",
            ActionKind::Resubmit => "RESUBMIT",
            ActionKind::Learn => "LEARN",
            ActionKind::Multipath => "MULTIPATH",
            ActionKind::Autopath => "AUTOPATH",
            ActionKind::Note => "NOTE",
            ActionKind::Exit => "EXIT",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            ActionKind::Bundle => Layout::Variable { elem_size: 2 },
            ActionKind::Learn => Layout::Variable { elem_size: LEARN_SPEC_SIZE },
            ActionKind::Note => Layout::Variable { elem_size: 1 },
            _ => Layout::Fixed,
        }
    }

    /// Bytes of the fixed part that follows the record header.
    pub fn fixed_len(self) -> usize {
        const SUBFIELD: usize = 8;
        match self {
            ActionKind::End
            | ActionKind::StripVlan
            | ActionKind::DecTtl
            | ActionKind::PopQueue
            | ActionKind::Exit => 0,
            ActionKind::Output => 2 + 2,
            ActionKind::Controller => 2 + 2 + 1,
            ActionKind::Enqueue => 2 + 4,
            ActionKind::OutputReg => SUBFIELD + 2,
            ActionKind::Bundle => 2 + 2 + 2 + SUBFIELD + 2,
            ActionKind::SetVlanVid => 2,
            ActionKind::SetVlanPcp => 1,
            ActionKind::SetEthSrc | ActionKind::SetEthDst => 6,
            ActionKind::SetIpv4Src | ActionKind::SetIpv4Dst => 4,
            ActionKind::SetIpv4Dscp => 1,
            ActionKind::SetL4SrcPort | ActionKind::SetL4DstPort => 2,
            ActionKind::RegMove => SUBFIELD + SUBFIELD,
            ActionKind::RegLoad => SUBFIELD + 8,
            ActionKind::SetTunnel => 8,
            ActionKind::SetQueue => 4,
            ActionKind::FinTimeout => 2 + 2,
            ActionKind::Resubmit => 2 + 1,
            ActionKind::Learn => 2 + 2 + 2 + 8 + 2 + 1 + 2 + 2 + 2,
            ActionKind::Multipath => 2 + 2 + 2 + 2 + 4 + SUBFIELD,
            ActionKind::Autopath => SUBFIELD + 4,
            ActionKind::Note => 2,
        }
    }

    /// Record length with no trailing elements, header included, padding excluded.
    pub fn raw_size(self) -> usize {
        RECORD_HEADER_LEN + self.fixed_len()
    }

    /// [`raw_size`](Self::raw_size) rounded up to the record alignment.
    pub fn size(self) -> usize {
        round_up(self.raw_size(), ACTION_ALIGN)
    }

    pub fn is_variable(self) -> bool {
        matches!(self.layout(), Layout::Variable { .. })
    }
}

/// Where a wire code lives: a base-dialect action type or a Nicira subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Ofpat10(u16),
    Nx(u16),
}

/// Length rule for a wire entry, header included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireLen {
    Exactly(usize),
    AtLeast(usize),
}

/// Wire form an action was decoded from; records keep it as their `compat` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireCode {
    /// Record built directly rather than decoded.
    None = 0,
    Output10,
    SetVlanVid10,
    SetVlanPcp10,
    StripVlan10,
    SetDlSrc10,
    SetDlDst10,
    SetNwSrc10,
    SetNwDst10,
    SetNwTos10,
    SetTpSrc10,
    SetTpDst10,
    Enqueue10,
    NxResubmit,
    NxSetTunnel,
    NxSetQueue,
    NxPopQueue,
    NxRegMove,
    NxRegLoad,
    NxNote,
    NxSetTunnel64,
    NxMultipath,
    NxAutopath,
    NxBundle,
    NxBundleLoad,
    NxResubmitTable,
    NxOutputReg,
    NxLearn,
    NxExit,
    NxDecTtl,
    NxFinTimeout,
    NxController,
}

impl WireCode {
    pub const ALL: [WireCode; 32] = [
        WireCode::None,
        WireCode::Output10,
        WireCode::SetVlanVid10,
        WireCode::SetVlanPcp10,
        WireCode::StripVlan10,
        WireCode::SetDlSrc10,
        WireCode::SetDlDst10,
        WireCode::SetNwSrc10,
        WireCode::SetNwDst10,
        WireCode::SetNwTos10,
        WireCode::SetTpSrc10,
        WireCode::SetTpDst10,
        WireCode::Enqueue10,
        WireCode::NxResubmit,
        WireCode::NxSetTunnel,
        WireCode::NxSetQueue,
        WireCode::NxPopQueue,
        WireCode::NxRegMove,
        WireCode::NxRegLoad,
        WireCode::NxNote,
        WireCode::NxSetTunnel64,
        WireCode::NxMultipath,
        WireCode::NxAutopath,
        WireCode::NxBundle,
        WireCode::NxBundleLoad,
        WireCode::NxResubmitTable,
        WireCode::NxOutputReg,
        WireCode::NxLearn,
        WireCode::NxExit,
        WireCode::NxDecTtl,
        WireCode::NxFinTimeout,
        WireCode::NxController,
    ];

    pub fn from_u8(v: u8) -> Option<WireCode> {
        WireCode::ALL.get(v as usize).copied()
    }

    /// Base-dialect action type lookup.
    pub fn from_ofpat10(type_: u16) -> Option<WireCode> {
        Some(match type_ {
            wire::OFPAT10_OUTPUT => WireCode::Output10,
            wire::OFPAT10_SET_VLAN_VID => WireCode::SetVlanVid10,
            wire::OFPAT10_SET_VLAN_PCP => WireCode::SetVlanPcp10,
            wire::OFPAT10_STRIP_VLAN => WireCode::StripVlan10,
            wire::OFPAT10_SET_DL_SRC => WireCode::SetDlSrc10,
            wire::OFPAT10_SET_DL_DST => WireCode::SetDlDst10,
            wire::OFPAT10_SET_NW_SRC => WireCode::SetNwSrc10,
            wire::OFPAT10_SET_NW_DST => WireCode::SetNwDst10,
            wire::OFPAT10_SET_NW_TOS => WireCode::SetNwTos10,
            wire::OFPAT10_SET_TP_SRC => WireCode::SetTpSrc10,
            wire::OFPAT10_SET_TP_DST => WireCode::SetTpDst10,
            wire::OFPAT10_ENQUEUE => WireCode::Enqueue10,
            _ => return None,
        })
    }

    /// Nicira subtype lookup. Obsolete subtypes have no mapping.
    pub fn from_nx_subtype(subtype: u16) -> Option<WireCode> {
        Some(match subtype {
            wire::NXAST_RESUBMIT => WireCode::NxResubmit,
            wire::NXAST_SET_TUNNEL => WireCode::NxSetTunnel,
            wire::NXAST_SET_QUEUE => WireCode::NxSetQueue,
            wire::NXAST_POP_QUEUE => WireCode::NxPopQueue,
            wire::NXAST_REG_MOVE => WireCode::NxRegMove,
            wire::NXAST_REG_LOAD => WireCode::NxRegLoad,
            wire::NXAST_NOTE => WireCode::NxNote,
            wire::NXAST_SET_TUNNEL64 => WireCode::NxSetTunnel64,
            wire::NXAST_MULTIPATH => WireCode::NxMultipath,
            wire::NXAST_AUTOPATH => WireCode::NxAutopath,
            wire::NXAST_BUNDLE => WireCode::NxBundle,
            wire::NXAST_BUNDLE_LOAD => WireCode::NxBundleLoad,
            wire::NXAST_RESUBMIT_TABLE => WireCode::NxResubmitTable,
            wire::NXAST_OUTPUT_REG => WireCode::NxOutputReg,
            wire::NXAST_LEARN => WireCode::NxLearn,
            wire::NXAST_EXIT => WireCode::NxExit,
            wire::NXAST_DEC_TTL => WireCode::NxDecTtl,
            wire::NXAST_FIN_TIMEOUT => WireCode::NxFinTimeout,
            wire::NXAST_CONTROLLER => WireCode::NxController,
            _ => return None,
        })
    }

    /// The wire type this code is emitted as. `None` has no wire form.
    pub fn wire_type(self) -> Option<WireType> {
        use WireType::{Nx, Ofpat10};
        Some(match self {
            WireCode::None => return None,
            WireCode::Output10 => Ofpat10(wire::OFPAT10_OUTPUT),
            WireCode::SetVlanVid10 => Ofpat10(wire::OFPAT10_SET_VLAN_VID),
            WireCode::SetVlanPcp10 => Ofpat10(wire::OFPAT10_SET_VLAN_PCP),
            WireCode::StripVlan10 => Ofpat10(wire::OFPAT10_STRIP_VLAN),
            WireCode::SetDlSrc10 => Ofpat10(wire::OFPAT10_SET_DL_SRC),
            WireCode::SetDlDst10 => Ofpat10(wire::OFPAT10_SET_DL_DST),
            WireCode::SetNwSrc10 => Ofpat10(wire::OFPAT10_SET_NW_SRC),
            WireCode::SetNwDst10 => Ofpat10(wire::OFPAT10_SET_NW_DST),
            WireCode::SetNwTos10 => Ofpat10(wire::OFPAT10_SET_NW_TOS),
            WireCode::SetTpSrc10 => Ofpat10(wire::OFPAT10_SET_TP_SRC),
            WireCode::SetTpDst10 => Ofpat10(wire::OFPAT10_SET_TP_DST),
            WireCode::Enqueue10 => Ofpat10(wire::OFPAT10_ENQUEUE),
            WireCode::NxResubmit => Nx(wire::NXAST_RESUBMIT),
            WireCode::NxSetTunnel => Nx(wire::NXAST_SET_TUNNEL),
            WireCode::NxSetQueue => Nx(wire::NXAST_SET_QUEUE),
            WireCode::NxPopQueue => Nx(wire::NXAST_POP_QUEUE),
            WireCode::NxRegMove => Nx(wire::NXAST_REG_MOVE),
            WireCode::NxRegLoad => Nx(wire::NXAST_REG_LOAD),
            WireCode::NxNote => Nx(wire::NXAST_NOTE),
            WireCode::NxSetTunnel64 => Nx(wire::NXAST_SET_TUNNEL64),
            WireCode::NxMultipath => Nx(wire::NXAST_MULTIPATH),
            WireCode::NxAutopath => Nx(wire::NXAST_AUTOPATH),
            WireCode::NxBundle => Nx(wire::NXAST_BUNDLE),
            WireCode::NxBundleLoad => Nx(wire::NXAST_BUNDLE_LOAD),
            WireCode::NxResubmitTable => Nx(wire::NXAST_RESUBMIT_TABLE),
            WireCode::NxOutputReg => Nx(wire::NXAST_OUTPUT_REG),
            WireCode::NxLearn => Nx(wire::NXAST_LEARN),
            WireCode::NxExit => Nx(wire::NXAST_EXIT),
            WireCode::NxDecTtl => Nx(wire::NXAST_DEC_TTL),
            WireCode::NxFinTimeout => Nx(wire::NXAST_FIN_TIMEOUT),
            WireCode::NxController => Nx(wire::NXAST_CONTROLLER),
        })
    }

    /// Internal kind this wire form decodes to.
    pub fn kind(self) -> Option<ActionKind> {
        Some(match self {
            WireCode::None => return None,
            WireCode::Output10 => ActionKind::Output,
            WireCode::SetVlanVid10 => ActionKind::SetVlanVid,
            WireCode::SetVlanPcp10 => ActionKind::SetVlanPcp,
            WireCode::StripVlan10 => ActionKind::StripVlan,
            WireCode::SetDlSrc10 => ActionKind::SetEthSrc,
            WireCode::SetDlDst10 => ActionKind::SetEthDst,
            WireCode::SetNwSrc10 => ActionKind::SetIpv4Src,
            WireCode::SetNwDst10 => ActionKind::SetIpv4Dst,
            WireCode::SetNwTos10 => ActionKind::SetIpv4Dscp,
            WireCode::SetTpSrc10 => ActionKind::SetL4SrcPort,
            WireCode::SetTpDst10 => ActionKind::SetL4DstPort,
            WireCode::Enqueue10 => ActionKind::Enqueue,
            WireCode::NxResubmit | WireCode::NxResubmitTable => ActionKind::Resubmit,
            WireCode::NxSetTunnel | WireCode::NxSetTunnel64 => ActionKind::SetTunnel,
            WireCode::NxSetQueue => ActionKind::SetQueue,
            WireCode::NxPopQueue => ActionKind::PopQueue,
            WireCode::NxRegMove => ActionKind::RegMove,
            WireCode::NxRegLoad => ActionKind::RegLoad,
            WireCode::NxNote => ActionKind::Note,
            WireCode::NxMultipath => ActionKind::Multipath,
            WireCode::NxAutopath => ActionKind::Autopath,
            WireCode::NxBundle | WireCode::NxBundleLoad => ActionKind::Bundle,
            WireCode::NxOutputReg => ActionKind::OutputReg,
            WireCode::NxLearn => ActionKind::Learn,
            WireCode::NxExit => ActionKind::Exit,
            WireCode::NxDecTtl => ActionKind::DecTtl,
            WireCode::NxFinTimeout => ActionKind::FinTimeout,
            WireCode::NxController => ActionKind::Controller,
        })
    }

    /// Length rule of the wire entry, header included.
    pub fn wire_len(self) -> WireLen {
        use WireLen::{AtLeast, Exactly};
        match self {
            WireCode::None => Exactly(0),
            WireCode::Output10
            | WireCode::SetVlanVid10
            | WireCode::SetVlanPcp10
            | WireCode::StripVlan10
            | WireCode::SetNwSrc10
            | WireCode::SetNwDst10
            | WireCode::SetNwTos10
            | WireCode::SetTpSrc10
            | WireCode::SetTpDst10 => Exactly(8),
            WireCode::SetDlSrc10 | WireCode::SetDlDst10 | WireCode::Enqueue10 => Exactly(16),
            WireCode::NxResubmit
            | WireCode::NxResubmitTable
            | WireCode::NxSetTunnel
            | WireCode::NxSetQueue
            | WireCode::NxPopQueue
            | WireCode::NxExit
            | WireCode::NxDecTtl
            | WireCode::NxFinTimeout
            | WireCode::NxController => Exactly(16),
            WireCode::NxRegMove
            | WireCode::NxRegLoad
            | WireCode::NxSetTunnel64
            | WireCode::NxAutopath
            | WireCode::NxOutputReg => Exactly(24),
            WireCode::NxMultipath => Exactly(32),
            WireCode::NxNote => AtLeast(16),
            WireCode::NxBundle | WireCode::NxBundleLoad | WireCode::NxLearn => AtLeast(32),
        }
    }
}
