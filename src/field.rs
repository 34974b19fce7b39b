//! Packet and metadata fields that actions may read or write, and bit ranges within them.
//!
//! Fields are identified on the wire by their 32-bit NXM header,
//! `(vendor << 16) | (field << 9) | length`. Only the fields actions can reference are
//! modelled here; matching itself lives elsewhere.

use std::collections::HashSet;
use std::fmt;

/// A field an action can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MfField {
    InPort,
    EthDst,
    EthSrc,
    EthType,
    VlanTci,
    IpTos,
    IpProto,
    IpSrc,
    IpDst,
    TcpSrc,
    TcpDst,
    UdpSrc,
    UdpDst,
    /// General purpose register 0..=7.
    Reg(u8),
    TunId,
}

/// Number of general purpose registers.
pub const N_REGS: u8 = 8;

const fn nxm_header(vendor: u32, field: u32, length: u32) -> u32 {
    (vendor << 16) | (field << 9) | length
}

const ETH_TYPE_IP: u64 = 0x0800;
const IPPROTO_TCP: u64 = 6;
const IPPROTO_UDP: u64 = 17;

impl MfField {
    pub fn header(self) -> u32 {
        match self {
            MfField::InPort => nxm_header(0, 0, 2),
            MfField::EthDst => nxm_header(0, 1, 6),
            MfField::EthSrc => nxm_header(0, 2, 6),
            MfField::EthType => nxm_header(0, 3, 2),
            MfField::VlanTci => nxm_header(0, 4, 2),
            MfField::IpTos => nxm_header(0, 5, 1),
            MfField::IpProto => nxm_header(0, 6, 1),
            MfField::IpSrc => nxm_header(0, 7, 4),
            MfField::IpDst => nxm_header(0, 8, 4),
            MfField::TcpSrc => nxm_header(0, 9, 2),
            MfField::TcpDst => nxm_header(0, 10, 2),
            MfField::UdpSrc => nxm_header(0, 11, 2),
            MfField::UdpDst => nxm_header(0, 12, 2),
            MfField::Reg(n) => nxm_header(1, n as u32, 4),
            MfField::TunId => nxm_header(1, 16, 8),
        }
    }

    /// Field named by an NXM header, or `None` for headers no action may use.
    pub fn from_header(header: u32) -> Option<MfField> {
        const IN_PORT: u32 = nxm_header(0, 0, 2);
        const ETH_DST: u32 = nxm_header(0, 1, 6);
        const ETH_SRC: u32 = nxm_header(0, 2, 6);
        const ETH_TYPE: u32 = nxm_header(0, 3, 2);
        const VLAN_TCI: u32 = nxm_header(0, 4, 2);
        const IP_TOS: u32 = nxm_header(0, 5, 1);
        const IP_PROTO: u32 = nxm_header(0, 6, 1);
        const IP_SRC: u32 = nxm_header(0, 7, 4);
        const IP_DST: u32 = nxm_header(0, 8, 4);
        const TCP_SRC: u32 = nxm_header(0, 9, 2);
        const TCP_DST: u32 = nxm_header(0, 10, 2);
        const UDP_SRC: u32 = nxm_header(0, 11, 2);
        const UDP_DST: u32 = nxm_header(0, 12, 2);
        const TUN_ID: u32 = nxm_header(1, 16, 8);
        Some(match header {
            IN_PORT => MfField::InPort,
            ETH_DST => MfField::EthDst,
            ETH_SRC => MfField::EthSrc,
            ETH_TYPE => MfField::EthType,
            VLAN_TCI => MfField::VlanTci,
            IP_TOS => MfField::IpTos,
            IP_PROTO => MfField::IpProto,
            IP_SRC => MfField::IpSrc,
            IP_DST => MfField::IpDst,
            TCP_SRC => MfField::TcpSrc,
            TCP_DST => MfField::TcpDst,
            UDP_SRC => MfField::UdpSrc,
            UDP_DST => MfField::UdpDst,
            TUN_ID => MfField::TunId,
            h if h & !(0x7f << 9) == nxm_header(1, 0, 4) => {
                let n = ((h >> 9) & 0x7f) as u8;
                if n < N_REGS {
                    MfField::Reg(n)
                } else {
                    return None;
                }
            }
            _ => return None,
        })
    }

    /// Width of the field in bits.
    pub fn n_bits(self) -> u32 {
        (self.header() & 0xff) * 8
    }

    /// Whether actions may write the field.
    pub fn is_writable(self) -> bool {
        !matches!(self, MfField::EthType | MfField::IpProto)
    }

    /// Field and value a flow must carry before this field is meaningful.
    pub fn prerequisite(self) -> Option<(MfField, u64)> {
        match self {
            MfField::IpTos | MfField::IpProto | MfField::IpSrc | MfField::IpDst => {
                Some((MfField::EthType, ETH_TYPE_IP))
            }
            MfField::TcpSrc | MfField::TcpDst => Some((MfField::IpProto, IPPROTO_TCP)),
            MfField::UdpSrc | MfField::UdpDst => Some((MfField::IpProto, IPPROTO_UDP)),
            _ => None,
        }
    }

    pub fn name(self) -> String {
        match self {
            MfField::InPort => "NXM_OF_IN_PORT".to_string(),
            MfField::EthDst => "NXM_OF_ETH_DST".to_string(),
            MfField::EthSrc => "NXM_OF_ETH_SRC".to_string(),
            MfField::EthType => "NXM_OF_ETH_TYPE".to_string(),
            MfField::VlanTci => "NXM_OF_VLAN_TCI".to_string(),
            MfField::IpTos => "NXM_OF_IP_TOS".to_string(),
            MfField::IpProto => "NXM_OF_IP_PROTO".to_string(),
            MfField::IpSrc => "NXM_OF_IP_SRC".to_string(),
            MfField::IpDst => "NXM_OF_IP_DST".to_string(),
            MfField::TcpSrc => "NXM_OF_TCP_SRC".to_string(),
            MfField::TcpDst => "NXM_OF_TCP_DST".to_string(),
            MfField::UdpSrc => "NXM_OF_UDP_SRC".to_string(),
            MfField::UdpDst => "NXM_OF_UDP_DST".to_string(),
            MfField::Reg(n) => format!("NXM_NX_REG{}", n),
            MfField::TunId => "NXM_NX_TUN_ID".to_string(),
        }
    }
}

impl fmt::Display for MfField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A bit range `ofs..ofs + n_bits` within a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subfield {
    pub field: MfField,
    pub ofs: u16,
    pub n_bits: u16,
}

impl Subfield {
    pub fn new(field: MfField, ofs: u16, n_bits: u16) -> Self {
        Subfield { field, ofs, n_bits }
    }

    /// The whole field.
    pub fn whole(field: MfField) -> Self {
        Subfield { field, ofs: 0, n_bits: field.n_bits() as u16 }
    }

    /// True if the range is non-empty and lies inside a field `width` bits wide.
    pub fn fits(&self, width: u32) -> bool {
        self.n_bits > 0 && self.ofs as u32 + self.n_bits as u32 <= width
    }
}

/// `NXM_NX_REG0[]`, `NXM_NX_REG0[5]` or `NXM_NX_REG0[0..15]`.
impl fmt::Display for Subfield {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.field)?;
        if self.ofs == 0 && self.n_bits as u32 == self.field.n_bits() {
            write!(f, "[]")
        } else if self.n_bits == 1 {
            write!(f, "[{}]", self.ofs)
        } else {
            write!(f, "[{}..{}]", self.ofs, self.ofs as u32 + self.n_bits as u32 - 1)
        }
    }
}

/// What the validator needs to know about the flow an action list will be attached to.
pub trait FlowContext {
    /// Declared width of `field` in this flow, or `None` if the field is unavailable.
    fn field_width(&self, field: MfField) -> Option<u32>;

    /// Current value of `field`, if the flow pins one.
    fn field_value(&self, field: MfField) -> Option<u64>;

    fn is_writable(&self, field: MfField) -> bool {
        field.is_writable()
    }
}

/// A flow described by the header values that gate field prerequisites.
#[derive(Debug, Clone, Default)]
pub struct Flow {
    pub eth_type: Option<u16>,
    pub ip_proto: Option<u8>,
    /// Fields the datapath does not provide for this flow.
    pub unavailable: HashSet<MfField>,
}

impl Flow {
    pub fn new() -> Self {
        Flow::default()
    }

    pub fn ipv4(ip_proto: Option<u8>) -> Self {
        Flow { eth_type: Some(ETH_TYPE_IP as u16), ip_proto, unavailable: HashSet::new() }
    }
}

impl FlowContext for Flow {
    fn field_width(&self, field: MfField) -> Option<u32> {
        if self.unavailable.contains(&field) {
            None
        } else {
            Some(field.n_bits())
        }
    }

    fn field_value(&self, field: MfField) -> Option<u64> {
        match field {
            MfField::EthType => self.eth_type.map(u64::from),
            MfField::IpProto => self.ip_proto.map(u64::from),
            _ => None,
        }
    }
}

/// True if every prerequisite of `field` (transitively) holds in `flow`.
pub fn prerequisites_ok(field: MfField, flow: &dyn FlowContext) -> bool {
    let mut cur = field;
    while let Some((dep, value)) = cur.prerequisite() {
        if flow.field_value(dep) != Some(value) {
            return false;
        }
        cur = dep;
    }
    true
}
