//! OpenFlow 1.0 and Nicira extension wire constants.
//!
//! All multi-byte wire fields are big-endian. Every wire entry is a multiple of
//! [`ACTION_ALIGN`] bytes long.

/// Alignment of wire entries and of the total action-list length.
pub const ACTION_ALIGN: usize = 8;

/// `type u16, len u16, pad[4]`: the shortest legal entry.
pub const ACTION_HEADER_LEN: usize = 8;

/// `type u16, len u16, vendor u32, subtype u16, pad[6]`.
pub const NX_HEADER_LEN: usize = 16;

/// Nicira vendor id carried by every `OFPAT10_VENDOR` entry we understand.
pub const NX_VENDOR_ID: u32 = 0x0000_2320;

// OpenFlow 1.0 action types.
pub const OFPAT10_OUTPUT: u16 = 0;
pub const OFPAT10_SET_VLAN_VID: u16 = 1;
pub const OFPAT10_SET_VLAN_PCP: u16 = 2;
pub const OFPAT10_STRIP_VLAN: u16 = 3;
pub const OFPAT10_SET_DL_SRC: u16 = 4;
pub const OFPAT10_SET_DL_DST: u16 = 5;
pub const OFPAT10_SET_NW_SRC: u16 = 6;
pub const OFPAT10_SET_NW_DST: u16 = 7;
pub const OFPAT10_SET_NW_TOS: u16 = 8;
pub const OFPAT10_SET_TP_SRC: u16 = 9;
pub const OFPAT10_SET_TP_DST: u16 = 10;
pub const OFPAT10_ENQUEUE: u16 = 11;
pub const OFPAT10_VENDOR: u16 = 0xffff;

// Nicira extension subtypes. 0 and 3 are obsolete and rejected.
pub const NXAST_RESUBMIT: u16 = 1;
pub const NXAST_SET_TUNNEL: u16 = 2;
pub const NXAST_SET_QUEUE: u16 = 4;
pub const NXAST_POP_QUEUE: u16 = 5;
pub const NXAST_REG_MOVE: u16 = 6;
pub const NXAST_REG_LOAD: u16 = 7;
pub const NXAST_NOTE: u16 = 8;
pub const NXAST_SET_TUNNEL64: u16 = 9;
pub const NXAST_MULTIPATH: u16 = 10;
pub const NXAST_AUTOPATH: u16 = 11;
pub const NXAST_BUNDLE: u16 = 12;
pub const NXAST_BUNDLE_LOAD: u16 = 13;
pub const NXAST_RESUBMIT_TABLE: u16 = 14;
pub const NXAST_OUTPUT_REG: u16 = 15;
pub const NXAST_LEARN: u16 = 16;
pub const NXAST_EXIT: u16 = 17;
pub const NXAST_DEC_TTL: u16 = 18;
pub const NXAST_FIN_TIMEOUT: u16 = 19;
pub const NXAST_CONTROLLER: u16 = 20;

// OpenFlow 1.0 ports.
pub const OFPP_MAX: u16 = 0xff00;
pub const OFPP_IN_PORT: u16 = 0xfff8;
pub const OFPP_TABLE: u16 = 0xfff9;
pub const OFPP_NORMAL: u16 = 0xfffa;
pub const OFPP_FLOOD: u16 = 0xfffb;
pub const OFPP_ALL: u16 = 0xfffc;
pub const OFPP_CONTROLLER: u16 = 0xfffd;
pub const OFPP_LOCAL: u16 = 0xfffe;
pub const OFPP_NONE: u16 = 0xffff;

/// Flow-mod flag carried by learn actions.
pub const OFPFF_SEND_FLOW_REM: u16 = 1 << 0;

/// Learned flows without timeouts never expire.
pub const OFP_FLOW_PERMANENT: u16 = 0;
pub const OFP_DEFAULT_PRIORITY: u16 = 0x8000;

/// Most slaves a bundle action may carry.
pub const BUNDLE_MAX_SLAVES: usize = 2048;

// Learn spec header bits.
pub const NX_LEARN_N_BITS_MASK: u16 = 0x3ff;
pub const NX_LEARN_SRC_FIELD: u16 = 0 << 13;
pub const NX_LEARN_SRC_IMMEDIATE: u16 = 1 << 13;
pub const NX_LEARN_SRC_MASK: u16 = 1 << 13;
pub const NX_LEARN_DST_MATCH: u16 = 0 << 11;
pub const NX_LEARN_DST_LOAD: u16 = 1 << 11;
pub const NX_LEARN_DST_OUTPUT: u16 = 2 << 11;
pub const NX_LEARN_DST_RESERVED: u16 = 3 << 11;
pub const NX_LEARN_DST_MASK: u16 = 3 << 11;

/// Rounds `n` up to the next multiple of `align` (a power of two).
pub const fn round_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// Packs a bit offset and width the way NXM actions carry them.
pub fn encode_ofs_nbits(ofs: u16, n_bits: u16) -> u16 {
    (ofs << 6) | (n_bits.wrapping_sub(1) & 0x3f)
}

/// Inverse of [`encode_ofs_nbits`]: returns `(ofs, n_bits)`.
pub fn decode_ofs_nbits(ofs_nbits: u16) -> (u16, u16) {
    (ofs_nbits >> 6, (ofs_nbits & 0x3f) + 1)
}

/// True for the logical ports that are always acceptable as an output target.
pub fn is_reserved_output_port(port: u16) -> bool {
    matches!(
        port,
        OFPP_IN_PORT | OFPP_TABLE | OFPP_NORMAL | OFPP_FLOOD | OFPP_ALL | OFPP_CONTROLLER | OFPP_LOCAL
    )
}

/// Name of a reserved port, or `None` for physical ports.
pub fn port_name(port: u16) -> Option<&'static str> {
    match port {
        OFPP_IN_PORT => Some("IN_PORT"),
        OFPP_TABLE => Some("TABLE"),
        OFPP_NORMAL => Some("NORMAL"),
        OFPP_FLOOD => Some("FLOOD"),
        OFPP_ALL => Some("ALL"),
        OFPP_CONTROLLER => Some("CONTROLLER"),
        OFPP_LOCAL => Some("LOCAL"),
        OFPP_NONE => Some("NONE"),
        _ => None,
    }
}

/// Bytes a learn spec immediate of `n_bits` bits occupies on the wire.
pub fn learn_imm_len(n_bits: u16) -> usize {
    2 * ((n_bits as usize + 15) / 16)
}
