//! MRP PDU framing: the TLV sequence carried inside an Ethernet frame
//! addressed to one of the well-known MRP multicast groups.
//!
//! Shaped after a `mac_frame.rs`-style codec (owned buffer structs,
//! hand-rolled `from_bytes`/size-mismatch errors) but big-endian on the
//! wire and, since every MRP PDU is small and bounded, built on
//! `heapless::Vec` rather than a zero-copy borrowed view - there is no
//! payload large enough here to make a borrow worth the added lifetime.

use heapless::Vec;

use crate::domain::{DomainId, LinkState, MacAddress, PortRole, Priority, RingState};
use crate::error::{DecodeError, EncodeError};
use crate::serde::{be_u16, be_u16_to_bytes, be_u32, be_u32_to_bytes, be_u64, be_u64_to_bytes};

/// No TLV combination this protocol defines exceeds this many bytes.
pub const MAX_PDU_LEN: usize = 128;

const VERSION: u16 = 0x0001;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TlvType {
    End = 0,
    Common = 1,
    Test = 2,
    TopologyChange = 3,
    LinkDown = 4,
    LinkUp = 5,
    InTest = 6,
    InTopologyChange = 7,
    InLinkDown = 8,
    InLinkUp = 9,
    InLinkStatusPoll = 10,
    Option = 127,
}

impl TlvType {
    fn from_u8(v: u8) -> Option<TlvType> {
        Some(match v {
            0 => TlvType::End,
            1 => TlvType::Common,
            2 => TlvType::Test,
            3 => TlvType::TopologyChange,
            4 => TlvType::LinkDown,
            5 => TlvType::LinkUp,
            6 => TlvType::InTest,
            7 => TlvType::InTopologyChange,
            8 => TlvType::InLinkDown,
            9 => TlvType::InLinkUp,
            10 => TlvType::InLinkStatusPoll,
            127 => TlvType::Option,
            _ => return None,
        })
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubTlvType {
    Reserved = 0,
    TestMgrNack = 1,
    TestPropagate = 2,
    AutoMgr = 3,
}

impl SubTlvType {
    fn from_u8(v: u8) -> Option<SubTlvType> {
        Some(match v {
            0 => SubTlvType::Reserved,
            1 => SubTlvType::TestMgrNack,
            2 => SubTlvType::TestPropagate,
            3 => SubTlvType::AutoMgr,
            _ => return None,
        })
    }
}

fn port_role_to_wire(role: PortRole) -> u16 {
    match role {
        PortRole::NotAssigned => 0,
        PortRole::Primary => 1,
        PortRole::Secondary => 2,
    }
}

fn port_role_from_wire(v: u16) -> PortRole {
    match v {
        1 => PortRole::Primary,
        2 => PortRole::Secondary,
        _ => PortRole::NotAssigned,
    }
}

fn ring_state_to_wire(state: RingState) -> u16 {
    match state {
        RingState::Undefined => 0,
        RingState::Open => 1,
        RingState::Closed => 2,
    }
}

fn ring_state_from_wire(v: u16) -> RingState {
    match v {
        1 => RingState::Open,
        2 => RingState::Closed,
        _ => RingState::Undefined,
    }
}

/// `TEST` / `INTEST` TLV body.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestTlv {
    pub priority: Priority,
    pub source_mac: MacAddress,
    pub port_role: PortRole,
    pub ring_state: RingState,
    pub transition: u16,
    pub timestamp: u32,
}

const TEST_TLV_LEN: u8 = 18;

impl TestTlv {
    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        push_all(out, &be_u16_to_bytes(self.priority.0))?;
        push_all(out, &self.source_mac.0)?;
        push_all(out, &be_u16_to_bytes(port_role_to_wire(self.port_role)))?;
        push_all(out, &be_u16_to_bytes(ring_state_to_wire(self.ring_state)))?;
        push_all(out, &be_u16_to_bytes(self.transition))?;
        push_all(out, &be_u32_to_bytes(self.timestamp))?;
        Ok(())
    }

    fn decode(body: &[u8]) -> Result<TestTlv, DecodeError> {
        require_len(body, TEST_TLV_LEN as usize, TlvType::Test as u8)?;
        Ok(TestTlv {
            priority: Priority(be_u16([body[0], body[1]])),
            source_mac: MacAddress([body[2], body[3], body[4], body[5], body[6], body[7]]),
            port_role: port_role_from_wire(be_u16([body[8], body[9]])),
            ring_state: ring_state_from_wire(be_u16([body[10], body[11]])),
            transition: be_u16([body[12], body[13]]),
            timestamp: be_u32([body[14], body[15], body[16], body[17]]),
        })
    }
}

/// `TOPOLOGYCHANGE` / `INTOPOLOGYCHANGE` TLV body.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyChangeTlv {
    pub priority: Priority,
    pub source_mac: MacAddress,
    pub port_role: PortRole,
    pub interval: u16,
    pub transition: u16,
}

const TOPOLOGY_CHANGE_TLV_LEN: u8 = 14;

impl TopologyChangeTlv {
    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        push_all(out, &be_u16_to_bytes(self.priority.0))?;
        push_all(out, &self.source_mac.0)?;
        push_all(out, &be_u16_to_bytes(port_role_to_wire(self.port_role)))?;
        push_all(out, &be_u16_to_bytes(self.interval))?;
        push_all(out, &be_u16_to_bytes(self.transition))?;
        Ok(())
    }

    fn decode(body: &[u8]) -> Result<TopologyChangeTlv, DecodeError> {
        require_len(body, TOPOLOGY_CHANGE_TLV_LEN as usize, TlvType::TopologyChange as u8)?;
        Ok(TopologyChangeTlv {
            priority: Priority(be_u16([body[0], body[1]])),
            source_mac: MacAddress([body[2], body[3], body[4], body[5], body[6], body[7]]),
            port_role: port_role_from_wire(be_u16([body[8], body[9]])),
            interval: be_u16([body[10], body[11]]),
            transition: be_u16([body[12], body[13]]),
        })
    }
}

/// `LINKUP` / `LINKDOWN` / `INLINKUP` / `INLINKDOWN` TLV body. Which link
/// state it represents is carried by the enclosing TLV type, not a field.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTlv {
    pub source_mac: MacAddress,
    pub port_role: PortRole,
    pub interval: u16,
    pub blocked: bool,
    pub transition: u16,
}

const LINK_TLV_LEN: u8 = 14;

impl LinkTlv {
    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        push_all(out, &self.source_mac.0)?;
        push_all(out, &be_u16_to_bytes(port_role_to_wire(self.port_role)))?;
        push_all(out, &be_u16_to_bytes(self.interval))?;
        out.push(if self.blocked { 1 } else { 0 })
            .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        out.push(0).map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        push_all(out, &be_u16_to_bytes(self.transition))?;
        Ok(())
    }

    fn decode(body: &[u8]) -> Result<LinkTlv, DecodeError> {
        require_len(body, LINK_TLV_LEN as usize, TlvType::LinkUp as u8)?;
        Ok(LinkTlv {
            source_mac: MacAddress([body[0], body[1], body[2], body[3], body[4], body[5]]),
            port_role: port_role_from_wire(be_u16([body[6], body[7]])),
            interval: be_u16([body[8], body[9]]),
            blocked: body[10] != 0,
            transition: be_u16([body[12], body[13]]),
        })
    }
}

/// `INLINKSTATUSPOLL` TLV body - a bare request, identified by source.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatusPollTlv {
    pub source_mac: MacAddress,
}

const LINK_STATUS_POLL_TLV_LEN: u8 = 6;

impl LinkStatusPollTlv {
    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        push_all(out, &self.source_mac.0)
    }

    fn decode(body: &[u8]) -> Result<LinkStatusPollTlv, DecodeError> {
        require_len(body, LINK_STATUS_POLL_TLV_LEN as usize, TlvType::InLinkStatusPoll as u8)?;
        Ok(LinkStatusPollTlv {
            source_mac: MacAddress([body[0], body[1], body[2], body[3], body[4], body[5]]),
        })
    }
}

/// The primary TLV carried by a PDU - exactly one of these precedes the
/// optional `OPTION` TLV and the mandatory `CommonTLV`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primary {
    Test(TestTlv),
    TopologyChange(TopologyChangeTlv),
    LinkChange(LinkState, LinkTlv),
    InTest(TestTlv),
    InTopologyChange(TopologyChangeTlv),
    InLinkChange(LinkState, LinkTlv),
    InLinkStatusPoll(LinkStatusPollTlv),
}

/// `TEST_MGR_NACK` / `TEST_PROPAGATE` sub-TLV payload: the sender's own
/// priority/MAC plus the best manager it currently knows of.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrationSubTlv {
    pub prio: Priority,
    pub source_mac: MacAddress,
    pub other_mrm_prio: Priority,
    pub other_mrm_mac: MacAddress,
}

const ARBITRATION_SUB_TLV_LEN: u8 = 16;

impl ArbitrationSubTlv {
    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        push_all(out, &be_u16_to_bytes(self.prio.0))?;
        push_all(out, &self.source_mac.0)?;
        push_all(out, &be_u16_to_bytes(self.other_mrm_prio.0))?;
        push_all(out, &self.other_mrm_mac.0)?;
        Ok(())
    }

    fn decode(body: &[u8]) -> Result<ArbitrationSubTlv, DecodeError> {
        require_len(body, ARBITRATION_SUB_TLV_LEN as usize, SubTlvType::TestMgrNack as u8)?;
        Ok(ArbitrationSubTlv {
            prio: Priority(be_u16([body[0], body[1]])),
            source_mac: MacAddress([body[2], body[3], body[4], body[5], body[6], body[7]]),
            other_mrm_prio: Priority(be_u16([body[8], body[9]])),
            other_mrm_mac: MacAddress([body[10], body[11], body[12], body[13], body[14], body[15]]),
        })
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubTlv {
    TestMgrNack(ArbitrationSubTlv),
    TestPropagate(ArbitrationSubTlv),
    AutoMgr,
    Reserved,
}

/// `OPTION(127)` TLV: a vendor/standard OUI plus zero or one sub-TLV.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionTlv {
    pub oui: [u8; 3],
    pub sub_tlv: Option<SubTlv>,
}

impl OptionTlv {
    pub const IEC_OUI: [u8; 3] = [0x00, 0x80, 0x63];

    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        // type + length placeholder, body, backpatch length
        let type_pos = out.len();
        out.push(TlvType::Option as u8)
            .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        out.push(0).map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        let body_start = out.len();
        push_all(out, &self.oui)?;
        match &self.sub_tlv {
            None => {}
            Some(SubTlv::TestMgrNack(a)) => {
                out.push(SubTlvType::TestMgrNack as u8)
                    .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
                a.encode(out)?;
            }
            Some(SubTlv::TestPropagate(a)) => {
                out.push(SubTlvType::TestPropagate as u8)
                    .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
                a.encode(out)?;
            }
            Some(SubTlv::AutoMgr) => {
                out.push(SubTlvType::AutoMgr as u8)
                    .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
            }
            Some(SubTlv::Reserved) => {
                out.push(SubTlvType::Reserved as u8)
                    .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
            }
        }
        let body_len = out.len() - body_start;
        out[type_pos + 1] = body_len as u8;
        Ok(())
    }

    /// `body` is the TLV's declared-length byte range, excluding the type
    /// and length bytes themselves.
    fn decode(body: &[u8]) -> Result<OptionTlv, DecodeError> {
        if body.len() < 3 {
            return Err(DecodeError::BadTlvLength {
                tlv_type: TlvType::Option as u8,
                declared: body.len() as u8,
                remaining: body.len(),
            });
        }
        let oui = [body[0], body[1], body[2]];
        let rest = &body[3..];
        let sub_tlv = if rest.is_empty() {
            None
        } else {
            let sub_type = SubTlvType::from_u8(rest[0]).ok_or(DecodeError::UnknownSubTlvType(rest[0]))?;
            let sub_body = &rest[1..];
            Some(match sub_type {
                SubTlvType::TestMgrNack => SubTlv::TestMgrNack(ArbitrationSubTlv::decode(sub_body)?),
                SubTlvType::TestPropagate => SubTlv::TestPropagate(ArbitrationSubTlv::decode(sub_body)?),
                SubTlvType::AutoMgr => SubTlv::AutoMgr,
                // not implemented on the wire beyond its tag; recognized and ignored.
                SubTlvType::Reserved => SubTlv::Reserved,
            })
        };
        Ok(OptionTlv { oui, sub_tlv })
    }
}

/// `CommonTLV(type=1, length=18)`: the sequence id and domain every PDU
/// carries, always the TLV immediately before `END`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonTlv {
    pub sequence_id: u16,
    pub domain: DomainId,
}

const COMMON_TLV_LEN: u8 = 18;

impl CommonTlv {
    fn encode(&self, out: &mut Vec<u8, MAX_PDU_LEN>) -> Result<(), EncodeError> {
        push_all(out, &be_u16_to_bytes(self.sequence_id))?;
        push_all(out, &be_u64_to_bytes(self.domain.uuid0))?;
        push_all(out, &be_u64_to_bytes(self.domain.uuid1))?;
        Ok(())
    }

    fn decode(body: &[u8]) -> Result<CommonTlv, DecodeError> {
        require_len(body, COMMON_TLV_LEN as usize, TlvType::Common as u8)?;
        Ok(CommonTlv {
            sequence_id: be_u16([body[0], body[1]]),
            domain: DomainId {
                uuid0: be_u64([body[2], body[3], body[4], body[5], body[6], body[7], body[8], body[9]]),
                uuid1: be_u64([body[10], body[11], body[12], body[13], body[14], body[15], body[16], body[17]]),
            },
        })
    }
}

/// A complete MRP PDU: version, primary TLV, optional `OPTION` TLV, the
/// mandatory common TLV, and the `END` terminator.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pdu {
    pub primary: Primary,
    pub option: Option<OptionTlv>,
    pub common: CommonTlv,
}

impl Pdu {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let mut out: Vec<u8, MAX_PDU_LEN> = Vec::new();
        push_all(&mut out, &be_u16_to_bytes(VERSION))?;

        let ty = match &self.primary {
            Primary::Test(_) => TlvType::Test,
            Primary::TopologyChange(_) => TlvType::TopologyChange,
            Primary::LinkChange(LinkState::Up, _) => TlvType::LinkUp,
            Primary::LinkChange(LinkState::Down, _) => TlvType::LinkDown,
            Primary::InTest(_) => TlvType::InTest,
            Primary::InTopologyChange(_) => TlvType::InTopologyChange,
            Primary::InLinkChange(LinkState::Up, _) => TlvType::InLinkUp,
            Primary::InLinkChange(LinkState::Down, _) => TlvType::InLinkDown,
            Primary::InLinkStatusPoll(_) => TlvType::InLinkStatusPoll,
        };
        let type_pos = out.len();
        out.push(ty as u8).map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        out.push(0).map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        let body_start = out.len();
        match &self.primary {
            Primary::Test(t) | Primary::InTest(t) => t.encode(&mut out)?,
            Primary::TopologyChange(t) | Primary::InTopologyChange(t) => t.encode(&mut out)?,
            Primary::LinkChange(_, t) | Primary::InLinkChange(_, t) => t.encode(&mut out)?,
            Primary::InLinkStatusPoll(t) => t.encode(&mut out)?,
        }
        let body_len = out.len() - body_start;
        out[type_pos + 1] = body_len as u8;

        if let Some(opt) = &self.option {
            opt.encode(&mut out)?;
        }

        out.push(TlvType::Common as u8)
            .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        out.push(COMMON_TLV_LEN)
            .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        self.common.encode(&mut out)?;

        out.push(TlvType::End as u8)
            .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;
        out.push(0).map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + 1 })?;

        if buf.len() < out.len() {
            return Err(EncodeError::BufferTooSmall { have: buf.len(), need: out.len() });
        }
        buf[..out.len()].copy_from_slice(&out);
        Ok(out.len())
    }

    pub fn decode(bytes: &[u8]) -> Result<Pdu, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::TooSmall { have: bytes.len(), need: 2 });
        }
        let version = be_u16([bytes[0], bytes[1]]);
        if version != VERSION {
            return Err(DecodeError::VersionMismatch { have: version });
        }

        let mut pos = 2usize;
        let (primary, next) = Self::decode_tlv(bytes, pos)?;
        pos = next;

        let mut option = None;
        if pos < bytes.len() && bytes[pos] == TlvType::Option as u8 {
            let (ty, len, body_start) = Self::tlv_header(bytes, pos)?;
            debug_assert_eq!(ty, TlvType::Option as u8);
            let body = &bytes[body_start..body_start + len as usize];
            option = Some(OptionTlv::decode(body)?);
            pos = body_start + len as usize;
        }

        let (ty, len, body_start) = Self::tlv_header(bytes, pos)?;
        if TlvType::from_u8(ty) != Some(TlvType::Common) {
            return Err(DecodeError::UnknownTlvType(ty));
        }
        let common = CommonTlv::decode(&bytes[body_start..body_start + len as usize])?;
        pos = body_start + len as usize;

        let (end_ty, _end_len, end_body_start) = Self::tlv_header(bytes, pos)?;
        if TlvType::from_u8(end_ty) != Some(TlvType::End) {
            return Err(DecodeError::MissingEndTlv);
        }
        let _ = end_body_start;

        Ok(Pdu { primary, option, common })
    }

    fn tlv_header(bytes: &[u8], pos: usize) -> Result<(u8, u8, usize), DecodeError> {
        if bytes.len() < pos + 2 {
            return Err(DecodeError::TooSmall { have: bytes.len(), need: pos + 2 });
        }
        let ty = bytes[pos];
        let len = bytes[pos + 1];
        let body_start = pos + 2;
        if bytes.len() < body_start + len as usize {
            return Err(DecodeError::BadTlvLength { tlv_type: ty, declared: len, remaining: bytes.len() - body_start });
        }
        Ok((ty, len, body_start))
    }

    fn decode_tlv(bytes: &[u8], pos: usize) -> Result<(Primary, usize), DecodeError> {
        let (ty, len, body_start) = Self::tlv_header(bytes, pos)?;
        let body = &bytes[body_start..body_start + len as usize];
        let next = body_start + len as usize;
        let tlv_type = TlvType::from_u8(ty).ok_or(DecodeError::UnknownTlvType(ty))?;
        let primary = match tlv_type {
            TlvType::Test => Primary::Test(TestTlv::decode(body)?),
            TlvType::TopologyChange => Primary::TopologyChange(TopologyChangeTlv::decode(body)?),
            TlvType::LinkUp => Primary::LinkChange(LinkState::Up, LinkTlv::decode(body)?),
            TlvType::LinkDown => Primary::LinkChange(LinkState::Down, LinkTlv::decode(body)?),
            TlvType::InTest => Primary::InTest(TestTlv::decode(body)?),
            TlvType::InTopologyChange => Primary::InTopologyChange(TopologyChangeTlv::decode(body)?),
            TlvType::InLinkUp => Primary::InLinkChange(LinkState::Up, LinkTlv::decode(body)?),
            TlvType::InLinkDown => Primary::InLinkChange(LinkState::Down, LinkTlv::decode(body)?),
            TlvType::InLinkStatusPoll => Primary::InLinkStatusPoll(LinkStatusPollTlv::decode(body)?),
            TlvType::End | TlvType::Common | TlvType::Option => return Err(DecodeError::UnknownTlvType(ty)),
        };
        Ok((primary, next))
    }
}

fn push_all(out: &mut Vec<u8, MAX_PDU_LEN>, bytes: &[u8]) -> Result<(), EncodeError> {
    out.extend_from_slice(bytes)
        .map_err(|_| EncodeError::BufferTooSmall { have: out.len(), need: out.len() + bytes.len() })
}

fn require_len(body: &[u8], need: usize, tlv_type: u8) -> Result<(), DecodeError> {
    if body.len() != need {
        return Err(DecodeError::BadTlvLength { tlv_type, declared: body.len() as u8, remaining: body.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> DomainId {
        DomainId { uuid0: 0x0102030405060708, uuid1: 0x1112131415161718 }
    }

    #[test]
    fn round_trips_test_pdu() {
        let pdu = Pdu {
            primary: Primary::Test(TestTlv {
                priority: Priority::DEFAULT,
                source_mac: MacAddress([1, 2, 3, 4, 5, 6]),
                port_role: PortRole::Primary,
                ring_state: RingState::Closed,
                transition: 3,
                timestamp: 123456,
            }),
            option: None,
            common: CommonTlv { sequence_id: 7, domain: domain() },
        };
        let mut buf = [0u8; MAX_PDU_LEN];
        let n = pdu.encode(&mut buf).unwrap();
        let decoded = Pdu::decode(&buf[..n]).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn round_trips_topology_change_pdu() {
        let pdu = Pdu {
            primary: Primary::TopologyChange(TopologyChangeTlv {
                priority: Priority::DEFAULT,
                source_mac: MacAddress([1, 2, 3, 4, 5, 6]),
                port_role: PortRole::Secondary,
                interval: 500,
                transition: 9,
            }),
            option: None,
            common: CommonTlv { sequence_id: 42, domain: domain() },
        };
        let mut buf = [0u8; MAX_PDU_LEN];
        let n = pdu.encode(&mut buf).unwrap();
        let decoded = Pdu::decode(&buf[..n]).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn round_trips_link_pdu_with_option() {
        let pdu = Pdu {
            primary: Primary::LinkChange(
                LinkState::Up,
                LinkTlv {
                    source_mac: MacAddress([9, 8, 7, 6, 5, 4]),
                    port_role: PortRole::Primary,
                    interval: 20,
                    blocked: false,
                    transition: 1,
                },
            ),
            option: Some(OptionTlv {
                oui: OptionTlv::IEC_OUI,
                sub_tlv: Some(SubTlv::TestMgrNack(ArbitrationSubTlv {
                    prio: Priority::MRA_DEFAULT,
                    source_mac: MacAddress([1, 1, 1, 1, 1, 1]),
                    other_mrm_prio: Priority::DEFAULT,
                    other_mrm_mac: MacAddress([2, 2, 2, 2, 2, 2]),
                })),
            }),
            common: CommonTlv { sequence_id: 1, domain: domain() },
        };
        let mut buf = [0u8; MAX_PDU_LEN];
        let n = pdu.encode(&mut buf).unwrap();
        let decoded = Pdu::decode(&buf[..n]).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn round_trips_reserved_sub_tlv() {
        let pdu = Pdu {
            primary: Primary::Test(TestTlv {
                priority: Priority::DEFAULT,
                source_mac: MacAddress([1, 2, 3, 4, 5, 6]),
                port_role: PortRole::Primary,
                ring_state: RingState::Open,
                transition: 0,
                timestamp: 0,
            }),
            option: Some(OptionTlv { oui: OptionTlv::IEC_OUI, sub_tlv: Some(SubTlv::Reserved) }),
            common: CommonTlv { sequence_id: 1, domain: domain() },
        };
        let mut buf = [0u8; MAX_PDU_LEN];
        let n = pdu.encode(&mut buf).unwrap();
        let decoded = Pdu::decode(&buf[..n]).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn rejects_bad_version() {
        let mut buf = [0u8; 4];
        buf[0] = 0x00;
        buf[1] = 0x02;
        assert_eq!(Pdu::decode(&buf), Err(DecodeError::VersionMismatch { have: 2 }));
    }

    #[test]
    fn rejects_unknown_tlv_type() {
        let mut buf = [0u8; 6];
        buf[0] = 0x00;
        buf[1] = 0x01; // version
        buf[2] = 0x63; // bogus primary TLV type
        buf[3] = 0x00; // length 0
        assert_eq!(Pdu::decode(&buf), Err(DecodeError::UnknownTlvType(0x63)));
    }
}
