//! Core MRP value types: node/ring state, roles, priorities, addresses.
//!
//! Mirrors the manual enum + `TryFrom`/`From` style used throughout the
//! original crate's `parameters.rs` rather than reaching for a derive macro
//! crate the rest of the dependency stack doesn't otherwise need.

use core::cmp::Ordering;

/// One of the nine states an MRP node's local state machine can be in.
///
/// `POWER_ON` is the only initial state; there is no terminal state, the
/// protocol runs for as long as the node is up.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    PowerOn,
    AcStat1,
    PrmUp,
    ChkRo,
    ChkRc,
    DeIdle,
    Pt,
    De,
    PtIdle,
}

/// Ring-wide connectivity state, recomputed by the manager/automanager role.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingState {
    Open,
    Closed,
    Undefined,
}

/// The role a node plays on the ring.
///
/// `ManagerAuto` is an automanager still arbitrating for the manager role;
/// `ManagerAutoComp` is an automanager that lost arbitration and is
/// currently behaving as a client.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Disabled,
    Client,
    Manager,
    ManagerAuto,
    ManagerAutoComp,
}

impl Role {
    /// True for any flavor of manager, arbitrating or settled.
    pub fn is_manager_like(self) -> bool {
        matches!(self, Role::Manager | Role::ManagerAuto)
    }
}

/// Which of the two ring ports a frame or timer event pertains to.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    NotAssigned,
    Primary,
    Secondary,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortForwardingState {
    Disabled,
    Blocked,
    Forwarding,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
}

/// Which physical ring port slot (as fixed by `Config`) an event concerns.
///
/// This is distinct from [`PortRole`]: the physical slot a port occupies
/// never changes at runtime, only which slot currently plays `Primary` vs
/// `Secondary` does (via the ring-port toggle in the state machine).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enum_map::Enum)]
pub enum RingPortIndex {
    First,
    Second,
}

impl RingPortIndex {
    pub fn other(self) -> RingPortIndex {
        match self {
            RingPortIndex::First => RingPortIndex::Second,
            RingPortIndex::Second => RingPortIndex::First,
        }
    }
}

/// Which observable field of an interface a `DelayTimer` debounces.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enum_map::Enum)]
pub enum InterfaceField {
    State,
    Carrier,
}

/// Manager election priority. Lower numeric value wins; MAC address is the
/// tiebreak when priorities are equal (lower MAC wins there too).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority(pub u16);

impl Priority {
    /// The default MRM priority.
    pub const DEFAULT: Priority = Priority(0x8000);
    /// The default automanager priority - deliberately worse (numerically
    /// higher) than `DEFAULT` so a plain manager wins arbitration against an
    /// automanager that hasn't been explicitly reconfigured.
    pub const MRA_DEFAULT: Priority = Priority(0xA000);

    /// `true` if `(self, self_mac)` should win arbitration against
    /// `(other, other_mac)`.
    pub fn is_better_than(self, self_mac: MacAddress, other: Priority, other_mac: MacAddress) -> bool {
        match self.0.cmp(&other.0) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self_mac.0 < other_mac.0,
        }
    }
}

/// 128-bit MRP ring domain identifier, carried by every PDU.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainId {
    pub uuid0: u64,
    pub uuid1: u64,
}

impl DomainId {
    /// The all-zero domain used when no ring-specific UUID has been
    /// provisioned.
    pub const DEFAULT: DomainId = DomainId { uuid0: 0, uuid1: 0 };
}

/// A 48-bit Ethernet MAC address, ordered lexicographically for the
/// priority tiebreak and the CCM endpoint tiebreak.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    pub const MC_TEST: MacAddress = MacAddress([0x01, 0x15, 0x4E, 0x00, 0x00, 0x01]);
    pub const MC_CONTROL: MacAddress = MacAddress([0x01, 0x15, 0x4E, 0x00, 0x00, 0x02]);
    pub const MC_INTEST: MacAddress = MacAddress([0x01, 0x15, 0x4E, 0x00, 0x00, 0x03]);
    pub const MC_INCONTROL: MacAddress = MacAddress([0x01, 0x15, 0x4E, 0x00, 0x00, 0x04]);
}

/// The EtherType/length-type trailer used by MRP frames.
pub const MRP_LT: u16 = 0x88E3;

/// Opaque identifier for a physical interface, as handed out by the host's
/// interface table. The core never interprets this beyond equality.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortId(pub u16);
