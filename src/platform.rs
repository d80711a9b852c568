//! Collaborator traits the state machine is driven against.
//!
//! Grounded on a `src/device.rs`-style mediator `Radio` trait - an
//! externally-owned collaborator the core only ever borrows, never owns -
//! generalized to the three collaborators SPEC_FULL.md §9 calls out
//! explicitly as replacing the reference's cyclic node/relay/interface-table
//! ownership: a **mediator**, injected once at construction, with no
//! ownership cycle back into the core.

use crate::domain::{LinkState, MacAddress, PortId};

/// The link-layer protocol an interface carries, the same test
/// `initPortTable`/`startContinuityCheck` run against `Protocol::ethernetMac`
/// before touching an interface at all.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceProtocol {
    EthernetMac,
    Other,
}

/// A single interface as reported by the host's interface table.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interface {
    pub id: PortId,
    pub mac: MacAddress,
    pub is_loopback: bool,
    pub is_wired: bool,
    pub is_multicast: bool,
    pub protocol: InterfaceProtocol,
    pub is_up: bool,
    pub has_carrier: bool,
    pub state: LinkState,
}

/// Forwards or blocks a PDU on a ring port. The core calls this once per
/// transmitted PDU; the collaborator owns the frame from that point.
pub trait Relay {
    /// Transmits `pdu` out `port`, addressed from `src_mac` to `dest_mac`
    /// with the given 802.1Q priority and length/type field.
    fn send(&mut self, port: PortId, dest_mac: MacAddress, src_mac: MacAddress, priority: u8, length_type: u16, pdu: &[u8]);

    /// Subscribes the node to a multicast group (e.g. `MC_TEST`).
    fn register_address(&mut self, mac: MacAddress);

    /// The bridge's own MAC address, used to recognize self-sent test
    /// frames that have looped all the way around a closed ring.
    fn bridge_address(&self) -> MacAddress;
}

/// Controls multicast forwarding-table entries on ring ports.
pub trait ForwardingDatabase {
    fn add_mrp_forwarding_interface(&mut self, port: PortId, mac: MacAddress, vlan: u16);
    fn remove_mrp_forwarding_interface(&mut self, port: PortId, mac: MacAddress, vlan: u16);
    /// Flushes all learned MAC entries - called after a topology change.
    fn clear_table(&mut self);
}

/// Read-only access to the host's interface table, grounded on
/// `initPortTable`'s `getNumInterfaces`/`getInterface(i)` enumeration.
pub trait InterfaceTable {
    /// Total number of interfaces the host knows about, for enumeration
    /// via [`InterfaceTable::interface`].
    fn interface_count(&self) -> usize;

    /// The interface at position `index` (`0..interface_count()`).
    fn interface(&self, index: usize) -> Interface;

    /// Looks an interface up by id, as ring port construction does. `None`
    /// when `id` does not name a live interface - a plain `Interface` would
    /// force a caller to fabricate one for an id the host does not
    /// recognize, so this lookup stays fallible even though
    /// [`InterfaceTable::interface`] is not.
    fn interface_by_id(&self, id: PortId) -> Option<Interface>;
}

/// The bundle of external collaborators the core is generic over. A host
/// implements all three on one type (often the same object that owns the
/// bridge) and hands it to [`crate::node::Node::new`].
pub trait Platform: Relay + ForwardingDatabase + InterfaceTable {}

impl<T: Relay + ForwardingDatabase + InterfaceTable> Platform for T {}
