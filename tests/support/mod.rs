//! Shared test fixtures: a deterministic fake clock and an in-memory
//! `Platform` double, grounded on `oxidecomputer-hubris/lib/multitimer`'s
//! fake-clock test harness (the same lineage `TimerBank` was modeled on),
//! adapted from a raw `u64` tick source to `embedded_time::Clock` since
//! that is what `Node<C, P>` is generic over.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_time::clock::Error as ClockError;
use embedded_time::fraction::Fraction;
use embedded_time::{Clock, Instant};

use mrp::{ForwardingDatabase, Interface, InterfaceProtocol, InterfaceTable, MacAddress, PortId, Relay};

/// A clock that exists only so test code can name `Instant<TestClock>`
/// values and pass them to `Node`'s `&mut self, now: Instant<C>` entry
/// points directly - nothing under test ever calls `try_now`.
#[derive(Debug, Clone, Copy)]
pub struct TestClock;

impl Clock for TestClock {
    type T = u64;
    // One tick per millisecond, matching `crate::timer::trunc_msec`'s
    // resolution.
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

    fn try_now(&self) -> Result<Instant<Self>, ClockError> {
        Ok(Instant::new(0))
    }
}

/// `ms` milliseconds after the clock's epoch.
pub fn at(ms: u64) -> Instant<TestClock> {
    Instant::new(ms)
}

#[derive(Debug, Clone)]
pub struct SentFrame {
    pub port: PortId,
    pub dest: MacAddress,
    pub src: MacAddress,
    pub priority: u8,
    pub length_type: u16,
    pub bytes: std::vec::Vec<u8>,
}

struct Inner {
    bridge: MacAddress,
    interfaces: std::vec::Vec<Interface>,
    sent: std::vec::Vec<SentFrame>,
    registered: std::vec::Vec<MacAddress>,
    fdb_adds: std::vec::Vec<(PortId, MacAddress, u16)>,
    fdb_removes: std::vec::Vec<(PortId, MacAddress, u16)>,
    clears: u32,
}

/// A [`Platform`](mrp::Platform) double that records every relay/FDB call
/// instead of acting on real hardware. Cheap to `Clone` (an `Rc` handle),
/// so a test keeps its own view of what the `Node` that owns one of these
/// clones has done, the same way a real host would observe its bridge.
#[derive(Clone)]
pub struct MockPlatform(Rc<RefCell<Inner>>);

impl MockPlatform {
    pub fn new(bridge: MacAddress) -> Self {
        MockPlatform(Rc::new(RefCell::new(Inner {
            bridge,
            interfaces: std::vec::Vec::new(),
            sent: std::vec::Vec::new(),
            registered: std::vec::Vec::new(),
            fdb_adds: std::vec::Vec::new(),
            fdb_removes: std::vec::Vec::new(),
            clears: 0,
        })))
    }

    pub fn add_interface(&self, iface: Interface) {
        self.0.borrow_mut().interfaces.push(iface);
    }

    pub fn sent(&self) -> std::vec::Vec<SentFrame> {
        self.0.borrow().sent.clone()
    }

    pub fn take_sent(&self) -> std::vec::Vec<SentFrame> {
        core::mem::take(&mut self.0.borrow_mut().sent)
    }

    pub fn clears(&self) -> u32 {
        self.0.borrow().clears
    }

    pub fn registered(&self) -> std::vec::Vec<MacAddress> {
        self.0.borrow().registered.clone()
    }

    pub fn fdb_adds(&self) -> std::vec::Vec<(PortId, MacAddress, u16)> {
        self.0.borrow().fdb_adds.clone()
    }

    pub fn fdb_removes(&self) -> std::vec::Vec<(PortId, MacAddress, u16)> {
        self.0.borrow().fdb_removes.clone()
    }
}

impl Relay for MockPlatform {
    fn send(&mut self, port: PortId, dest_mac: MacAddress, src_mac: MacAddress, priority: u8, length_type: u16, pdu: &[u8]) {
        self.0.borrow_mut().sent.push(SentFrame {
            port,
            dest: dest_mac,
            src: src_mac,
            priority,
            length_type,
            bytes: pdu.to_vec(),
        });
    }

    fn register_address(&mut self, mac: MacAddress) {
        self.0.borrow_mut().registered.push(mac);
    }

    fn bridge_address(&self) -> MacAddress {
        self.0.borrow().bridge
    }
}

impl ForwardingDatabase for MockPlatform {
    fn add_mrp_forwarding_interface(&mut self, port: PortId, mac: MacAddress, vlan: u16) {
        self.0.borrow_mut().fdb_adds.push((port, mac, vlan));
    }

    fn remove_mrp_forwarding_interface(&mut self, port: PortId, mac: MacAddress, vlan: u16) {
        self.0.borrow_mut().fdb_removes.push((port, mac, vlan));
    }

    fn clear_table(&mut self) {
        self.0.borrow_mut().clears += 1;
    }
}

impl InterfaceTable for MockPlatform {
    fn interface_count(&self) -> usize {
        self.0.borrow().interfaces.len()
    }

    fn interface(&self, index: usize) -> Interface {
        self.0.borrow().interfaces[index]
    }

    fn interface_by_id(&self, id: PortId) -> Option<Interface> {
        self.0.borrow().interfaces.iter().find(|i| i.id == id).copied()
    }
}

/// Two non-loopback wired interfaces at `PortId(0)`/`PortId(1)`, both down,
/// ready to be brought up through `Node::on_link_change`.
pub fn platform_with_ring_ports(bridge: MacAddress) -> MockPlatform {
    let platform = MockPlatform::new(bridge);
    platform.add_interface(Interface {
        id: PortId(0),
        mac: MacAddress([0, 0, 0, 0, 0, 1]),
        is_loopback: false,
        is_wired: true,
        is_multicast: true,
        protocol: InterfaceProtocol::EthernetMac,
        is_up: false,
        has_carrier: false,
        state: mrp::LinkState::Down,
    });
    platform.add_interface(Interface {
        id: PortId(1),
        mac: MacAddress([0, 0, 0, 0, 0, 2]),
        is_loopback: false,
        is_wired: true,
        is_multicast: true,
        protocol: InterfaceProtocol::EthernetMac,
        is_up: false,
        has_carrier: false,
        state: mrp::LinkState::Down,
    });
    platform
}
