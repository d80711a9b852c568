//! The MRP state machine's event vocabulary and transition matrix
//! (SPEC_FULL.md §4.1).
//!
//! The crate root's own `src/lib.rs` declares `pub mod state;` but never
//! shipped a file behind it in the snapshot this crate was built from -
//! this module is the first to fill that declaration in. The transition
//! matrix below is built from `original_source/.../Mrp.cc`'s
//! `handleMessageWhenUp` dispatch table, `mauTypeChangeInd`, `testRingInd`,
//! `topologyChangeInd`, `linkChangeInd`, `testMgrNackInd`,
//! `testPropagateInd`, and the `handle*Timer` family.

use embedded_time::{Clock, Instant};

use crate::ccm::CcmFrame;
use crate::domain::{
    DomainId, InterfaceField, LinkState, MacAddress, NodeState, PortForwardingState, PortRole, Priority, Role,
    RingPortIndex, RingState,
};
use crate::pdu::{ArbitrationSubTlv, LinkTlv, OptionTlv, Pdu, Primary, SubTlv, TestTlv, TopologyChangeTlv};
use crate::platform::Platform;
use crate::timer::{trunc_msec, TimerName};

/// Every event the dispatcher reacts to. Constructed by `Node::on_frame`,
/// `Node::on_link_change` and `Node::poll`, and fed to `Node::dispatch`
/// one at a time - the single-threaded cooperative discipline SPEC_FULL.md
/// §5 describes is just "the caller calls `dispatch` once per event and
/// waits for it to return before calling it again", enforced by Rust's
/// `&mut self` borrow rather than an explicit guard.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    MauTypeChange(RingPortIndex, LinkState),
    TestRingInd { port: RingPortIndex, source_mac: MacAddress, prio: Priority },
    TopologyChangeInd { source_mac: MacAddress, interval: u16, sequence_id: u16 },
    LinkChangeInd { port_role: PortRole, link_state: LinkState },
    TestMgrNackInd { port: RingPortIndex, data: ArbitrationSubTlv },
    TestPropagateInd { port: RingPortIndex, data: ArbitrationSubTlv },
    InTestInd { port: RingPortIndex, pdu: Pdu },
    InTopologyChangeInd { port: RingPortIndex, pdu: Pdu, sequence_id: u16 },
    InLinkChangeInd { port: RingPortIndex, pdu: Pdu },
    InLinkStatusPollInd { port: RingPortIndex, pdu: Pdu },
    TestTimer,
    TopologyChangeTimer,
    LinkUpTimer,
    LinkDownTimer,
    FdbClearTimer,
    FdbClearDelay,
    StartUpTimer,
    LinkUpHysteresisTimer,
    ContinuityCheckTimer(RingPortIndex),
    DelayTimer(RingPortIndex, InterfaceField),
}

impl<C: Clock, P: Platform> crate::node::Node<C, P> {
    /// The single dispatch entry point: every public ingestion method
    /// (`on_frame`, `on_link_change`, `poll`) eventually calls this once
    /// per event, to completion, before the next.
    pub(crate) fn dispatch(&mut self, now: Instant<C>, event: Event) {
        if !self.running && !matches!(event, Event::StartUpTimer) {
            return;
        }
        match event {
            Event::MauTypeChange(port, link) => self.mau_type_change_ind(now, port, link),
            Event::TestRingInd { port, source_mac, prio } => self.test_ring_ind(now, port, source_mac, prio),
            Event::TopologyChangeInd { source_mac, interval, sequence_id } => {
                self.topology_change_ind(now, source_mac, interval, sequence_id)
            }
            Event::LinkChangeInd { port_role, link_state } => self.link_change_ind(now, port_role, link_state),
            Event::TestMgrNackInd { port, data } => self.test_mgr_nack_ind(now, port, data),
            Event::TestPropagateInd { port, data } => self.test_propagate_ind(now, port, data),
            Event::InTestInd { port, pdu } => self.interconnection_forward(port, pdu),
            Event::InTopologyChangeInd { port, pdu, .. } => {
                self.interconnection_forward(port, pdu);
                self.schedule_topology_change_if_absent(now);
            }
            Event::InLinkChangeInd { port, pdu } => self.interconnection_forward(port, pdu),
            Event::InLinkStatusPollInd { port, pdu } => self.interconnection_forward(port, pdu),
            Event::TestTimer => self.handle_test_timer(now),
            Event::TopologyChangeTimer => self.handle_topology_change_timer(now),
            Event::LinkUpTimer => self.handle_link_up_timer(now),
            Event::LinkDownTimer => self.handle_link_down_timer(now),
            Event::FdbClearTimer => self.platform.clear_table(),
            Event::FdbClearDelay => self.platform.clear_table(),
            Event::StartUpTimer => self.handle_start_up_timer(now),
            Event::LinkUpHysteresisTimer => {}
            Event::ContinuityCheckTimer(port) => self.handle_continuity_check_timer(now, port),
            Event::DelayTimer(port, _field) => {
                let link = self.ports[port].link_state();
                self.mau_type_change_ind(now, port, link);
            }
        }
    }

    // ---- role init -----------------------------------------------------

    pub(crate) fn mrc_init(&mut self, now: Instant<C>) {
        self.role = Role::Client;
        self.platform.register_address(MacAddress::MC_CONTROL);
        for port in [RingPortIndex::First, RingPortIndex::Second] {
            let id = self.ports[port].id;
            self.platform.add_mrp_forwarding_interface(id, MacAddress::MC_CONTROL, 0);
            self.platform.add_mrp_forwarding_interface(id, MacAddress::MC_TEST, 0);
            if self.config.flags.contains(crate::config::ConfigFlags::INTERCONNECTION_LINK_CHECK_AWARE)
                || self.config.flags.contains(crate::config::ConfigFlags::INTERCONNECTION_RING_CHECK_AWARE)
            {
                self.platform.add_mrp_forwarding_interface(id, MacAddress::MC_INCONTROL, 0);
                self.platform.add_mrp_forwarding_interface(id, MacAddress::MC_INTEST, 0);
            }
        }
        self.set_ring_state(RingState::Undefined);
        self.set_node_state(NodeState::AcStat1);
        let p_link = self.ports[RingPortIndex::First].link_state();
        let s_link = self.ports[RingPortIndex::Second].link_state();
        self.mau_type_change_ind(now, RingPortIndex::First, p_link);
        self.mau_type_change_ind(now, RingPortIndex::Second, s_link);
    }

    pub(crate) fn mrm_init(&mut self, now: Instant<C>, demoted_from_mra: bool) {
        self.role = Role::Manager;
        self.platform.register_address(MacAddress::MC_TEST);
        self.platform.register_address(MacAddress::MC_CONTROL);
        if demoted_from_mra {
            for port in [RingPortIndex::First, RingPortIndex::Second] {
                let id = self.ports[port].id;
                self.platform.remove_mrp_forwarding_interface(id, MacAddress::MC_TEST, 0);
                self.platform.remove_mrp_forwarding_interface(id, MacAddress::MC_CONTROL, 0);
            }
        }
        self.set_ring_state(RingState::Open);
        self.test_retransmission_count = 0;
        self.set_node_state(NodeState::AcStat1);
        let p_link = self.ports[RingPortIndex::First].link_state();
        let s_link = self.ports[RingPortIndex::Second].link_state();
        self.mau_type_change_ind(now, RingPortIndex::First, p_link);
        self.mau_type_change_ind(now, RingPortIndex::Second, s_link);
    }

    pub(crate) fn mra_init(&mut self, now: Instant<C>) {
        self.mrm_init(now, false);
        self.role = Role::ManagerAuto;
        self.host_best_mrm_priority = 0xFFFF;
        self.host_best_mrm_source_address = MacAddress::BROADCAST;
        self.mon_n_return = 0;
        self.config.flags.remove(crate::config::ConfigFlags::REACT_ON_LINK_CHANGE);
    }

    fn handle_start_up_timer(&mut self, now: Instant<C>) {
        match self.config.expected_role {
            Role::Client => self.mrc_init(now),
            Role::Manager => self.mrm_init(now, false),
            Role::ManagerAuto => self.mra_init(now),
            Role::Disabled | Role::ManagerAutoComp => {}
        }
    }

    // ---- port helpers ----------------------------------------------------

    fn secondary_index(&self) -> RingPortIndex {
        self.primary_index.other()
    }

    fn toggle_ring_ports(&mut self) {
        self.primary_index = self.primary_index.other();
    }

    fn local_priority(&self) -> Priority {
        match self.role {
            Role::ManagerAuto | Role::ManagerAutoComp => Priority::MRA_DEFAULT,
            _ => self.config.mrp_priority,
        }
    }

    /// Every `node_state` mutation goes through here so a host with `defmt`
    /// enabled observes each transition without the state machine having to
    /// remember to log at each of its ~25 call sites individually.
    fn set_node_state(&mut self, next: NodeState) {
        #[cfg(feature = "defmt")]
        if next != self.node_state {
            defmt::debug!("node state {} -> {}", self.node_state, next);
        }
        self.node_state = next;
    }

    /// As [`Self::set_node_state`], for `ring_state` - the value SPEC_FULL.md
    /// §3 says must be "emitted to an observer on each change".
    fn set_ring_state(&mut self, next: RingState) {
        #[cfg(feature = "defmt")]
        if next != self.ring_state {
            defmt::info!("ring state {} -> {}", self.ring_state, next);
        }
        self.ring_state = next;
    }

    // ---- action primitives -----------------------------------------------

    fn next_sequence_id(&mut self) -> u16 {
        self.sequence_id = self.sequence_id.wrapping_add(1);
        self.sequence_id
    }

    fn send_pdu(&mut self, port: RingPortIndex, dest: MacAddress, primary: Primary, option: Option<OptionTlv>) {
        let domain = self.config.domain;
        let sequence_id = self.next_sequence_id();
        let pdu = Pdu { primary, option, common: crate::pdu::CommonTlv { sequence_id, domain } };
        let mut buf = [0u8; crate::pdu::MAX_PDU_LEN];
        if let Ok(n) = pdu.encode(&mut buf) {
            let src = self.ports[port].mac;
            let id = self.ports[port].id;
            self.platform.send(id, dest, src, 7, crate::domain::MRP_LT, &buf[..n]);
        }
    }

    fn test_ring_req(&mut self, now: Instant<C>, interval: core::time::Duration) {
        let bridge = self.platform.bridge_address();
        let ring_state = self.ring_state;
        for (port, role) in [(self.primary_index, PortRole::Primary), (self.secondary_index(), PortRole::Secondary)] {
            let t = TestTlv { priority: self.local_priority(), source_mac: bridge, port_role: role, ring_state, transition: 0, timestamp: 0 };
            self.send_pdu(port, MacAddress::MC_TEST, Primary::Test(t), None);
        }
        self.timers.reschedule(now, TimerName::Test, trunc_msec(interval));
    }

    fn topology_change_req(&mut self, now: Instant<C>, interval: core::time::Duration) {
        let bridge = self.platform.bridge_address();
        let t = TopologyChangeTlv {
            priority: self.local_priority(),
            source_mac: bridge,
            port_role: PortRole::NotAssigned,
            interval: interval.as_millis() as u16,
            transition: 0,
        };
        self.send_pdu(self.primary_index, MacAddress::MC_CONTROL, Primary::TopologyChange(t), None);
        self.send_pdu(self.secondary_index(), MacAddress::MC_CONTROL, Primary::TopologyChange(t), None);
        self.timers.reschedule(now, TimerName::TopologyChange, trunc_msec(interval));
        self.clear_fdb(now);
    }

    fn link_change_req(&mut self, now: Instant<C>, port_role: PortRole, link_state: LinkState) {
        let bridge = self.platform.bridge_address();
        let interval = self.timing.link_up_down_interval;
        let t = LinkTlv { source_mac: bridge, port_role, interval: interval.as_millis() as u16, blocked: false, transition: 0 };
        let which = if port_role == PortRole::Primary { self.primary_index } else { self.secondary_index() };
        self.send_pdu(which, MacAddress::MC_CONTROL, Primary::LinkChange(link_state, t), None);
        let name = match link_state {
            LinkState::Up => TimerName::LinkUp,
            LinkState::Down => TimerName::LinkDown,
        };
        self.timers.reschedule(now, name, trunc_msec(interval));
    }

    fn test_mgr_nack_req(&mut self, now: Instant<C>, port: RingPortIndex, peer: ArbitrationSubTlv) {
        let _ = now;
        let bridge = self.platform.bridge_address();
        let t = TestTlv {
            priority: self.local_priority(),
            source_mac: bridge,
            port_role: if port == self.primary_index { PortRole::Primary } else { PortRole::Secondary },
            ring_state: self.ring_state,
            transition: 0,
            timestamp: 0,
        };
        let option = OptionTlv {
            oui: OptionTlv::IEC_OUI,
            sub_tlv: Some(SubTlv::TestMgrNack(ArbitrationSubTlv {
                prio: self.local_priority(),
                source_mac: bridge,
                other_mrm_prio: peer.prio,
                other_mrm_mac: peer.source_mac,
            })),
        };
        self.send_pdu(port, MacAddress::MC_TEST, Primary::Test(t), Some(option));
    }

    fn test_propagate_req(&mut self, port: RingPortIndex) {
        let bridge = self.platform.bridge_address();
        let t = TestTlv {
            priority: self.local_priority(),
            source_mac: bridge,
            port_role: if port == self.primary_index { PortRole::Primary } else { PortRole::Secondary },
            ring_state: self.ring_state,
            transition: 0,
            timestamp: 0,
        };
        let option = OptionTlv {
            oui: OptionTlv::IEC_OUI,
            sub_tlv: Some(SubTlv::TestPropagate(ArbitrationSubTlv {
                prio: self.local_priority(),
                source_mac: bridge,
                other_mrm_prio: self.host_best_mrm_priority_as_priority(),
                other_mrm_mac: self.host_best_mrm_source_address,
            })),
        };
        self.send_pdu(port, MacAddress::MC_TEST, Primary::Test(t), Some(option));
    }

    fn host_best_mrm_priority_as_priority(&self) -> Priority {
        Priority(self.host_best_mrm_priority)
    }

    fn clear_fdb(&mut self, _now: Instant<C>) {
        self.platform.clear_table();
    }

    /// Forwards an interconnection-class PDU out the ring port opposite the
    /// one it arrived on, unmodified, while the ring is open at this node
    /// (SPEC_FULL.md §4.1's interconnection rule) - in every other state,
    /// interconnection frames on ring ports are dropped instead.
    fn interconnection_forward(&mut self, port: RingPortIndex, pdu: Pdu) {
        if self.node_state != NodeState::ChkRo {
            return;
        }
        let dest = match pdu.primary {
            Primary::InTest(_) => MacAddress::MC_INTEST,
            _ => MacAddress::MC_INCONTROL,
        };
        let out_port = if port == self.primary_index { self.secondary_index() } else { self.primary_index };
        let mut buf = [0u8; crate::pdu::MAX_PDU_LEN];
        if let Ok(n) = pdu.encode(&mut buf) {
            let src = self.ports[out_port].mac;
            let id = self.ports[out_port].id;
            self.platform.send(id, dest, src, 7, crate::domain::MRP_LT, &buf[..n]);
        }
    }

    fn schedule_topology_change_if_absent(&mut self, now: Instant<C>) {
        if !self.timers.is_armed(TimerName::TopologyChange) {
            self.topology_change_req(now, self.timing.topology_change_interval);
        }
    }

    // ---- MAU_TYPE_CHANGE ---------------------------------------------------

    fn mau_type_change_ind(&mut self, now: Instant<C>, port: RingPortIndex, link: LinkState) {
        match self.role {
            Role::Client | Role::ManagerAutoComp => self.mau_type_change_client(now, port, link),
            Role::Manager | Role::ManagerAuto => self.mau_type_change_manager(now, port, link),
            Role::Disabled => {}
        }
    }

    fn mau_type_change_client(&mut self, now: Instant<C>, port: RingPortIndex, link: LinkState) {
        match (self.node_state, link) {
            (NodeState::AcStat1, LinkState::Up) => {
                if port == self.secondary_index() {
                    self.toggle_ring_ports();
                }
                self.ports[self.primary_index].forwarding = PortForwardingState::Forwarding;
                self.set_node_state(NodeState::DeIdle);
            }
            (NodeState::DeIdle, LinkState::Up) if port == self.secondary_index() => {
                self.link_change_count = self.timing.link_max_change();
                self.link_change_req(now, PortRole::Primary, LinkState::Up);
                self.set_node_state(NodeState::Pt);
            }
            (NodeState::DeIdle, LinkState::Down) if port == self.primary_index => {
                self.ports[self.primary_index].forwarding = PortForwardingState::Disabled;
                self.set_node_state(NodeState::AcStat1);
            }
            (NodeState::Pt, LinkState::Down) if port == self.secondary_index() => {
                self.timers.cancel(TimerName::LinkUp);
                self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                self.link_change_req(now, PortRole::Primary, LinkState::Down);
                self.set_node_state(NodeState::De);
            }
            (NodeState::Pt, LinkState::Down) if port == self.primary_index => {
                self.timers.cancel(TimerName::LinkUp);
                self.toggle_ring_ports();
                self.ports[self.primary_index].forwarding = PortForwardingState::Forwarding;
                self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                self.link_change_req(now, PortRole::Primary, LinkState::Down);
                self.set_node_state(NodeState::De);
            }
            (NodeState::De, LinkState::Up) if port == self.secondary_index() => {
                self.timers.cancel(TimerName::LinkDown);
                self.link_change_req(now, PortRole::Primary, LinkState::Up);
                self.set_node_state(NodeState::Pt);
            }
            (NodeState::De, LinkState::Down) if port == self.primary_index => {
                self.link_change_count = self.timing.link_max_change();
                self.ports[self.primary_index].forwarding = PortForwardingState::Blocked;
                self.set_node_state(NodeState::AcStat1);
            }
            (NodeState::PtIdle, LinkState::Down) if port == self.secondary_index() => {
                self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                self.link_change_req(now, PortRole::Primary, LinkState::Down);
                self.set_node_state(NodeState::De);
            }
            (NodeState::PtIdle, LinkState::Down) if port == self.primary_index => {
                self.toggle_ring_ports();
                self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                self.link_change_req(now, PortRole::Primary, LinkState::Down);
                self.set_node_state(NodeState::De);
            }
            _ => {}
        }
    }

    fn mau_type_change_manager(&mut self, now: Instant<C>, port: RingPortIndex, link: LinkState) {
        match (self.node_state, link) {
            (NodeState::AcStat1, LinkState::Up) => {
                if port == self.secondary_index() {
                    self.toggle_ring_ports();
                }
                self.ports[self.primary_index].forwarding = PortForwardingState::Forwarding;
                self.test_retransmission_count = 0;
                self.test_ring_req(now, self.timing.default_test_interval);
                self.set_node_state(NodeState::PrmUp);
                self.set_ring_state(RingState::Open);
            }
            (NodeState::PrmUp, LinkState::Down) if port == self.primary_index => {
                self.timers.cancel(TimerName::Test);
                self.ports[self.primary_index].forwarding = PortForwardingState::Blocked;
                self.set_node_state(NodeState::AcStat1);
                self.set_ring_state(RingState::Open);
            }
            (NodeState::PrmUp, LinkState::Up) if port == self.secondary_index() => {
                self.test_retransmission_count = 0;
                self.no_topology_change = true;
                self.test_ring_req(now, self.timing.default_test_interval);
                self.set_node_state(NodeState::ChkRc);
                self.set_ring_state(RingState::Closed);
            }
            (NodeState::ChkRo, LinkState::Down) if port == self.primary_index => {
                self.toggle_ring_ports();
                self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                self.test_ring_req(now, self.timing.default_test_interval);
                self.topology_change_req(now, self.timing.topology_change_interval);
                self.set_node_state(NodeState::PrmUp);
                self.set_ring_state(RingState::Open);
            }
            (NodeState::ChkRo, LinkState::Down) if port == self.secondary_index() => {
                self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                self.set_node_state(NodeState::PrmUp);
                self.set_ring_state(RingState::Open);
            }
            (NodeState::ChkRc, LinkState::Down) if port == self.primary_index => {
                self.toggle_ring_ports();
                self.test_ring_req(now, self.timing.default_test_interval);
                self.topology_change_req(now, self.timing.topology_change_interval);
                self.set_node_state(NodeState::PrmUp);
                self.set_ring_state(RingState::Open);
            }
            (NodeState::ChkRc, LinkState::Down) if port == self.secondary_index() => {
                self.set_node_state(NodeState::PrmUp);
                self.set_ring_state(RingState::Open);
            }
            _ => {}
        }
    }

    // ---- TEST_RING_IND ----------------------------------------------------

    fn test_ring_ind(&mut self, now: Instant<C>, port: RingPortIndex, source_mac: MacAddress, prio: Priority) {
        if source_mac == self.platform.bridge_address() {
            // The manager's own test frame looped all the way around -
            // the ring is intact.
            match self.node_state {
                NodeState::PrmUp => {
                    self.test_retransmission_count = 0;
                    self.no_topology_change = false;
                    self.test_ring_req(now, self.timing.default_test_interval);
                    self.set_node_state(NodeState::ChkRc);
                    self.set_ring_state(RingState::Closed);
                }
                NodeState::ChkRo => {
                    self.ports[self.secondary_index()].forwarding = PortForwardingState::Blocked;
                    self.test_retransmission_count = 0;
                    self.no_topology_change = false;
                    self.test_ring_req(now, self.timing.default_test_interval);
                    if self.config.flags.contains(crate::config::ConfigFlags::REACT_ON_LINK_CHANGE) {
                        self.topology_change_req(now, core::time::Duration::ZERO);
                    } else {
                        self.topology_change_req(now, self.timing.topology_change_interval);
                    }
                    self.set_node_state(NodeState::ChkRc);
                    self.set_ring_state(RingState::Closed);
                }
                NodeState::ChkRc => {
                    self.test_retransmission_count = 0;
                    self.no_topology_change = false;
                }
                _ => {}
            }
            return;
        }

        let bridge = self.platform.bridge_address();
        if self.role.is_manager_like() && self.local_priority().is_better_than(bridge, prio, source_mac) {
            // Our priority beats the peer's: tell it to step down (MRA
            // arbitration).
            self.test_mgr_nack_req(now, port, ArbitrationSubTlv {
                prio,
                source_mac,
                other_mrm_prio: self.local_priority(),
                other_mrm_mac: self.platform.bridge_address(),
            });
        }
    }

    // ---- TOPOLOGY_CHANGE_IND (with the deliberate fallthrough) -------------

    fn topology_change_ind(&mut self, now: Instant<C>, source_mac: MacAddress, interval: u16, sequence_id: u16) {
        let _ = source_mac;
        if let Some(last) = self.last_topology_id {
            if sequence_id <= last {
                #[cfg(feature = "defmt")]
                defmt::debug!("dropping duplicate topology change, sequence {} <= last {}", sequence_id, last);
                return;
            }
        }
        self.last_topology_id = Some(sequence_id);

        // Deliberate fallthrough (SPEC_FULL.md §4.1, §9 "Resolved"): the
        // DE_IDLE arm's own bookkeeping runs, and execution falls into the
        // PT_IDLE arm's `clear_fdb` regardless of which of the two states
        // we were actually in.
        if matches!(self.node_state, NodeState::DeIdle | NodeState::PtIdle) {
            if self.node_state == NodeState::DeIdle {
                self.link_change_count = self.timing.link_max_change();
            }
            self.clear_fdb(now);
        }

        if self.node_state == NodeState::Pt {
            self.link_change_count = self.timing.link_max_change();
            self.timers.cancel(TimerName::LinkUp);
            self.ports[self.secondary_index()].forwarding = PortForwardingState::Forwarding;
            self.clear_fdb(now);
            self.set_node_state(NodeState::PtIdle);
        }

        if self.node_state == NodeState::De {
            self.link_change_count = self.timing.link_max_change();
            self.timers.cancel(TimerName::LinkDown);
            self.clear_fdb(now);
            self.set_node_state(NodeState::DeIdle);
        }

        let _ = interval;
    }

    // ---- LINK_CHANGE_IND ----------------------------------------------------

    fn link_change_ind(&mut self, now: Instant<C>, port_role: PortRole, link_state: LinkState) {
        let port = match port_role {
            PortRole::Primary => self.primary_index,
            PortRole::Secondary => self.secondary_index(),
            PortRole::NotAssigned => return,
        };
        let forwarding = match link_state {
            LinkState::Up => PortForwardingState::Forwarding,
            LinkState::Down => PortForwardingState::Disabled,
        };
        self.ports[port].forwarding = forwarding;
        self.clear_fdb(now);
    }

    // ---- MRA arbitration ----------------------------------------------------

    /// `data.source_mac`/`data.prio` are the NACK sender's own address and
    /// priority; `data.other_mrm_mac` is whoever the sender is telling to
    /// step down, which must be us. Mirrors `Mrp::testMgrNackInd`'s
    /// `bestMRMSourceAddress == localBridgeAddress` check - the previous
    /// `data.source_mac == bridge` condition could never be true for a NACK
    /// actually sent by a peer.
    fn test_mgr_nack_ind(&mut self, now: Instant<C>, port: RingPortIndex, data: ArbitrationSubTlv) {
        if !matches!(self.role, Role::ManagerAuto) {
            return;
        }
        if !matches!(self.node_state, NodeState::PrmUp | NodeState::ChkRo | NodeState::ChkRc) {
            return;
        }
        let bridge = self.platform.bridge_address();
        if data.source_mac == bridge || data.other_mrm_mac != bridge {
            return;
        }
        if data.prio.is_better_than(data.source_mac, self.host_best_mrm_priority_as_priority(), self.host_best_mrm_source_address) {
            self.host_best_mrm_priority = data.prio.0;
            self.host_best_mrm_source_address = data.source_mac;
        }
        self.timers.cancel(TimerName::TopologyChange);
        self.test_propagate_req(port);
        // Snapshot before `mrc_init`, which resets `node_state` itself.
        let prior_state = self.node_state;
        self.mrc_init(now);
        self.role = Role::ManagerAutoComp;
        let next = if prior_state == NodeState::ChkRc {
            self.ports[self.secondary_index()].forwarding = PortForwardingState::Forwarding;
            NodeState::PtIdle
        } else {
            NodeState::DeIdle
        };
        self.set_node_state(next);
    }

    /// Relays a better-known manager's identity along the chain of
    /// demoted automanagers. Mirrors `Mrp::testPropagateInd`: only a node
    /// that is itself demoted (`DE`/`DE_IDLE`/`PT`/`PT_IDLE` while
    /// configured as `MANAGER_AUTO`) adopts the propagated best, and only
    /// when it came from the peer this node currently considers best.
    fn test_propagate_ind(&mut self, now: Instant<C>, _port: RingPortIndex, data: ArbitrationSubTlv) {
        let _ = now;
        if self.config.expected_role != Role::ManagerAuto {
            return;
        }
        if !matches!(self.node_state, NodeState::De | NodeState::DeIdle | NodeState::Pt | NodeState::PtIdle) {
            return;
        }
        let bridge = self.platform.bridge_address();
        if data.source_mac == bridge || data.source_mac != self.host_best_mrm_source_address {
            return;
        }
        self.host_best_mrm_source_address = data.other_mrm_mac;
        self.host_best_mrm_priority = data.other_mrm_prio.0;
        self.mon_n_return = 0;
    }

    // ---- timers --------------------------------------------------------------

    fn handle_test_timer(&mut self, now: Instant<C>) {
        match self.node_state {
            NodeState::ChkRc => {
                if self.test_retransmission_count >= self.timing.test_max_retransmission_count() {
                    self.ports[self.secondary_index()].forwarding = PortForwardingState::Forwarding;
                    self.test_retransmission_count = 0;
                    if !self.no_topology_change {
                        self.topology_change_req(now, self.timing.topology_change_interval);
                    }
                    self.test_ring_req(now, self.timing.default_test_interval);
                    self.set_node_state(NodeState::ChkRo);
                    self.set_ring_state(RingState::Open);
                } else {
                    self.test_retransmission_count += 1;
                    self.test_ring_req(now, self.timing.default_test_interval);
                }
            }
            NodeState::PrmUp | NodeState::ChkRo => {
                self.test_ring_req(now, self.timing.default_test_interval);
            }
            // Re-promotion while demoted (`Mrp::handleTestTimer`'s
            // DE/DE_IDLE/PT/PT_IDLE arms): the same TestTimer that was
            // running before demotion keeps firing, now at
            // `short_test_interval`, counting `mon_n_return` up to
            // `mon_n_rmax` before concluding no better manager reasserted
            // itself and reclaiming the manager role.
            NodeState::De | NodeState::DeIdle | NodeState::Pt | NodeState::PtIdle
                if self.config.expected_role == Role::ManagerAuto =>
            {
                self.timers.reschedule(now, TimerName::Test, trunc_msec(self.timing.short_test_interval));
                if self.mon_n_return <= self.timing.mon_n_rmax() {
                    self.mon_n_return += 1;
                } else {
                    let prior_state = self.node_state;
                    self.mrm_init(now, true);
                    self.role = Role::ManagerAuto;
                    let next = match prior_state {
                        NodeState::De | NodeState::DeIdle => NodeState::PrmUp,
                        NodeState::Pt => NodeState::ChkRc,
                        _ => NodeState::ChkRo,
                    };
                    self.set_node_state(next);
                }
            }
            _ => {}
        }
    }

    fn handle_topology_change_timer(&mut self, _now: Instant<C>) {
        // One-shot: the topology-change suppression window has elapsed,
        // nothing further to do until the next topology_change_req re-arms
        // it.
    }

    fn handle_link_up_timer(&mut self, now: Instant<C>) {
        if self.node_state != NodeState::Pt {
            return;
        }
        if self.link_change_count == 0 {
            self.ports[self.secondary_index()].forwarding = PortForwardingState::Forwarding;
            self.link_change_count = self.timing.link_max_change();
            self.set_node_state(NodeState::PtIdle);
        } else {
            self.link_change_count -= 1;
            self.link_change_req(now, PortRole::Primary, LinkState::Up);
        }
    }

    fn handle_link_down_timer(&mut self, now: Instant<C>) {
        if self.node_state != NodeState::De {
            return;
        }
        if self.link_change_count == 0 {
            self.link_change_count = self.timing.link_max_change();
            self.set_node_state(NodeState::DeIdle);
        } else {
            self.link_change_count -= 1;
            self.link_change_req(now, PortRole::Primary, LinkState::Down);
        }
    }

    // ---- continuity check -----------------------------------------------------

    fn handle_continuity_check_timer(&mut self, now: Instant<C>, port: RingPortIndex) {
        if !self.config.flags.contains(crate::config::ConfigFlags::ENABLE_LINK_CHECK_ON_RING) {
            return;
        }
        let interval = self.ccm[port].interval;
        let (frame, timed_out): (CcmFrame, bool) = self.ccm[port].on_periodic_tick(now);
        self.send_ccm(port, frame);
        self.timers.reschedule(now, TimerName::ContinuityCheck(port), trunc_msec(interval.duration()));
        if timed_out {
            self.mau_type_change_ind(now, port, LinkState::Down);
        }
    }

    fn send_ccm(&mut self, port: RingPortIndex, frame: CcmFrame) {
        let src = self.ports[port].mac;
        let id = self.ports[port].id;
        let mut buf = [0u8; 8];
        buf[0] = frame.flags;
        buf[1] = frame.endpoint_id;
        buf[2..4].copy_from_slice(&frame.sequence.to_be_bytes());
        self.platform.send(id, MacAddress::MC_CONTROL, src, 7, crate::domain::MRP_LT, &buf);
    }

    /// Called by `Node::on_ccm_frame` once the frame has been accepted for
    /// a ring port: refreshes liveness and runs the endpoint tiebreak.
    pub(crate) fn ccm_received(&mut self, now: Instant<C>, port: RingPortIndex, source_mac: MacAddress) {
        let local_mac = self.ports[port].mac;
        self.ccm[port].on_received(now, source_mac, local_mac);
    }

    /// True if this node's `DomainId` matches the PDU's.
    pub(crate) fn domain_matches(&self, domain: DomainId) -> bool {
        domain == self.config.domain
    }
}
