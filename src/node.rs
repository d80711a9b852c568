//! The aggregate root: `Node<C, P>` owns everything the state machine in
//! [`crate::state`] needs and exposes the small set of entry points a host
//! drives it through (SPEC_FULL.md §5, §6).
//!
//! Grounded on the `EndDevice<C: Clock>` pattern (`src/lib.rs`): a single
//! struct generic over the clock, constructed once from a `Parameters`-like
//! config and then driven purely through `&mut self` methods, with no
//! interior mutability or shared ownership anywhere in the core.

use embedded_time::{Clock, Instant};
use enum_map::EnumMap;

use crate::ccm::CcmPortState;
use crate::config::{Config, ConfigFlags, TimingConstants};
use crate::domain::{InterfaceField, MacAddress, NodeState, Priority, Role, RingPortIndex, RingState};
use crate::error::{ConfigError, FatalError};
use crate::pdu::{Pdu, Primary};
use crate::platform::Platform;
use crate::port::{debounce_delay, RingPort};
use crate::state::Event;
use crate::timer::{trunc_msec, TimerBank, TimerName};

/// A single MRP node's complete runtime state.
///
/// `C` fixes the clock the embedding host uses (so tests can drive it with
/// a fake clock, the same way `oxidecomputer-hubris/lib/multitimer`'s test
/// suite does); `P` is the host-supplied [`Platform`] mediator.
pub struct Node<C: Clock, P: Platform> {
    pub(crate) platform: P,
    pub(crate) config: Config,
    pub(crate) timing: TimingConstants,
    pub(crate) timers: TimerBank<C>,
    pub(crate) ccm: EnumMap<RingPortIndex, CcmPortState<C>>,
    pub(crate) ports: EnumMap<RingPortIndex, RingPort>,
    /// Which physical ring-port slot is currently playing `Primary`. The
    /// physical slot assignment from `Config` never changes; this is what
    /// the state machine's port-toggle actions flip.
    pub(crate) primary_index: RingPortIndex,
    pub(crate) role: Role,
    pub(crate) node_state: NodeState,
    pub(crate) ring_state: RingState,
    pub(crate) sequence_id: u16,
    pub(crate) last_topology_id: Option<u16>,
    pub(crate) test_retransmission_count: u8,
    pub(crate) no_topology_change: bool,
    pub(crate) link_change_count: u8,
    pub(crate) host_best_mrm_priority: u16,
    pub(crate) host_best_mrm_source_address: MacAddress,
    pub(crate) mon_n_return: u8,
    pub(crate) running: bool,
}

impl<C: Clock, P: Platform> Node<C, P> {
    /// Builds a node from `config` and the host-supplied `platform`,
    /// resolving each ring port's MAC address through
    /// [`crate::platform::InterfaceTable`] and rejecting the one
    /// configuration error that needs live interface data: a ring port that
    /// turns out to be a loopback interface.
    pub fn new(config: Config, platform: P) -> Result<Self, ConfigError> {
        config.validate()?;

        let p1 = platform.interface_by_id(config.ring_port1);
        let p2 = platform.interface_by_id(config.ring_port2);

        let iface1 = p1.ok_or(ConfigError::LoopbackRingPort(config.ring_port1))?;
        let iface2 = p2.ok_or(ConfigError::LoopbackRingPort(config.ring_port2))?;
        if iface1.is_loopback {
            return Err(ConfigError::LoopbackRingPort(config.ring_port1));
        }
        if iface2.is_loopback {
            return Err(ConfigError::LoopbackRingPort(config.ring_port2));
        }

        let mut port_first = RingPort::new(config.ring_port1, iface1.mac);
        port_first.is_up = iface1.is_up;
        port_first.has_carrier = iface1.has_carrier;
        let mut port_second = RingPort::new(config.ring_port2, iface2.mac);
        port_second.is_up = iface2.is_up;
        port_second.has_carrier = iface2.has_carrier;

        let mut ports = EnumMap::default();
        ports[RingPortIndex::First] = port_first;
        ports[RingPortIndex::Second] = port_second;

        let mut ccm = EnumMap::default();
        ccm[RingPortIndex::First] = CcmPortState::new(config.ccm_interval, 1, "ring-port-1");
        ccm[RingPortIndex::Second] = CcmPortState::new(config.ccm_interval, 1, "ring-port-2");

        let timing = config.timing_profile.constants();

        Ok(Node {
            platform,
            config,
            timing,
            timers: TimerBank::new(),
            ccm,
            ports,
            primary_index: RingPortIndex::First,
            role: Role::Disabled,
            node_state: NodeState::PowerOn,
            ring_state: RingState::Undefined,
            sequence_id: 0,
            last_topology_id: None,
            test_retransmission_count: 0,
            no_topology_change: config.flags.contains(ConfigFlags::NO_TOPOLOGY_CHANGE),
            link_change_count: 0,
            host_best_mrm_priority: 0xFFFF,
            host_best_mrm_source_address: MacAddress::BROADCAST,
            mon_n_return: 0,
            running: false,
        })
    }

    /// Brings the node up: assumes the configured `expected_role` and
    /// starts continuity checking on ports where it is enabled.
    pub fn start(&mut self, now: Instant<C>) {
        #[cfg(feature = "defmt")]
        defmt::debug!("starting node, expected role {}", self.config.expected_role);
        self.running = true;
        if self.config.flags.contains(ConfigFlags::ENABLE_LINK_CHECK_ON_RING) {
            for port in [RingPortIndex::First, RingPortIndex::Second] {
                self.ccm[port].start(now);
                self.timers.reschedule(now, TimerName::ContinuityCheck(port), trunc_msec(self.config.ccm_interval.duration()));
            }
        }
        self.dispatch(now, Event::StartUpTimer);
    }

    /// Takes the node down: subsequent event deliveries are no-ops until
    /// [`Node::start`] is called again.
    pub fn stop(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("stopping node");
        self.running = false;
        self.role = Role::Disabled;
        self.node_state = NodeState::PowerOn;
        self.ring_state = RingState::Undefined;
        for port in [RingPortIndex::First, RingPortIndex::Second] {
            self.ports[port].forwarding = crate::domain::PortForwardingState::Disabled;
        }
        self.timers.cancel_all();
    }

    /// Drains every timer whose deadline has passed as of `now` and
    /// dispatches each one, one at a time.
    pub fn poll(&mut self, now: Instant<C>) {
        if !self.running {
            return;
        }
        let fired = self.timers.poll(now);
        for name in fired {
            let event = match name {
                TimerName::Test => Event::TestTimer,
                TimerName::TopologyChange => Event::TopologyChangeTimer,
                TimerName::LinkUp => Event::LinkUpTimer,
                TimerName::LinkDown => Event::LinkDownTimer,
                TimerName::FdbClear => Event::FdbClearTimer,
                TimerName::FdbClearDelay => Event::FdbClearDelay,
                TimerName::StartUp => Event::StartUpTimer,
                TimerName::LinkUpHysteresis => Event::LinkUpHysteresisTimer,
                TimerName::ContinuityCheck(port) => Event::ContinuityCheckTimer(port),
                TimerName::Delay(port, field) => Event::DelayTimer(port, field),
            };
            self.dispatch(now, event);
        }
    }

    /// Reports a raw observable change (administrative state or carrier)
    /// on one of the two ring ports. Debounced through a `DELAY_TIMER`
    /// rather than synthesizing `MAU_TYPE_CHANGE` immediately
    /// (SPEC_FULL.md §4.5).
    pub fn on_link_change(&mut self, now: Instant<C>, port: RingPortIndex, field: InterfaceField, value: bool) {
        match field {
            InterfaceField::State => self.ports[port].is_up = value,
            InterfaceField::Carrier => self.ports[port].has_carrier = value,
        }
        let resulting = self.ports[port].link_state();
        let delay = debounce_delay(resulting, self.config.link_detection_delay);
        self.timers.reschedule(now, TimerName::Delay(port, field), trunc_msec(delay));
    }

    /// Hands a received frame's payload (the MRP PDU, without the Ethernet
    /// header) to the core. `Err(FatalError)` signals a malformed frame the
    /// host should treat as a hard protocol violation rather than simply
    /// drop - callers should stop feeding this node events rather than
    /// continue (SPEC_FULL.md §7).
    pub fn on_frame(&mut self, now: Instant<C>, port: RingPortIndex, bytes: &[u8]) -> Result<(), FatalError> {
        if !self.running {
            return Ok(());
        }
        let pdu = match Pdu::decode(bytes) {
            Ok(pdu) => pdu,
            Err(e) => {
                if let Err(fatal) = e.into_fatal() {
                    #[cfg(feature = "defmt")]
                    defmt::error!("fatal PDU decode error on port {}: {}", port, fatal);
                    return Err(fatal);
                }
                #[cfg(feature = "defmt")]
                defmt::debug!("dropping malformed PDU on port {}: {}", port, e);
                return Ok(());
            }
        };

        if !self.domain_matches(pdu.common.domain) {
            #[cfg(feature = "defmt")]
            defmt::debug!("dropping PDU from foreign domain on port {}", port);
            return Ok(());
        }

        if let Some(option) = &pdu.option {
            match &option.sub_tlv {
                Some(crate::pdu::SubTlv::TestMgrNack(data)) => {
                    self.dispatch(now, Event::TestMgrNackInd { port, data: *data });
                    return Ok(());
                }
                Some(crate::pdu::SubTlv::TestPropagate(data)) => {
                    self.dispatch(now, Event::TestPropagateInd { port, data: *data });
                    return Ok(());
                }
                _ => {}
            }
        }

        let sequence_id = pdu.common.sequence_id;
        let event = match pdu.primary {
            Primary::Test(t) => Event::TestRingInd { port, source_mac: t.source_mac, prio: t.priority },
            Primary::TopologyChange(t) => Event::TopologyChangeInd { source_mac: t.source_mac, interval: t.interval, sequence_id },
            Primary::LinkChange(link_state, t) => Event::LinkChangeInd { port_role: t.port_role, link_state },
            Primary::InTest(_) => Event::InTestInd { port, pdu },
            Primary::InTopologyChange(_) => Event::InTopologyChangeInd { port, pdu, sequence_id },
            Primary::InLinkChange(..) => Event::InLinkChangeInd { port, pdu },
            Primary::InLinkStatusPoll(_) => Event::InLinkStatusPollInd { port, pdu },
        };
        self.dispatch(now, event);
        Ok(())
    }

    /// Hands a received CCM frame to the continuity-check subsystem for
    /// `port`. Separate from [`Node::on_frame`] since CCM frames are not
    /// MRP PDUs and carry no TLV structure.
    pub fn on_ccm_frame(&mut self, now: Instant<C>, port: RingPortIndex, source_mac: MacAddress) {
        if !self.running || !self.config.flags.contains(ConfigFlags::ENABLE_LINK_CHECK_ON_RING) {
            return;
        }
        self.ccm_received(now, port, source_mac);
    }

    /// Current node state, for host-side observability (logging, metrics).
    pub fn node_state(&self) -> NodeState {
        self.node_state
    }

    /// Current ring state, as last computed by the manager/automanager role.
    pub fn ring_state(&self) -> RingState {
        self.ring_state
    }

    /// Current role this node is playing on the ring.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The priority this node currently advertises - `config.mrp_priority`
    /// for a manager, the fixed automanager default otherwise.
    pub fn effective_priority(&self) -> Priority {
        match self.role {
            Role::ManagerAuto | Role::ManagerAutoComp => Priority::MRA_DEFAULT,
            _ => self.config.mrp_priority,
        }
    }
}
