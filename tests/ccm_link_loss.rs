//! With continuity checking enabled on the ring, a port that never hears a
//! peer's CCM frame times out after `3.5 x ccm_interval` and is treated as
//! if its link had dropped, independent of any carrier/administrative
//! signal.

mod support;

use mrp::{Config, ConfigFlags, DomainId, InterfaceField, MacAddress, Node, NodeState, PortId, RingPortIndex, Role, TimingProfile};
use support::{at, platform_with_ring_ports, MockPlatform, TestClock};

fn client_config_with_ccm() -> Config {
    Config {
        ring_port1: PortId(0),
        ring_port2: PortId(1),
        domain: DomainId::DEFAULT,
        timing_profile: TimingProfile::Ms200,
        expected_role: Role::Client,
        flags: ConfigFlags::CHECK_MEDIA_REDUNDANCY | ConfigFlags::ENABLE_LINK_CHECK_ON_RING,
        ..Config::default()
    }
}

#[test]
fn ccm_timeout_forces_link_down() {
    let bridge = MacAddress([0xDD; 6]);
    let platform = platform_with_ring_ports(bridge);
    let mut node: Node<TestClock, MockPlatform> = Node::new(client_config_with_ccm(), platform.clone()).unwrap();

    node.start(at(0));
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::State, true);
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::Carrier, true);
    node.poll(at(0));
    assert_eq!(node.node_state(), NodeState::DeIdle);

    // ccm_interval defaults to 10ms; liveness window is 3.5x that (35ms).
    // No CCM frames are ever received, so the fourth periodic tick (at
    // t=40) finds the deadline already passed.
    for now in [10u64, 20, 30, 40] {
        node.poll(at(now));
    }

    assert_eq!(node.node_state(), NodeState::AcStat1);

    let ccm_frames_sent = platform.sent().iter().filter(|f| f.bytes.len() == 8).count();
    assert!(ccm_frames_sent >= 4, "expected at least 4 CCM frames per port, saw {}", ccm_frames_sent);
}
