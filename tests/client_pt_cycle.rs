//! A client whose secondary ring port comes up while its primary is
//! already up enters the PT cycle and announces a LINK_CHANGE(Up) on the
//! newly-primary port.

mod support;

use mrp::pdu::Primary;
use mrp::{Config, ConfigFlags, DomainId, InterfaceField, LinkState, MacAddress, Node, NodeState, PortId, RingPortIndex, Role, TimingProfile};
use support::{at, platform_with_ring_ports, MockPlatform, TestClock};

fn client_config() -> Config {
    Config {
        ring_port1: PortId(0),
        ring_port2: PortId(1),
        domain: DomainId::DEFAULT,
        timing_profile: TimingProfile::Ms200,
        expected_role: Role::Client,
        flags: ConfigFlags::CHECK_MEDIA_REDUNDANCY,
        ..Config::default()
    }
}

#[test]
fn secondary_link_up_starts_pt_cycle() {
    let bridge = MacAddress([0xBB; 6]);
    let platform = platform_with_ring_ports(bridge);
    let mut node: Node<TestClock, MockPlatform> = Node::new(client_config(), platform.clone()).unwrap();

    node.start(at(0));
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::State, true);
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::Carrier, true);
    node.poll(at(0));
    assert_eq!(node.node_state(), NodeState::DeIdle);

    node.on_link_change(at(10), RingPortIndex::Second, InterfaceField::State, true);
    node.on_link_change(at(10), RingPortIndex::Second, InterfaceField::Carrier, true);
    node.poll(at(10));

    assert_eq!(node.node_state(), NodeState::Pt);

    let sent = platform.sent();
    let saw_link_up = sent.iter().any(|f| {
        matches!(mrp::Pdu::decode(&f.bytes).unwrap().primary, Primary::LinkChange(LinkState::Up, _))
    });
    assert!(saw_link_up, "expected a LINK_CHANGE(Up) PDU, got {:?}", sent);
}
