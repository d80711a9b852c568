//! An interconnection-class PDU received on a ring port while the ring is
//! open (CHK_RO) is relayed out the opposite ring port unmodified; in
//! every other ring state it is simply dropped.

mod support;

use mrp::pdu::{CommonTlv, Primary, TestTlv};
use mrp::{Config, ConfigFlags, DomainId, InterfaceField, MacAddress, Node, NodeState, PortId, PortRole, Priority, RingPortIndex, RingState, Role, TimingProfile};
use support::{at, platform_with_ring_ports, MockPlatform, TestClock};

fn manager_config() -> Config {
    Config {
        ring_port1: PortId(0),
        ring_port2: PortId(1),
        domain: DomainId::DEFAULT,
        timing_profile: TimingProfile::Ms200,
        expected_role: Role::Manager,
        flags: ConfigFlags::CHECK_MEDIA_REDUNDANCY,
        ..Config::default()
    }
}

fn in_test_pdu(source_mac: MacAddress) -> mrp::Pdu {
    mrp::Pdu {
        primary: Primary::InTest(TestTlv {
            priority: Priority::DEFAULT,
            source_mac,
            port_role: PortRole::NotAssigned,
            ring_state: RingState::Undefined,
            transition: 0,
            timestamp: 0,
        }),
        option: None,
        common: CommonTlv { sequence_id: 1, domain: DomainId::DEFAULT },
    }
}

#[test]
fn in_test_is_dropped_outside_chk_ro() {
    let bridge = MacAddress([0xAA; 6]);
    let platform = platform_with_ring_ports(bridge);
    let mut node: Node<TestClock, MockPlatform> = Node::new(manager_config(), platform.clone()).unwrap();

    node.start(at(0));
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::State, true);
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::Carrier, true);
    node.poll(at(0));
    assert_eq!(node.node_state(), NodeState::PrmUp);

    platform.take_sent();

    let other = MacAddress([0x33; 6]);
    let mut buf = [0u8; 64];
    let n = in_test_pdu(other).encode(&mut buf).unwrap();
    node.on_frame(at(1), RingPortIndex::Second, &buf[..n]).unwrap();

    assert!(platform.sent().is_empty(), "INTEST must not be relayed outside CHK_RO");
}

#[test]
fn in_test_is_relayed_out_the_opposite_port_in_chk_ro() {
    let bridge = MacAddress([0xAA; 6]);
    let platform = platform_with_ring_ports(bridge);
    let mut node: Node<TestClock, MockPlatform> = Node::new(manager_config(), platform.clone()).unwrap();

    node.start(at(0));
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::State, true);
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::Carrier, true);
    node.poll(at(0));
    assert_eq!(node.node_state(), NodeState::PrmUp);

    node.on_link_change(at(10), RingPortIndex::Second, InterfaceField::State, true);
    node.on_link_change(at(10), RingPortIndex::Second, InterfaceField::Carrier, true);
    node.poll(at(10));
    assert_eq!(node.node_state(), NodeState::ChkRc);

    // Three successive TestTimer misses (test_max_retransmission_count = 2
    // for the 200ms profile) reopen the ring: CHK_RC -> CHK_RO.
    for now in [30u64, 50, 70] {
        node.poll(at(now));
    }
    assert_eq!(node.node_state(), NodeState::ChkRo);
    assert_eq!(node.ring_state(), RingState::Open);

    platform.take_sent();

    let other = MacAddress([0x33; 6]);
    let mut buf = [0u8; 64];
    let n = in_test_pdu(other).encode(&mut buf).unwrap();
    node.on_frame(at(71), RingPortIndex::Second, &buf[..n]).unwrap();

    let sent = platform.sent();
    let relayed = sent.iter().find(|f| f.dest == MacAddress::MC_INTEST).expect("INTEST should be relayed to MC_INTEST");
    assert_eq!(relayed.port, PortId(0), "must be relayed out the primary (opposite) ring port");
    let decoded = mrp::Pdu::decode(&relayed.bytes).unwrap();
    assert_eq!(decoded, in_test_pdu(other), "relayed PDU must be unmodified");
}
