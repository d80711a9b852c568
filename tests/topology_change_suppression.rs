//! A TOPOLOGY_CHANGE indication whose sequence id does not exceed the last
//! one accepted is dropped outright - no forwarding-database flush, no
//! state change - the mechanism that keeps a flood of duplicate/reordered
//! topology-change frames from repeatedly flushing learned addresses.

mod support;

use mrp::pdu::{CommonTlv, Primary, TopologyChangeTlv};
use mrp::{Config, ConfigFlags, DomainId, InterfaceField, MacAddress, Node, NodeState, PortId, PortRole, Priority, RingPortIndex, Role, TimingProfile};
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

fn topology_change_pdu(sequence_id: u16, source_mac: MacAddress) -> mrp::Pdu {
    mrp::Pdu {
        primary: Primary::TopologyChange(TopologyChangeTlv {
            priority: Priority::DEFAULT,
            source_mac,
            port_role: PortRole::NotAssigned,
            interval: 10,
            transition: 0,
        }),
        option: None,
        common: CommonTlv { sequence_id, domain: DomainId::DEFAULT },
    }
}

#[test]
fn duplicate_or_stale_sequence_ids_are_dropped() {
    let bridge = MacAddress([0xCC; 6]);
    let other = MacAddress([0x10; 6]);
    let platform = platform_with_ring_ports(bridge);
    let mut node: Node<TestClock, MockPlatform> = Node::new(client_config(), platform.clone()).unwrap();

    node.start(at(0));
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::State, true);
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::Carrier, true);
    node.poll(at(0));
    assert_eq!(node.node_state(), NodeState::DeIdle);

    let mut buf = [0u8; 64];

    let pdu = topology_change_pdu(5, other);
    let n = pdu.encode(&mut buf).unwrap();
    node.on_frame(at(1), RingPortIndex::First, &buf[..n]).unwrap();
    assert_eq!(platform.clears(), 1);

    let pdu = topology_change_pdu(3, other);
    let n = pdu.encode(&mut buf).unwrap();
    node.on_frame(at(2), RingPortIndex::First, &buf[..n]).unwrap();
    assert_eq!(platform.clears(), 1, "stale sequence id must not flush the FDB again");

    let pdu = topology_change_pdu(5, other);
    let n = pdu.encode(&mut buf).unwrap();
    node.on_frame(at(3), RingPortIndex::First, &buf[..n]).unwrap();
    assert_eq!(platform.clears(), 1, "repeated sequence id must not flush the FDB again");

    let pdu = topology_change_pdu(6, other);
    let n = pdu.encode(&mut buf).unwrap();
    node.on_frame(at(4), RingPortIndex::First, &buf[..n]).unwrap();
    assert_eq!(platform.clears(), 2);
}
