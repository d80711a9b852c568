//! An automanager that hears a TEST_MGR_NACK naming a better-priority peer
//! steps down to client-like behavior (MANAGER_AUTO_COMP), then - if that
//! peer never reasserts itself - re-promotes once `monNReturn` exceeds
//! `monNRmax` on the repurposed TestTimer.

mod support;

use mrp::pdu::{ArbitrationSubTlv, CommonTlv, OptionTlv, Primary, SubTlv, TestTlv};
use mrp::{Config, ConfigFlags, DomainId, InterfaceField, MacAddress, Node, NodeState, PortId, PortRole, Priority, RingPortIndex, RingState, Role, TimingProfile};
use support::{at, platform_with_ring_ports, MockPlatform, TestClock};

fn mra_config() -> Config {
    Config {
        ring_port1: PortId(0),
        ring_port2: PortId(1),
        domain: DomainId::DEFAULT,
        timing_profile: TimingProfile::Ms200,
        expected_role: Role::ManagerAuto,
        flags: ConfigFlags::CHECK_MEDIA_REDUNDANCY,
        ..Config::default()
    }
}

#[test]
fn demotes_then_re_promotes() {
    let bridge = MacAddress([0xAA; 6]);
    let better_peer = MacAddress([0x01; 6]);
    let platform = platform_with_ring_ports(bridge);
    let mut node: Node<TestClock, MockPlatform> = Node::new(mra_config(), platform.clone()).unwrap();

    node.start(at(0));
    assert_eq!(node.role(), Role::ManagerAuto);

    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::State, true);
    node.on_link_change(at(0), RingPortIndex::First, InterfaceField::Carrier, true);
    node.poll(at(0));
    assert_eq!(node.node_state(), NodeState::PrmUp);

    let nack = ArbitrationSubTlv {
        prio: Priority(0x1000),
        source_mac: better_peer,
        other_mrm_prio: Priority::MRA_DEFAULT,
        other_mrm_mac: bridge,
    };
    let pdu = mrp::Pdu {
        primary: Primary::Test(TestTlv {
            priority: Priority(0x1000),
            source_mac: better_peer,
            port_role: PortRole::Primary,
            ring_state: RingState::Open,
            transition: 0,
            timestamp: 0,
        }),
        option: Some(OptionTlv { oui: OptionTlv::IEC_OUI, sub_tlv: Some(SubTlv::TestMgrNack(nack)) }),
        common: CommonTlv { sequence_id: 1, domain: DomainId::DEFAULT },
    };
    let mut buf = [0u8; 64];
    let n = pdu.encode(&mut buf).unwrap();
    node.on_frame(at(5), RingPortIndex::First, &buf[..n]).unwrap();

    assert_eq!(node.role(), Role::ManagerAutoComp);
    assert_eq!(node.node_state(), NodeState::DeIdle);

    let saw_propagate = platform.sent().iter().any(|f| {
        matches!(
            mrp::Pdu::decode(&f.bytes).unwrap().option.and_then(|o| o.sub_tlv),
            Some(SubTlv::TestPropagate(_))
        )
    });
    assert!(saw_propagate, "expected a TEST_PROPAGATE relay after demotion");

    // The pre-demotion TestTimer (armed at t=0, 20ms default interval) keeps
    // firing at `short_test_interval` (10ms) afterwards, counting monNReturn
    // up to monNRmax (3) before reclaiming the manager role.
    for now in [20u64, 30, 40, 50, 60] {
        node.poll(at(now));
    }

    assert_eq!(node.role(), Role::ManagerAuto);
    assert_eq!(node.node_state(), NodeState::PrmUp);
    assert_eq!(node.ring_state(), RingState::Open);
}
