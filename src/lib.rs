//! Media Redundancy Protocol (IEC 62439-2) node core.
//!
//! Implements the per-node MRP state machine: nine node states, three ring
//! states, client/manager/automanager role behavior, priority-based manager
//! election, link-change debouncing, forwarding-database flush
//! orchestration, and an optional IEEE 802.1ag Continuity Check Message
//! fast link-loss detector. The MAC forwarding table, the relay (bridge
//! egress), and the interface table are external collaborator surface,
//! injected at construction through the [`platform::Platform`] trait - this
//! crate defines only the interfaces the core requires from them.
//!
//! Supports `no_std`.
#![no_std]

pub mod domain;

pub mod config;
pub mod error;

pub mod pdu;
mod serde;

pub mod timer;

pub mod ccm;

pub mod platform;
pub mod port;

pub mod node;
pub mod state;

pub use config::{CcmInterval, Config, ConfigFlags, TimingConstants, TimingProfile};
pub use domain::{
    DomainId, InterfaceField, LinkState, MacAddress, NodeState, PortForwardingState, PortId, PortRole, Priority,
    Role, RingPortIndex, RingState, MRP_LT,
};
pub use error::{ConfigError, DecodeError, EncodeError, FatalError};
pub use node::Node;
pub use pdu::Pdu;
pub use platform::{ForwardingDatabase, Interface, InterfaceProtocol, InterfaceTable, Platform, Relay};
