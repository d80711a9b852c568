//! Port / interface model (SPEC_FULL.md §4.5).
//!
//! Tracks the two ring ports' raw observable signals and forwarding state.
//! Grounded on `original_source/.../Mrp.cc`'s `receiveSignal`/`initPortTable`
//! debounce handling, and on a `src/device.rs`-style pattern of a thin
//! struct the core owns directly while the underlying hardware/host
//! state lives behind an injected collaborator (here, [`crate::platform::InterfaceTable`]).

use core::time::Duration;

use crate::domain::{LinkState, MacAddress, PortForwardingState, PortId};

/// Per-port state the core tracks directly (as opposed to state owned by
/// the host's interface table and only read through
/// [`crate::platform::InterfaceTable`]).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingPort {
    pub id: PortId,
    pub mac: MacAddress,
    pub is_up: bool,
    pub has_carrier: bool,
    pub forwarding: PortForwardingState,
}

impl RingPort {
    pub fn new(id: PortId, mac: MacAddress) -> Self {
        RingPort { id, mac, is_up: false, has_carrier: false, forwarding: PortForwardingState::Disabled }
    }

    /// The link state `MAU_TYPE_CHANGE` events are synthesized from: up
    /// only when both the administrative state and the carrier agree.
    pub fn link_state(&self) -> LinkState {
        if self.is_up && self.has_carrier {
            LinkState::Up
        } else {
            LinkState::Down
        }
    }
}

/// The debounce delay for a `DELAY_TIMER` arming in reaction to a raw
/// observable change, per SPEC_FULL.md §4.5: fast for a transition to
/// `Up` (a fixed 1 microsecond "hysteresis"), the configured
/// `link_detection_delay` for a transition to `Down`.
pub fn debounce_delay(resulting_state: LinkState, link_detection_delay: Duration) -> Duration {
    match resulting_state {
        LinkState::Up => Duration::from_micros(1),
        LinkState::Down => link_detection_delay,
    }
}
