//! IEEE 802.1ag Continuity Check Message subsystem (SPEC_FULL.md §4.4).
//!
//! Grounded on `original_source/.../Mrp.cc`'s
//! `handleContinuityCheckMessage`/`handleContinuityCheckTimer` (the
//! `3.5 x interval` liveness deadline, the MAC-address endpoint tiebreak)
//! and a per-field struct style for per-port bookkeeping (`src/lib.rs`).

use core::fmt::Write as _;

use embedded_time::{Clock, Instant};

use crate::config::CcmInterval;
use crate::domain::MacAddress;
use crate::timer::trunc_msec;

/// A sourced CCM frame, ready to hand to the relay.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcmFrame {
    pub sequence: u16,
    pub endpoint_id: u8,
    pub flags: u8,
}

/// Per-ring-port continuity-check bookkeeping.
pub struct CcmPortState<C: Clock> {
    pub interval: CcmInterval,
    pub endpoint_id: u8,
    pub name: heapless::String<32>,
    pub next_update: Option<Instant<C>>,
    pub sent_sequence: u16,
    pub lost_count: u32,
}

fn liveness_window(interval: CcmInterval) -> core::time::Duration {
    (interval.duration() * 7) / 2
}

impl<C: Clock> CcmPortState<C> {
    pub fn new(interval: CcmInterval, endpoint_id: u8, name: &str) -> Self {
        let mut n = heapless::String::new();
        let _ = n.push_str(name);
        CcmPortState { interval, endpoint_id, name: n, next_update: None, sent_sequence: 0, lost_count: 0 }
    }

    /// Arms the initial liveness deadline; called when CCM is enabled on
    /// this port.
    pub fn start(&mut self, now: Instant<C>) {
        self.next_update = now.checked_add(trunc_msec(liveness_window(self.interval)));
    }

    /// One periodic tick: sources a new CCM frame and reports whether the
    /// liveness deadline has already passed (in which case the caller
    /// should synthesize `MAU_TYPE_CHANGE(port, Down)`).
    pub fn on_periodic_tick(&mut self, now: Instant<C>) -> (CcmFrame, bool) {
        self.sent_sequence = self.sent_sequence.wrapping_add(1);
        let frame = CcmFrame { sequence: self.sent_sequence, endpoint_id: self.endpoint_id, flags: self.interval.wire_flags() };
        let timed_out = match self.next_update {
            Some(deadline) => now >= deadline,
            None => false,
        };
        if timed_out {
            self.lost_count += 1;
        }
        (frame, timed_out)
    }

    /// A CCM frame was received on this port. Refreshes the liveness
    /// deadline and, if the peer's MAC sorts lower than ours, flips to
    /// endpoint id 2 so a pair of peers converge on complementary ids.
    pub fn on_received(&mut self, now: Instant<C>, source_mac: MacAddress, local_mac: MacAddress) {
        self.next_update = now.checked_add(trunc_msec(liveness_window(self.interval)));
        if source_mac.0 < local_mac.0 && self.endpoint_id != 2 {
            self.endpoint_id = 2;
            let base = self.name.trim_end_matches("-2").to_owned_in_place();
            let mut rewritten: heapless::String<32> = heapless::String::new();
            let _ = write!(rewritten, "{}-2", base);
            self.name = rewritten;
        }
    }
}

/// `str::trim_end_matches` returns a borrowed slice into `self`; copying it
/// out to an owned fixed-capacity string before reusing the buffer it was
/// borrowed from avoids a self-referential borrow.
trait ToOwnedInPlace {
    fn to_owned_in_place(&self) -> heapless::String<32>;
}

impl ToOwnedInPlace for str {
    fn to_owned_in_place(&self) -> heapless::String<32> {
        let mut s = heapless::String::new();
        let _ = s.push_str(self);
        s
    }
}
