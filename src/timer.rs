//! Named one-shot timer bank (SPEC_FULL.md §4.3).
//!
//! `EndDevice<C>` threads a single `Clock: embedded_time::Clock` type
//! parameter through itself and keeps a handful of named
//! `Option<Instant<C>>` fields directly on the struct rather than through a
//! generic map (`src/lib.rs`). `oxidecomputer-hubris/lib/multitimer`
//! generalizes that same deadline/rearm bookkeeping to an
//! `enum_map`-keyed registry of many timers. MRP's timer set is small and
//! fixed at compile time, so this keeps the named-field shape for the
//! eight scalar timers and only reaches for `enum_map::EnumMap` where the
//! timer is genuinely parameterized per ring port.

use embedded_time::duration::Milliseconds;
use embedded_time::{Clock, Instant};
use enum_map::EnumMap;
use heapless::Vec;

use crate::domain::{InterfaceField, RingPortIndex};

/// Every timer name the state machine can arm, including the two families
/// parameterized by ring port (and, for `Delay`, additionally by which
/// interface field is being debounced).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerName {
    Test,
    TopologyChange,
    LinkUp,
    LinkDown,
    FdbClear,
    FdbClearDelay,
    StartUp,
    LinkUpHysteresis,
    ContinuityCheck(RingPortIndex),
    Delay(RingPortIndex, InterfaceField),
}

/// Maximum number of distinct timer identities: 8 scalar + 2 continuity
/// check + 4 delay (2 ports x 2 fields).
const MAX_TIMERS: usize = 14;

/// Truncates a delay to millisecond resolution, matching the on-wire
/// interval representation (SPEC_FULL.md §4.3).
pub fn trunc_msec(delay: core::time::Duration) -> Milliseconds<u64> {
    Milliseconds::new(delay.as_millis() as u64)
}

/// A bank of named one-shot timers driven by a single clock.
pub struct TimerBank<C: Clock> {
    test: Option<Instant<C>>,
    topology_change: Option<Instant<C>>,
    link_up: Option<Instant<C>>,
    link_down: Option<Instant<C>>,
    fdb_clear: Option<Instant<C>>,
    fdb_clear_delay: Option<Instant<C>>,
    start_up: Option<Instant<C>>,
    link_up_hysteresis: Option<Instant<C>>,
    continuity_check: EnumMap<RingPortIndex, Option<Instant<C>>>,
    delay: EnumMap<RingPortIndex, EnumMap<InterfaceField, Option<Instant<C>>>>,
}

impl<C: Clock> TimerBank<C> {
    pub fn new() -> Self {
        TimerBank {
            test: None,
            topology_change: None,
            link_up: None,
            link_down: None,
            fdb_clear: None,
            fdb_clear_delay: None,
            start_up: None,
            link_up_hysteresis: None,
            continuity_check: EnumMap::default(),
            delay: EnumMap::default(),
        }
    }

    fn slot(&self, name: TimerName) -> &Option<Instant<C>> {
        match name {
            TimerName::Test => &self.test,
            TimerName::TopologyChange => &self.topology_change,
            TimerName::LinkUp => &self.link_up,
            TimerName::LinkDown => &self.link_down,
            TimerName::FdbClear => &self.fdb_clear,
            TimerName::FdbClearDelay => &self.fdb_clear_delay,
            TimerName::StartUp => &self.start_up,
            TimerName::LinkUpHysteresis => &self.link_up_hysteresis,
            TimerName::ContinuityCheck(port) => &self.continuity_check[port],
            TimerName::Delay(port, field) => &self.delay[port][field],
        }
    }

    fn slot_mut(&mut self, name: TimerName) -> &mut Option<Instant<C>> {
        match name {
            TimerName::Test => &mut self.test,
            TimerName::TopologyChange => &mut self.topology_change,
            TimerName::LinkUp => &mut self.link_up,
            TimerName::LinkDown => &mut self.link_down,
            TimerName::FdbClear => &mut self.fdb_clear,
            TimerName::FdbClearDelay => &mut self.fdb_clear_delay,
            TimerName::StartUp => &mut self.start_up,
            TimerName::LinkUpHysteresis => &mut self.link_up_hysteresis,
            TimerName::ContinuityCheck(port) => &mut self.continuity_check[port],
            TimerName::Delay(port, field) => &mut self.delay[port][field],
        }
    }

    /// Arms `name` to fire `delay` after `now`, unless it is already armed.
    pub fn schedule(&mut self, now: Instant<C>, name: TimerName, delay: Milliseconds<u64>) {
        if self.slot(name).is_none() {
            let deadline = now.checked_add(delay);
            *self.slot_mut(name) = deadline;
        }
    }

    /// Cancels `name` (if armed) and arms it fresh for `delay` after `now`.
    pub fn reschedule(&mut self, now: Instant<C>, name: TimerName, delay: Milliseconds<u64>) {
        self.cancel(name);
        *self.slot_mut(name) = now.checked_add(delay);
    }

    /// Idempotent: disarms `name` if armed, otherwise a no-op.
    pub fn cancel(&mut self, name: TimerName) {
        *self.slot_mut(name) = None;
    }

    pub fn is_armed(&self, name: TimerName) -> bool {
        self.slot(name).is_some()
    }

    /// Cancels every armed timer, used by `Node::stop`.
    pub fn cancel_all(&mut self) {
        self.test = None;
        self.topology_change = None;
        self.link_up = None;
        self.link_down = None;
        self.fdb_clear = None;
        self.fdb_clear_delay = None;
        self.start_up = None;
        self.link_up_hysteresis = None;
        self.continuity_check = EnumMap::default();
        self.delay = EnumMap::default();
    }

    /// Returns every timer whose deadline has passed as of `now`,
    /// disarming each one (they are one-shot).
    pub fn poll(&mut self, now: Instant<C>) -> Vec<TimerName, MAX_TIMERS> {
        let mut fired = Vec::new();
        for name in Self::all_names() {
            if let Some(deadline) = *self.slot(name) {
                if deadline <= now {
                    self.cancel(name);
                    // capacity is MAX_TIMERS and `all_names` yields exactly
                    // that many distinct entries, so this cannot overflow.
                    let _ = fired.push(name);
                }
            }
        }
        fired
    }

    fn all_names() -> [TimerName; MAX_TIMERS] {
        [
            TimerName::Test,
            TimerName::TopologyChange,
            TimerName::LinkUp,
            TimerName::LinkDown,
            TimerName::FdbClear,
            TimerName::FdbClearDelay,
            TimerName::StartUp,
            TimerName::LinkUpHysteresis,
            TimerName::ContinuityCheck(RingPortIndex::First),
            TimerName::ContinuityCheck(RingPortIndex::Second),
            TimerName::Delay(RingPortIndex::First, InterfaceField::State),
            TimerName::Delay(RingPortIndex::First, InterfaceField::Carrier),
            TimerName::Delay(RingPortIndex::Second, InterfaceField::State),
            TimerName::Delay(RingPortIndex::Second, InterfaceField::Carrier),
        ]
    }
}

impl<C: Clock> Default for TimerBank<C> {
    fn default() -> Self {
        Self::new()
    }
}
