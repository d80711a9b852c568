//! Node configuration and the per-profile derived timing constants.
//!
//! `Config` is a plain struct with a `Default` impl supplying recommended
//! values, the same shape as a hand-rolled `Parameters` struct - no parsing
//! crate, no derive-based validation, just an explicit `validate()` call.

use core::time::Duration;

use crate::domain::{DomainId, PortId, Priority, Role};
use crate::error::ConfigError;

/// One of the four timing profiles IEC 62439-2 defines, named by the
/// maximum ring-recovery time they guarantee.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingProfile {
    Ms500,
    Ms200,
    Ms30,
    Ms10,
}

impl TimingProfile {
    pub fn from_millis(v: u16) -> Result<TimingProfile, ConfigError> {
        match v {
            500 => Ok(TimingProfile::Ms500),
            200 => Ok(TimingProfile::Ms200),
            30 => Ok(TimingProfile::Ms30),
            10 => Ok(TimingProfile::Ms10),
            other => Err(ConfigError::InvalidTimingProfile(other)),
        }
    }

    /// The derived constants for this profile (SPEC_FULL.md §3 table),
    /// grounded on `original_source/.../Mrp.cc`'s `setTimingProfile`.
    pub fn constants(self) -> TimingConstants {
        match self {
            TimingProfile::Ms500 => TimingConstants {
                topology_change_interval: Duration::from_micros(20_000),
                short_test_interval: Duration::from_micros(30_000),
                default_test_interval: Duration::from_micros(50_000),
                test_monitoring_count: 5,
                link_up_down_interval: Duration::from_micros(20_000),
            },
            TimingProfile::Ms200 => TimingConstants {
                topology_change_interval: Duration::from_micros(10_000),
                short_test_interval: Duration::from_micros(10_000),
                default_test_interval: Duration::from_micros(20_000),
                test_monitoring_count: 3,
                link_up_down_interval: Duration::from_micros(20_000),
            },
            TimingProfile::Ms30 => TimingConstants {
                topology_change_interval: Duration::from_micros(500),
                short_test_interval: Duration::from_micros(1_000),
                default_test_interval: Duration::from_micros(3_500),
                test_monitoring_count: 3,
                link_up_down_interval: Duration::from_micros(3_000),
            },
            TimingProfile::Ms10 => TimingConstants {
                topology_change_interval: Duration::from_micros(500),
                short_test_interval: Duration::from_micros(500),
                default_test_interval: Duration::from_micros(1_000),
                test_monitoring_count: 3,
                link_up_down_interval: Duration::from_micros(1_000),
            },
        }
    }
}

/// Constants derived from a [`TimingProfile`], used throughout the state
/// machine and timer service.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConstants {
    pub topology_change_interval: Duration,
    pub short_test_interval: Duration,
    pub default_test_interval: Duration,
    pub test_monitoring_count: u8,
    pub link_up_down_interval: Duration,
}

impl TimingConstants {
    /// `testMaxRetransmissionCount`, one less than the monitoring count.
    pub fn test_max_retransmission_count(self) -> u8 {
        self.test_monitoring_count - 1
    }

    /// `linkMaxChange`, the client PT-cycle retry budget. Derived from the
    /// monitoring count the way the reference derives its retry ceilings
    /// from it.
    pub fn link_max_change(self) -> u8 {
        self.test_monitoring_count
    }

    /// `monNRmax`, the MRA re-promotion tick budget.
    pub fn mon_n_rmax(self) -> u8 {
        self.test_monitoring_count
    }
}

bitflags::bitflags! {
    /// The boolean behavior flags a node is configured with.
    ///
    /// Grounded on `oxidecomputer-hubris/sys/abi`'s use of `bitflags` for a
    /// fixed set of independent booleans, generalized from a plain `bool`
    /// struct field per flag since SPEC_FULL.md enumerates these as one
    /// named set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigFlags: u16 {
        const REACT_ON_LINK_CHANGE               = 1 << 0;
        const NON_BLOCKING_MRC                    = 1 << 1;
        const CHECK_MEDIA_REDUNDANCY              = 1 << 2;
        const NO_TOPOLOGY_CHANGE                  = 1 << 3;
        const ENABLE_LINK_CHECK_ON_RING           = 1 << 4;
        const INTERCONNECTION_LINK_CHECK_AWARE    = 1 << 5;
        const INTERCONNECTION_RING_CHECK_AWARE    = 1 << 6;
    }
}

/// Node configuration, supplied by the embedding host at construction time.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub ring_port1: PortId,
    pub ring_port2: PortId,
    pub domain: DomainId,
    pub timing_profile: TimingProfile,
    pub expected_role: Role,
    pub flags: ConfigFlags,
    pub ccm_interval: CcmInterval,
    pub link_detection_delay: Duration,
    pub processing_delay: Duration,
    pub mrp_priority: Priority,
}

/// The two IEC 802.1ag CCM profiles MRP recognizes.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcmInterval {
    Ms3_3,
    Ms10,
}

impl CcmInterval {
    pub fn duration(self) -> Duration {
        match self {
            CcmInterval::Ms3_3 => Duration::from_micros(3_300),
            CcmInterval::Ms10 => Duration::from_micros(10_000),
        }
    }

    /// The on-wire flags nibble encoding this profile.
    pub fn wire_flags(self) -> u8 {
        match self {
            CcmInterval::Ms3_3 => 0x01,
            CcmInterval::Ms10 => 0x02,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ring_port1: PortId(0),
            ring_port2: PortId(1),
            domain: DomainId::DEFAULT,
            timing_profile: TimingProfile::Ms200,
            expected_role: Role::Client,
            flags: ConfigFlags::CHECK_MEDIA_REDUNDANCY,
            ccm_interval: CcmInterval::Ms10,
            link_detection_delay: Duration::from_millis(1000),
            processing_delay: Duration::from_millis(0),
            mrp_priority: Priority::DEFAULT,
        }
    }
}

impl Config {
    /// Rejects the two fatal configuration classes SPEC_FULL.md §3/§7
    /// name: an invalid timing profile is already unrepresentable once a
    /// `TimingProfile` has been constructed via `from_millis`, so the only
    /// remaining checks are the ring-port invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_port1 == self.ring_port2 {
            return Err(ConfigError::DuplicateRingPort);
        }
        Ok(())
    }
}
