//! Error taxonomy.
//!
//! Three distinct types rather than one flat `Error` enum, so that a fatal
//! condition can't be accidentally treated as recoverable by a caller who
//! forgot a match arm - see `src/mac_frame.rs`'s per-operation error enums
//! in the crate this was built from for the same idea applied to framing.

use crate::domain::PortId;

/// Fatal configuration errors, checked once at `Config::validate` /
/// `Node::new` time. A `Node` can never be observed in an invalid
/// configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `timingProfile` was not one of the four IEC 62439-2 profiles.
    InvalidTimingProfile(u16),
    /// The primary and secondary ring port were configured as the same
    /// interface.
    DuplicateRingPort,
    /// A ring port was configured on a loopback interface.
    LoopbackRingPort(PortId),
}

/// Logic errors detected while running, surfaced only from the frame
/// ingestion path. The reference implementation aborts the whole node on
/// these; callers of this crate should treat an `Err(FatalError)` the same
/// way rather than continue feeding the node events.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    UnknownTlvType(u8),
    UnknownSubTlvType(u8),
}

/// Ordinary PDU codec failures. Callers decoding frames directly through
/// [`crate::pdu::Pdu::decode`] see these; callers going through
/// [`crate::node::Node::on_frame`] only see the two variants that are
/// promoted to [`FatalError`] (`UnknownTlvType`, `UnknownSubTlvType`) as an
/// `Err(FatalError)`, everything else is logged and dropped.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than any valid MRP PDU could be.
    TooSmall { have: usize, need: usize },
    /// The two-byte version field was not `0x0001`.
    VersionMismatch { have: u16 },
    /// A TLV's declared length ran past the end of the buffer.
    BadTlvLength { tlv_type: u8, declared: u8, remaining: usize },
    /// A TLV's type byte wasn't one this protocol defines, in a slot where
    /// that is a fatal error (see SPEC_FULL.md §7).
    UnknownTlvType(u8),
    /// A sub-TLV type byte inside an `OPTION` TLV wasn't one this protocol
    /// defines.
    UnknownSubTlvType(u8),
    /// The frame ended without a terminating `END` TLV.
    MissingEndTlv,
}

impl DecodeError {
    /// Promote to the fatal class if this is one of the two errors the
    /// reference treats as a programming/configuration error rather than a
    /// transient protocol anomaly.
    pub fn into_fatal(self) -> Result<(), FatalError> {
        match self {
            DecodeError::UnknownTlvType(t) => Err(FatalError::UnknownTlvType(t)),
            DecodeError::UnknownSubTlvType(t) => Err(FatalError::UnknownSubTlvType(t)),
            _ => Ok(()),
        }
    }
}

/// Encode-side failures - in practice only a caller-supplied buffer that's
/// too small, since every MRP PDU fits comfortably within
/// [`crate::pdu::MAX_PDU_LEN`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    BufferTooSmall { have: usize, need: usize },
}
