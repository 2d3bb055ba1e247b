//! Observability hooks
//!
//! The driver reports bus traffic and verification outcomes to an
//! [`EventSink`] supplied by the caller. The default sink discards
//! everything; pass a real one via
//! [`Drv8711::with_event_sink`](crate::Drv8711::with_event_sink) to
//! trace frames on a logic-analyzer-free bench or to count retries in
//! the field.

use crate::registers::Register;

/// One observable driver event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A write frame was transmitted. `attempt` counts from 0 and is
    /// nonzero only for verification retries.
    Write {
        /// Register being written
        register: Register,
        /// The transmitted frame
        frame: u16,
        /// Attempt index within the verified-write loop
        attempt: u8,
    },
    /// A verification read-back completed
    ReadBack {
        /// Register being verified
        register: Register,
        /// The frame clocked back by the chip
        frame: u16,
        /// Whether the low 12 bits matched the written payload
        matched: bool,
    },
    /// A register was read
    Read {
        /// Register that was read
        register: Register,
        /// The frame clocked back by the chip
        frame: u16,
    },
    /// A verified write exhausted its retry budget
    WriteFailed {
        /// Register whose write could not be verified
        register: Register,
    },
}

/// Receiver for driver [`Event`]s
pub trait EventSink {
    /// Record one event. Called synchronously from the driver; keep it
    /// cheap.
    fn record(&mut self, event: Event);
}

/// An [`EventSink`] that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&mut self, _event: Event) {}
}
