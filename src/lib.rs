#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod device;
pub mod event;
pub mod interface;
pub mod registers;

// Re-export main types
pub use device::{Drv8711, MAX_WRITE_ATTEMPTS, WRITE_BACKOFF_STEP_US};
pub use event::{Event, EventSink, NoopEventSink};
pub use interface::{Interface, SpiInterface};
pub use registers::{
    BlankRegister, CtrlRegister, DecayRegister, DriveRegister, OffRegister, Register,
    RegisterValue, StallRegister, StatusRegister, TorqueRegister,
};

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// A verified write exhausted its retry budget without the
    /// read-back ever matching the written payload
    WriteVerification(Register),
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
