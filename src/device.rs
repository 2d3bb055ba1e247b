//! High-level driver API for the DRV8711
//!
//! [`Drv8711`] owns the bus interface, a delay provider for retry
//! backoff, and an in-memory mirror of the chip's eight registers. The
//! mirror is the single source of truth between writes: callers edit
//! it through the `*_mut` accessors, then push it with the `write_*`
//! methods. Configuration writes are verified by an immediate
//! read-back and retried with linear backoff; see the module-level
//! notes on [`registers`](crate::registers) for the frame format.

use embedded_hal::delay::DelayNs;

use crate::event::{Event, EventSink, NoopEventSink};
use crate::interface::Interface;
use crate::registers::{
    read_frame, BlankRegister, CtrlRegister, DecayRegister, DriveRegister, OffRegister,
    RegisterValue, StallRegister, StatusRegister, TorqueRegister, PAYLOAD_MASK,
};
use crate::Error;

/// Maximum number of transmit attempts for one verified write
pub const MAX_WRITE_ATTEMPTS: u8 = 10;

/// Backoff unit for verified-write retries
///
/// Before retry `n` the driver sleeps `n * WRITE_BACKOFF_STEP_US`
/// microseconds, so the total worst-case stall per write is the
/// triangular sum 45 x 100 us = 4.5 ms.
pub const WRITE_BACKOFF_STEP_US: u32 = 100;

/// Main driver for the DRV8711
///
/// Generic over the bus [`Interface`], a [`DelayNs`] provider and an
/// optional [`EventSink`]. The driver assumes exclusive ownership of
/// the chip and single-threaded callers; it performs no internal
/// locking.
pub struct Drv8711<I, D, S = NoopEventSink> {
    interface: I,
    delay: D,
    sink: S,
    ctrl: CtrlRegister,
    torque: TorqueRegister,
    off: OffRegister,
    blank: BlankRegister,
    decay: DecayRegister,
    stall: StallRegister,
    drive: DriveRegister,
    status: StatusRegister,
    error_flag: bool,
}

impl<I, D> Drv8711<I, D> {
    /// Create a new driver with the register mirror at factory presets.
    ///
    /// No bus traffic happens here; call [`init`](Self::init) to push
    /// the presets to the chip. The DRV8711 has no identification
    /// register, so construction cannot probe for the device.
    pub fn new(interface: I, delay: D) -> Self {
        Self::with_event_sink(interface, delay, NoopEventSink)
    }
}

impl<I, D, S> Drv8711<I, D, S> {
    /// Create a new driver that reports bus traffic and verification
    /// outcomes to `sink`
    pub fn with_event_sink(interface: I, delay: D, sink: S) -> Self {
        Self {
            interface,
            delay,
            sink,
            ctrl: CtrlRegister::default(),
            torque: TorqueRegister::default(),
            off: OffRegister::default(),
            blank: BlankRegister::default(),
            decay: DecayRegister::default(),
            stall: StallRegister::default(),
            drive: DriveRegister::default(),
            status: StatusRegister::default(),
            error_flag: false,
        }
    }

    /// Reload the factory presets into the register mirror.
    ///
    /// Only the mirror changes; the chip is untouched until the next
    /// write.
    pub fn set_defaults(&mut self) {
        self.ctrl = CtrlRegister::default();
        self.torque = TorqueRegister::default();
        self.off = OffRegister::default();
        self.blank = BlankRegister::default();
        self.decay = DecayRegister::default();
        self.stall = StallRegister::default();
        self.drive = DriveRegister::default();
        self.status = StatusRegister::default();
    }

    /// Mirror value of the CTRL register
    pub fn ctrl(&self) -> CtrlRegister {
        self.ctrl
    }

    /// Mutable access to the CTRL mirror
    pub fn ctrl_mut(&mut self) -> &mut CtrlRegister {
        &mut self.ctrl
    }

    /// Mirror value of the TORQUE register
    pub fn torque(&self) -> TorqueRegister {
        self.torque
    }

    /// Mutable access to the TORQUE mirror
    pub fn torque_mut(&mut self) -> &mut TorqueRegister {
        &mut self.torque
    }

    /// Mirror value of the OFF register
    pub fn off(&self) -> OffRegister {
        self.off
    }

    /// Mutable access to the OFF mirror
    pub fn off_mut(&mut self) -> &mut OffRegister {
        &mut self.off
    }

    /// Mirror value of the BLANK register
    pub fn blank(&self) -> BlankRegister {
        self.blank
    }

    /// Mutable access to the BLANK mirror
    pub fn blank_mut(&mut self) -> &mut BlankRegister {
        &mut self.blank
    }

    /// Mirror value of the DECAY register
    pub fn decay(&self) -> DecayRegister {
        self.decay
    }

    /// Mutable access to the DECAY mirror
    pub fn decay_mut(&mut self) -> &mut DecayRegister {
        &mut self.decay
    }

    /// Mirror value of the STALL register
    pub fn stall(&self) -> StallRegister {
        self.stall
    }

    /// Mutable access to the STALL mirror
    pub fn stall_mut(&mut self) -> &mut StallRegister {
        &mut self.stall
    }

    /// Mirror value of the DRIVE register
    pub fn drive(&self) -> DriveRegister {
        self.drive
    }

    /// Mutable access to the DRIVE mirror
    pub fn drive_mut(&mut self) -> &mut DriveRegister {
        &mut self.drive
    }

    /// Mirror value of the STATUS register (as of the last read)
    pub fn last_status(&self) -> StatusRegister {
        self.status
    }

    /// True if a verified write has exhausted its retry budget since
    /// the last [`clear_error`](Self::clear_error)
    pub fn error_flag(&self) -> bool {
        self.error_flag
    }

    /// Reset the persistent write-verification error flag
    pub fn clear_error(&mut self) {
        self.error_flag = false;
    }

    /// Consume the driver and return the interface and delay provider
    pub fn release(self) -> (I, D) {
        (self.interface, self.delay)
    }
}

impl<I, D, S> Drv8711<I, D, S>
where
    I: Interface,
    D: DelayNs,
    S: EventSink,
{
    /// Initialize the chip: reload the factory presets into the mirror
    /// and push all eight registers.
    ///
    /// The motor outputs stay disabled (CTRL.ENBL preset is off); call
    /// [`enable`](Self::enable) when ready to drive.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or any configuration
    /// register cannot be verified.
    pub fn init(&mut self) -> Result<(), Error<I::Error>> {
        self.set_defaults();
        self.write_all()
    }

    /// Enable the motor outputs (set CTRL.ENBL and write CTRL)
    pub fn enable(&mut self) -> Result<(), Error<I::Error>> {
        self.ctrl.enbl = true;
        self.write_ctrl()
    }

    /// Disable the motor outputs (clear CTRL.ENBL and write CTRL)
    pub fn disable(&mut self) -> Result<(), Error<I::Error>> {
        self.ctrl.enbl = false;
        self.write_ctrl()
    }

    /// Read the STATUS register into the mirror and return it
    pub fn status(&mut self) -> Result<StatusRegister, Error<I::Error>> {
        self.read_status()
    }

    /// Clear all latched fault bits.
    ///
    /// Zeroes the STATUS mirror and writes it without verification:
    /// the chip updates live fault bits continuously, so a read-back
    /// comparison would race against it.
    pub fn clear_status(&mut self) -> Result<(), Error<I::Error>> {
        self.status = StatusRegister::default();
        self.write_status()
    }

    /// Push the CTRL mirror to the chip (verified)
    pub fn write_ctrl(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.ctrl;
        self.write_verified(value)
    }

    /// Push the TORQUE mirror to the chip (verified)
    pub fn write_torque(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.torque;
        self.write_verified(value)
    }

    /// Push the OFF mirror to the chip (verified)
    pub fn write_off(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.off;
        self.write_verified(value)
    }

    /// Push the BLANK mirror to the chip (verified)
    pub fn write_blank(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.blank;
        self.write_verified(value)
    }

    /// Push the DECAY mirror to the chip (verified)
    pub fn write_decay(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.decay;
        self.write_verified(value)
    }

    /// Push the STALL mirror to the chip (verified)
    pub fn write_stall(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.stall;
        self.write_verified(value)
    }

    /// Push the DRIVE mirror to the chip (verified)
    pub fn write_drive(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.drive;
        self.write_verified(value)
    }

    /// Push the STATUS mirror to the chip.
    ///
    /// STATUS writes clear latched fault bits and are never verified;
    /// this is exactly one exchange.
    pub fn write_status(&mut self) -> Result<(), Error<I::Error>> {
        let value = self.status;
        self.write_unverified(value)
    }

    /// Read CTRL into the mirror and return it
    pub fn read_ctrl(&mut self) -> Result<CtrlRegister, Error<I::Error>> {
        let value = self.read_register::<CtrlRegister>()?;
        self.ctrl = value;
        Ok(value)
    }

    /// Read TORQUE into the mirror and return it
    pub fn read_torque(&mut self) -> Result<TorqueRegister, Error<I::Error>> {
        let value = self.read_register::<TorqueRegister>()?;
        self.torque = value;
        Ok(value)
    }

    /// Read OFF into the mirror and return it
    pub fn read_off(&mut self) -> Result<OffRegister, Error<I::Error>> {
        let value = self.read_register::<OffRegister>()?;
        self.off = value;
        Ok(value)
    }

    /// Read BLANK into the mirror and return it
    pub fn read_blank(&mut self) -> Result<BlankRegister, Error<I::Error>> {
        let value = self.read_register::<BlankRegister>()?;
        self.blank = value;
        Ok(value)
    }

    /// Read DECAY into the mirror and return it
    pub fn read_decay(&mut self) -> Result<DecayRegister, Error<I::Error>> {
        let value = self.read_register::<DecayRegister>()?;
        self.decay = value;
        Ok(value)
    }

    /// Read STALL into the mirror and return it
    pub fn read_stall(&mut self) -> Result<StallRegister, Error<I::Error>> {
        let value = self.read_register::<StallRegister>()?;
        self.stall = value;
        Ok(value)
    }

    /// Read DRIVE into the mirror and return it
    pub fn read_drive(&mut self) -> Result<DriveRegister, Error<I::Error>> {
        let value = self.read_register::<DriveRegister>()?;
        self.drive = value;
        Ok(value)
    }

    /// Read STATUS into the mirror and return it
    pub fn read_status(&mut self) -> Result<StatusRegister, Error<I::Error>> {
        let value = self.read_register::<StatusRegister>()?;
        self.status = value;
        Ok(value)
    }

    /// Push all eight registers in on-chip address order.
    ///
    /// CTRL through DRIVE use the verified path; STATUS is written
    /// unverified. The first failure aborts the sequence.
    pub fn write_all(&mut self) -> Result<(), Error<I::Error>> {
        self.write_ctrl()?;
        self.write_torque()?;
        self.write_off()?;
        self.write_blank()?;
        self.write_decay()?;
        self.write_stall()?;
        self.write_drive()?;
        self.write_status()?;
        Ok(())
    }

    /// Read all eight registers into the mirror in on-chip address
    /// order
    pub fn read_all(&mut self) -> Result<(), Error<I::Error>> {
        self.read_ctrl()?;
        self.read_torque()?;
        self.read_off()?;
        self.read_blank()?;
        self.read_decay()?;
        self.read_stall()?;
        self.read_drive()?;
        self.read_status()?;
        Ok(())
    }

    /// Write one register with read-back verification.
    ///
    /// Transmits the frame, reads the register back, and compares the
    /// low 12 bits (the read/write flag and address bits are stripped).
    /// On mismatch the write is retried up to [`MAX_WRITE_ATTEMPTS`]
    /// times with a linearly growing backoff. Exhausting the budget
    /// sets the persistent error flag; the chip may then hold either
    /// the old or the new value.
    fn write_verified<R: RegisterValue>(&mut self, value: R) -> Result<(), Error<I::Error>> {
        let frame = value.write_frame();
        let request = read_frame(R::ADDRESS);

        for attempt in 0..MAX_WRITE_ATTEMPTS {
            if attempt > 0 {
                self.delay.delay_us(attempt as u32 * WRITE_BACKOFF_STEP_US);
            }

            self.sink.record(Event::Write {
                register: R::ADDRESS,
                frame,
                attempt,
            });
            self.interface.exchange(frame)?;

            let readback = self.interface.exchange(request)?;
            let matched = (readback & PAYLOAD_MASK) == (frame & PAYLOAD_MASK);
            self.sink.record(Event::ReadBack {
                register: R::ADDRESS,
                frame: readback,
                matched,
            });

            if matched {
                return Ok(());
            }
        }

        self.error_flag = true;
        self.sink.record(Event::WriteFailed {
            register: R::ADDRESS,
        });
        Err(Error::WriteVerification(R::ADDRESS))
    }

    /// Write one register without read-back
    fn write_unverified<R: RegisterValue>(&mut self, value: R) -> Result<(), Error<I::Error>> {
        let frame = value.write_frame();
        self.sink.record(Event::Write {
            register: R::ADDRESS,
            frame,
            attempt: 0,
        });
        self.interface.exchange(frame)?;
        Ok(())
    }

    /// Issue one read exchange and decode the reply
    fn read_register<R: RegisterValue>(&mut self) -> Result<R, Error<I::Error>> {
        let reply = self.interface.exchange(read_frame(R::ADDRESS))?;
        self.sink.record(Event::Read {
            register: R::ADDRESS,
            frame: reply,
        });
        Ok(R::unpack(reply & PAYLOAD_MASK))
    }
}
