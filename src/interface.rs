//! Bus interface for the DRV8711
//!
//! The DRV8711 speaks a word-oriented SPI protocol: every operation is
//! a single full-duplex 16-bit exchange with the register address and
//! read/write flag embedded in the frame itself. This module defines
//! the [`Interface`] trait the driver is generic over, plus an
//! [`SpiInterface`] implementation for `embedded-hal` SPI devices.

use embedded_hal::spi::SpiDevice;

/// A full-duplex 16-bit exchange with the DRV8711.
///
/// One call clocks `frame` out MSB first while the chip clocks the
/// reply back in, with chip select asserted for exactly the duration
/// of the exchange. For read frames the reply carries the addressed
/// register's payload in its low 12 bits.
pub trait Interface {
    /// Bus error type
    type Error;

    /// Perform one 16-bit exchange, returning the bits clocked in.
    fn exchange(&mut self, frame: u16) -> Result<u16, Self::Error>;
}

/// SPI interface for the DRV8711
///
/// # Note on Chip Select
///
/// This interface uses the `SpiDevice` trait from `embedded-hal`, which
/// manages the chip select pin automatically: it is asserted immediately
/// before each exchange and released immediately after. Note that the
/// DRV8711 chip select is active **high**, so the CS pin handed to the
/// `SpiDevice` implementation must account for the inverted polarity.
///
/// If using `embedded-hal-bus`, you would typically create an `SpiDevice`
/// like:
/// ```ignore
/// let spi_device = embedded_hal_bus::spi::ExclusiveDevice::new(spi_bus, cs_pin, delay);
/// let interface = SpiInterface::new(spi_device);
/// ```
///
/// The bus must be configured for SPI mode 0 (idle-low clock, data
/// latched on the rising edge), MSB first.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Create a new SPI interface with the given SPI device
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume the interface and return the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI, E> Interface for SpiInterface<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    type Error = E;

    fn exchange(&mut self, frame: u16) -> Result<u16, Self::Error> {
        let mut buffer = frame.to_be_bytes();
        self.spi.transfer_in_place(&mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }
}
