//! Hardware resource acquisition
//!
//! A [`Platform`] opens the four resources the radio needs by name: the SPI
//! device node and three GPIO numbers from a [`PinConfig`](crate::PinConfig).
//! [`Sx127x::open`](crate::Sx127x::open) acquires them in a fixed order and
//! lets already opened resources drop when a later one fails, so a failed
//! open never leaks an exported pin or an open bus.

use core::fmt;

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};

use crate::irq::InterruptPin;

/// Resources owned by a radio
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// SPI bus
    Bus,
    /// Chip-select pin
    ChipSelect,
    /// Reset pin
    Reset,
    /// DIO0 interrupt pin
    Interrupt,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bus => "SPI bus",
            Self::ChipSelect => "chip-select pin",
            Self::Reset => "reset pin",
            Self::Interrupt => "interrupt pin",
        };
        f.write_str(name)
    }
}

/// Opens buses and pins by name.
///
/// Resources are scoped: dropping one releases it.
pub trait Platform {
    /// Full-duplex SPI bus, chip-select not handled by the bus
    type Bus: SpiBus;
    /// Output used for chip-select and reset
    type Output: OutputPin;
    /// Input carrying DIO0
    type Interrupt: InterruptPin;
    /// Delay provider
    type Delay: DelayNs;
    /// Acquisition failure
    type Error: fmt::Debug;

    /// Opens and configures the SPI device node at `device`.
    fn open_bus(&mut self, device: &str) -> Result<Self::Bus, Self::Error>;

    /// Exports `pin` as an output.
    fn open_output(&mut self, pin: u32) -> Result<Self::Output, Self::Error>;

    /// Exports `pin` as an input usable for edge waits.
    fn open_interrupt(&mut self, pin: u32) -> Result<Self::Interrupt, Self::Error>;

    /// Returns a delay provider.
    fn delay(&mut self) -> Self::Delay;
}
