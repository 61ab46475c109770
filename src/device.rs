//! SX127x Register Access Layer
//!
//! This module provides the lowest level interface to the radio: single register
//! transactions over a full-duplex SPI bus with a separately driven chip-select pin.
//!
//! Every transaction is two bytes long:
//! - Byte 0: register address in bits 6:0, bit 7 set for a write
//! - Byte 1: the value to write, or a dummy byte whose exchange shifts out the
//!   register value on a read
//!
//! The `Device<SPI, CS>` struct owns the bus and the chip-select pin and
//! provides methods for:
//! - Reading and writing raw registers
//! - Reading, writing and modifying typed registers
//! - Streaming payload bytes through the FIFO register
//!
//! `Device` has no locking of its own. All methods take `&mut self`; the radio
//! keeps the device behind a single mutex so that a read-modify-write or a
//! whole FIFO transfer forms one uninterrupted critical section.
//!
//! # Example
//! ```no_run
//! # fn example<SPI, CS>(spi: SPI, cs: CS) -> Result<(), sx127x::Error>
//! # where SPI: embedded_hal::spi::SpiBus, CS: embedded_hal::digital::OutputPin {
//! use sx127x::{device::Device, ModemConfig2};
//!
//! let mut device = Device::new(spi, cs);
//!
//! // Read a raw register
//! let version = device.read(0x42)?;
//!
//! // Update the spreading factor, keeping the other fields
//! device.modify_register(|config: &mut ModemConfig2| config.spreading_factor = 9)?;
//! # Ok(())
//! # }
//! ```

use core::convert::Infallible;

use embedded_hal::{digital::OutputPin, spi::SpiBus};
use regiface::{ByteArray, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};
use tracing::trace;

use crate::registers::FIFO_ADDRESS;
use crate::Error;

/// Address bit selecting a write transaction.
const WRITE_FLAG: u8 = 0x80;

/// Register level interface to an SX127x.
pub struct Device<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Device<SPI, CS> {
    /// Creates a new Device from the SPI bus and the chip-select pin.
    ///
    /// The bus must be configured for mode 0, 8 bit words, at most 10 MHz.
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Releases the underlying bus and chip-select pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Device<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Drives chip-select high, the idle state required before a reset pulse.
    pub fn deselect(&mut self) -> Result<(), Error> {
        self.cs.set_high().map_err(Error::pin)
    }

    fn exchange(&mut self, frame: [u8; 2]) -> Result<[u8; 2], Error> {
        let mut response = [0u8; 2];

        self.cs.set_low().map_err(Error::pin)?;
        let transfer = self
            .spi
            .transfer(&mut response, &frame)
            .and_then(|()| self.spi.flush())
            .map_err(Error::bus);
        // chip-select is released even when the transfer failed
        self.cs.set_high().map_err(Error::pin)?;

        transfer.map(|()| response)
    }

    /// Writes a raw value to a register.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Pin` - chip-select could not be driven
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), Error> {
        trace!("write {:#04x} <- {:#04x}", address, value);
        self.exchange([WRITE_FLAG | address, value]).map(|_| ())
    }

    /// Reads the raw value of a register.
    ///
    /// The value is the second byte shifted in during the exchange.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Pin` - chip-select could not be driven
    pub fn read(&mut self, address: u8) -> Result<u8, Error> {
        let [_, value] = self.exchange([address & !WRITE_FLAG, 0x00])?;
        trace!("read {:#04x} -> {:#04x}", address, value);
        Ok(value)
    }

    /// Reads a typed register.
    ///
    /// Registers wider than one byte are read one address at a time, starting
    /// at the register address.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Deserialization` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        for (offset, byte) in raw_value.as_mut().iter_mut().enumerate() {
            *byte = self.read(R::id() + offset as u8)?;
        }

        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Writes a typed register.
    ///
    /// Registers wider than one byte are written MSB first, one address at a time.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing WritableRegister with u8 ID
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw_value) => raw_value,
            Err(never) => match never {},
        };

        for (offset, byte) in raw_value.as_ref().iter().enumerate() {
            self.write(R::id() + offset as u8, *byte)?;
        }

        Ok(())
    }

    /// Reads a typed register, lets `f` change it and writes it back.
    ///
    /// Fields `f` does not touch are written back unchanged, which is how
    /// registers shared by several settings are updated.
    pub fn modify_register<R, F>(&mut self, f: F) -> Result<(), Error>
    where
        R: ReadableRegister<IdType = u8> + WritableRegister<IdType = u8, Error = Infallible>,
        F: FnOnce(&mut R),
    {
        let mut register = self.read_register::<R>()?;
        f(&mut register);
        self.write_register(register)
    }

    /// Writes bytes to the FIFO at the current FIFO pointer.
    ///
    /// One transaction per byte.
    pub fn write_fifo(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for byte in bytes {
            self.write(FIFO_ADDRESS, *byte)?;
        }
        Ok(())
    }

    /// Fills `bytes` from the FIFO starting at the current FIFO pointer.
    pub fn read_fifo(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        for byte in bytes.iter_mut() {
            *byte = self.read(FIFO_ADDRESS)?;
        }
        Ok(())
    }
}
