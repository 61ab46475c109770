//! System-related registers
//!
//! This module contains the registers that select the modem and the operating
//! mode of the transceiver, and the silicon revision register used to identify
//! the chip during initialization.
//!
//! The operating mode register is the only register that may be written in
//! every mode. Most LoRa configuration registers can only be changed while the
//! chip is in Sleep or Standby.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Silicon revision reported by every SX1276/77/78/79 part.
pub const EXPECTED_VERSION: u8 = 0x12;

/// Transceiver mode as encoded in bits 2:0 of [`OpMode`]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipMode {
    /// Lowest power; FIFO contents are lost
    Sleep = 0x0,
    /// Crystal oscillator running, FIFO accessible
    Standby = 0x1,
    /// Frequency synthesis for transmit
    FsTx = 0x2,
    /// Transmit a single packet, then return to Standby
    Transmit = 0x3,
    /// Frequency synthesis for receive
    FsRx = 0x4,
    /// Receive until told otherwise
    ReceiveContinuous = 0x5,
    /// Receive a single packet, then return to Standby
    ReceiveSingle = 0x6,
    /// Channel activity detection
    ChannelActivityDetection = 0x7,
}

impl ChipMode {
    /// Decodes the three mode bits; every value names a mode.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x0 => Self::Sleep,
            0x1 => Self::Standby,
            0x2 => Self::FsTx,
            0x3 => Self::Transmit,
            0x4 => Self::FsRx,
            0x5 => Self::ReceiveContinuous,
            0x6 => Self::ReceiveSingle,
            _ => Self::ChannelActivityDetection,
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// Selects between the FSK/OOK and LoRa modems and sets the transceiver mode.
///
/// # Important Notes
/// - `long_range_mode` can only be changed while in Sleep
/// - This driver always writes the LoRa flag together with the mode, so the
///   modem never leaves LoRa mode once initialized
/// - `low_frequency_mode` selects the low-frequency register bank (bands below 525 MHz
///   on SX1276/77/79); it is kept clear by this driver
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// Bit 7: LoRa modem selected
    pub long_range_mode: bool,
    /// Bit 3: low-frequency register bank access
    pub low_frequency_mode: bool,
    /// Bits 2:0: transceiver mode
    pub mode: ChipMode,
}

impl OpMode {
    /// LoRa modem in the given transceiver mode.
    pub fn lora(mode: ChipMode) -> Self {
        Self {
            long_range_mode: true,
            low_frequency_mode: false,
            mode,
        }
    }
}

/// Silicon version register (address: 0x42)
///
/// Read-only. Holds [`EXPECTED_VERSION`] on all SX127x parts; any other value
/// means the bus is miswired or another chip answers on the chip-select line.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct Version {
    /// Full revision number (bits 7:4) and metal mask revision (bits 3:0)
    pub value: u8,
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            long_range_mode: bytes[0] & 0x80 != 0,
            low_frequency_mode: bytes[0] & 0x08 != 0,
            mode: ChipMode::from_bits(bytes[0]),
        })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = self.mode as u8;
        if self.long_range_mode {
            value |= 0x80;
        }
        if self.low_frequency_mode {
            value |= 0x08;
        }
        Ok([value])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}
