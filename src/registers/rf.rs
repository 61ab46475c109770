//! RF-related registers
//!
//! This module contains registers related to the RF front end:
//! - Carrier frequency synthesis
//! - Power amplifier selection and output level
//! - Low noise amplifier gain and boost

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Crystal oscillator frequency in Hz.
pub const OSCILLATOR_FREQUENCY: u64 = 32_000_000;

/// Carrier frequency register (addresses: 0x06-0x08)
///
/// 24-bit synthesizer word, MSB at 0x06. The carrier frequency is
/// `frf * F_XOSC / 2^19`, a resolution of roughly 61 Hz.
///
/// # Important Notes
/// - The new frequency only takes effect once the LSB (0x08) has been written
/// - Must be written in Sleep or Standby
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct CarrierFrequency {
    /// Synthesizer word, only the low 24 bits are used
    pub frf: u32,
}

impl CarrierFrequency {
    /// Nearest synthesizer word for a frequency in Hz.
    pub fn from_hz(hz: u32) -> Self {
        let scaled = u64::from(hz) << 19;
        let frf = (scaled + OSCILLATOR_FREQUENCY / 2) / OSCILLATOR_FREQUENCY;
        Self {
            frf: (frf as u32) & 0x00FF_FFFF,
        }
    }

    /// Frequency in Hz the synthesizer word produces.
    pub fn hz(self) -> u32 {
        ((u64::from(self.frf) * OSCILLATOR_FREQUENCY) >> 19) as u32
    }
}

/// PA configuration register (address: 0x09)
///
/// Selects the output pin of the power amplifier and its level.
///
/// # Output Power
/// - RFO pin: `Pout = Pmax - (15 - output_power)`, `Pmax = 10.8 + 0.6 * max_power`
/// - PA_BOOST pin: `Pout = 17 - (15 - output_power)`
///
/// RFM9x style modules only route PA_BOOST to the antenna, so this driver
/// always selects it.
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PaConfig {
    /// Bit 7: route output through PA_BOOST instead of RFO
    pub pa_boost: bool,
    /// Bits 6:4: maximum power selection for the RFO pin
    pub max_power: u8,
    /// Bits 3:0: output power level
    pub output_power: u8,
}

impl Default for PaConfig {
    fn default() -> Self {
        Self {
            pa_boost: false,
            max_power: 0x4,
            output_power: 0xF,
        }
    }
}

/// LNA settings register (address: 0x0C)
///
/// # Important Notes
/// - `boost_hf` = 0b11 enables the 150% LNA current boost in the HF band,
///   which the driver turns on during initialization
/// - Gain is only honored when the AGC is off (see [`ModemConfig3`](crate::ModemConfig3))
#[register(0x0Cu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct Lna {
    /// Bits 7:5: LNA gain, 1 = maximum gain
    pub gain: u8,
    /// Bits 4:3: low-frequency band LNA current adjustment
    pub boost_lf: u8,
    /// Bit 2: reserved, written back as read
    pub reserved: bool,
    /// Bits 1:0: high-frequency band LNA current adjustment
    pub boost_hf: u8,
}

impl Default for Lna {
    fn default() -> Self {
        Self {
            gain: 0x1,
            boost_lf: 0x0,
            reserved: false,
            boost_hf: 0x0,
        }
    }
}

impl FromByteArray for CarrierFrequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            frf: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

impl ToByteArray for CarrierFrequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let [_, msb, mid, lsb] = self.frf.to_be_bytes();
        Ok([msb, mid, lsb])
    }
}

impl FromByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            pa_boost: bytes[0] & 0x80 != 0,
            max_power: (bytes[0] >> 4) & 0x07,
            output_power: bytes[0] & 0x0F,
        })
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let boost = if self.pa_boost { 0x80 } else { 0x00 };
        Ok([boost | ((self.max_power & 0x07) << 4) | (self.output_power & 0x0F)])
    }
}

impl FromByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            gain: bytes[0] >> 5,
            boost_lf: (bytes[0] >> 3) & 0x03,
            reserved: bytes[0] & 0x04 != 0,
            boost_hf: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let reserved = if self.reserved { 0x04 } else { 0x00 };
        Ok([((self.gain & 0x07) << 5)
            | ((self.boost_lf & 0x03) << 3)
            | reserved
            | (self.boost_hf & 0x03)])
    }
}
