//! LoRa modem configuration registers
//!
//! This module contains the registers that define the LoRa modulation:
//! - Bandwidth, coding rate and header mode ([`ModemConfig1`])
//! - Spreading factor and payload CRC ([`ModemConfig2`])
//! - Low data rate optimization and AGC ([`ModemConfig3`])
//! - Detection tuning required when switching to and from SF6
//!
//! Bandwidth and coding rate share one register, so both are always updated
//! with a read-modify-write that only touches their own bit range.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Modem configuration register 1 (address: 0x1D)
///
/// # Bit Layout
/// - Bits 7:4: signal bandwidth code (0 = 7.8 kHz .. 9 = 500 kHz)
/// - Bits 3:1: coding rate code (1 = 4/5 .. 4 = 4/8)
/// - Bit 0: implicit header mode
///
/// # Important Notes
/// - In implicit header mode the payload length, coding rate and CRC
///   presence must be configured identically on both ends
/// - Spreading factor 6 only works with implicit header mode
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct ModemConfig1 {
    /// Signal bandwidth code
    pub bandwidth: u8,
    /// Error coding rate code, denominator minus four
    pub coding_rate: u8,
    /// Implicit (headerless) mode enabled
    pub implicit_header: bool,
}

impl Default for ModemConfig1 {
    fn default() -> Self {
        Self {
            bandwidth: 0x7,
            coding_rate: 0x1,
            implicit_header: false,
        }
    }
}

/// Modem configuration register 2 (address: 0x1E)
///
/// # Bit Layout
/// - Bits 7:4: spreading factor (6..12)
/// - Bit 3: continuous transmit mode
/// - Bit 2: payload CRC generation and check
/// - Bits 1:0: RX single-mode timeout MSB
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct ModemConfig2 {
    /// Spreading factor as log2 of chips per symbol
    pub spreading_factor: u8,
    /// Send the FIFO content repeatedly
    pub tx_continuous: bool,
    /// Append a payload CRC on transmit and check it on receive
    pub rx_payload_crc: bool,
    /// Upper two bits of the RX symbol timeout
    pub symbol_timeout_msb: u8,
}

impl Default for ModemConfig2 {
    fn default() -> Self {
        Self {
            spreading_factor: 7,
            tx_continuous: false,
            rx_payload_crc: false,
            symbol_timeout_msb: 0,
        }
    }
}

/// Modem configuration register 3 (address: 0x26)
///
/// # Important Notes
/// - Low data rate optimization is mandatory when the symbol length exceeds 16 ms
/// - With `agc_auto_on` the LNA gain is set by the internal AGC loop
#[register(0x26u8)]
#[derive(Debug, Clone, Copy, Default, ReadableRegister, WritableRegister)]
pub struct ModemConfig3 {
    /// Bit 3: low data rate optimization
    pub low_data_rate_optimize: bool,
    /// Bit 2: LNA gain set by the AGC loop
    pub agc_auto_on: bool,
}

/// LoRa detection optimize register (address: 0x31)
///
/// Written with a fixed tuning value depending on whether spreading factor 6
/// is in use. Upper bits are reserved and are part of the tuning value.
#[register(0x31u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct DetectionOptimize {
    /// Raw register value
    pub value: u8,
}

impl DetectionOptimize {
    /// Tuning for spreading factor 6
    pub const SF6: Self = Self { value: 0xC5 };
    /// Tuning for spreading factors 7 to 12
    pub const SF7_TO_SF12: Self = Self { value: 0xC3 };
}

/// LoRa detection threshold register (address: 0x37)
///
/// Companion of [`DetectionOptimize`], switched together with it.
#[register(0x37u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct DetectionThreshold {
    /// Raw register value
    pub value: u8,
}

impl DetectionThreshold {
    /// Threshold for spreading factor 6
    pub const SF6: Self = Self { value: 0x0C };
    /// Threshold for spreading factors 7 to 12
    pub const SF7_TO_SF12: Self = Self { value: 0x0A };
}

impl FromByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            bandwidth: bytes[0] >> 4,
            coding_rate: (bytes[0] >> 1) & 0x07,
            implicit_header: bytes[0] & 0x01 != 0,
        })
    }
}

impl ToByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let implicit = if self.implicit_header { 0x01 } else { 0x00 };
        Ok([((self.bandwidth & 0x0F) << 4) | ((self.coding_rate & 0x07) << 1) | implicit])
    }
}

impl FromByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            spreading_factor: bytes[0] >> 4,
            tx_continuous: bytes[0] & 0x08 != 0,
            rx_payload_crc: bytes[0] & 0x04 != 0,
            symbol_timeout_msb: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = (self.spreading_factor & 0x0F) << 4;
        if self.tx_continuous {
            value |= 0x08;
        }
        if self.rx_payload_crc {
            value |= 0x04;
        }
        Ok([value | (self.symbol_timeout_msb & 0x03)])
    }
}

impl FromByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            low_data_rate_optimize: bytes[0] & 0x08 != 0,
            agc_auto_on: bytes[0] & 0x04 != 0,
        })
    }
}

impl ToByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = 0x00;
        if self.low_data_rate_optimize {
            value |= 0x08;
        }
        if self.agc_auto_on {
            value |= 0x04;
        }
        Ok([value])
    }
}

impl FromByteArray for DetectionOptimize {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for DetectionOptimize {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for DetectionThreshold {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for DetectionThreshold {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}
