//! Interrupt and DIO mapping registers
//!
//! This module contains registers for interrupt handling:
//! - Interrupt flags, cleared by writing a one to the flag
//! - Interrupt mask, a set bit disables the interrupt
//! - Mapping of interrupt sources onto the DIO0..DIO3 pins
//!
//! With the default mapping (all zero) DIO0 signals RxDone in receive modes
//! and TxDone in transmit mode.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// LoRa interrupt sources, as laid out in the flags and mask registers
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        /// Receive timeout (single receive mode)
        const RX_TIMEOUT = 1 << 7;
        /// Packet reception complete
        const RX_DONE = 1 << 6;
        /// Payload CRC check failed
        const PAYLOAD_CRC_ERROR = 1 << 5;
        /// Valid header received in explicit mode
        const VALID_HEADER = 1 << 4;
        /// Packet transmission complete
        const TX_DONE = 1 << 3;
        /// Channel activity detection finished
        const CAD_DONE = 1 << 2;
        /// Frequency hopping channel change
        const FHSS_CHANGE_CHANNEL = 1 << 1;
        /// Channel activity detected
        const CAD_DETECTED = 1;
    }
}

/// Interrupt flags register (address: 0x12)
///
/// # Important Notes
/// - Flags remain set until explicitly cleared
/// - Writing a one clears the flag, writing back the value just read clears
///   exactly the flags that were seen
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct IrqStatus {
    /// Raised interrupt flags
    pub flags: IrqFlags,
}

/// Interrupt mask register (address: 0x11)
///
/// A set bit disables the corresponding interrupt source.
#[register(0x11u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct IrqMask {
    /// Masked (disabled) interrupt sources
    pub masked: IrqFlags,
}

impl IrqMask {
    /// Only RxDone and PayloadCrcError left enabled (0x9F).
    pub fn receive_only() -> Self {
        Self {
            masked: !(IrqFlags::RX_DONE | IrqFlags::PAYLOAD_CRC_ERROR),
        }
    }
}

/// DIO mapping register 1 (address: 0x40)
///
/// Two bits per pin select which interrupt source drives DIO0..DIO3.
///
/// # DIO0 Mapping (LoRa)
/// - 0b00: RxDone / TxDone
/// - 0b01: RxTimeout
/// - 0b10: CadDone
#[register(0x40u8)]
#[derive(Debug, Clone, Copy, Default, ReadableRegister, WritableRegister)]
pub struct DioMapping1 {
    /// Bits 7:6
    pub dio0: u8,
    /// Bits 5:4
    pub dio1: u8,
    /// Bits 3:2
    pub dio2: u8,
    /// Bits 1:0
    pub dio3: u8,
}

impl FromByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: IrqFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl FromByteArray for IrqMask {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            masked: IrqFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqMask {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.masked.bits()])
    }
}

impl FromByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            dio0: bytes[0] >> 6,
            dio1: (bytes[0] >> 4) & 0x03,
            dio2: (bytes[0] >> 2) & 0x03,
            dio3: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.dio0 & 0x03) << 6)
            | ((self.dio1 & 0x03) << 4)
            | ((self.dio2 & 0x03) << 2)
            | (self.dio3 & 0x03)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_only_mask_is_0x9f() {
        assert_eq!(IrqMask::receive_only().to_bytes().unwrap(), [0x9F]);
    }

    #[test]
    fn unknown_flag_bits_are_retained() {
        let status = IrqStatus::from_bytes([0xFF]).unwrap();
        assert_eq!(status.to_bytes().unwrap(), [0xFF]);
        assert!(status.flags.contains(IrqFlags::RX_DONE | IrqFlags::TX_DONE));
    }
}
