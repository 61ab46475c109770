//! Packet handling related registers
//!
//! This module contains registers for framing and buffering packets:
//! - FIFO pointers (shared 256 byte buffer for transmit and receive)
//! - Payload and preamble length
//! - Sync word
//! - Metrics of the last received packet
//!
//! The FIFO itself is not a register struct: it is accessed one byte per
//! transaction through [`FIFO_ADDRESS`], each access advancing
//! [`FifoAddrPtr`] by one.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Address of the FIFO data register.
pub const FIFO_ADDRESS: u8 = 0x00;

/// FIFO SPI pointer register (address: 0x0D)
///
/// Position in the FIFO of the next FIFO register access.
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, Default, ReadableRegister, WritableRegister)]
pub struct FifoAddrPtr {
    /// FIFO offset
    pub address: u8,
}

/// FIFO transmit base address register (address: 0x0E)
///
/// Where a transmitted payload starts. The driver uses the whole FIFO for
/// either direction and sets both base addresses to zero.
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, Default, ReadableRegister, WritableRegister)]
pub struct FifoTxBaseAddr {
    /// FIFO offset
    pub address: u8,
}

/// FIFO receive base address register (address: 0x0F)
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, Default, ReadableRegister, WritableRegister)]
pub struct FifoRxBaseAddr {
    /// FIFO offset
    pub address: u8,
}

/// Start address of the last received packet (address: 0x10)
///
/// Read-only. Copy this into [`FifoAddrPtr`] before draining a packet.
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct FifoRxCurrentAddr {
    /// FIFO offset
    pub address: u8,
}

/// Number of payload bytes of the last received packet (address: 0x13)
///
/// Read-only. Only meaningful in explicit header mode; in implicit mode the
/// length is the configured [`PayloadLength`].
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct RxNbBytes {
    /// Payload length in bytes
    pub count: u8,
}

/// SNR estimate of the last packet (address: 0x19)
///
/// Read-only. Two's complement, in quarter dB steps.
#[register(0x19u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct PacketSnr {
    /// Raw signed value
    pub raw: i8,
}

impl PacketSnr {
    /// SNR in dB.
    pub fn db(self) -> f32 {
        f32::from(self.raw) * 0.25
    }
}

/// RSSI of the last packet (address: 0x1A)
///
/// Read-only. The value in dBm is `raw - 157` in the HF band and
/// `raw - 164` in the LF band.
#[register(0x1Au8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct PacketRssi {
    /// Raw unsigned value
    pub raw: u8,
}

/// Preamble length register (addresses: 0x20-0x21)
///
/// Number of programmed preamble symbols, MSB first. The modem adds 4.25
/// symbols to this value.
#[register(0x20u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PreambleLength {
    /// Preamble length in symbols
    pub symbols: u16,
}

impl Default for PreambleLength {
    fn default() -> Self {
        Self { symbols: 8 }
    }
}

/// Payload length register (address: 0x22)
///
/// Number of bytes to transmit. In implicit header mode this is also the
/// expected length of every received packet.
#[register(0x22u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PayloadLength {
    /// Payload length in bytes; zero is not allowed
    pub length: u8,
}

impl Default for PayloadLength {
    fn default() -> Self {
        Self { length: 1 }
    }
}

/// LoRa sync word register (address: 0x39)
///
/// Value 0x34 is reserved for LoRaWAN networks.
#[register(0x39u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct SyncWord {
    /// Sync word
    pub value: u8,
}

impl Default for SyncWord {
    fn default() -> Self {
        Self { value: 0x12 }
    }
}

impl FromByteArray for FifoAddrPtr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { address: bytes[0] })
    }
}

impl ToByteArray for FifoAddrPtr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.address])
    }
}

impl FromByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { address: bytes[0] })
    }
}

impl ToByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.address])
    }
}

impl FromByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { address: bytes[0] })
    }
}

impl ToByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.address])
    }
}

impl FromByteArray for FifoRxCurrentAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { address: bytes[0] })
    }
}

impl FromByteArray for RxNbBytes {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { count: bytes[0] })
    }
}

impl FromByteArray for PacketSnr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            raw: i8::from_be_bytes(bytes),
        })
    }
}

impl FromByteArray for PacketRssi {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}

impl FromByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            symbols: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.symbols.to_be_bytes())
    }
}

impl FromByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { length: bytes[0] })
    }
}

impl ToByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.length])
    }
}

impl FromByteArray for SyncWord {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for SyncWord {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}
