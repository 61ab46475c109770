//! Driver error type

use embedded_hal::{digital, spi};
use thiserror::Error;

use crate::platform::Resource;

/// Errors reported by the SX127x driver.
///
/// Conditions the radio recovers from on its own (no packet waiting, a
/// packet dropped for a bad CRC, a wait that timed out) are not errors and
/// show up as empty results instead.
#[derive(Debug, Error)]
pub enum Error {
    /// SPI transfer failed
    #[error("SPI bus error: {0:?}")]
    Bus(spi::ErrorKind),
    /// Chip-select, reset or interrupt pin access failed
    #[error("pin error: {0:?}")]
    Pin(digital::ErrorKind),
    /// Register contents could not be decoded
    #[error("failed to decode register value")]
    Deserialization,
    /// A bus or pin could not be opened
    #[error("failed to acquire {resource}: {reason}")]
    ResourceAcquisition {
        /// Resource that failed to open
        resource: Resource,
        /// Platform specific failure description
        reason: String,
    },
    /// The version register does not identify an SX127x
    #[error("unexpected chip version {found:#04x}, expected {expected:#04x}")]
    VersionMismatch {
        /// Version of a genuine SX127x
        expected: u8,
        /// Version read from the chip
        found: u8,
    },
    /// Payload does not fit the 255 byte length register
    #[error("payload of {0} bytes exceeds 255 bytes")]
    PayloadTooLarge(usize),
    /// The radio has not been initialized
    #[error("radio not initialized")]
    NotInitialized,
    /// The background receiver owns the interrupt pin
    #[error("background receiver is active")]
    ReceiverActive,
    /// Transmit done was not signalled within the configured timeout
    #[error("transmission did not complete in time")]
    TxTimeout,
    /// The receiver thread could not be started
    #[error("failed to start receiver thread: {0}")]
    Spawn(String),
}

impl Error {
    pub(crate) fn bus<E: spi::Error>(error: E) -> Self {
        Self::Bus(error.kind())
    }

    pub(crate) fn pin<E: digital::Error>(error: E) -> Self {
        Self::Pin(error.kind())
    }
}
