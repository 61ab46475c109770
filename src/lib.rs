//! SX127x LoRa Radio Driver
//!
//! This crate provides a thread-safe interface for the Semtech SX1276/77/78/79
//! LoRa transceivers (and modules built on them such as the HopeRF RFM95/96/98)
//! attached to a hosted system, typically a Linux single board computer.
//!
//! # Features
//! - Frequency range: 137-1020 MHz (part dependent)
//! - LoRa modulation: SF6-12, BW 7.8-500 kHz, CR 4/5-4/8
//! - Output power: +2 to +17 dBm on PA_BOOST
//! - Explicit and implicit header modes, optional payload CRC
//! - Blocking send, polled or interrupt driven receive
//! - Background reception with a user handler
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Register access layer
//!   - Two byte SPI transactions with a separately driven chip-select
//!   - Typed register read, write and read-modify-write
//!
//! - [`registers`]: Register definitions for direct hardware access
//!
//! - [`radio`]: The [`Sx127x`] driver
//!   - Operating mode and modulation configuration
//!   - Packet send and receive through the FIFO
//!   - Signal metrics of the last packet
//!
//! - [`irq`]: Interrupt pin abstraction with cancellable edge waits
//!
//! - [`platform`]: Acquisition of buses and pins by name
//!
//! # Usage
//! Hardware is accessed through `embedded-hal` 1.0 traits: the bus is a
//! [`SpiBus`](embedded_hal::spi::SpiBus) without hardware chip-select, the
//! chip-select and reset lines are [`OutputPin`](embedded_hal::digital::OutputPin)s
//! and DIO0 is an [`InterruptPin`]. Any `InputPin` can serve as DIO0 through
//! [`PolledInput`].
//!
//! 1. Create an [`Sx127x`] from the resources, or let [`Sx127x::open`] acquire
//!    them from a [`Platform`]
//! 2. Call [`Sx127x::init`] to reset and identify the chip
//! 3. Configure frequency, spreading factor, bandwidth, ...
//! 4. [`Sx127x::send`] packets, or enter receive and collect packets with
//!    [`Sx127x::receive_packet`]
//! 5. Optionally register a handler with [`Sx127x::on_receive`] to be called
//!    from a background thread whenever a packet arrives
//!
//! # Important Notes
//! - Register changes while the background receiver is active are allowed but
//!   may leave the chip out of receive mode; re-register or call
//!   [`Sx127x::receive`] afterwards
//! - Reading a packet while the background receiver is active returns the chip
//!   to continuous receive; [`Sx127x::reset`] and [`Sx127x::init`] stop the
//!   background receiver
//! - Sleeping discards the FIFO contents
//! - All numeric setters clamp out-of-range values instead of failing
//!
//! # Example
//! ```no_run
//! use std::sync::mpsc;
//!
//! use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};
//! use sx127x::{Error, InterruptPin, Sx127x};
//!
//! fn listen<SPI, CS, RST, IRQ, D>(mut radio: Sx127x<SPI, CS, RST, IRQ, D>) -> Result<(), Error>
//! where
//!     SPI: SpiBus + Send + 'static,
//!     CS: OutputPin + Send + 'static,
//!     RST: OutputPin + Send + 'static,
//!     IRQ: InterruptPin + Send + 'static,
//!     D: DelayNs + Send + 'static,
//! {
//!     let (tx, rx) = mpsc::channel();
//!     radio.on_receive(Some(Box::new(move || {
//!         let _ = tx.send(());
//!     })))?;
//!
//!     for () in rx.iter().take(10) {
//!         let packet = radio.receive_packet(255)?;
//!         println!("{} bytes, RSSI {} dBm", packet.len(), radio.rssi()?);
//!     }
//!
//!     radio.on_receive(None)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
mod error;
pub mod irq;
pub mod platform;
pub mod radio;
mod receiver;
pub mod registers;

pub use config::*;
pub use error::Error;
pub use irq::{CancelToken, Edge, EdgeEvent, InterruptPin, PolledInput};
pub use platform::{Platform, Resource};
pub use radio::{Parts, Sx127x};
pub use receiver::Handler;
pub use registers::*;
