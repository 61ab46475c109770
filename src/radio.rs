//! SX127x LoRa radio
//!
//! [`Sx127x`] owns the four hardware resources of a radio (SPI bus,
//! chip-select, reset and DIO0 interrupt pins) together with a delay provider,
//! and exposes the LoRa modem as a small state machine:
//!
//! - Configuration setters translate modulation parameters into register
//!   writes and keep a cached [`RadioConfig`] with the effective values
//! - Mode changes are explicit register writes ([`Sx127x::idle`],
//!   [`Sx127x::sleep`], [`Sx127x::receive`]); transmit is only entered by
//!   [`Sx127x::send`]
//! - Packets are framed into and drained out of the FIFO
//! - A background receiver can call a handler for every received packet
//!
//! # Locking
//! The bus, chip-select, reset pin, delay and cached configuration live behind
//! one mutex. Every public operation takes it once, so a read-modify-write or
//! a whole FIFO transfer is never interleaved with another transaction, even
//! when the background receiver is running. The interrupt pin has a separate
//! lock so that a thread parked on the pin never holds up register access.
//!
//! # Example
//! ```no_run
//! # fn example<SPI, CS, RST, IRQ, D>(spi: SPI, cs: CS, reset: RST, irq: IRQ, delay: D)
//! # -> Result<(), sx127x::Error>
//! # where
//! #     SPI: embedded_hal::spi::SpiBus,
//! #     CS: embedded_hal::digital::OutputPin,
//! #     RST: embedded_hal::digital::OutputPin,
//! #     IRQ: sx127x::InterruptPin,
//! #     D: embedded_hal::delay::DelayNs,
//! # {
//! use sx127x::{HeaderMode, Sx127x};
//!
//! let mut radio = Sx127x::new(spi, cs, reset, irq, delay);
//! radio.init()?;
//! radio.set_frequency(915_000_000)?;
//! radio.set_spreading_factor(9)?;
//! radio.set_header_mode(HeaderMode::Explicit)?;
//!
//! radio.send(b"hello")?;
//!
//! radio.receive()?;
//! let mut buffer = [0u8; 255];
//! let len = radio.receive_into(&mut buffer)?;
//! # let _ = len;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};
use tracing::{debug, info, warn};

use crate::config::{
    Bandwidth, DriverOptions, HeaderMode, OperatingMode, PinConfig, RadioConfig,
    MAX_CODING_RATE, MAX_SPREADING_FACTOR, MAX_TX_POWER, MIN_CODING_RATE, MIN_SPREADING_FACTOR,
    MIN_TX_POWER,
};
use crate::device::Device;
use crate::irq::{CancelToken, Edge, EdgeEvent, InterruptPin};
use crate::platform::{Platform, Resource};
use crate::receiver::{Handler, PacketSource, Receiver};
use crate::registers::{
    CarrierFrequency, ChipMode, DetectionOptimize, DetectionThreshold, DioMapping1,
    FifoAddrPtr, FifoRxBaseAddr, FifoRxCurrentAddr, FifoTxBaseAddr, IrqFlags, IrqMask, IrqStatus,
    Lna, ModemConfig1, ModemConfig2, ModemConfig3, OpMode, PaConfig, PacketRssi, PacketSnr,
    PayloadLength, PreambleLength, RxNbBytes, SyncWord, Version, EXPECTED_VERSION,
};
use crate::Error;

/// RSSI offset below the band threshold (LF port).
const RSSI_OFFSET_LF: i16 = 164;
/// RSSI offset at or above the band threshold (HF port).
const RSSI_OFFSET_HF: i16 = 157;

/// Last register dumped by [`Sx127x::dump_registers`].
const LAST_DUMPED_REGISTER: u8 = 0x25;

/// Resources handed back by [`Sx127x::close`].
pub struct Parts<SPI, CS, RST, IRQ, D> {
    /// SPI bus
    pub spi: SPI,
    /// Chip-select pin
    pub cs: CS,
    /// Reset pin
    pub reset: RST,
    /// DIO0 interrupt pin
    pub irq: IRQ,
    /// Delay provider
    pub delay: D,
}

/// State guarded by the register lock.
struct Chip<SPI, CS, RST, D> {
    device: Device<SPI, CS>,
    reset: RST,
    delay: D,
    config: RadioConfig,
    mode: OperatingMode,
    initialized: bool,
}

struct Shared<SPI, CS, RST, IRQ, D> {
    chip: Mutex<Chip<SPI, CS, RST, D>>,
    irq: Mutex<IRQ>,
    options: DriverOptions,
}

/// Driver for one SX127x radio.
pub struct Sx127x<SPI, CS, RST, IRQ, D> {
    shared: Arc<Shared<SPI, CS, RST, IRQ, D>>,
    receiver: Receiver,
}

impl<SPI, CS, RST, IRQ, D> Sx127x<SPI, CS, RST, IRQ, D> {
    /// Creates an uninitialized radio with default [`DriverOptions`].
    ///
    /// Call [`init`](Self::init) before anything else.
    pub fn new(spi: SPI, cs: CS, reset: RST, irq: IRQ, delay: D) -> Self {
        Self::with_options(spi, cs, reset, irq, delay, DriverOptions::default())
    }

    /// Creates an uninitialized radio.
    pub fn with_options(
        spi: SPI,
        cs: CS,
        reset: RST,
        irq: IRQ,
        delay: D,
        options: DriverOptions,
    ) -> Self {
        let chip = Chip {
            device: Device::new(spi, cs),
            reset,
            delay,
            config: RadioConfig::default(),
            mode: OperatingMode::Standby,
            initialized: false,
        };

        Self {
            shared: Arc::new(Shared {
                chip: Mutex::new(chip),
                irq: Mutex::new(irq),
                options,
            }),
            receiver: Receiver::new(),
        }
    }

    /// Driver options in effect.
    pub fn options(&self) -> DriverOptions {
        self.shared.options
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.shared.chip().initialized
    }

    /// Whether a background receiver is running.
    pub fn is_receiving_in_background(&self) -> bool {
        self.receiver.is_active()
    }

    /// Snapshot of the effective configuration.
    pub fn config(&self) -> Result<RadioConfig, Error> {
        Ok(self.shared.session()?.config)
    }

    /// Last mode commanded by the driver.
    pub fn mode(&self) -> Result<OperatingMode, Error> {
        Ok(self.shared.session()?.mode)
    }
}

impl<SPI, OUT, IRQ, D> Sx127x<SPI, OUT, OUT, IRQ, D>
where
    SPI: SpiBus,
    OUT: OutputPin,
    IRQ: InterruptPin,
    D: DelayNs,
{
    /// Acquires the radio's resources from `platform` and initializes it.
    ///
    /// Resources are opened in the order bus, chip-select, reset, interrupt.
    /// On any failure everything acquired so far is released again.
    ///
    /// # Errors
    /// * `Error::ResourceAcquisition` - a bus or pin could not be opened
    /// * `Error::VersionMismatch` - no SX127x answered
    pub fn open<P>(
        platform: &mut P,
        pins: &PinConfig,
        options: DriverOptions,
    ) -> Result<Self, Error>
    where
        P: Platform<Bus = SPI, Output = OUT, Interrupt = IRQ, Delay = D>,
    {
        fn acquisition<E: core::fmt::Debug>(resource: Resource) -> impl FnOnce(E) -> Error {
            move |e| Error::ResourceAcquisition {
                resource,
                reason: format!("{e:?}"),
            }
        }

        let spi = platform
            .open_bus(&pins.bus_device)
            .map_err(acquisition(Resource::Bus))?;
        let cs = platform
            .open_output(pins.cs_pin)
            .map_err(acquisition(Resource::ChipSelect))?;
        let reset = platform
            .open_output(pins.reset_pin)
            .map_err(acquisition(Resource::Reset))?;
        let irq = platform
            .open_interrupt(pins.irq_pin)
            .map_err(acquisition(Resource::Interrupt))?;

        let mut radio = Self::with_options(spi, cs, reset, irq, platform.delay(), options);
        radio.init()?;

        info!(
            "SX127x ready on {} (cs {}, reset {}, irq {})",
            pins.bus_device, pins.cs_pin, pins.reset_pin, pins.irq_pin
        );
        Ok(radio)
    }
}

impl<SPI, CS, RST, IRQ, D> Sx127x<SPI, CS, RST, IRQ, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    IRQ: InterruptPin,
    D: DelayNs,
{
    /// Resets and identifies the chip, then applies the default LoRa setup.
    ///
    /// Default setup: LoRa modem, both FIFO base addresses at 0, LNA boost,
    /// AGC on, PA_BOOST at 17 dBm, Standby. The cached configuration is reset
    /// to [`RadioConfig::default`]. A running background receiver is stopped
    /// first.
    ///
    /// # Errors
    /// * `Error::VersionMismatch` - the version register does not read 0x12;
    ///   the radio stays uninitialized
    pub fn init(&mut self) -> Result<(), Error> {
        self.receiver.unsubscribe();
        let mut chip = self.shared.chip();
        chip.initialized = false;
        chip.hardware_reset()?;

        let version = chip.device.read_register::<Version>()?.value;
        debug!("SX127x version: {:#04x}", version);
        if version != EXPECTED_VERSION {
            return Err(Error::VersionMismatch {
                expected: EXPECTED_VERSION,
                found: version,
            });
        }

        chip.set_mode(OperatingMode::Sleep)?;
        chip.device.write_register(FifoRxBaseAddr::default())?;
        chip.device.write_register(FifoTxBaseAddr::default())?;
        chip.device.modify_register(|lna: &mut Lna| lna.boost_hf = 0x03)?;
        chip.device.write_register(ModemConfig3 {
            low_data_rate_optimize: false,
            agc_auto_on: true,
        })?;

        chip.config = RadioConfig::default();
        chip.set_tx_power(MAX_TX_POWER)?;
        chip.set_mode(OperatingMode::Standby)?;
        chip.initialized = true;

        info!("SX127x initialized");
        Ok(())
    }

    /// Pulses the reset line.
    ///
    /// The chip comes back with power-on defaults, so the radio is left
    /// uninitialized; call [`init`](Self::init) afterwards. A running
    /// background receiver is stopped first.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.receiver.unsubscribe();
        let mut chip = self.shared.chip();
        chip.initialized = false;
        chip.hardware_reset()
    }

    /// Reads the silicon version register.
    pub fn version(&self) -> Result<u8, Error> {
        Ok(self.shared.session()?.device.read_register::<Version>()?.value)
    }

    /// Reads registers 0x01 to 0x25 as `(address, value)` pairs.
    ///
    /// The FIFO register is skipped since reading it moves the FIFO pointer.
    pub fn dump_registers(&self) -> Result<Vec<(u8, u8)>, Error> {
        let mut chip = self.shared.session()?;
        (0x01..=LAST_DUMPED_REGISTER)
            .map(|address| Ok((address, chip.device.read(address)?)))
            .collect()
    }

    /// Enters Standby. Registers and the FIFO can be accessed.
    pub fn idle(&mut self) -> Result<(), Error> {
        self.shared.session()?.set_mode(OperatingMode::Standby)
    }

    /// Enters Sleep. The FIFO contents are lost.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.shared.session()?.set_mode(OperatingMode::Sleep)
    }

    /// Enters continuous receive.
    pub fn receive(&mut self) -> Result<(), Error> {
        self.shared.session()?.set_mode(OperatingMode::ReceiveContinuous)
    }

    /// Selects explicit or implicit header mode.
    ///
    /// In implicit mode `size` is also the length of every received packet.
    pub fn set_header_mode(&mut self, mode: HeaderMode) -> Result<(), Error> {
        self.shared.session()?.set_header_mode(mode)
    }

    /// Sets the PA_BOOST output level, clamped to 2..=17 dBm.
    pub fn set_tx_power(&mut self, level: u8) -> Result<(), Error> {
        self.shared.session()?.set_tx_power(level)
    }

    /// Sets the carrier frequency in Hz.
    pub fn set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        self.shared.session()?.set_frequency(hz)
    }

    /// Sets the spreading factor, clamped to 6..=12.
    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Error> {
        self.shared.session()?.set_spreading_factor(sf)
    }

    /// Sets the bandwidth to the narrowest supported value of at least `hz`.
    pub fn set_bandwidth(&mut self, hz: u32) -> Result<(), Error> {
        self.shared.session()?.set_bandwidth(Bandwidth::from_hz(hz))
    }

    /// Sets the coding rate 4/`denominator`, clamped to 5..=8.
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Error> {
        self.shared.session()?.set_coding_rate(denominator)
    }

    /// Sets the preamble length in symbols.
    pub fn set_preamble_length(&mut self, symbols: u16) -> Result<(), Error> {
        self.shared.session()?.set_preamble_length(symbols)
    }

    /// Sets the sync word.
    pub fn set_sync_word(&mut self, word: u8) -> Result<(), Error> {
        self.shared.session()?.set_sync_word(word)
    }

    /// Enables or disables the payload CRC.
    pub fn set_crc(&mut self, enabled: bool) -> Result<(), Error> {
        self.shared.session()?.set_crc(enabled)
    }

    /// Applies every field of `config` in one locked section.
    pub fn apply_config(&mut self, config: &RadioConfig) -> Result<(), Error> {
        let mut chip = self.shared.session()?;
        chip.set_frequency(config.frequency)?;
        chip.set_spreading_factor(config.spreading_factor)?;
        chip.set_bandwidth(config.bandwidth)?;
        chip.set_coding_rate(config.coding_rate)?;
        chip.set_preamble_length(config.preamble_length)?;
        chip.set_sync_word(config.sync_word)?;
        chip.set_crc(config.crc)?;
        chip.set_header_mode(config.header_mode)?;
        chip.set_tx_power(config.tx_power)
    }

    /// Transmits `payload` and blocks until the chip reports TxDone.
    ///
    /// The register lock is held for the whole transmission. The wait is
    /// unbounded unless [`DriverOptions::tx_timeout`] is set.
    ///
    /// # Errors
    /// * `Error::PayloadTooLarge` - more than 255 bytes
    /// * `Error::TxTimeout` - TxDone not seen within the configured timeout
    pub fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        let length =
            u8::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge(payload.len()))?;
        let options = self.shared.options;
        let mut chip = self.shared.session()?;

        chip.set_mode(OperatingMode::Standby)?;
        chip.device.write_register(FifoAddrPtr { address: 0 })?;
        chip.device.write_fifo(payload)?;
        chip.device.write_register(PayloadLength { length })?;

        chip.set_mode(OperatingMode::Transmit)?;
        chip.wait_for_tx_done(&options)?;
        chip.device.write_register(IrqStatus {
            flags: IrqFlags::TX_DONE,
        })?;
        // the modem drops back to standby by itself after TxDone
        chip.mode = OperatingMode::Standby;

        // reception in implicit mode relies on the fixed length
        if let HeaderMode::Implicit { size } = chip.config.header_mode {
            if size != length {
                chip.device.write_register(PayloadLength { length: size })?;
            }
        }

        debug!("sent {} bytes", length);
        Ok(())
    }

    /// Whether a received packet is waiting. Leaves the flags untouched.
    pub fn packet_available(&self) -> Result<bool, Error> {
        let status = self.shared.session()?.device.read_register::<IrqStatus>()?;
        Ok(status.flags.contains(IrqFlags::RX_DONE))
    }

    /// Copies the last received packet into `buffer`.
    ///
    /// Returns the number of bytes copied: zero when no packet is waiting or
    /// the packet failed its CRC, and at most `buffer.len()` when the packet is
    /// larger than the buffer. All raised interrupt flags are cleared.
    ///
    /// The chip is left in Standby, or back in continuous receive while the
    /// background receiver is waiting for the next packet.
    pub fn receive_into(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
        let flags = {
            let mut chip = self.shared.session()?;
            let status = chip.device.read_register::<IrqStatus>()?;
            chip.device.write_register(status)?;
            status.flags
        };

        if !flags.contains(IrqFlags::RX_DONE) {
            return Ok(0);
        }
        if flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
            warn!("discarding packet with bad CRC");
            return Ok(0);
        }

        let mut chip = self.shared.session()?;
        chip.set_mode(OperatingMode::Standby)?;

        let length = match chip.config.header_mode {
            HeaderMode::Implicit { size } => size,
            HeaderMode::Explicit => chip.device.read_register::<RxNbBytes>()?.count,
        };
        let start = chip.device.read_register::<FifoRxCurrentAddr>()?.address;
        chip.device.write_register(FifoAddrPtr { address: start })?;

        let length = usize::from(length).min(buffer.len());
        chip.device.read_fifo(&mut buffer[..length])?;

        if self.receiver.is_active() {
            chip.set_mode(OperatingMode::ReceiveContinuous)?;
        }

        debug!("received {} bytes", length);
        Ok(length)
    }

    /// Returns the last received packet, truncated to `max_len` bytes.
    ///
    /// Empty when no packet is waiting or the packet failed its CRC.
    pub fn receive_packet(&mut self, max_len: usize) -> Result<Vec<u8>, Error> {
        let mut packet = vec![0u8; max_len];
        let length = self.receive_into(&mut packet)?;
        packet.truncate(length);
        Ok(packet)
    }

    /// RSSI of the last packet in dBm.
    pub fn rssi(&self) -> Result<i16, Error> {
        let threshold = self.shared.options.rssi_band_threshold_hz;
        let mut chip = self.shared.session()?;
        let raw = i16::from(chip.device.read_register::<PacketRssi>()?.raw);
        let offset = if chip.config.frequency < threshold {
            RSSI_OFFSET_LF
        } else {
            RSSI_OFFSET_HF
        };
        Ok(raw - offset)
    }

    /// SNR of the last packet in dB.
    pub fn snr(&self) -> Result<f32, Error> {
        let snr = self.shared.session()?.device.read_register::<PacketSnr>()?;
        Ok(snr.db())
    }

    /// Arms continuous receive with RxDone routed to DIO0 and blocks until
    /// DIO0 rises or `timeout` elapses. `None` waits indefinitely.
    ///
    /// # Errors
    /// * `Error::ReceiverActive` - a background receiver owns the interrupt pin
    /// * `Error::Pin` - the edge wait failed
    pub fn wait_for_packet(&mut self, timeout: Option<Duration>) -> Result<EdgeEvent, Error> {
        if self.receiver.is_active() {
            return Err(Error::ReceiverActive);
        }
        self.shared.wait_for_rx_done(timeout, &CancelToken::new())
    }

    /// Stops the background receiver, puts the chip to sleep and hands back
    /// the hardware resources.
    ///
    /// The receiver is stopped even when the sleep command fails.
    pub fn close(mut self) -> Result<Parts<SPI, CS, RST, IRQ, D>, Error> {
        self.receiver.unsubscribe();

        {
            let mut chip = self.shared.chip();
            if chip.initialized {
                chip.set_mode(OperatingMode::Sleep)?;
                chip.initialized = false;
            }
        }

        let Self { shared, receiver } = self;
        drop(receiver);

        let shared = Arc::try_unwrap(shared).map_err(|_| Error::ReceiverActive)?;
        let chip = shared
            .chip
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let irq = shared.irq.into_inner().unwrap_or_else(PoisonError::into_inner);
        let (spi, cs) = chip.device.release();

        info!("SX127x closed");

        Ok(Parts {
            spi,
            cs,
            reset: chip.reset,
            irq,
            delay: chip.delay,
        })
    }
}

impl<SPI, CS, RST, IRQ, D> Sx127x<SPI, CS, RST, IRQ, D>
where
    SPI: SpiBus + Send + 'static,
    CS: OutputPin + Send + 'static,
    RST: OutputPin + Send + 'static,
    IRQ: InterruptPin + Send + 'static,
    D: DelayNs + Send + 'static,
{
    /// Registers or removes the packet handler.
    ///
    /// `Some` starts the background receiver, or swaps the handler of the
    /// running one. `None` stops the receiver and returns only once its
    /// thread has exited; no handler call happens after that.
    ///
    /// The handler runs on the receiver thread and is not passed the packet.
    pub fn on_receive(&mut self, handler: Option<Handler>) -> Result<(), Error> {
        match handler {
            Some(handler) => {
                self.shared.session()?;
                let source: Arc<dyn PacketSource> = self.shared.clone();
                self.receiver.subscribe(source, handler)
            }
            None => {
                self.receiver.unsubscribe();
                Ok(())
            }
        }
    }
}

impl<SPI, CS, RST, IRQ, D> Shared<SPI, CS, RST, IRQ, D> {
    fn chip(&self) -> MutexGuard<'_, Chip<SPI, CS, RST, D>> {
        self.chip.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the registers of an initialized radio.
    fn session(&self) -> Result<MutexGuard<'_, Chip<SPI, CS, RST, D>>, Error> {
        let chip = self.chip();
        if chip.initialized {
            Ok(chip)
        } else {
            Err(Error::NotInitialized)
        }
    }
}

impl<SPI, CS, RST, IRQ, D> Shared<SPI, CS, RST, IRQ, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    IRQ: InterruptPin,
    D: DelayNs,
{
    fn wait_for_rx_done(
        &self,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<EdgeEvent, Error> {
        {
            let mut chip = self.session()?;
            chip.set_mode(OperatingMode::Standby)?;
            chip.device.write_register(IrqMask::receive_only())?;
            chip.device.write_register(DioMapping1::default())?;
            chip.set_mode(OperatingMode::ReceiveContinuous)?;
        }

        let mut irq = self.irq.lock().unwrap_or_else(PoisonError::into_inner);
        irq.wait_for_edge(Edge::Rising, timeout, cancel)
            .map_err(Error::pin)
    }
}

impl<SPI, CS, RST, IRQ, D> PacketSource for Shared<SPI, CS, RST, IRQ, D>
where
    SPI: SpiBus + Send + 'static,
    CS: OutputPin + Send + 'static,
    RST: OutputPin + Send + 'static,
    IRQ: InterruptPin + Send + 'static,
    D: DelayNs + Send + 'static,
{
    fn wait_for_packet(
        &self,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<EdgeEvent, Error> {
        self.wait_for_rx_done(timeout, cancel)
    }
}

impl<SPI, CS, RST, D> Chip<SPI, CS, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    fn hardware_reset(&mut self) -> Result<(), Error> {
        self.device.deselect()?;
        self.reset.set_low().map_err(Error::pin)?;
        self.delay.delay_us(300);
        self.reset.set_high().map_err(Error::pin)?;
        self.delay.delay_ms(10);
        Ok(())
    }

    fn set_mode(&mut self, mode: OperatingMode) -> Result<(), Error> {
        let chip_mode = match mode {
            OperatingMode::Sleep => ChipMode::Sleep,
            OperatingMode::Standby => ChipMode::Standby,
            OperatingMode::Transmit => ChipMode::Transmit,
            OperatingMode::ReceiveContinuous => ChipMode::ReceiveContinuous,
        };
        self.device.write_register(OpMode::lora(chip_mode))?;
        if self.mode != mode {
            debug!("mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        Ok(())
    }

    fn set_header_mode(&mut self, mode: HeaderMode) -> Result<(), Error> {
        let implicit = matches!(mode, HeaderMode::Implicit { .. });
        self.device
            .modify_register(|config: &mut ModemConfig1| config.implicit_header = implicit)?;
        if let HeaderMode::Implicit { size } = mode {
            self.device.write_register(PayloadLength { length: size })?;
        }
        self.config.header_mode = mode;
        debug!("header mode {:?}", mode);
        Ok(())
    }

    fn set_tx_power(&mut self, level: u8) -> Result<(), Error> {
        let level = level.clamp(MIN_TX_POWER, MAX_TX_POWER);
        self.device.write_register(PaConfig {
            pa_boost: true,
            max_power: 0,
            output_power: level - MIN_TX_POWER,
        })?;
        self.config.tx_power = level;
        debug!("tx power {} dBm", level);
        Ok(())
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        self.device.write_register(CarrierFrequency::from_hz(hz))?;
        self.config.frequency = hz;
        debug!("frequency {} Hz", hz);
        Ok(())
    }

    fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Error> {
        let sf = sf.clamp(MIN_SPREADING_FACTOR, MAX_SPREADING_FACTOR);
        if sf == MIN_SPREADING_FACTOR {
            self.device.write_register(DetectionOptimize::SF6)?;
            self.device.write_register(DetectionThreshold::SF6)?;
        } else {
            self.device.write_register(DetectionOptimize::SF7_TO_SF12)?;
            self.device.write_register(DetectionThreshold::SF7_TO_SF12)?;
        }
        self.device
            .modify_register(|config: &mut ModemConfig2| config.spreading_factor = sf)?;
        self.config.spreading_factor = sf;
        debug!("spreading factor {}", sf);
        Ok(())
    }

    fn set_bandwidth(&mut self, bandwidth: Bandwidth) -> Result<(), Error> {
        self.device
            .modify_register(|config: &mut ModemConfig1| config.bandwidth = bandwidth.code())?;
        self.config.bandwidth = bandwidth;
        debug!("bandwidth {} Hz", bandwidth.hz());
        Ok(())
    }

    fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Error> {
        let denominator = denominator.clamp(MIN_CODING_RATE, MAX_CODING_RATE);
        self.device.modify_register(|config: &mut ModemConfig1| {
            config.coding_rate = denominator - 4;
        })?;
        self.config.coding_rate = denominator;
        debug!("coding rate 4/{}", denominator);
        Ok(())
    }

    fn set_preamble_length(&mut self, symbols: u16) -> Result<(), Error> {
        self.device.write_register(PreambleLength { symbols })?;
        self.config.preamble_length = symbols;
        Ok(())
    }

    fn set_sync_word(&mut self, word: u8) -> Result<(), Error> {
        self.device.write_register(SyncWord { value: word })?;
        self.config.sync_word = word;
        Ok(())
    }

    fn set_crc(&mut self, enabled: bool) -> Result<(), Error> {
        self.device
            .modify_register(|config: &mut ModemConfig2| config.rx_payload_crc = enabled)?;
        self.config.crc = enabled;
        Ok(())
    }

    fn wait_for_tx_done(&mut self, options: &DriverOptions) -> Result<(), Error> {
        let started = Instant::now();
        let interval = u32::try_from(options.tx_poll_interval.as_nanos()).unwrap_or(u32::MAX);

        loop {
            let status = self.device.read_register::<IrqStatus>()?;
            if status.flags.contains(IrqFlags::TX_DONE) {
                return Ok(());
            }
            if let Some(timeout) = options.tx_timeout {
                if started.elapsed() >= timeout {
                    self.set_mode(OperatingMode::Standby)?;
                    return Err(Error::TxTimeout);
                }
            }
            self.delay.delay_ns(interval);
        }
    }
}
