//! Radio, pin and driver configuration
//!
//! [`RadioConfig`] is the driver's cached view of the modulation settings. It
//! is only ever changed by the setters on [`Sx127x`](crate::Sx127x), which
//! clamp out-of-range input instead of failing, so a `RadioConfig` read back
//! from the driver always holds the effective values.

use std::time::Duration;

/// Lowest spreading factor supported by the modem.
pub const MIN_SPREADING_FACTOR: u8 = 6;
/// Highest spreading factor supported by the modem.
pub const MAX_SPREADING_FACTOR: u8 = 12;
/// Lowest coding rate denominator (4/5).
pub const MIN_CODING_RATE: u8 = 5;
/// Highest coding rate denominator (4/8).
pub const MAX_CODING_RATE: u8 = 8;
/// Lowest PA_BOOST output level in dBm.
pub const MIN_TX_POWER: u8 = 2;
/// Highest PA_BOOST output level in dBm without the +20 dBm option.
pub const MAX_TX_POWER: u8 = 17;

/// LoRa signal bandwidth
///
/// The modem supports ten discrete bandwidths. [`Bandwidth::from_hz`] picks
/// the narrowest one that is at least as wide as the request.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bandwidth {
    /// 7.8 kHz
    Khz7_8 = 0,
    /// 10.4 kHz
    Khz10_4 = 1,
    /// 15.6 kHz
    Khz15_6 = 2,
    /// 20.8 kHz
    Khz20_8 = 3,
    /// 31.25 kHz
    Khz31_25 = 4,
    /// 41.7 kHz
    Khz41_7 = 5,
    /// 62.5 kHz
    Khz62_5 = 6,
    /// 125 kHz
    Khz125 = 7,
    /// 250 kHz
    Khz250 = 8,
    /// 500 kHz
    Khz500 = 9,
}

impl Bandwidth {
    const ALL: [Bandwidth; 10] = [
        Self::Khz7_8,
        Self::Khz10_4,
        Self::Khz15_6,
        Self::Khz20_8,
        Self::Khz31_25,
        Self::Khz41_7,
        Self::Khz62_5,
        Self::Khz125,
        Self::Khz250,
        Self::Khz500,
    ];

    /// Maps a requested bandwidth in Hz to a supported bandwidth.
    ///
    /// Anything above 250 kHz selects 500 kHz.
    pub fn from_hz(hz: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|bandwidth| hz <= bandwidth.hz())
            .unwrap_or(Self::Khz500)
    }

    /// Decodes the 4-bit register code; unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Register code in bits 7:4 of `ModemConfig1`.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Nominal bandwidth in Hz.
    pub fn hz(self) -> u32 {
        match self {
            Self::Khz7_8 => 7_800,
            Self::Khz10_4 => 10_400,
            Self::Khz15_6 => 15_600,
            Self::Khz20_8 => 20_800,
            Self::Khz31_25 => 31_250,
            Self::Khz41_7 => 41_700,
            Self::Khz62_5 => 62_500,
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }
}

/// Header mode
///
/// In explicit mode every frame carries its length, coding rate and CRC
/// presence. In implicit mode those are fixed by configuration and every
/// received packet is exactly `size` bytes long.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Header included in each frame
    #[default]
    Explicit,
    /// No header, fixed payload length
    Implicit {
        /// Payload length in bytes
        size: u8,
    },
}

/// Operating modes exposed by the driver
///
/// `Transmit` is only entered from inside [`Sx127x::send`](crate::Sx127x::send).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Lowest power, FIFO contents are lost
    Sleep,
    /// Idle with the oscillator running; registers and FIFO accessible
    Standby,
    /// Sending a packet
    Transmit,
    /// Listening for packets until told otherwise
    ReceiveContinuous,
}

/// LoRa modulation and packet settings
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioConfig {
    /// Carrier frequency in Hz
    pub frequency: u32,
    /// Spreading factor, 6..=12
    pub spreading_factor: u8,
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Coding rate denominator, 5..=8 (4/5 .. 4/8)
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Sync word
    pub sync_word: u8,
    /// Payload CRC generated and checked
    pub crc: bool,
    /// Explicit or implicit header
    pub header_mode: HeaderMode,
    /// PA_BOOST output level in dBm, 2..=17
    pub tx_power: u8,
}

impl Default for RadioConfig {
    /// Chip reset values plus the power level written by `init`.
    fn default() -> Self {
        Self {
            frequency: 434_000_000,
            spreading_factor: 7,
            bandwidth: Bandwidth::Khz125,
            coding_rate: 5,
            preamble_length: 8,
            sync_word: 0x12,
            crc: false,
            header_mode: HeaderMode::Explicit,
            tx_power: MAX_TX_POWER,
        }
    }
}

/// Where the radio is attached
///
/// Defaults match the common Raspberry Pi LoRa hats: SPI0 with software
/// chip-select on GPIO 25, reset on GPIO 17 and DIO0 on GPIO 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinConfig {
    /// SPI device node
    pub bus_device: String,
    /// Chip-select GPIO
    pub cs_pin: u32,
    /// Reset GPIO
    pub reset_pin: u32,
    /// DIO0 interrupt GPIO
    pub irq_pin: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            bus_device: String::from("/dev/spidev0.0"),
            cs_pin: 25,
            reset_pin: 17,
            irq_pin: 4,
        }
    }
}

impl PinConfig {
    /// Overrides the given fields, keeping the others.
    pub fn configure(
        mut self,
        bus_device: Option<&str>,
        cs_pin: Option<u32>,
        reset_pin: Option<u32>,
        irq_pin: Option<u32>,
    ) -> Self {
        if let Some(bus_device) = bus_device {
            self.bus_device = bus_device.to_owned();
        }
        if let Some(cs_pin) = cs_pin {
            self.cs_pin = cs_pin;
        }
        if let Some(reset_pin) = reset_pin {
            self.reset_pin = reset_pin;
        }
        if let Some(irq_pin) = irq_pin {
            self.irq_pin = irq_pin;
        }
        self
    }
}

/// Driver behavior that is not a chip register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Delay between reads of the IRQ flags while waiting for TxDone
    pub tx_poll_interval: Duration,
    /// Give up on a transmission after this long; `None` waits forever
    pub tx_timeout: Option<Duration>,
    /// Carriers below this frequency use the LF band RSSI offset
    pub rssi_band_threshold_hz: u32,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tx_poll_interval: Duration::from_micros(100),
            tx_timeout: None,
            rssi_band_threshold_hz: 868_000_000,
        }
    }
}
