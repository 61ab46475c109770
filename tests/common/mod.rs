//! Register-file simulator of an SX127x for driver tests.
//!
//! The simulated chip answers two byte register transactions, models the FIFO
//! pointer, write-one-to-clear interrupt flags and TxDone after a configurable
//! number of flag polls. Every completed transaction is logged, and a
//! chip-select assertion while the chip is already selected is counted as an
//! overlap.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::{self, SpiBus};
use sx127x::{
    CancelToken, Edge, EdgeEvent, InterruptPin, Platform, Resource, Sx127x, FIFO_ADDRESS,
};

pub const REG_OP_MODE: u8 = 0x01;
pub const REG_FRF_MSB: u8 = 0x06;
pub const REG_FRF_MID: u8 = 0x07;
pub const REG_FRF_LSB: u8 = 0x08;
pub const REG_PA_CONFIG: u8 = 0x09;
pub const REG_LNA: u8 = 0x0C;
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
pub const REG_IRQ_FLAGS_MASK: u8 = 0x11;
pub const REG_IRQ_FLAGS: u8 = 0x12;
pub const REG_RX_NB_BYTES: u8 = 0x13;
pub const REG_PKT_SNR: u8 = 0x19;
pub const REG_PKT_RSSI: u8 = 0x1A;
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;
pub const REG_PREAMBLE_MSB: u8 = 0x20;
pub const REG_PREAMBLE_LSB: u8 = 0x21;
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
pub const REG_MODEM_CONFIG_3: u8 = 0x26;
pub const REG_DETECTION_OPTIMIZE: u8 = 0x31;
pub const REG_DETECTION_THRESHOLD: u8 = 0x37;
pub const REG_SYNC_WORD: u8 = 0x39;
pub const REG_DIO_MAPPING_1: u8 = 0x40;
pub const REG_VERSION: u8 = 0x42;

pub const IRQ_TX_DONE: u8 = 0x08;
pub const IRQ_CRC_ERROR: u8 = 0x20;
pub const IRQ_RX_DONE: u8 = 0x40;

/// Where simulated packets are placed in the FIFO.
pub const RX_OFFSET: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(u8, u8),
    Write(u8, u8),
}

pub struct ChipState {
    regs: [u8; 0x80],
    fifo: [u8; 256],
    selected: bool,
    pub overlaps: usize,
    pub log: Vec<Access>,
    /// Flag reads between entering transmit and TxDone.
    pub tx_polls: usize,
    pending_tx: Option<usize>,
    pub reset_pulses: usize,
    pub released: usize,
}

impl ChipState {
    fn new() -> Self {
        let mut state = Self {
            regs: [0; 0x80],
            fifo: [0; 256],
            selected: false,
            overlaps: 0,
            log: Vec::new(),
            tx_polls: 3,
            pending_tx: None,
            reset_pulses: 0,
            released: 0,
        };
        state.power_on();
        state
    }

    fn power_on(&mut self) {
        let version = self.regs[REG_VERSION as usize];
        self.regs = [0; 0x80];
        self.regs[REG_OP_MODE as usize] = 0x09;
        self.regs[REG_FRF_MSB as usize] = 0x6C;
        self.regs[REG_FRF_MID as usize] = 0x80;
        self.regs[REG_PA_CONFIG as usize] = 0x4F;
        self.regs[REG_LNA as usize] = 0x20;
        self.regs[REG_MODEM_CONFIG_1 as usize] = 0x72;
        self.regs[REG_MODEM_CONFIG_2 as usize] = 0x70;
        self.regs[REG_PREAMBLE_LSB as usize] = 0x08;
        self.regs[REG_PAYLOAD_LENGTH as usize] = 0x01;
        self.regs[REG_SYNC_WORD as usize] = 0x12;
        self.regs[REG_DETECTION_OPTIMIZE as usize] = 0xC3;
        self.regs[REG_DETECTION_THRESHOLD as usize] = 0x0A;
        self.regs[REG_VERSION as usize] = if version == 0 { 0x12 } else { version };
        self.pending_tx = None;
    }

    fn write(&mut self, address: u8, value: u8) -> u8 {
        let index = address as usize;
        let previous = self.regs[index];
        match address {
            FIFO_ADDRESS => {
                let pointer = self.regs[REG_FIFO_ADDR_PTR as usize];
                self.fifo[pointer as usize] = value;
                self.regs[REG_FIFO_ADDR_PTR as usize] = pointer.wrapping_add(1);
            }
            REG_IRQ_FLAGS => self.regs[index] &= !value,
            REG_OP_MODE => {
                self.regs[index] = value;
                if value & 0x07 == 0x03 {
                    self.pending_tx = Some(self.tx_polls);
                }
            }
            _ => self.regs[index] = value,
        }
        self.log.push(Access::Write(address, value));
        previous
    }

    fn read(&mut self, address: u8) -> u8 {
        let value = match address {
            FIFO_ADDRESS => {
                let pointer = self.regs[REG_FIFO_ADDR_PTR as usize];
                self.regs[REG_FIFO_ADDR_PTR as usize] = pointer.wrapping_add(1);
                self.fifo[pointer as usize]
            }
            REG_IRQ_FLAGS => {
                match self.pending_tx {
                    Some(0) => {
                        self.pending_tx = None;
                        self.regs[REG_IRQ_FLAGS as usize] |= IRQ_TX_DONE;
                        let mode = self.regs[REG_OP_MODE as usize];
                        self.regs[REG_OP_MODE as usize] = (mode & !0x07) | 0x01;
                    }
                    Some(remaining) => self.pending_tx = Some(remaining - 1),
                    None => {}
                }
                self.regs[REG_IRQ_FLAGS as usize]
            }
            _ => self.regs[address as usize],
        };
        self.log.push(Access::Read(address, value));
        value
    }
}

/// Handle on the simulated chip shared by the fake bus, pins and the test.
#[derive(Clone)]
pub struct FakeChip(Arc<Mutex<ChipState>>);

impl FakeChip {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(ChipState::new())))
    }

    pub fn state(&self) -> MutexGuard<'_, ChipState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reg(&self, address: u8) -> u8 {
        self.state().regs[address as usize]
    }

    pub fn set_reg(&self, address: u8, value: u8) {
        self.state().regs[address as usize] = value;
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    pub fn log(&self) -> Vec<Access> {
        self.state().log.clone()
    }

    /// Values written to `address` since the log was last cleared.
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.log()
            .into_iter()
            .filter_map(|access| match access {
                Access::Write(a, value) if a == address => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn overlaps(&self) -> usize {
        self.state().overlaps
    }

    pub fn released(&self) -> usize {
        self.state().released
    }

    /// Places `payload` in the FIFO and raises RxDone, as the modem does at
    /// the end of a reception.
    pub fn deliver(&self, payload: &[u8], crc_error: bool) {
        let mut state = self.state();
        for (offset, byte) in payload.iter().enumerate() {
            state.fifo[RX_OFFSET as usize + offset] = *byte;
        }
        state.regs[REG_FIFO_RX_CURRENT_ADDR as usize] = RX_OFFSET;
        state.regs[REG_RX_NB_BYTES as usize] = payload.len() as u8;
        state.regs[REG_IRQ_FLAGS as usize] |= IRQ_RX_DONE;
        if crc_error {
            state.regs[REG_IRQ_FLAGS as usize] |= IRQ_CRC_ERROR;
        }
    }

    /// Fills the FIFO without touching any register.
    pub fn load_fifo(&self, offset: u8, bytes: &[u8]) {
        let mut state = self.state();
        for (index, byte) in bytes.iter().enumerate() {
            state.fifo[offset as usize + index] = *byte;
        }
    }

    pub fn fifo(&self, offset: u8, len: usize) -> Vec<u8> {
        let state = self.state();
        state.fifo[offset as usize..offset as usize + len].to_vec()
    }
}

pub struct FakeBus(FakeChip);

impl spi::ErrorType for FakeBus {
    type Error = Infallible;
}

impl SpiBus for FakeBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        assert_eq!(write.len(), 2, "register transactions are two bytes");
        let mut state = self.0.state();
        assert!(state.selected, "transfer without chip-select");

        let address = write[0] & 0x7F;
        let value = if write[0] & 0x80 != 0 {
            state.write(address, write[1])
        } else {
            state.read(address)
        };
        read[0] = 0;
        read[1] = value;
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let write = words.to_vec();
        self.transfer(words, &write)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Drop for FakeBus {
    fn drop(&mut self) {
        self.0.state().released += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    ChipSelect,
    Reset,
}

pub struct FakePin {
    chip: FakeChip,
    role: PinRole,
    high: bool,
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.chip.state();
        if self.role == PinRole::ChipSelect {
            if state.selected {
                state.overlaps += 1;
            }
            state.selected = true;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.chip.state();
        match self.role {
            PinRole::ChipSelect => state.selected = false,
            PinRole::Reset if !self.high => {
                state.reset_pulses += 1;
                state.power_on();
            }
            PinRole::Reset => {}
        }
        self.high = true;
        Ok(())
    }
}

impl Drop for FakePin {
    fn drop(&mut self) {
        self.chip.state().released += 1;
    }
}

/// DIO0 line driven by the test through [`IrqLine`].
pub struct FakeIrq {
    chip: FakeChip,
    edges: mpsc::Receiver<()>,
}

/// Test side of the DIO0 line.
#[derive(Clone)]
pub struct IrqLine(mpsc::Sender<()>);

impl IrqLine {
    pub fn pulse(&self) {
        let _ = self.0.send(());
    }
}

impl ErrorType for FakeIrq {
    type Error = Infallible;
}

impl InterruptPin for FakeIrq {
    fn wait_for_edge(
        &mut self,
        edge: Edge,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<EdgeEvent, Self::Error> {
        assert_eq!(edge, Edge::Rising);
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if cancel.is_cancelled() {
                return Ok(EdgeEvent::Cancelled);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(EdgeEvent::TimedOut);
            }
            match self.edges.recv_timeout(Duration::from_millis(2)) {
                Ok(()) => return Ok(EdgeEvent::Detected),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    // no more edges will come; behave like an idle line
                    std::thread::sleep(Duration::from_millis(2));
                }
            }
        }
    }
}

impl Drop for FakeIrq {
    fn drop(&mut self) {
        self.chip.state().released += 1;
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub type TestRadio = Sx127x<FakeBus, FakePin, FakePin, FakeIrq, NoDelay>;

pub fn parts(chip: &FakeChip) -> (FakeBus, FakePin, FakePin, FakeIrq, IrqLine) {
    let (tx, rx) = mpsc::channel();
    (
        FakeBus(chip.clone()),
        FakePin {
            chip: chip.clone(),
            role: PinRole::ChipSelect,
            high: true,
        },
        FakePin {
            chip: chip.clone(),
            role: PinRole::Reset,
            high: true,
        },
        FakeIrq {
            chip: chip.clone(),
            edges: rx,
        },
        IrqLine(tx),
    )
}

/// Uninitialized radio on a fresh simulated chip.
pub fn radio() -> (TestRadio, FakeChip, IrqLine) {
    let chip = FakeChip::new();
    let (bus, cs, reset, irq, line) = parts(&chip);
    (Sx127x::new(bus, cs, reset, irq, NoDelay), chip, line)
}

/// Initialized radio with an empty transaction log.
pub fn initialized_radio() -> (TestRadio, FakeChip, IrqLine) {
    let (mut radio, chip, line) = radio();
    radio.init().unwrap();
    chip.clear_log();
    (radio, chip, line)
}

/// Platform handing out fakes, optionally failing one acquisition.
pub struct FakePlatform {
    pub chip: FakeChip,
    pub fail: Option<Resource>,
    pub line: Option<IrqLine>,
    pub requested: Vec<String>,
}

impl FakePlatform {
    pub fn new(chip: &FakeChip) -> Self {
        Self {
            chip: chip.clone(),
            fail: None,
            line: None,
            requested: Vec::new(),
        }
    }

    fn check(&self, resource: Resource) -> Result<(), String> {
        if self.fail == Some(resource) {
            Err(format!("{resource} busy"))
        } else {
            Ok(())
        }
    }
}

impl Platform for FakePlatform {
    type Bus = FakeBus;
    type Output = FakePin;
    type Interrupt = FakeIrq;
    type Delay = NoDelay;
    type Error = String;

    fn open_bus(&mut self, device: &str) -> Result<FakeBus, String> {
        self.requested.push(device.to_owned());
        self.check(Resource::Bus)?;
        Ok(FakeBus(self.chip.clone()))
    }

    fn open_output(&mut self, pin: u32) -> Result<FakePin, String> {
        self.requested.push(format!("gpio{pin}"));
        // the first output requested is chip-select, the second reset
        let role = if self.requested.len() == 2 {
            PinRole::ChipSelect
        } else {
            PinRole::Reset
        };
        let resource = match role {
            PinRole::ChipSelect => Resource::ChipSelect,
            PinRole::Reset => Resource::Reset,
        };
        self.check(resource)?;
        Ok(FakePin {
            chip: self.chip.clone(),
            role,
            high: true,
        })
    }

    fn open_interrupt(&mut self, pin: u32) -> Result<FakeIrq, String> {
        self.requested.push(format!("gpio{pin}"));
        self.check(Resource::Interrupt)?;
        let (tx, rx) = mpsc::channel();
        self.line = Some(IrqLine(tx));
        Ok(FakeIrq {
            chip: self.chip.clone(),
            edges: rx,
        })
    }

    fn delay(&mut self) -> NoDelay {
        NoDelay
    }
}
