// Licensed under the Apache-2.0 license

//! Simulated controller for host testing.
//!
//! [`SimController`] implements [`RegisterBlock`] and behaves like the real
//! core as seen through its registers: commands raise TIP for a few status
//! reads, RXACK reflects the addressed target, BUSY spans START..STOP. Two
//! targets sit on the simulated bus, a 24C64-style EEPROM at 0xA0 and a
//! PCF8563-style RTC at 0xA2.
//!
//! Fault knobs: NACKed address phases, an EEPROM write cycle that NACKs
//! polling starts, BUSY lingering after STOP, and a wedged core that never
//! raises TIP.

use crate::i2c::registers::{
    Register, RegisterBlock, CMD_READ, CMD_START, CMD_STOP, CMD_WRITE, CTRL_EN, STATUS_AL,
    STATUS_BUSY, STATUS_IF, STATUS_RXACK, STATUS_TIP,
};
use heapless::Vec;

pub const SIM_EEPROM_ADDR: u8 = 0xA0;
pub const SIM_RTC_ADDR: u8 = 0xA2;
pub const SIM_EEPROM_SIZE: usize = 8192;
pub const SIM_EEPROM_PAGE: usize = 32;
pub const TRACE_DEPTH: usize = 512;

/// What the simulated bus saw, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Start { address: u8, acked: bool },
    Write { value: u8, acked: bool },
    Read { value: u8 },
    Stop,
}

/// A device hanging off the simulated bus.
pub trait SimTarget {
    /// 8-bit write address.
    fn address(&self) -> u8;
    /// Address phase matched. Return false to NACK it.
    fn begin(&mut self, read: bool) -> bool;
    /// Byte from the master. Return false to NACK it.
    fn write(&mut self, value: u8) -> bool;
    /// Byte for the master.
    fn read(&mut self) -> u8;
    /// Stop condition.
    fn end(&mut self);
}

/// 64 Kbit EEPROM: two address bytes, 32-byte page rollover on write,
/// whole-array rollover on read.
pub struct SimEeprom {
    memory: [u8; SIM_EEPROM_SIZE],
    pointer: u16,
    address_bytes: u8,
    wrote_data: bool,
    write_cycle_polls: u32,
    busy_polls: u32,
}

impl Default for SimEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEeprom {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: [0xFF; SIM_EEPROM_SIZE],
            pointer: 0,
            address_bytes: 0,
            wrote_data: false,
            write_cycle_polls: 0,
            busy_polls: 0,
        }
    }

    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// NACK this many address phases after every programming cycle.
    pub fn set_write_cycle_polls(&mut self, polls: u32) {
        self.write_cycle_polls = polls;
    }

    fn mask(pointer: u16) -> u16 {
        pointer & (SIM_EEPROM_SIZE as u16 - 1)
    }
}

impl SimTarget for SimEeprom {
    fn address(&self) -> u8 {
        SIM_EEPROM_ADDR
    }

    fn begin(&mut self, read: bool) -> bool {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return false;
        }
        if !read {
            self.address_bytes = 0;
        }
        true
    }

    fn write(&mut self, value: u8) -> bool {
        match self.address_bytes {
            0 => {
                self.pointer = Self::mask(u16::from(value) << 8);
                self.address_bytes = 1;
            }
            1 => {
                self.pointer = Self::mask(self.pointer | u16::from(value));
                self.address_bytes = 2;
            }
            _ => {
                if let Some(cell) = self.memory.get_mut(usize::from(self.pointer)) {
                    *cell = value;
                }
                let page = self.pointer & !(SIM_EEPROM_PAGE as u16 - 1);
                let offset = (self.pointer + 1) & (SIM_EEPROM_PAGE as u16 - 1);
                self.pointer = page | offset;
                self.wrote_data = true;
            }
        }
        true
    }

    fn read(&mut self) -> u8 {
        let value = self
            .memory
            .get(usize::from(self.pointer))
            .copied()
            .unwrap_or(0xFF);
        self.pointer = Self::mask(self.pointer.wrapping_add(1));
        value
    }

    fn end(&mut self) {
        if self.wrote_data {
            self.busy_polls = self.write_cycle_polls;
            self.wrote_data = false;
        }
    }
}

/// Real-time clock register file: one address byte, 16 registers.
#[derive(Default)]
pub struct SimRtc {
    registers: [u8; 16],
    pointer: u8,
    pointer_set: bool,
}

impl SimRtc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut [u8; 16] {
        &mut self.registers
    }

    fn advance(&mut self) {
        self.pointer = (self.pointer + 1) & 0x0F;
    }
}

impl SimTarget for SimRtc {
    fn address(&self) -> u8 {
        SIM_RTC_ADDR
    }

    fn begin(&mut self, read: bool) -> bool {
        if !read {
            self.pointer_set = false;
        }
        true
    }

    fn write(&mut self, value: u8) -> bool {
        if self.pointer_set {
            if let Some(reg) = self.registers.get_mut(usize::from(self.pointer)) {
                *reg = value;
            }
            self.advance();
        } else {
            self.pointer = value & 0x0F;
            self.pointer_set = true;
        }
        true
    }

    fn read(&mut self) -> u8 {
        let value = self
            .registers
            .get(usize::from(self.pointer))
            .copied()
            .unwrap_or(0);
        self.advance();
        value
    }

    fn end(&mut self) {}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Selected {
    Eeprom,
    Rtc,
}

pub struct SimController {
    control: u32,
    prescale: u32,
    transmit: u32,
    receive: u32,
    command: u32,
    rxack: bool,
    arbitration_lost: bool,
    lose_next: bool,
    interrupt: bool,
    busy: bool,
    busy_hold: u32,
    busy_hold_after_stop: u32,
    tip_reads: u32,
    tip_length: u32,
    wedged: bool,
    nack_addresses: u32,
    nack_read_addresses: u32,
    selected: Option<(Selected, bool)>,
    eeprom: Option<SimEeprom>,
    rtc: Option<SimRtc>,
    trace: Vec<BusEvent, TRACE_DEPTH>,
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimController {
    /// Controller with both targets attached, core disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            control: 0,
            prescale: 0xFFFF,
            transmit: 0,
            receive: 0,
            command: 0,
            rxack: false,
            arbitration_lost: false,
            lose_next: false,
            interrupt: false,
            busy: false,
            busy_hold: 0,
            busy_hold_after_stop: 0,
            tip_reads: 0,
            tip_length: 2,
            wedged: false,
            nack_addresses: 0,
            nack_read_addresses: 0,
            selected: None,
            eeprom: Some(SimEeprom::new()),
            rtc: Some(SimRtc::new()),
            trace: Vec::new(),
        }
    }

    /// Controller with no targets on the bus.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            eeprom: None,
            rtc: None,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn control(&self) -> u32 {
        self.control
    }

    #[must_use]
    pub fn prescale(&self) -> u32 {
        self.prescale
    }

    #[must_use]
    pub fn trace(&self) -> &[BusEvent] {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    pub fn eeprom(&self) -> Option<&SimEeprom> {
        self.eeprom.as_ref()
    }

    pub fn eeprom_mut(&mut self) -> Option<&mut SimEeprom> {
        self.eeprom.as_mut()
    }

    pub fn rtc(&self) -> Option<&SimRtc> {
        self.rtc.as_ref()
    }

    pub fn rtc_mut(&mut self) -> Option<&mut SimRtc> {
        self.rtc.as_mut()
    }

    /// NACK the next `count` address phases regardless of target.
    pub fn nack_addresses(&mut self, count: u32) {
        self.nack_addresses = count;
    }

    /// NACK the next `count` read-direction address phases.
    pub fn nack_read_addresses(&mut self, count: u32) {
        self.nack_read_addresses = count;
    }

    /// Keep BUSY set for `reads` status reads after every STOP.
    pub fn hold_busy_after_stop(&mut self, reads: u32) {
        self.busy_hold_after_stop = reads;
    }

    /// Flag arbitration lost on the next transfer.
    pub fn lose_arbitration(&mut self) {
        self.lose_next = true;
    }

    /// Stop raising TIP, as if the core clock had died.
    pub fn wedge(&mut self) {
        self.wedged = true;
    }

    fn record(&mut self, event: BusEvent) {
        // a full trace just stops recording
        let _ = self.trace.push(event);
    }

    fn target(&mut self, which: Selected) -> Option<&mut dyn SimTarget> {
        match which {
            Selected::Eeprom => self.eeprom.as_mut().map(|t| t as &mut dyn SimTarget),
            Selected::Rtc => self.rtc.as_mut().map(|t| t as &mut dyn SimTarget),
        }
    }

    fn lookup(&self, address: u8) -> Option<Selected> {
        let base = address & !1;
        if self.eeprom.as_ref().is_some_and(|t| t.address() == base) {
            Some(Selected::Eeprom)
        } else if self.rtc.as_ref().is_some_and(|t| t.address() == base) {
            Some(Selected::Rtc)
        } else {
            None
        }
    }

    fn execute(&mut self, command: u32) {
        if self.control & CTRL_EN == 0 || self.wedged {
            return;
        }
        self.tip_reads = self.tip_length;
        self.interrupt = true;
        self.arbitration_lost = self.lose_next;
        self.lose_next = false;

        if self.arbitration_lost {
            self.busy = false;
            self.selected = None;
            return;
        }

        if command & CMD_START != 0 {
            self.busy = true;
            let address = (self.transmit & 0xFF) as u8;
            let read = address & 1 != 0;
            let forced_nack = if self.nack_addresses > 0 {
                self.nack_addresses -= 1;
                true
            } else if read && self.nack_read_addresses > 0 {
                self.nack_read_addresses -= 1;
                true
            } else {
                false
            };
            let found = self.lookup(address);
            let acked = match found {
                Some(which) if !forced_nack => self.target(which).is_some_and(|t| t.begin(read)),
                _ => false,
            };
            self.selected = if acked { found.map(|w| (w, read)) } else { None };
            self.rxack = !acked;
            self.record(BusEvent::Start { address, acked });
        } else if command & CMD_WRITE != 0 {
            let value = (self.transmit & 0xFF) as u8;
            let acked = match self.selected {
                Some((which, false)) => self.target(which).is_some_and(|t| t.write(value)),
                _ => false,
            };
            self.rxack = !acked;
            self.record(BusEvent::Write { value, acked });
        } else if command & CMD_READ != 0 {
            let value = match self.selected {
                Some((which, true)) => self.target(which).map_or(0xFF, |t| t.read()),
                _ => 0xFF,
            };
            self.receive = u32::from(value);
            self.rxack = false;
            self.record(BusEvent::Read { value });
        }

        if command & CMD_STOP != 0 {
            if let Some((which, _)) = self.selected.take() {
                if let Some(target) = self.target(which) {
                    target.end();
                }
            }
            self.busy = false;
            self.busy_hold = self.busy_hold_after_stop;
            self.record(BusEvent::Stop);
        }
    }

    fn status(&mut self) -> u32 {
        let mut status = 0;
        if self.rxack {
            status |= STATUS_RXACK;
        }
        if self.busy || self.busy_hold > 0 {
            status |= STATUS_BUSY;
        }
        if self.busy_hold > 0 {
            self.busy_hold -= 1;
        }
        if self.arbitration_lost {
            status |= STATUS_AL;
        }
        if self.tip_reads > 0 {
            status |= STATUS_TIP;
            self.tip_reads -= 1;
        } else if self.interrupt {
            status |= STATUS_IF;
        }
        status
    }
}

impl RegisterBlock for SimController {
    fn read(&mut self, reg: Register) -> u32 {
        match reg {
            Register::Control => self.control,
            Register::Prescale => self.prescale,
            Register::Transmit => self.transmit,
            Register::Receive => self.receive,
            Register::Command => self.command,
            Register::Status => self.status(),
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        match reg {
            Register::Control => self.control = value & 0xC0,
            Register::Prescale => self.prescale = value & 0xFFFF,
            Register::Transmit => self.transmit = value & 0xFF,
            Register::Receive => {}
            Register::Command => {
                self.command = value & 0xF9;
                self.execute(self.command);
            }
            Register::Status => {}
        }
    }
}
