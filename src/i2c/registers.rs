// Licensed under the Apache-2.0 license

//! Register interface of the I2C master core.
//!
//! Six 32-bit registers on a 4-byte stride. Only the low byte of each is
//! meaningful.

use core::ptr::{read_volatile, write_volatile};

/// Physical base of the controller on the reference SoC.
pub const I2C_BASE_ADDR: usize = 0x1000_4000;

/// Control register: core enable.
pub const CTRL_EN: u32 = 0x80;

pub const CMD_START: u32 = 0x80;
pub const CMD_STOP: u32 = 0x40;
pub const CMD_READ: u32 = 0x20;
pub const CMD_WRITE: u32 = 0x10;
pub const CMD_START_READ: u32 = CMD_START | CMD_READ;
pub const CMD_START_WRITE: u32 = CMD_START | CMD_WRITE;
pub const CMD_STOP_READ: u32 = CMD_STOP | CMD_READ;
pub const CMD_STOP_WRITE: u32 = CMD_STOP | CMD_WRITE;

/// Received acknowledge, active low: set means the target did NOT acknowledge.
pub const STATUS_RXACK: u32 = 0x80;
pub const STATUS_BUSY: u32 = 0x40;
/// Arbitration lost.
pub const STATUS_AL: u32 = 0x20;
/// Transfer in progress.
pub const STATUS_TIP: u32 = 0x02;
/// Interrupt flag.
pub const STATUS_IF: u32 = 0x01;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    Control,
    Prescale,
    Transmit,
    Receive,
    Command,
    Status,
}

impl Register {
    /// Byte offset from the controller base.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Register::Control => 0,
            Register::Prescale => 4,
            Register::Transmit => 8,
            Register::Receive => 12,
            Register::Command => 16,
            Register::Status => 20,
        }
    }
}

/// Raw access to the controller registers.
///
/// Reads take `&mut self`: reading status has observable timing on real
/// hardware, and the handle stands for exclusive ownership of the controller.
pub trait RegisterBlock {
    fn read(&mut self, reg: Register) -> u32;
    fn write(&mut self, reg: Register, value: u32);
}

impl<R: RegisterBlock + ?Sized> RegisterBlock for &mut R {
    fn read(&mut self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value);
    }
}

/// Memory-mapped register bank.
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must be the address of a controller register bank that nothing
    /// else accesses for the lifetime of the returned handle.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for Mmio {
    #[inline(always)]
    fn read(&mut self, reg: Register) -> u32 {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { read_volatile((self.base + reg.offset()) as *const u32) }
    }

    #[inline(always)]
    fn write(&mut self, reg: Register, value: u32) {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { write_volatile((self.base + reg.offset()) as *mut u32, value) }
    }
}
