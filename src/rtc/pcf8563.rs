// Licensed under the Apache-2.0 license

//! PCF8563 real-time clock.
//!
//! The time and date live in seven consecutive BCD registers starting at
//! 0x02, in datasheet order: seconds, minutes, hours, days, weekdays,
//! century_months, years. Bit 7 of the seconds register is the VL
//! (voltage-low) flag and bit 7 of the month register is the century flag.

use crate::common::DeviceError;
use crate::i2c::traits::RegisterTransfer;
use crate::i2c::transaction::{DeviceAddress, RegisterAddress};
use crate::rtc::bcd::{from_bcd, to_bcd};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const PCF8563_ADDR: DeviceAddress = DeviceAddress::from_base(0xA2);

pub struct Register;
impl Register {
    pub const CONTROL_STATUS_1: u8 = 0x00;
    pub const CONTROL_STATUS_2: u8 = 0x01;
    pub const SECONDS: u8 = 0x02;
    pub const MINUTES: u8 = 0x03;
    pub const HOURS: u8 = 0x04;
    pub const DAYS: u8 = 0x05;
    pub const WEEKDAYS: u8 = 0x06;
    pub const CENTURY_MONTHS: u8 = 0x07;
    pub const YEARS: u8 = 0x08;
}

pub struct FieldMask;
impl FieldMask {
    pub const SECONDS: u8 = 0x7F;
    pub const MINUTES: u8 = 0x7F;
    pub const HOURS: u8 = 0x3F;
    pub const DAYS: u8 = 0x3F;
    pub const WEEKDAYS: u8 = 0x07;
    pub const MONTHS: u8 = 0x1F;
    pub const YEARS: u8 = 0xFF;
}

pub struct BitFlags;
impl BitFlags {
    /// Clock integrity no longer guaranteed.
    pub const VL: u8 = 0b1000_0000;
    pub const CENTURY: u8 = 0b1000_0000;
}

/// Number of time registers.
pub const TIME_RECORD_LEN: usize = 7;

/// Calendar time in binary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeRecord {
    /// 0..=59
    pub second: u8,
    /// 0..=59
    pub minute: u8,
    /// 0..=23
    pub hour: u8,
    /// 1..=31
    pub day: u8,
    /// 0..=6
    pub weekday: u8,
    /// 1..=12
    pub month: u8,
    /// 0..=99
    pub year: u8,
    pub century: bool,
}

impl TimeRecord {
    /// Whether every field fits its register.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.second <= 59
            && self.minute <= 59
            && self.hour <= 23
            && (1..=31).contains(&self.day)
            && self.weekday <= 6
            && (1..=12).contains(&self.month)
            && self.year <= 99
    }
}

/// The seven time registers as they sit on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct TimeRegisters {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub days: u8,
    pub weekdays: u8,
    pub century_months: u8,
    pub years: u8,
}

impl From<&TimeRecord> for TimeRegisters {
    fn from(record: &TimeRecord) -> Self {
        let century = if record.century { BitFlags::CENTURY } else { 0 };
        Self {
            seconds: to_bcd(record.second),
            minutes: to_bcd(record.minute),
            hours: to_bcd(record.hour),
            days: to_bcd(record.day),
            weekdays: to_bcd(record.weekday),
            century_months: to_bcd(record.month) | century,
            years: to_bcd(record.year),
        }
    }
}

impl From<TimeRegisters> for TimeRecord {
    fn from(regs: TimeRegisters) -> Self {
        Self {
            second: from_bcd(regs.seconds, FieldMask::SECONDS),
            minute: from_bcd(regs.minutes, FieldMask::MINUTES),
            hour: from_bcd(regs.hours, FieldMask::HOURS),
            day: from_bcd(regs.days, FieldMask::DAYS),
            weekday: from_bcd(regs.weekdays, FieldMask::WEEKDAYS),
            month: from_bcd(regs.century_months, FieldMask::MONTHS),
            year: from_bcd(regs.years, FieldMask::YEARS),
            century: regs.century_months & BitFlags::CENTURY != 0,
        }
    }
}

/// BCD register image for `record`, first byte at [`Register::SECONDS`].
///
/// Fields are not range checked; see [`TimeRecord::is_valid`].
#[must_use]
pub fn encode_time_record(record: &TimeRecord) -> [u8; TIME_RECORD_LEN] {
    zerocopy::transmute!(TimeRegisters::from(record))
}

#[must_use]
pub fn decode_time_record(bytes: &[u8; TIME_RECORD_LEN]) -> TimeRecord {
    let regs: TimeRegisters = zerocopy::transmute!(*bytes);
    TimeRecord::from(regs)
}

pub struct Pcf8563<B: RegisterTransfer> {
    bus: B,
}

impl<B: RegisterTransfer> Pcf8563<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn release(self) -> B {
        self.bus
    }

    /// Load `record` into the clock. Clears the VL flag.
    ///
    /// # Errors
    ///
    /// `DeviceError::OutOfRange` if a field does not fit its register; the
    /// bus is not touched in that case.
    pub fn set_time(&mut self, record: &TimeRecord) -> Result<(), DeviceError<B::Error>> {
        if !record.is_valid() {
            return Err(DeviceError::OutOfRange);
        }
        let bytes = encode_time_record(record);
        self.bus
            .write_bytes(
                PCF8563_ADDR,
                RegisterAddress::Eight(Register::SECONDS),
                &bytes,
            )
            .map_err(DeviceError::Bus)
    }

    /// # Errors
    ///
    /// `DeviceError::Bus` on a failed transfer.
    pub fn time(&mut self) -> Result<TimeRecord, DeviceError<B::Error>> {
        let mut bytes = [0u8; TIME_RECORD_LEN];
        self.bus
            .read_bytes(
                PCF8563_ADDR,
                RegisterAddress::Eight(Register::SECONDS),
                &mut bytes,
            )
            .map_err(DeviceError::Bus)?;
        Ok(decode_time_record(&bytes))
    }

    /// True if the oscillator stopped or supply dropped since the time was
    /// last set.
    ///
    /// # Errors
    ///
    /// `DeviceError::Bus` on a failed transfer.
    pub fn clock_integrity_lost(&mut self) -> Result<bool, DeviceError<B::Error>> {
        let mut seconds = [0u8; 1];
        self.bus
            .read_bytes(
                PCF8563_ADDR,
                RegisterAddress::Eight(Register::SECONDS),
                &mut seconds,
            )
            .map_err(DeviceError::Bus)?;
        Ok(seconds.iter().any(|s| s & BitFlags::VL != 0))
    }
}
