// Licensed under the Apache-2.0 license

//! Common types and constants for the OpenCores-style I2C driver modules.
//!
//! This module provides shared definitions for error handling, bus timing
//! configuration and the acknowledgement policies used across the driver.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use fugit::HertzU32;

/// Driver error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The addressed device did not pull SDA low in the acknowledge slot.
    NoAcknowledge(NoAcknowledgeSource),
    /// A bounded wait strategy gave up before the controller was ready.
    Timeout,
    /// The controller reported arbitration lost.
    ArbitrationLoss,
    /// Configuration or argument outside what the hardware can express.
    Invalid,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::NoAcknowledge(source) => ErrorKind::NoAcknowledge(source),
            Error::ArbitrationLoss => ErrorKind::ArbitrationLoss,
            Error::Timeout | Error::Invalid => ErrorKind::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

impl I2cSpeed {
    #[must_use]
    pub const fn rate(self) -> HertzU32 {
        HertzU32::from_raw(self as u32)
    }
}

/// What to do when the address phase of a start condition is not acknowledged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartPolicy {
    /// Log the missing acknowledgement and carry on.
    BestEffort,
    /// Fail with `Error::NoAcknowledge(Address)`.
    Strict,
    /// Reissue the whole start sequence until acknowledged. `None` never gives up.
    Retry { limit: Option<u32> },
}

/// What to do when a data byte is not acknowledged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AckPolicy {
    /// Log and carry on.
    Report,
    /// Fail with `Error::NoAcknowledge(Data)`.
    Enforce,
}

/// Per-operation acknowledgement handling for register transfers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Policies {
    /// Address phase of `write_bytes`.
    pub write_address: StartPolicy,
    /// Address phase of `read_bytes` (internal register pointer set-up).
    pub read_address: StartPolicy,
    /// Restart in read direction before the data phase of `read_bytes`.
    pub read_data: StartPolicy,
    /// Address phase of address-only transfers (embedded-hal `write`, `read`,
    /// `transaction`), where the target is not known to exist.
    pub transfer: StartPolicy,
    /// Payload bytes in either direction.
    pub data: AckPolicy,
}

impl Policies {
    /// Best-effort behaviour of the reference firmware: address set-up retries
    /// forever, the read restart and payload bytes only report NACKs.
    /// Address-only transfers still fail on a missing device.
    #[must_use]
    pub const fn compat() -> Self {
        Self {
            write_address: StartPolicy::Retry { limit: None },
            read_address: StartPolicy::Retry { limit: None },
            read_data: StartPolicy::BestEffort,
            transfer: StartPolicy::Strict,
            data: AckPolicy::Report,
        }
    }

    /// Every missing acknowledgement is an error.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            write_address: StartPolicy::Strict,
            read_address: StartPolicy::Strict,
            read_data: StartPolicy::Strict,
            transfer: StartPolicy::Strict,
            data: AckPolicy::Enforce,
        }
    }
}

impl Default for Policies {
    fn default() -> Self {
        Self::compat()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct I2cConfig {
    pub input_clock: HertzU32,
    pub speed: I2cSpeed,
    pub policies: Policies,
}

impl I2cConfig {
    /// Prescale register value: `input_clock / (5 * bus_clock) - 1`.
    ///
    /// # Errors
    ///
    /// `Error::Invalid` if the input clock is too slow for the bus speed or the
    /// divisor does not fit the 16-bit prescale register.
    pub fn prescaler(&self) -> Result<u16, Error> {
        let divisor = self
            .speed
            .rate()
            .raw()
            .checked_mul(5)
            .ok_or(Error::Invalid)?;
        let ratio = self.input_clock.raw() / divisor;
        let value = ratio.checked_sub(1).ok_or(Error::Invalid)?;
        u16::try_from(value).map_err(|_| Error::Invalid)
    }
}

impl Default for I2cConfig {
    fn default() -> Self {
        I2cConfigBuilder::new().build()
    }
}

pub struct I2cConfigBuilder {
    input_clock: HertzU32,
    speed: I2cSpeed,
    policies: Policies,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input_clock: HertzU32::MHz(50),
            speed: I2cSpeed::Standard,
            policies: Policies::compat(),
        }
    }
    #[must_use]
    pub fn input_clock(mut self, clock: HertzU32) -> Self {
        self.input_clock = clock;
        self
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn policies(mut self, policies: Policies) -> Self {
        self.policies = policies;
        self
    }
    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            input_clock: self.input_clock,
            speed: self.speed,
            policies: self.policies,
        }
    }
}
