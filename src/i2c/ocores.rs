// Licensed under the Apache-2.0 license

//! Bus primitives for the byte-oriented I2C master core.
//!
//! Each primitive issues one command and reports the acknowledgement it saw.
//! Policy (retry, ignore, abort) is applied one level up, in [`OcoresI2c::start`]
//! and the `*_byte` helpers, according to the configured [`Policies`].

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{AckPolicy, Error, I2cConfig, Policies, StartPolicy};
use crate::i2c::registers::{
    Register, RegisterBlock, CMD_READ, CMD_START_WRITE, CMD_STOP, CMD_STOP_READ, CMD_WRITE,
    CTRL_EN, STATUS_AL, STATUS_BUSY, STATUS_RXACK, STATUS_TIP,
};
use crate::i2c::wait::{PollWait, Unbounded};
use embedded_hal::i2c::NoAcknowledgeSource;

/// Command used to clock in one byte from the target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadCommand {
    /// Plain read; more bytes follow.
    Read,
    /// Read the final byte and release the bus.
    StopRead,
}

impl ReadCommand {
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            ReadCommand::Read => CMD_READ,
            ReadCommand::StopRead => CMD_STOP_READ,
        }
    }
}

pub struct OcoresI2c<R: RegisterBlock, W: PollWait = Unbounded, L: Logger = NoOpLogger> {
    pub(crate) regs: R,
    pub(crate) wait: W,
    pub(crate) logger: L,
    pub(crate) policies: Policies,
}

impl<R: RegisterBlock, W: PollWait, L: Logger> OcoresI2c<R, W, L> {
    /// Wrap a register bank. The controller is not touched until
    /// [`configure`](Self::configure).
    pub fn new(regs: R, wait: W, logger: L) -> Self {
        Self {
            regs,
            wait,
            logger,
            policies: Policies::compat(),
        }
    }

    /// Give back the register bank.
    pub fn release(self) -> R {
        self.regs
    }

    #[must_use]
    pub fn policies(&self) -> Policies {
        self.policies
    }

    pub fn set_policies(&mut self, policies: Policies) {
        self.policies = policies;
    }

    /// Program the clock divider and enable the core.
    ///
    /// Must run once before any transfer. Returns the prescale value written.
    ///
    /// # Errors
    ///
    /// `Error::Invalid` if the requested bus speed cannot be derived from the
    /// input clock. The controller is left untouched in that case.
    pub fn configure(&mut self, config: &I2cConfig) -> Result<u16, Error> {
        let prescale = config.prescaler()?;
        self.regs.write(Register::Control, 0);
        self.regs.write(Register::Prescale, u32::from(prescale));
        self.regs.write(Register::Control, CTRL_EN);
        self.policies = config.policies;
        self.logger.debug("i2c: core enabled");
        Ok(prescale)
    }

    pub fn status(&mut self) -> u32 {
        self.regs.read(Register::Status)
    }

    pub fn is_busy(&mut self) -> bool {
        self.status() & STATUS_BUSY != 0
    }

    /// Wait for the current transfer to finish and report whether the target
    /// acknowledged it.
    ///
    /// Completion is TIP rising and then falling again; RXACK is active low.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` from a bounded wait strategy, `Error::ArbitrationLoss`
    /// if the controller lost the bus during the transfer.
    pub fn wait_for_ack(&mut self) -> Result<bool, Error> {
        let regs = &mut self.regs;
        self.wait.block(|| {
            if regs.read(Register::Status) & STATUS_TIP != 0 {
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            }
        })?;
        let status = self.wait.block(|| {
            let status = regs.read(Register::Status);
            if status & STATUS_TIP == 0 {
                Ok(status)
            } else {
                Err(nb::Error::WouldBlock)
            }
        })?;
        if status & STATUS_AL != 0 {
            return Err(Error::ArbitrationLoss);
        }
        Ok(status & STATUS_RXACK == 0)
    }

    /// Wait until the controller reports the bus idle.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` from a bounded wait strategy.
    pub fn wait_idle(&mut self) -> Result<(), Error> {
        let regs = &mut self.regs;
        self.wait.block(|| {
            if regs.read(Register::Status) & STATUS_BUSY != 0 {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(())
            }
        })
    }

    /// One start condition plus address byte. Returns the acknowledgement.
    ///
    /// # Errors
    ///
    /// See [`wait_for_ack`](Self::wait_for_ack).
    pub fn issue_start(&mut self, address: u8) -> Result<bool, Error> {
        self.regs.write(Register::Transmit, u32::from(address));
        self.regs.write(Register::Command, CMD_START_WRITE);
        self.wait_for_ack()
    }

    /// Start condition with the given policy for an unacknowledged address.
    ///
    /// # Errors
    ///
    /// `Error::NoAcknowledge(Address)` under `Strict`, or under `Retry` once
    /// the attempt limit is used up; wait errors otherwise.
    pub fn start(&mut self, address: u8, policy: StartPolicy) -> Result<(), Error> {
        let mut attempts: u32 = 0;
        loop {
            if self.issue_start(address)? {
                return Ok(());
            }
            attempts = attempts.saturating_add(1);
            match policy {
                StartPolicy::BestEffort => {
                    self.logger.error("[wr start]no ack recv");
                    return Ok(());
                }
                StartPolicy::Strict => {
                    return Err(Error::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                StartPolicy::Retry { limit: Some(limit) } if attempts >= limit => {
                    self.logger.error("[rd start]retry limit reached");
                    return Err(Error::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                StartPolicy::Retry { .. } => {}
            }
        }
    }

    /// Start in write direction, reporting but tolerating a missing acknowledgement.
    ///
    /// # Errors
    ///
    /// Wait errors only.
    pub fn start_write(&mut self, address: u8) -> Result<(), Error> {
        self.start(address, StartPolicy::BestEffort)
    }

    /// Start, repeating the whole sequence until the target acknowledges.
    ///
    /// # Errors
    ///
    /// Wait errors only; without a bounded wait strategy this can spin forever
    /// on an absent target.
    pub fn start_read(&mut self, address: u8) -> Result<(), Error> {
        self.start(address, StartPolicy::Retry { limit: None })
    }

    /// Shift one byte out. Returns the acknowledgement.
    ///
    /// # Errors
    ///
    /// See [`wait_for_ack`](Self::wait_for_ack).
    pub fn transmit(&mut self, value: u8) -> Result<bool, Error> {
        self.regs.write(Register::Transmit, u32::from(value));
        self.regs.write(Register::Command, CMD_WRITE);
        self.wait_for_ack()
    }

    /// Shift one byte in. Returns the byte and the acknowledgement bit.
    ///
    /// # Errors
    ///
    /// See [`wait_for_ack`](Self::wait_for_ack).
    pub fn receive(&mut self, command: ReadCommand) -> Result<(u8, bool), Error> {
        self.regs.write(Register::Command, command.bits());
        let ack = self.wait_for_ack()?;
        let value = (self.regs.read(Register::Receive) & 0xFF) as u8;
        Ok((value, ack))
    }

    /// Write a payload byte under the configured data policy.
    ///
    /// # Errors
    ///
    /// `Error::NoAcknowledge(Data)` under `AckPolicy::Enforce`; wait errors.
    pub fn write_byte(&mut self, value: u8) -> Result<(), Error> {
        let ack = self.transmit(value)?;
        self.check_data_ack(ack, "[i2c write]no ack recv")
    }

    /// Read a payload byte under the configured data policy.
    ///
    /// # Errors
    ///
    /// `Error::NoAcknowledge(Data)` under `AckPolicy::Enforce`; wait errors.
    pub fn read_byte(&mut self, command: ReadCommand) -> Result<u8, Error> {
        let (value, ack) = self.receive(command)?;
        self.check_data_ack(ack, "[i2c read]no ack recv")?;
        Ok(value)
    }

    /// Generate a stop condition and wait for the bus to go idle.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` from a bounded wait strategy.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.regs.write(Register::Command, CMD_STOP);
        self.wait_idle()
    }

    /// Best-effort bus release after a failed transfer.
    pub(crate) fn abort(&mut self) {
        if self.stop().is_err() {
            self.logger.error("i2c: bus still busy after abort");
        }
    }

    fn check_data_ack(&mut self, ack: bool, msg: &str) -> Result<(), Error> {
        if ack {
            return Ok(());
        }
        match self.policies.data {
            AckPolicy::Report => {
                self.logger.error(msg);
                Ok(())
            }
            AckPolicy::Enforce => Err(Error::NoAcknowledge(NoAcknowledgeSource::Data)),
        }
    }
}
