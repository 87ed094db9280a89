// Licensed under the Apache-2.0 license

//! High-level I2C controller.
//!
//! Owns a configured hardware driver and exposes it through the embedded-hal
//! [`I2c`](embedded_hal::i2c::I2c) trait and through [`RegisterTransfer`] for
//! device drivers.

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::I2cConfig;
use crate::i2c::traits::{I2cMaster, RegisterTransfer};
use crate::i2c::transaction::{DeviceAddress, RegisterAddress};
use embedded_hal::i2c::{Operation, SevenBitAddress};

pub struct I2cController<H: I2cMaster, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub config: I2cConfig,
    pub logger: L,
}

impl<H: I2cMaster, L: Logger> I2cController<H, L> {
    /// Initialise `hardware` with `config` and take ownership of it.
    ///
    /// # Errors
    ///
    /// Whatever [`I2cHardwareCore::init`](crate::i2c::traits::I2cHardwareCore::init)
    /// reports; the hardware is dropped in that case.
    pub fn new(mut hardware: H, config: I2cConfig, mut logger: L) -> Result<Self, H::Error> {
        if let Err(e) = hardware.init(&config) {
            logger.error("i2c: controller init failed");
            return Err(e);
        }
        Ok(Self {
            hardware,
            config,
            logger,
        })
    }

    /// Re-run initialisation with the stored configuration, for example
    /// after the core lost power or its policies were changed at runtime.
    ///
    /// # Errors
    ///
    /// Whatever the hardware's `init` reports.
    pub fn reset(&mut self) -> Result<u16, H::Error> {
        match self.hardware.init(&self.config) {
            Ok(prescale) => {
                self.logger.debug("i2c: controller reset");
                Ok(prescale)
            }
            Err(e) => {
                self.logger.error("i2c: controller reset failed");
                Err(e)
            }
        }
    }

    pub fn release(self) -> H {
        self.hardware
    }
}

impl<H: I2cMaster, L: Logger> embedded_hal::i2c::ErrorType for I2cController<H, L> {
    type Error = H::Error;
}

impl<H: I2cMaster, L: Logger> embedded_hal::i2c::I2c for I2cController<H, L> {
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.hardware.read(addr, buffer)
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.hardware.write(addr, bytes)
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.hardware.write_read(addr, bytes, buffer)
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.hardware.transaction_slice(addr, operations)
    }
}

impl<H: I2cMaster + RegisterTransfer, L: Logger> RegisterTransfer for I2cController<H, L> {
    type Error = <H as RegisterTransfer>::Error;

    fn write_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        RegisterTransfer::write_bytes(&mut self.hardware, device, register, payload)
    }

    fn read_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        RegisterTransfer::read_bytes(&mut self.hardware, device, register, buffer)
    }
}
