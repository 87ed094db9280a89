// Licensed under the Apache-2.0 license

//! Address-only transfers for the embedded-hal interface.
//!
//! Operations in one transaction are joined with repeated starts. A
//! transaction that ends in a read finishes with STOP+READ on its last byte;
//! anything else ends with an explicit STOP.

use crate::common::Logger;
use crate::i2c::common::{Error, I2cConfig};
use crate::i2c::ocores::{OcoresI2c, ReadCommand};
use crate::i2c::registers::RegisterBlock;
use crate::i2c::traits::{I2cHardwareCore, I2cMaster};
use crate::i2c::transaction::DeviceAddress;
use crate::i2c::wait::PollWait;
use embedded_hal::i2c::{Operation, SevenBitAddress};

#[derive(Copy, Clone, PartialEq, Eq)]
enum Direction {
    Write,
    Read,
}

impl<R: RegisterBlock, W: PollWait, L: Logger> OcoresI2c<R, W, L> {
    fn run_operations(
        &mut self,
        device: DeviceAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let count = operations.len();
        let mut current = None;
        for (index, operation) in operations.iter_mut().enumerate() {
            let final_op = index + 1 == count;
            match operation {
                Operation::Write(bytes) => {
                    if current != Some(Direction::Write) {
                        self.start(device.write(), self.policies.transfer)?;
                        current = Some(Direction::Write);
                    }
                    for &byte in bytes.iter() {
                        self.write_byte(byte)?;
                    }
                    if final_op {
                        self.stop()?;
                    }
                }
                Operation::Read(buffer) => {
                    if current != Some(Direction::Read) {
                        self.start(device.read(), self.policies.transfer)?;
                        current = Some(Direction::Read);
                    }
                    let len = buffer.len();
                    for (i, slot) in buffer.iter_mut().enumerate() {
                        let command = if final_op && i + 1 == len {
                            ReadCommand::StopRead
                        } else {
                            ReadCommand::Read
                        };
                        *slot = self.read_byte(command)?;
                    }
                    if final_op {
                        if len == 0 {
                            self.stop()?;
                        } else {
                            self.wait_idle()?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl<R: RegisterBlock, W: PollWait, L: Logger> I2cHardwareCore for OcoresI2c<R, W, L> {
    type Error = Error;

    fn init(&mut self, config: &I2cConfig) -> Result<u16, Self::Error> {
        self.configure(config)
    }

    fn is_busy(&mut self) -> bool {
        OcoresI2c::is_busy(self)
    }
}

impl<R: RegisterBlock, W: PollWait, L: Logger> I2cMaster<SevenBitAddress> for OcoresI2c<R, W, L> {
    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.transaction_slice(addr, &mut [Operation::Write(bytes)])
    }

    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.transaction_slice(addr, &mut [Operation::Read(buffer)])
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction_slice(addr, &mut [Operation::Write(bytes), Operation::Read(buffer)])
    }

    fn transaction_slice(
        &mut self,
        addr: SevenBitAddress,
        ops_slice: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let device = DeviceAddress::from_seven_bit(addr)?;
        if ops_slice.is_empty() {
            return Ok(());
        }
        let result = self.run_operations(device, ops_slice);
        if result.is_err() {
            self.abort();
        }
        result
    }
}
