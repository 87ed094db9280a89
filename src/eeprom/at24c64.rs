// Licensed under the Apache-2.0 license

//! AT24C64 serial EEPROM (64 Kbit, 16-bit word address, 32-byte pages).
//!
//! A page write wraps inside its page on the device, so [`At24c64::write`]
//! splits payloads at page boundaries. After each page the device runs an
//! internal write cycle during which it NACKs its address; the next
//! transaction's address phase, under a retrying [`StartPolicy`], doubles as
//! acknowledge polling.
//!
//! [`StartPolicy`]: crate::i2c::common::StartPolicy

use crate::common::DeviceError;
use crate::i2c::traits::RegisterTransfer;
use crate::i2c::transaction::{DeviceAddress, RegisterAddress};

pub const AT24C64_ADDR: DeviceAddress = DeviceAddress::from_base(0xA0);
pub const AT24C64_CAPACITY: usize = 8 * 1024;
pub const AT24C64_PAGE_SIZE: usize = 32;

pub struct At24c64<B: RegisterTransfer> {
    bus: B,
    address: DeviceAddress,
}

impl<B: RegisterTransfer> At24c64<B> {
    /// Device with all address pins tied low.
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, AT24C64_ADDR)
    }

    pub fn with_address(bus: B, address: DeviceAddress) -> Self {
        Self { bus, address }
    }

    pub fn release(self) -> B {
        self.bus
    }

    /// Sequential read starting at `offset`.
    ///
    /// # Errors
    ///
    /// `DeviceError::OutOfRange` if the range runs past the end of the array;
    /// `DeviceError::Bus` on a failed transfer.
    pub fn read(&mut self, offset: u16, buffer: &mut [u8]) -> Result<(), DeviceError<B::Error>> {
        check_range(offset, buffer.len())?;
        self.bus
            .read_bytes(self.address, RegisterAddress::Sixteen(offset), buffer)
            .map_err(DeviceError::Bus)
    }

    /// Write within a single page.
    ///
    /// # Errors
    ///
    /// `DeviceError::OutOfRange` if `data` would cross a page boundary or
    /// the end of the array; `DeviceError::Bus` on a failed transfer.
    pub fn write_page(&mut self, offset: u16, data: &[u8]) -> Result<(), DeviceError<B::Error>> {
        check_range(offset, data.len())?;
        let in_page = usize::from(offset) % AT24C64_PAGE_SIZE;
        if in_page + data.len() > AT24C64_PAGE_SIZE {
            return Err(DeviceError::OutOfRange);
        }
        self.bus
            .write_bytes(self.address, RegisterAddress::Sixteen(offset), data)
            .map_err(DeviceError::Bus)
    }

    /// Write any range, one page transaction at a time.
    ///
    /// # Errors
    ///
    /// `DeviceError::OutOfRange` if the range runs past the end of the array;
    /// `DeviceError::Bus` on the first failed page, earlier pages stay written.
    pub fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), DeviceError<B::Error>> {
        check_range(offset, data.len())?;
        let mut offset = offset;
        let mut rest = data;
        while !rest.is_empty() {
            let room = AT24C64_PAGE_SIZE - usize::from(offset) % AT24C64_PAGE_SIZE;
            let (chunk, tail) = rest.split_at(room.min(rest.len()));
            self.write_page(offset, chunk)?;
            let advance = u16::try_from(chunk.len()).map_err(|_| DeviceError::OutOfRange)?;
            offset = offset.saturating_add(advance);
            rest = tail;
        }
        Ok(())
    }
}

fn check_range<E>(offset: u16, len: usize) -> Result<(), DeviceError<E>> {
    match usize::from(offset).checked_add(len) {
        Some(end) if end <= AT24C64_CAPACITY => Ok(()),
        _ => Err(DeviceError::OutOfRange),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NoOpLogger;
    use crate::i2c::common::{Error, I2cConfig, Policies};
    use crate::i2c::ocores::OcoresI2c;
    use crate::i2c::sim::{BusEvent, SimController};
    use crate::i2c::wait::SpinLimit;
    use embedded_hal::i2c::NoAcknowledgeSource;
    use std::vec::Vec;

    type SimBus = OcoresI2c<SimController, SpinLimit, NoOpLogger>;

    fn eeprom() -> At24c64<SimBus> {
        let mut bus = OcoresI2c::new(SimController::new(), SpinLimit::new(1_000), NoOpLogger);
        bus.configure(&I2cConfig::default()).unwrap();
        At24c64::new(bus)
    }

    #[test]
    fn test_write_read_across_pages() {
        let mut eeprom = eeprom();
        let data: Vec<u8> = (0..70).collect();
        eeprom.write(20, &data).unwrap();
        let mut readback = [0u8; 70];
        eeprom.read(20, &mut readback).unwrap();
        assert_eq!(&readback[..], &data[..]);

        // 20..32, 32..64, 64..90
        let sim = eeprom.release().release();
        let pages = sim
            .trace()
            .iter()
            .filter(|e| matches!(e, BusEvent::Start { address: 0xA0, .. }))
            .count();
        assert_eq!(pages, 3 + 1);
    }

    #[test]
    fn test_write_page_rejects_boundary_crossing() {
        let mut eeprom = eeprom();
        assert_eq!(
            eeprom.write_page(30, &[1, 2, 3]),
            Err(DeviceError::OutOfRange)
        );
        assert_eq!(eeprom.write_page(29, &[1, 2, 3]), Ok(()));
    }

    #[test]
    fn test_bounds() {
        let mut eeprom = eeprom();
        let mut buf = [0u8; 2];
        assert_eq!(eeprom.read(8191, &mut buf), Err(DeviceError::OutOfRange));
        assert_eq!(eeprom.read(8190, &mut buf), Ok(()));
        assert_eq!(eeprom.write(8190, &[0; 4]), Err(DeviceError::OutOfRange));
        assert_eq!(eeprom.write(u16::MAX, &[]), Err(DeviceError::OutOfRange));
    }

    #[test]
    fn test_empty_write_touches_nothing() {
        let mut eeprom = eeprom();
        eeprom.write(100, &[]).unwrap();
        assert!(eeprom.release().release().trace().is_empty());
    }

    #[test]
    fn test_write_cycle_is_polled() {
        let mut eeprom = eeprom();
        let mut bus = eeprom.release();
        bus.regs.eeprom_mut().unwrap().set_write_cycle_polls(4);
        eeprom = At24c64::new(bus);

        let data = [0x5Au8; 40];
        eeprom.write(0, &data).unwrap();
        let mut readback = [0u8; 40];
        eeprom.read(0, &mut readback).unwrap();
        assert_eq!(readback, data);

        let sim = eeprom.release().release();
        let nacked = sim
            .trace()
            .iter()
            .filter(|e| matches!(e, BusEvent::Start { acked: false, .. }))
            .count();
        // once before the second page, once before the read
        assert_eq!(nacked, 8);
    }

    #[test]
    fn test_strict_write_cycle_fails_fast() {
        let mut bus = OcoresI2c::new(SimController::new(), SpinLimit::new(1_000), NoOpLogger);
        bus.configure(&I2cConfig::default()).unwrap();
        bus.set_policies(Policies::strict());
        bus.regs.eeprom_mut().unwrap().set_write_cycle_polls(1);
        let mut eeprom = At24c64::new(bus);
        assert_eq!(
            eeprom.write(0, &[0u8; 40]),
            Err(DeviceError::Bus(Error::NoAcknowledge(
                NoAcknowledgeSource::Address
            )))
        );
    }
}
