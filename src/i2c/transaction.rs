// Licensed under the Apache-2.0 license

//! Register-addressed transfers built from the bus primitives.
//!
//! A write is `start(W) reg.. data.. stop`. A read sets the device's
//! register pointer in its own write transaction, stops, then restarts in
//! read direction and clocks the data in, the last byte with STOP+READ.

use crate::common::Logger;
use crate::i2c::common::Error;
use crate::i2c::ocores::{OcoresI2c, ReadCommand};
use crate::i2c::registers::RegisterBlock;
use crate::i2c::traits::RegisterTransfer;
use crate::i2c::wait::PollWait;

/// 8-bit bus address of a target: 7-bit address in bits 7..1, direction in bit 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// From an 8-bit base address. The direction bit is cleared.
    #[must_use]
    pub const fn from_base(base: u8) -> Self {
        Self(base & !1)
    }

    /// From a 7-bit address as used by embedded-hal.
    ///
    /// # Errors
    ///
    /// `Error::Invalid` for addresses above 0x7F.
    pub const fn from_seven_bit(address: u8) -> Result<Self, Error> {
        if address > 0x7F {
            return Err(Error::Invalid);
        }
        Ok(Self(address << 1))
    }

    /// Address byte selecting write direction.
    #[must_use]
    pub const fn write(self) -> u8 {
        self.0
    }

    /// Address byte selecting read direction (base + 1).
    #[must_use]
    pub const fn read(self) -> u8 {
        self.0 | 1
    }

    #[must_use]
    pub const fn seven_bit(self) -> u8 {
        self.0 >> 1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressWidth {
    Eight,
    Sixteen,
}

/// Internal register address inside the target, with its wire width.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterAddress {
    Eight(u8),
    /// Sent high byte first.
    Sixteen(u16),
}

impl RegisterAddress {
    /// # Errors
    ///
    /// `Error::Invalid` if `address` does not fit in `width`.
    pub fn new(width: AddressWidth, address: u16) -> Result<Self, Error> {
        match width {
            AddressWidth::Eight => u8::try_from(address)
                .map(RegisterAddress::Eight)
                .map_err(|_| Error::Invalid),
            AddressWidth::Sixteen => Ok(RegisterAddress::Sixteen(address)),
        }
    }

    #[must_use]
    pub const fn width(self) -> AddressWidth {
        match self {
            RegisterAddress::Eight(_) => AddressWidth::Eight,
            RegisterAddress::Sixteen(_) => AddressWidth::Sixteen,
        }
    }

    /// Bytes in wire order.
    pub fn bytes(self) -> impl Iterator<Item = u8> {
        let (bytes, len) = match self {
            RegisterAddress::Eight(address) => ([address, 0], 1),
            RegisterAddress::Sixteen(address) => (address.to_be_bytes(), 2),
        };
        bytes.into_iter().take(len)
    }
}

impl<R: RegisterBlock, W: PollWait, L: Logger> OcoresI2c<R, W, L> {
    /// Write `payload` to consecutive registers starting at `register`.
    ///
    /// An empty payload sets the register pointer and stops.
    ///
    /// # Errors
    ///
    /// Whatever the configured policies escalate; the bus is released with a
    /// stop condition before an error is returned.
    pub fn write_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Error> {
        let result = self.write_phase(device, register, payload);
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Fill `buffer` from consecutive registers starting at `register`.
    ///
    /// An empty buffer performs only the pointer-setting transaction.
    ///
    /// # Errors
    ///
    /// Whatever the configured policies escalate; the bus is released with a
    /// stop condition before an error is returned.
    pub fn read_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        let result = self.read_phases(device, register, buffer);
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Read `count` bytes into a fixed-capacity vector.
    ///
    /// # Errors
    ///
    /// `Error::Invalid` if `count` exceeds `N`; otherwise as
    /// [`read_bytes`](Self::read_bytes).
    pub fn read_vec<const N: usize>(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        count: usize,
    ) -> Result<heapless::Vec<u8, N>, Error> {
        let mut data = heapless::Vec::new();
        data.resize(count, 0).map_err(|()| Error::Invalid)?;
        self.read_bytes(device, register, &mut data)?;
        Ok(data)
    }

    fn write_phase(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Error> {
        self.start(device.write(), self.policies.write_address)?;
        for byte in register.bytes() {
            self.write_byte(byte)?;
        }
        for &byte in payload {
            self.write_byte(byte)?;
        }
        self.stop()
    }

    fn read_phases(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.start(device.write(), self.policies.read_address)?;
        for byte in register.bytes() {
            self.write_byte(byte)?;
        }
        self.stop()?;

        if buffer.is_empty() {
            return Ok(());
        }

        self.start(device.read(), self.policies.read_data)?;
        let last = buffer.len() - 1;
        for (index, slot) in buffer.iter_mut().enumerate() {
            let command = if index == last {
                ReadCommand::StopRead
            } else {
                ReadCommand::Read
            };
            *slot = self.read_byte(command)?;
        }
        self.wait_idle()
    }
}

impl<R: RegisterBlock, W: PollWait, L: Logger> RegisterTransfer for OcoresI2c<R, W, L> {
    type Error = Error;

    fn write_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        OcoresI2c::write_bytes(self, device, register, payload)
    }

    fn read_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        OcoresI2c::read_bytes(self, device, register, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NoOpLogger;
    use crate::i2c::common::{I2cConfig, I2cConfigBuilder, Policies, StartPolicy};
    use crate::i2c::sim::{BusEvent, SimController};
    use crate::i2c::wait::SpinLimit;
    use embedded_hal::i2c::NoAcknowledgeSource;
    use std::vec::Vec;

    const EEPROM: DeviceAddress = DeviceAddress::from_base(0xA0);
    const RTC: DeviceAddress = DeviceAddress::from_base(0xA2);

    fn bus() -> OcoresI2c<SimController, SpinLimit, NoOpLogger> {
        bus_with(I2cConfig::default())
    }

    fn bus_with(config: I2cConfig) -> OcoresI2c<SimController, SpinLimit, NoOpLogger> {
        let mut i2c = OcoresI2c::new(SimController::new(), SpinLimit::new(1_000), NoOpLogger);
        i2c.configure(&config).unwrap();
        i2c
    }

    fn start(address: u8) -> BusEvent {
        BusEvent::Start {
            address,
            acked: true,
        }
    }

    fn write(value: u8) -> BusEvent {
        BusEvent::Write { value, acked: true }
    }

    #[test]
    fn test_device_address() {
        let dev = DeviceAddress::from_base(0xA1);
        assert_eq!(dev.write(), 0xA0);
        assert_eq!(dev.read(), 0xA1);
        assert_eq!(dev.seven_bit(), 0x50);
        assert_eq!(DeviceAddress::from_seven_bit(0x51), Ok(RTC));
        assert_eq!(DeviceAddress::from_seven_bit(0x80), Err(Error::Invalid));
    }

    #[test]
    fn test_register_address_wire_order() {
        let bytes: Vec<u8> = RegisterAddress::Sixteen(0x1234).bytes().collect();
        assert_eq!(bytes, vec![0x12, 0x34]);
        let bytes: Vec<u8> = RegisterAddress::Eight(0x02).bytes().collect();
        assert_eq!(bytes, vec![0x02]);
        assert_eq!(
            RegisterAddress::new(AddressWidth::Eight, 0x100),
            Err(Error::Invalid)
        );
        assert_eq!(
            RegisterAddress::new(AddressWidth::Sixteen, 0x100).map(RegisterAddress::width),
            Ok(AddressWidth::Sixteen)
        );
    }

    #[test]
    fn test_write_then_read_sixteen_bytes() {
        let mut i2c = bus();
        let data: Vec<u8> = (0..16).collect();
        i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0), &data).unwrap();
        let mut readback = [0u8; 16];
        i2c.read_bytes(EEPROM, RegisterAddress::Sixteen(0), &mut readback).unwrap();
        assert_eq!(&readback[..], &data[..]);
    }

    #[test]
    fn test_round_trip_lengths() {
        for len in [0usize, 1, 2, 31] {
            let mut i2c = bus();
            let data: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(7) ^ 0x5A).collect();
            i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0x0100), &data).unwrap();
            let mut readback = vec![0u8; len];
            i2c.read_bytes(EEPROM, RegisterAddress::Sixteen(0x0100), &mut readback).unwrap();
            assert_eq!(readback, data);
        }
    }

    #[test]
    fn test_write_phase_sequence() {
        let mut i2c = bus();
        i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0x0102), &[0xAA, 0xBB]).unwrap();
        assert_eq!(
            i2c.regs.trace(),
            &[
                start(0xA0),
                write(0x01),
                write(0x02),
                write(0xAA),
                write(0xBB),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_read_phase_sequence() {
        let mut i2c = bus();
        i2c.regs.rtc_mut().unwrap().registers_mut()[2..5].copy_from_slice(&[1, 2, 3]);
        let mut buf = [0u8; 3];
        i2c.read_bytes(RTC, RegisterAddress::Eight(0x02), &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(
            i2c.regs.trace(),
            &[
                start(0xA2),
                write(0x02),
                BusEvent::Stop,
                start(0xA3),
                BusEvent::Read { value: 1 },
                BusEvent::Read { value: 2 },
                BusEvent::Read { value: 3 },
                BusEvent::Stop,
            ]
        );
        assert!(!i2c.is_busy());
    }

    #[test]
    fn test_zero_length_is_address_phase_and_stop() {
        let mut i2c = bus();
        i2c.read_bytes(RTC, RegisterAddress::Eight(0x05), &mut []).unwrap();
        assert_eq!(
            i2c.regs.trace(),
            &[start(0xA2), write(0x05), BusEvent::Stop]
        );

        i2c.regs.clear_trace();
        i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0x0010), &[]).unwrap();
        assert_eq!(
            i2c.regs.trace(),
            &[start(0xA0), write(0x00), write(0x10), BusEvent::Stop]
        );
    }

    #[test]
    fn test_write_cycle_polling_via_address_retry() {
        let mut i2c = bus();
        i2c.regs.eeprom_mut().unwrap().set_write_cycle_polls(4);
        i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0), &[9, 8, 7]).unwrap();
        i2c.regs.clear_trace();

        let mut buf = [0u8; 3];
        i2c.read_bytes(EEPROM, RegisterAddress::Sixteen(0), &mut buf).unwrap();
        assert_eq!(buf, [9, 8, 7]);
        let nacked = i2c
            .regs
            .trace()
            .iter()
            .filter(|e| matches!(e, BusEvent::Start { acked: false, .. }))
            .count();
        assert_eq!(nacked, 4);
    }

    #[test]
    fn test_strict_policy_aborts_and_releases_bus() {
        let mut i2c = bus_with(
            I2cConfigBuilder::new()
                .policies(Policies::strict())
                .build(),
        );
        let absent = DeviceAddress::from_base(0x40);
        assert_eq!(
            i2c.write_bytes(absent, RegisterAddress::Eight(0), &[1]),
            Err(Error::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        assert_eq!(i2c.regs.trace().last(), Some(&BusEvent::Stop));
        assert!(!i2c.is_busy());
    }

    #[test]
    fn test_read_restart_policy() {
        let mut i2c = bus();
        i2c.regs.rtc_mut().unwrap().registers_mut()[0] = 0x11;

        // best effort: the unacknowledged restart is tolerated, data is bus idle level
        i2c.regs.nack_read_addresses(1);
        let mut buf = [0u8; 1];
        i2c.read_bytes(RTC, RegisterAddress::Eight(0), &mut buf).unwrap();
        assert_eq!(buf, [0xFF]);

        i2c.set_policies(Policies {
            read_data: StartPolicy::Strict,
            ..Policies::compat()
        });
        i2c.regs.nack_read_addresses(1);
        assert_eq!(
            i2c.read_bytes(RTC, RegisterAddress::Eight(0), &mut buf),
            Err(Error::NoAcknowledge(NoAcknowledgeSource::Address))
        );

        i2c.read_bytes(RTC, RegisterAddress::Eight(0), &mut buf).unwrap();
        assert_eq!(buf, [0x11]);
    }

    #[test]
    fn test_read_vec_capacity() {
        let mut i2c = bus();
        i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0x20), &[4, 5, 6]).unwrap();
        let data: heapless::Vec<u8, 4> = i2c
            .read_vec(EEPROM, RegisterAddress::Sixteen(0x20), 3)
            .unwrap();
        assert_eq!(&data[..], &[4, 5, 6]);
        assert_eq!(
            i2c.read_vec::<2>(EEPROM, RegisterAddress::Sixteen(0x20), 3),
            Err(Error::Invalid)
        );
    }

    #[test]
    fn test_timeout_when_core_wedges_mid_transfer() {
        let mut i2c = bus();
        i2c.regs.wedge();
        assert_eq!(
            i2c.write_bytes(EEPROM, RegisterAddress::Sixteen(0), &[1]),
            Err(Error::Timeout)
        );
    }
}
