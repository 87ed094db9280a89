// Licensed under the Apache-2.0 license

//! Bus sharing between execution contexts.
//!
//! The controller has one command register and one status register, so two
//! transactions must never interleave. [`SharedI2c`] runs each whole
//! transaction, start to stop, inside a single critical section.

use crate::i2c::traits::RegisterTransfer;
use crate::i2c::transaction::{DeviceAddress, RegisterAddress};
use core::cell::RefCell;
use critical_section::Mutex;

pub struct SharedI2c<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> SharedI2c<T> {
    pub const fn new(bus: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bus)),
        }
    }

    /// Run `f` with exclusive access to the bus.
    ///
    /// Interrupts stay masked for the duration, so keep `f` to one
    /// transaction. Calling `lock` again from inside `f` panics.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

impl<T: RegisterTransfer> RegisterTransfer for &SharedI2c<T> {
    type Error = T::Error;

    fn write_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        self.lock(|bus| bus.write_bytes(device, register, payload))
    }

    fn read_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.lock(|bus| bus.read_bytes(device, register, buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NoOpLogger;
    use crate::i2c::common::I2cConfig;
    use crate::i2c::ocores::OcoresI2c;
    use crate::i2c::sim::{BusEvent, SimController};
    use crate::i2c::transaction::AddressWidth;
    use crate::i2c::wait::SpinLimit;

    fn shared() -> SharedI2c<OcoresI2c<SimController, SpinLimit, NoOpLogger>> {
        let mut bus = OcoresI2c::new(SimController::new(), SpinLimit::new(1_000), NoOpLogger);
        bus.configure(&I2cConfig::default()).unwrap();
        SharedI2c::new(bus)
    }

    #[test]
    fn test_shared_round_trip() {
        let bus = shared();
        let mut handle = &bus;
        let eeprom = DeviceAddress::from_base(0xA0);
        let register = RegisterAddress::new(AddressWidth::Sixteen, 0x0040).unwrap();
        handle.write_bytes(eeprom, register, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        handle.read_bytes(eeprom, register, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_transactions_do_not_interleave() {
        let bus = shared();
        std::thread::scope(|s| {
            for id in 0..4u8 {
                let bus = &bus;
                s.spawn(move || {
                    let mut handle = bus;
                    let rtc = DeviceAddress::from_base(0xA2);
                    for _ in 0..10 {
                        let register = RegisterAddress::new(AddressWidth::Eight, 0x08).unwrap();
                        handle.write_bytes(rtc, register, &[id, id]).unwrap();
                    }
                });
            }
        });
        let sim = bus.into_inner().release();
        // every start is followed by its own three writes and a stop
        let trace = sim.trace();
        assert_eq!(trace.len(), 4 * 10 * 5);
        for chunk in trace.chunks(5) {
            assert!(matches!(chunk[0], BusEvent::Start { address: 0xA2, .. }));
            assert_eq!(chunk[4], BusEvent::Stop);
            match (chunk[2], chunk[3]) {
                (BusEvent::Write { value: a, .. }, BusEvent::Write { value: b, .. }) => {
                    assert_eq!(a, b);
                }
                other => panic!("unexpected events {other:?}"),
            }
        }
    }
}
