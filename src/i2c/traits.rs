// Licensed under the Apache-2.0 license

//! # I2C Hardware Abstraction Traits
//!
//! Small traits, each with one responsibility, composed into the full
//! controller interface.
//!
//! ```text
//! I2cHardwareCore (clocking, bus state)
//!     └── I2cMaster (embedded-hal style transfers by 7-bit address)
//! RegisterTransfer (register-addressed transfers, used by device drivers)
//! ```

use crate::i2c::common::I2cConfig;
use crate::i2c::transaction::{DeviceAddress, RegisterAddress};
use embedded_hal::i2c::{AddressMode, Operation, SevenBitAddress};

/// Core I2C hardware interface providing basic operations
///
/// This is the foundation trait that all I2C hardware implementations must provide.
///
/// # Examples
///
/// ```rust,no_run
/// use ocores_ddk::i2c::{I2cConfigBuilder, I2cHardwareCore, I2cSpeed};
///
/// fn setup_i2c<T: I2cHardwareCore>(controller: &mut T) -> Result<u16, T::Error> {
///     let config = I2cConfigBuilder::new().speed(I2cSpeed::Fast).build();
///     controller.init(&config)
/// }
/// ```
pub trait I2cHardwareCore {
    /// Hardware-specific error type that implements embedded-hal error traits
    type Error: embedded_hal::i2c::Error + core::fmt::Debug;

    /// Program clocking and enable the controller.
    ///
    /// Returns the clock divider written to hardware.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested bus speed cannot be derived from the
    /// input clock.
    fn init(&mut self, config: &I2cConfig) -> Result<u16, Self::Error>;

    /// Whether a transfer currently owns the bus.
    fn is_busy(&mut self) -> bool;
}

/// I2C Master mode operations
///
/// The address type `A` must implement `AddressMode` to ensure compatibility
/// with embedded-hal.
pub trait I2cMaster<A: AddressMode = SevenBitAddress>: I2cHardwareCore {
    /// Write data to a target device at the given address
    ///
    /// # Errors
    ///
    /// Returns an error if the configured policies escalate a missing
    /// acknowledgement, or a bounded wait gives up.
    fn write(&mut self, addr: A, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a target device at the given address
    ///
    /// # Errors
    ///
    /// As [`write`](Self::write).
    fn read(&mut self, addr: A, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read with a repeated start between the two.
    ///
    /// # Errors
    ///
    /// As [`write`](Self::write).
    fn write_read(&mut self, addr: A, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Execute a sequence of I2C operations as a single transaction
    ///
    /// # Errors
    ///
    /// Returns an error if any operation in the sequence fails. The bus is
    /// released before the error is returned.
    fn transaction_slice(
        &mut self,
        addr: A,
        ops_slice: &mut [Operation<'_>],
    ) -> Result<(), Self::Error>;
}

/// Transfers to or from a target's internal register space.
///
/// Device drivers are written against this trait so they run unchanged on
/// the bare controller, a wrapped controller, or a lock-protected shared bus.
pub trait RegisterTransfer {
    type Error: core::fmt::Debug;

    /// # Errors
    ///
    /// Bus error of the implementation.
    fn write_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Bus error of the implementation.
    fn read_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error>;
}

impl<T: RegisterTransfer + ?Sized> RegisterTransfer for &mut T {
    type Error = T::Error;

    fn write_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        (**self).write_bytes(device, register, payload)
    }

    fn read_bytes(
        &mut self,
        device: DeviceAddress,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).read_bytes(device, register, buffer)
    }
}
