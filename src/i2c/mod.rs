// Licensed under the Apache-2.0 license

//! I2C master driver for the OpenCores-style byte-command controller.
//!
//! Layers, bottom up: the register bank ([`registers`]), wait strategies
//! ([`wait`]), single-command bus primitives ([`ocores`]), register-addressed
//! transactions ([`transaction`]) and the embedded-hal facing controller
//! ([`i2c_controller`]).

pub mod common;
pub mod hardware_instantiation;
pub mod i2c_controller;
pub mod master;
pub mod ocores;
pub mod registers;
pub mod shared;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod traits;
pub mod transaction;
pub mod wait;

pub use common::{AckPolicy, Error, I2cConfig, I2cConfigBuilder, I2cSpeed, Policies, StartPolicy};
pub use i2c_controller::I2cController;
pub use ocores::{OcoresI2c, ReadCommand};
pub use registers::{Mmio, Register, RegisterBlock};
pub use shared::SharedI2c;
pub use traits::{I2cHardwareCore, I2cMaster, RegisterTransfer};
pub use transaction::{AddressWidth, DeviceAddress, RegisterAddress};
pub use wait::{DelayTimeout, PollWait, SpinLimit, Unbounded};
