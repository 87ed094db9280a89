// Licensed under the Apache-2.0 license

//! # Hardware instantiation
//!
//! The SoC has a single I2C master core at [`I2C_BASE_ADDR`]. Handing out more
//! than one driver for it would let two owners interleave commands on the same
//! register bank, so [`instantiate_hardware`] succeeds at most once per boot.
//!
//! ```rust,ignore
//! use ocores_ddk::i2c::hardware_instantiation::instantiate_hardware;
//! use ocores_ddk::i2c::I2cConfig;
//!
//! let mut i2c = instantiate_hardware(I2cConfig::default())?.ok_or(Error::Invalid)?;
//! i2c.write(0x50, &[0x00, 0x10, 0xAA])?;
//!
//! // Later calls get nothing.
//! assert!(instantiate_hardware(I2cConfig::default())?.is_none());
//! ```
//!
//! ## Thread Safety
//!
//! The claim flag is guarded by a critical section. The returned controller
//! itself is not; wrap it in [`SharedI2c`](crate::i2c::shared::SharedI2c) to
//! use it from interrupt handlers as well as the main loop.

use crate::common::NoOpLogger;
use crate::i2c::common::{Error, I2cConfig};
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::ocores::OcoresI2c;
use crate::i2c::registers::{Mmio, I2C_BASE_ADDR};
use crate::i2c::wait::Unbounded;
use core::cell::Cell;
use critical_section::Mutex;

/// Bus driver over the memory-mapped core, without logging.
pub type OcoresI2cNoLog = OcoresI2c<Mmio, Unbounded, NoOpLogger>;

/// Controller type returned by [`instantiate_hardware`].
pub type I2cControllerNoLog = I2cController<OcoresI2cNoLog, NoOpLogger>;

static CLAIMED: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// Mark the core as owned. Returns false if it already was.
fn claim() -> bool {
    critical_section::with(|cs| !CLAIMED.borrow(cs).replace(true))
}

/// Create and configure the controller for the on-chip I2C core.
///
/// Returns `Ok(None)` if the controller was already handed out.
///
/// # Errors
///
/// `Error::Invalid` if `config` asks for a bus speed the input clock cannot
/// produce. The core is not claimed in that case, so a corrected retry works.
pub fn instantiate_hardware(config: I2cConfig) -> Result<Option<I2cControllerNoLog>, Error> {
    config.prescaler()?;
    if !claim() {
        return Ok(None);
    }
    // SAFETY: I2C_BASE_ADDR is the core's register bank and `claim` makes
    // this the only handle to it.
    let regs = unsafe { Mmio::new(I2C_BASE_ADDR) };
    let hardware = OcoresI2c::new(regs, Unbounded, NoOpLogger);
    I2cController::new(hardware, config, NoOpLogger).map(Some)
}
