// Licensed under the Apache-2.0 license

//! Wait strategies for status polling.
//!
//! Every wait in the driver is a poll of the status register. The strategy
//! decides how long to keep polling: production firmware spins forever like
//! the hardware reference does, host tests bound the loop so a wedged
//! simulation fails instead of hanging.

use crate::i2c::common::Error;
use embedded_hal::delay::DelayNs;
use fugit::MicrosDurationU32;

pub trait PollWait {
    /// Call `poll` until it stops returning `WouldBlock`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `poll`; bounded strategies return
    /// `Error::Timeout` when they give up.
    fn block<T, F>(&mut self, poll: F) -> Result<T, Error>
    where
        F: FnMut() -> nb::Result<T, Error>;
}

impl<W: PollWait + ?Sized> PollWait for &mut W {
    fn block<T, F>(&mut self, poll: F) -> Result<T, Error>
    where
        F: FnMut() -> nb::Result<T, Error>,
    {
        (**self).block(poll)
    }
}

/// Spin until the condition holds. Never times out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl PollWait for Unbounded {
    fn block<T, F>(&mut self, mut poll: F) -> Result<T, Error>
    where
        F: FnMut() -> nb::Result<T, Error>,
    {
        loop {
            match poll() {
                Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
                Err(nb::Error::Other(e)) => return Err(e),
                Ok(v) => return Ok(v),
            }
        }
    }
}

/// Spin at most `max_polls` times.
#[derive(Clone, Copy, Debug)]
pub struct SpinLimit {
    pub max_polls: u32,
}

impl SpinLimit {
    #[must_use]
    pub const fn new(max_polls: u32) -> Self {
        Self { max_polls }
    }
}

impl PollWait for SpinLimit {
    fn block<T, F>(&mut self, mut poll: F) -> Result<T, Error>
    where
        F: FnMut() -> nb::Result<T, Error>,
    {
        for _ in 0..self.max_polls {
            match poll() {
                Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
                Err(nb::Error::Other(e)) => return Err(e),
                Ok(v) => return Ok(v),
            }
        }
        Err(Error::Timeout)
    }
}

/// Sleep `step` between polls and give up once `timeout` has elapsed.
pub struct DelayTimeout<D: DelayNs> {
    delay: D,
    step: MicrosDurationU32,
    timeout: MicrosDurationU32,
}

impl<D: DelayNs> DelayTimeout<D> {
    pub fn new(delay: D, step: MicrosDurationU32, timeout: MicrosDurationU32) -> Self {
        Self {
            delay,
            step,
            timeout,
        }
    }
}

impl<D: DelayNs> PollWait for DelayTimeout<D> {
    fn block<T, F>(&mut self, mut poll: F) -> Result<T, Error>
    where
        F: FnMut() -> nb::Result<T, Error>,
    {
        let step = self.step.to_micros().max(1);
        let mut waited: u32 = 0;
        loop {
            match poll() {
                Err(nb::Error::Other(e)) => return Err(e),
                Ok(v) => return Ok(v),
                Err(nb::Error::WouldBlock) => {}
            }
            if waited >= self.timeout.to_micros() {
                return Err(Error::Timeout);
            }
            self.delay.delay_us(step);
            waited = waited.saturating_add(step);
        }
    }
}
