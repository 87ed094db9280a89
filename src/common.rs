// Licensed under the Apache-2.0 license

//! Shared logging seam.
//!
//! Drivers take a `L: Logger` type parameter so diagnostics can be routed to a
//! console on target or dropped entirely, without the driver knowing which.

use embedded_io::Write;

pub trait Logger {
    fn debug(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

/// Logger writing one line per message to a byte sink such as a UART.
///
/// Write failures are swallowed: a broken console must never stall the bus.
pub struct UartLogger<W: Write> {
    writer: W,
}

impl<W: Write> UartLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give the sink back.
    pub fn release(self) -> W {
        self.writer
    }

    fn line(&mut self, msg: &str) {
        let _ = self.writer.write_all(msg.as_bytes());
        let _ = self.writer.write_all(b"\n");
    }
}

impl<W: Write> Logger for UartLogger<W> {
    fn debug(&mut self, msg: &str) {
        self.line(msg);
    }

    fn error(&mut self, msg: &str) {
        self.line(msg);
    }
}

impl<L: Logger + ?Sized> Logger for &mut L {
    fn debug(&mut self, msg: &str) {
        (**self).debug(msg);
    }

    fn error(&mut self, msg: &str) {
        (**self).error(msg);
    }
}

/// Error from a device driver layered on a bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceError<E> {
    /// The underlying bus transfer failed.
    Bus(E),
    /// An address, length or field value the device cannot hold.
    OutOfRange,
}
