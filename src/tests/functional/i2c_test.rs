// Licensed under the Apache-2.0 license

use crate::eeprom::At24c64;
use crate::i2c::traits::RegisterTransfer;
use crate::rtc::{Pcf8563, TimeRecord};
use embedded_io::Write;

pub const TEST_NUM: usize = 20;

const REFERENCE_TIME: TimeRecord = TimeRecord {
    second: 51,
    minute: 30,
    hour: 18,
    day: 7,
    weekday: 3,
    month: 8,
    year: 24,
    century: false,
};

/// Exercise the EEPROM and RTC on `bus`, reporting to `uart`.
///
/// The bus must already be configured. Returns true if every check passed.
/// Console write errors are ignored.
pub fn run_i2c_tests<W: Write, B: RegisterTransfer>(uart: &mut W, mut bus: B) -> bool {
    let _ = writeln!(uart, "i2c test\r");
    let mut passed = test_eeprom_page(uart, &mut bus);
    passed &= test_rtc_time(uart, &mut bus);
    let _ = writeln!(uart, "test done\r");
    passed
}

fn test_eeprom_page<W: Write, B: RegisterTransfer>(uart: &mut W, bus: &mut B) -> bool {
    let mut eeprom = At24c64::new(bus);

    let mut reference = [0u8; TEST_NUM];
    for (value, slot) in (0u8..).zip(reference.iter_mut()) {
        *slot = value;
    }

    if let Err(e) = eeprom.write(0, &reference) {
        let _ = writeln!(uart, "AT24C64 write error: {e:?}\r");
        return false;
    }
    let _ = writeln!(uart, "AT24C64 wr page done\r");

    let mut readback = [0u8; TEST_NUM];
    if let Err(e) = eeprom.read(0, &mut readback) {
        let _ = writeln!(uart, "AT24C64 read error: {e:?}\r");
        return false;
    }

    let mut passed = true;
    for (recv, expt) in readback.iter().zip(reference.iter()) {
        let _ = writeln!(uart, "recv: {recv} expt: {expt}\r");
        if recv != expt {
            let _ = writeln!(uart, "test fail\r");
            passed = false;
        }
    }
    let _ = writeln!(uart, "AT24C64 rd page done\r");
    passed
}

fn test_rtc_time<W: Write, B: RegisterTransfer>(uart: &mut W, bus: &mut B) -> bool {
    let mut rtc = Pcf8563::new(bus);

    if let Err(e) = rtc.set_time(&REFERENCE_TIME) {
        let _ = writeln!(uart, "PCF8563B write error: {e:?}\r");
        return false;
    }
    let _ = writeln!(uart, "PCF8563B wr done\r");

    let time = match rtc.time() {
        Ok(time) => time,
        Err(e) => {
            let _ = writeln!(uart, "PCF8563B read error: {e:?}\r");
            return false;
        }
    };
    let _ = writeln!(
        uart,
        "20{:02}-{:02}-{:02} {:02}:{:02}:{:02} weekday {}\r",
        time.year, time.month, time.day, time.hour, time.minute, time.second, time.weekday
    );

    // the clock may have ticked between write and read
    let passed = time.year == REFERENCE_TIME.year
        && time.month == REFERENCE_TIME.month
        && time.day == REFERENCE_TIME.day
        && time.weekday == REFERENCE_TIME.weekday
        && time.hour == REFERENCE_TIME.hour
        && time.minute == REFERENCE_TIME.minute
        && time.second >= REFERENCE_TIME.second;
    if !passed {
        let _ = writeln!(uart, "test fail\r");
    }
    let _ = writeln!(uart, "PCF8563B rd done\r");
    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NoOpLogger;
    use crate::i2c::common::{I2cConfig, Policies};
    use crate::i2c::ocores::OcoresI2c;
    use crate::i2c::sim::SimController;
    use crate::i2c::wait::SpinLimit;
    use std::string::String;

    #[derive(Default)]
    struct Console {
        text: String,
    }

    impl embedded_io::ErrorType for Console {
        type Error = core::convert::Infallible;
    }

    impl Write for Console {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.text.push_str(core::str::from_utf8(buf).unwrap());
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn bus(sim: SimController) -> OcoresI2c<SimController, SpinLimit, NoOpLogger> {
        let mut i2c = OcoresI2c::new(sim, SpinLimit::new(1_000), NoOpLogger);
        i2c.configure(&I2cConfig::default()).unwrap();
        i2c
    }

    #[test]
    fn test_harness_passes_on_sim() {
        let mut console = Console::default();
        let mut i2c = bus(SimController::new());
        assert!(run_i2c_tests(&mut console, &mut i2c));
        assert!(console.text.contains("recv: 19 expt: 19"));
        assert!(console.text.contains("2024-08-07 18:30:51 weekday 3"));
        assert!(!console.text.contains("test fail"));
        assert!(console.text.ends_with("test done\r\n"));
    }

    #[test]
    fn test_harness_reports_missing_devices() {
        let mut console = Console::default();
        let mut i2c = bus(SimController::empty());
        i2c.set_policies(Policies::strict());
        assert!(!run_i2c_tests(&mut console, &mut i2c));
        assert!(console.text.contains("AT24C64 write error"));
        assert!(console.text.contains("PCF8563B write error"));
        assert!(console.text.ends_with("test done\r\n"));
    }
}
