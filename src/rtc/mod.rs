// Licensed under the Apache-2.0 license

//! Real-time clock support: BCD helpers and the PCF8563 driver.

pub mod bcd;
pub mod pcf8563;

pub use bcd::{from_bcd, to_bcd};
pub use pcf8563::{decode_time_record, encode_time_record, Pcf8563, TimeRecord, TimeRegisters};
