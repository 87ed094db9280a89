// Licensed under the Apache-2.0 license

//! Packed BCD conversion.

/// Binary to packed BCD.
///
/// Values above 99 do not fit two digits; the tens digit overflows the high
/// nibble and the result is meaningless. Range checks belong to the caller.
#[must_use]
pub fn to_bcd(mut value: u8) -> u8 {
    let mut tens: u8 = 0;
    while value >= 10 {
        tens += 1;
        value -= 10;
    }
    (tens << 4) | value
}

/// Packed BCD to binary, keeping only the bits in `mask`.
///
/// The mask strips flag bits that share a register with the digits, such as
/// the century flag in the month register.
#[must_use]
pub const fn from_bcd(value: u8, mask: u8) -> u8 {
    let tens = (value & mask & 0xF0) >> 4;
    tens * 10 + (value & mask & 0x0F)
}
