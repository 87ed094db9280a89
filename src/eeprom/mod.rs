// Licensed under the Apache-2.0 license

pub mod at24c64;

pub use at24c64::At24c64;
