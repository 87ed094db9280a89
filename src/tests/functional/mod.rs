// Licensed under the Apache-2.0 license

//! On-target checks that print their progress to a console.

pub mod i2c_test;
