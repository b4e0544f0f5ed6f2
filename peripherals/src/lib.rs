pub mod aht20;
pub mod fade;
pub mod hd44780;
pub mod host;
#[cfg(feature = "rpi")]
pub mod rpi;
