pub mod adb;
pub mod driver;

pub use adb::Device;
pub use driver::AndroidDriver;
