//! Граница между логикой cirlog и драйвером DW1000.
//!
//! Сам драйвер (SPI, регистры, микрокод LDE) сюда не входит: устройство
//! описывается трейтом [`UwbDevice`], а для тестов и отладки без железа есть
//! [`SimulatedDevice`].

pub mod bringup;
pub mod device;
#[cfg(feature = "sim")]
pub mod sim;

pub use bringup::*;
pub use device::*;
#[cfg(feature = "sim")]
pub use sim::*;
