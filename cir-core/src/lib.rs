//! Ядро cirlog
//!
//! Чтение памяти аккумулятора DW1000 ограниченными порциями, фиксированный
//! бинарный формат записи CIR и разбор принятых кадров.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use cir_core::{save_record, capture_file_name};
//! use cir_types::CirBuffer;
//!
//! let cir = CirBuffer::new(1016)?;
//! let path = capture_file_name("hallway", 42);
//! let written = save_record(&path, 42, 0xFF_FFFF_FFFF, &cir)?;
//! assert_eq!(written, 12 + 4 * 1016);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accumulator;
pub mod binary;
pub mod format;
pub mod frame;
pub mod serialization;
pub mod wait;

pub use accumulator::*;
pub use binary::*;
pub use format::*;
pub use frame::*;
pub use serialization::*;
pub use wait::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
