//! Пример: чтение файла CIR
//!
//! Демонстрирует:
//! - загрузку записи с определением числа выборок по размеру файла
//! - поиск самого мощного отвода
//!
//! Запуск: `cargo run -p cir-core --example inspect_capture -- run_1_cir.bin`

use std::path::PathBuf;

use cir_core::load_record;
use cir_types::CirBuffer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("example_1_cir.bin"));

    let rec = match load_record(&input_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("✗ {input_path:?}: {e}");
            return Err(Box::new(e));
        }
    };

    println!("✓ Record loaded");
    println!("  Frame number : {}", rec.frame_number);
    println!("  RX timestamp : {} (0x{:010X})", rec.rx_timestamp, rec.timestamp_40());
    println!("  Samples      : {}", rec.sample_count());

    let cir = CirBuffer::from_samples(&rec.samples);
    if let Some((idx, s)) = cir.peak() {
        println!("  Peak         : #{idx} ({}, {}) power={}", s.real, s.imag, s.power());
    }

    println!("\nFirst taps:");
    for (i, s) in rec.samples.iter().take(3).enumerate() {
        println!("  [{i}] {:>6} {:>6}", s.real, s.imag);
    }

    Ok(())
}
