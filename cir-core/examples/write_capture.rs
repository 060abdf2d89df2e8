//! Пример: запись файла CIR с синтетическими выборками
//!
//! Демонстрирует:
//! - выделение CirBuffer под 1016 выборок (PRF 64 МГц)
//! - заполнение затухающим импульсом
//! - сохранение записи и проверку размера файла

use std::path::Path;

use cir_core::{capture_path, record_size, save_record};
use cir_types::{CirBuffer, CirSample, CIR_SAMPLES_PRF64};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let first_path = 740;

    // --- Синтетическая CIR: импульс на первом пути, затухание ×0.7 ---
    let samples: Vec<CirSample> = (0..CIR_SAMPLES_PRF64)
        .map(|i| {
            if i < first_path {
                return CirSample::new(0, 0);
            }
            let amp = 12_000.0 * 0.7_f64.powi((i - first_path) as i32);
            CirSample::new(amp as i16, (amp / 3.0) as i16)
        })
        .collect();
    let cir = CirBuffer::from_samples(&samples);

    let path = capture_path(Path::new("."), "example", 1);
    let written = save_record(&path, 1, 0x00_1234_5678, &cir)?;

    println!("✓ Записано: {path:?}");
    println!("  Bytes    : {written} (expected {})", record_size(CIR_SAMPLES_PRF64));

    Ok(())
}
