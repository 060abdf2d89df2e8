use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use clap::Parser;
use cir_core::{record_size, CirWindow};
use cir_hal::{create_device, DeviceKind};
use cir_recorder::{CaptureConfig, CapturePipeline, RecorderError, DEFAULT_RX_TIMEOUT};
use cir_types::RadioConfig;
use log::{error, info, warn, LevelFilter};

#[derive(Parser, Debug)]
#[command(
    name = "cir-recorder",
    version = env!("CARGO_PKG_VERSION"),
    about = "Record DW1000 channel impulse responses, one file per received frame",
    long_about = None,
)]
struct Cli {
    /// Имя эксперимента (префикс файлов `<EXPERIMENT>_<frame>_cir.bin`)
    experiment: String,
    /// Сколько записей сделать (> 0). По умолчанию: до Ctrl+C
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    max_captures: Option<u32>,
    /// Устройство: sim, dw1000
    #[arg(short, long, default_value = "sim")]
    device: String,
    /// Каталог для файлов
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    /// Таймаут ожидания кадра, мс (0 = ждать бесконечно)
    #[arg(long, default_value_t = (DEFAULT_RX_TIMEOUT.as_millis() as u64))]
    rx_timeout_ms: u64,
    /// Сохранять окно, начинающееся за N выборок до первого пути
    #[arg(long, value_name = "N")]
    around_first_path: Option<usize>,
    /// Выборок в записи. По умолчанию: вся глубина аккумулятора
    #[arg(long, value_name = "N")]
    cir_samples: Option<usize>,
    /// JSON с параметрами радио
    #[arg(long, value_name = "FILE")]
    radio_config: Option<PathBuf>,
    /// Тихий режим (только ошибки)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Подробный вывод (каждый кадр)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (_, true) => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let device_kind: DeviceKind = match cli.device.parse() {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let radio = match &cli.radio_config {
        Some(path) => match RadioConfig::from_json_file(path) {
            Ok(r) => r,
            Err(e) => {
                error!("--radio-config: {e}");
                std::process::exit(1);
            }
        },
        None => RadioConfig::default(),
    };

    let config = CaptureConfig {
        device: device_kind,
        experiment: cli.experiment.clone(),
        output_dir: cli.output_dir.clone(),
        max_captures: cli.max_captures,
        radio,
        cir_samples: cli.cir_samples,
        rx_timeout: (cli.rx_timeout_ms > 0).then(|| Duration::from_millis(cli.rx_timeout_ms)),
        window: cli
            .around_first_path
            .map_or(CirWindow::Full, |before| CirWindow::AroundFirstPath { before }),
        ..CaptureConfig::default()
    };

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    let mut device = match create_device(&config.device).map_err(RecorderError::DeviceNotFound) {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    // Выводим конфигурацию
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Device        : {}", config.device);
    info!("  Radio         : {}", config.radio);
    info!(
        "  Record        : {} samples ({} B)",
        config.sample_count(),
        record_size(config.sample_count())
    );
    info!("  Window        : {:?}", config.window);
    info!("  RX timeout    : {:?}", config.rx_timeout);
    info!("  Output        : {:?}", config.output_dir);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (pipeline, metrics) = CapturePipeline::new(config);
    let stop_flag: Arc<AtomicBool> = pipeline.stop_flag();
    let stop_ctrlc = stop_flag.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C: принудительный выход
            warn!("Force exit");
            std::process::exit(130);
        }
        warn!("Ctrl+C received, finishing current capture...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    let session_start = Instant::now();

    let captured = match pipeline.run(device.as_mut()) {
        Ok(n) => n,
        Err(e) => {
            error!("Capture failed: {e}");
            std::process::exit(1);
        }
    };

    // --- Итоговая статистика ---
    let summary = metrics.summary(&session_start);
    info!("\n{summary}");

    if summary.write_errors > 0 {
        warn!(
            "⚠ {} records could not be saved. Check the output directory and disk space.",
            summary.write_errors
        );
    }

    info!("✓ Capture complete: {captured} records in {:?}", cli.output_dir);
}
