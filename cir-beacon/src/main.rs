use std::{
    path::PathBuf,
    sync::atomic::Ordering,
    time::Duration,
};

use clap::{Parser, Subcommand};
use cir_beacon::{BeaconConfig, BeaconError, BeaconSession};
use cir_hal::{create_device, DeviceKind};
use cir_types::RadioConfig;
use log::{error, info, warn, LevelFilter};

#[derive(Parser, Debug)]
#[command(
    name = "cir-beacon",
    version = env!("CARGO_PKG_VERSION"),
    about = "DW1000 test transmitters: radar frames for the CIR recorder and a headcount beacon",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
    /// Устройство: sim, dw1000
    #[arg(short, long, default_value = "sim", global = true)]
    device: String,
    /// Сколько ждать окончания передачи, мс (0 = бесконечно)
    #[arg(long, default_value_t = 1000, global = true)]
    tx_timeout_ms: u64,
    /// JSON с параметрами радио
    #[arg(long, value_name = "FILE", global = true)]
    radio_config: Option<PathBuf>,
    /// Тихий режим (только ошибки)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Подробный вывод
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Кадры с растущим счётчиком
    Radar {
        /// Имя эксперимента
        experiment: String,
        /// Сколько кадров отправить (> 0). По умолчанию: до Ctrl+C
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        max_frames: Option<u32>,
        /// Пауза между кадрами, мс
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },
    /// Кадры с Unix-временем (канал 2)
    Headcount {
        /// Сколько кадров отправить
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        /// Пауза между кадрами, мс
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
    },
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

    let mut config = match cli.mode {
        Mode::Radar {
            experiment,
            max_frames,
            interval_ms,
        } => BeaconConfig {
            count: max_frames,
            interval: Duration::from_millis(interval_ms),
            ..BeaconConfig::radar(experiment)
        },
        Mode::Headcount { count, interval_ms } => BeaconConfig {
            count: Some(count),
            interval: Duration::from_millis(interval_ms),
            ..BeaconConfig::headcount()
        },
    };

    config.device = device_kind;
    config.tx_timeout = (cli.tx_timeout_ms > 0).then(|| Duration::from_millis(cli.tx_timeout_ms));

    if let Some(path) = &cli.radio_config {
        config.radio = match RadioConfig::from_json_file(path) {
            Ok(r) => r,
            Err(e) => {
                error!("--radio-config: {e}");
                std::process::exit(1);
            }
        };
    }

    let mut device = match create_device(&config.device).map_err(BeaconError::DeviceNotFound) {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!("Device: {}, radio: {}", config.device, config.radio);

    let session = match BeaconSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let stop_ctrlc = session.stop_flag();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            warn!("Force exit");
            std::process::exit(130);
        }
        warn!("Ctrl+C received, stopping after the current frame...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    match session.run(device.as_mut()) {
        Ok(summary) => info!("✓ {} frames sent", summary.frames_sent),
        Err(e) => {
            error!("Transmission failed: {e}");
            std::process::exit(1);
        }
    }
}
