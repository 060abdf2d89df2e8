use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use cir_core::{poll_until, HeadcountFrame, PollOutcome, RadarFrame, FRAME_LEN};
use cir_hal::{bring_up, LoadMode, UwbDevice};
use cir_types::{CirError, CirResult, SysStatus};
use log::{debug, info};

use crate::{BeaconConfig, BeaconMode, BeaconResult};

/// Светодиоды, включаемые передатчиком.
pub const BEACON_LEDS: u8 = 0b0000_0011;

/// Итог сессии передачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeaconSummary {
    pub frames_sent: u32,
    /// Метка времени передачи последнего кадра (40 бит)
    pub last_tx_timestamp: Option<u64>,
}

/// Сессия передачи (single-threaded).
pub struct BeaconSession {
    config: BeaconConfig,
    stop_flag: Arc<AtomicBool>,
}

impl BeaconSession {
    /// Создаёт сессию, проверяя конфигурацию.
    pub fn new(config: BeaconConfig) -> BeaconResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Передаёт кадры до лимита или stop_flag.
    ///
    /// Кадр, передача которого не завершилась за `tx_timeout`, прерывает
    /// сессию с [`CirError::WaitTimeout`].
    pub fn run(
        self,
        device: &mut dyn UwbDevice,
    ) -> BeaconResult<BeaconSummary> {
        let cfg = &self.config;

        bring_up(device, &cfg.radio, LoadMode::None)?;
        device.set_leds(BEACON_LEDS)?;

        match &cfg.mode {
            BeaconMode::Radar { experiment } => {
                info!("Starting test {experiment} with {}", describe_count(cfg.count))
            }
            BeaconMode::Headcount => info!("Headcount beacon, {}", describe_count(cfg.count)),
        }

        let mut summary = BeaconSummary::default();
        let mut sequence: u8 = 0;
        let mut frame_count: i32 = 0;

        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop signal received. Stopping...");
                break;
            }

            frame_count = frame_count.wrapping_add(1);

            if let Some(max) = cfg.count {
                if frame_count as u32 > max {
                    break;
                }
            }

            sequence = sequence.wrapping_add(1);

            let frame = match cfg.mode {
                BeaconMode::Radar { .. } => RadarFrame {
                    sequence,
                    frame_count,
                }
                .encode()?,
                BeaconMode::Headcount => HeadcountFrame {
                    sequence,
                    unix_secs: unix_now(),
                }
                .encode()?,
            };

            let tx_ts = send_frame(device, &frame, cfg.tx_timeout)?;

            summary.frames_sent += 1;
            summary.last_tx_timestamp = Some(tx_ts);

            match cfg.mode {
                BeaconMode::Radar { .. } => info!("MSG {frame_count} sent"),
                BeaconMode::Headcount => info!("{sequence} MSG SENT! Time: {}", unix_now()),
            }
            debug!("TX timestamp 0x{tx_ts:010X}");

            let more = cfg.count.map_or(true, |max| (frame_count as u32) < max);
            if more && !cfg.interval.is_zero() {
                std::thread::sleep(cfg.interval);
            }
        }

        Ok(summary)
    }
}

/// Передаёт один кадр и ждёт TXFRS. Возвращает метку времени передачи.
pub fn send_frame(
    device: &mut dyn UwbDevice,
    frame: &[u8; FRAME_LEN],
    timeout: Option<Duration>,
) -> CirResult<u64> {
    device.write_tx_data(frame, 0)?;
    device.write_tx_fctrl(FRAME_LEN, 0, false)?;
    device.start_tx()?;

    let outcome = poll_until(timeout, || {
        let status = device.read_status()?;
        Ok(status.intersects(SysStatus::TXFRS).then_some(()))
    })?;

    if let PollOutcome::TimedOut { waited } = outcome {
        device.force_trx_off()?;
        return Err(CirError::WaitTimeout {
            waited_ms: waited.as_millis() as u64,
        });
    }

    device.clear_status(SysStatus::TXFRS)?;

    device.tx_timestamp_u64()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn describe_count(count: Option<u32>) -> String {
    match count {
        Some(n) => format!("{n} transmissions"),
        None => "infinite transmissions".to_string(),
    }
}
