use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use cir_core::{
    capture_path, poll_until, save_record, AccumulatorReader, PollOutcome, RadarFrame, RX_BUF_LEN,
    RX_FINFO_RXFL_MASK_1023,
};
use cir_hal::{bring_up, LoadMode, UwbDevice};
use cir_types::{CirBuffer, CirError, CirResult, SysStatus};
use log::{debug, info, log_enabled, warn, Level};

use crate::{metrics::CaptureMetrics, CaptureConfig, RecorderResult};

/// Чем закончилась одна попытка захвата.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Запись сохранена целиком
    Recorded {
        frame_number: i32,
        path: PathBuf,
        bytes: usize,
    },
    /// Кадр длиннее приёмного буфера, пропущен
    Oversized { len: usize },
    /// Приёмник сообщил об ошибке
    RxError(SysStatus),
    /// Кадр не пришёл за отведённое время
    TimedOut,
    /// Файл не создан или запись оборвалась
    WriteFailed { path: PathBuf, error: CirError },
}

/// Буферы, которыми владеет цикл захвата.
pub struct CaptureState {
    reader: AccumulatorReader,
    cir: CirBuffer,
    rx_buf: [u8; RX_BUF_LEN],
    captured: u32,
}

/// Оркестрирует сессию захвата.
pub struct CapturePipeline {
    config: CaptureConfig,
    metrics: Arc<CaptureMetrics>,
    stop_flag: Arc<AtomicBool>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CaptureState {
    /// Выделяет буфер выборок. Ошибка выделения фатальна для сессии.
    pub fn new(config: &CaptureConfig) -> CirResult<Self> {
        Ok(Self {
            reader: AccumulatorReader::new(config.chunk_limit)?,
            cir: CirBuffer::new(config.sample_count())?,
            rx_buf: [0u8; RX_BUF_LEN],
            captured: 0,
        })
    }

    /// Сколько записей сохранено.
    pub fn captured(&self) -> u32 {
        self.captured
    }
}

impl CapturePipeline {
    /// Создаёт пайплайн. Возвращает также shared-ссылку на метрики.
    pub fn new(config: CaptureConfig) -> (Self, Arc<CaptureMetrics>) {
        let metrics = CaptureMetrics::new();
        let p = Self {
            config,
            metrics: metrics.clone(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        };

        (p, metrics)
    }

    /// Флаг остановки. Установить в `true` для graceful shutdown.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Поднимает устройство и захватывает кадры до лимита или остановки.
    /// Возвращает число сохранённых записей.
    pub fn run(
        self,
        device: &mut dyn UwbDevice,
    ) -> RecorderResult<u32> {
        let cfg = &self.config;
        cfg.validate()?;

        bring_up(device, &cfg.radio, LoadMode::Ucode)?;

        let mut state = CaptureState::new(cfg)?;

        info!(
            "Capturing '{}' into {:?}: {} samples/record, window {:?}, limit {:?}",
            cfg.experiment,
            cfg.output_dir,
            cfg.sample_count(),
            cfg.window,
            cfg.max_captures
        );

        let session_start = Instant::now();

        loop {
            if let Some(max) = cfg.max_captures {
                if state.captured >= max {
                    info!("Capture limit reached ({max}). Stopping...");
                    break;
                }
            }

            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop signal received. Stopping...");
                break;
            }

            match self.capture_once(device, &mut state) {
                Ok(outcome) => self.account(&outcome, &session_start, state.captured),
                Err(e) if e.is_transient() => {
                    self.account_error(&e);

                    // приёмник мог остаться включённым
                    if let Err(reset) = device.force_trx_off().and_then(|_| device.rx_reset()) {
                        warn!("Receiver reset failed: {reset}");
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        device.force_trx_off()?;

        Ok(state.captured)
    }

    /// Одна попытка: включить приём, дождаться кадра, сохранить CIR.
    ///
    /// Устройство должно быть поднято через [`bring_up`] с микрокодом LDE.
    pub fn capture_once(
        &self,
        device: &mut dyn UwbDevice,
        state: &mut CaptureState,
    ) -> CirResult<CaptureOutcome> {
        let cfg = &self.config;

        state.rx_buf.fill(0);
        state.cir.clear();

        device.rx_enable()?;

        let waited = poll_until(cfg.rx_timeout, || {
            let status = device.read_status()?;
            Ok(status
                .intersects(SysStatus::RXFCG | SysStatus::ALL_RX_ERR)
                .then_some(status))
        })?;

        let status = match waited {
            PollOutcome::Ready(status) => status,
            PollOutcome::TimedOut { waited } => {
                debug!("No frame within {waited:?}");
                device.force_trx_off()?;
                device.rx_reset()?;
                return Ok(CaptureOutcome::TimedOut);
            }
        };

        if !status.intersects(SysStatus::RXFCG) {
            device.clear_status(SysStatus::ALL_RX_ERR)?;
            device.rx_reset()?;
            return Ok(CaptureOutcome::RxError(status & SysStatus::ALL_RX_ERR));
        }

        device.clear_status(SysStatus::RXFCG)?;

        let len = (device.read_rx_frame_info()? & RX_FINFO_RXFL_MASK_1023) as usize;
        if len > RX_BUF_LEN {
            return Ok(CaptureOutcome::Oversized { len });
        }

        device.read_rx_data(&mut state.rx_buf[..len], 0)?;
        let frame = RadarFrame::decode(&state.rx_buf[..len])?;

        let rx_timestamp = device.rx_timestamp_u64()?;

        let diagnostics = if cfg.window.needs_diagnostics() || log_enabled!(Level::Debug) {
            Some(device.read_diagnostics()?)
        } else {
            None
        };

        let first_sample = cfg.window.start_sample(
            diagnostics.as_ref(),
            state.cir.sample_count(),
            cfg.depth(),
        );

        state
            .reader
            .read_cir(device, first_sample, &mut state.cir)?;

        if let Some(diag) = &diagnostics {
            debug!(
                "Frame #{} seq={} fp={} fp_amp2={} noise={} window@{first_sample} peak={:?}",
                frame.frame_count,
                frame.sequence,
                diag.first_path_index(),
                diag.first_path_amp2,
                diag.std_noise,
                state.cir.peak()
            );
        }

        let path = capture_path(&cfg.output_dir, &cfg.experiment, frame.frame_count);

        match save_record(&path, frame.frame_count, rx_timestamp, &state.cir) {
            Ok(bytes) => {
                state.captured += 1;
                Ok(CaptureOutcome::Recorded {
                    frame_number: frame.frame_count,
                    path,
                    bytes,
                })
            }
            Err(error) => Ok(CaptureOutcome::WriteFailed { path, error }),
        }
    }

    fn account(
        &self,
        outcome: &CaptureOutcome,
        start: &Instant,
        captured: u32,
    ) {
        let m = &self.metrics;

        match outcome {
            CaptureOutcome::Recorded {
                frame_number,
                path,
                bytes,
            } => {
                m.frames_recorded.fetch_add(1, Ordering::Relaxed);
                m.bytes_written.fetch_add(*bytes as u64, Ordering::Relaxed);
                debug!("Frame {frame_number} -> {path:?}");

                let every = self.config.progress_every;
                if every > 0 && captured % every == 0 {
                    self.log_progress(start);
                }
            }
            CaptureOutcome::Oversized { len } => {
                m.oversized_frames.fetch_add(1, Ordering::Relaxed);
                debug!("Skipping {len}-byte frame (buffer is {RX_BUF_LEN} bytes)");
            }
            CaptureOutcome::RxError(bits) => {
                m.rx_errors.fetch_add(1, Ordering::Relaxed);
                debug!("RX error, status {bits}");
            }
            CaptureOutcome::TimedOut => {
                m.rx_timeouts.fetch_add(1, Ordering::Relaxed);
            }
            CaptureOutcome::WriteFailed { path, error } => {
                m.write_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Could not save {path:?}: {error}");
            }
        }
    }

    fn account_error(
        &self,
        e: &CirError,
    ) {
        let m = &self.metrics;

        match e {
            CirError::FrameTooShort { .. } => {
                m.malformed_frames.fetch_add(1, Ordering::Relaxed);
                debug!("Malformed frame: {e}");
            }
            _ => {
                m.transport_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Capture attempt failed: {e}");
            }
        }
    }

    fn log_progress(
        &self,
        start: &Instant,
    ) {
        let m = &self.metrics;

        info!(
            "[ {:.0}s ] records={} failed={} oversized={} rx_err={} timeouts={} rate={:.1}/s",
            start.elapsed().as_secs_f64(),
            m.frames_recorded.load(Ordering::Relaxed),
            m.failed_attempts(),
            m.oversized_frames.load(Ordering::Relaxed),
            m.rx_errors.load(Ordering::Relaxed),
            m.rx_timeouts.load(Ordering::Relaxed),
            m.capture_rate_hz(start),
        );
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
