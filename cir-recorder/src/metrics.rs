use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// Счётчики сессии захвата.
///
/// Пишет только цикл захвата; `main` держит вторую ссылку через `Arc` и
/// читает сводку после завершения `run`.
#[derive(Debug, Default)]
pub struct CaptureMetrics {
    pub frames_recorded: AtomicU64,
    pub oversized_frames: AtomicU64,
    pub malformed_frames: AtomicU64,
    pub rx_errors: AtomicU64,
    pub rx_timeouts: AtomicU64,
    pub transport_errors: AtomicU64,
    pub write_errors: AtomicU64,
    pub bytes_written: AtomicU64,
}

/// Snapshot метрик для отображения / тестирования.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub duration_secs: f64,
    pub frames_recorded: u64,
    pub oversized_frames: u64,
    pub malformed_frames: u64,
    pub rx_errors: u64,
    pub rx_timeouts: u64,
    pub transport_errors: u64,
    pub write_errors: u64,
    pub bytes_written: u64,
    pub capture_rate_hz: f64,
}

impl CaptureMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Записей в секунду.
    pub fn capture_rate_hz(
        &self,
        elapsed: &Instant,
    ) -> f64 {
        let secs = elapsed.elapsed().as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.frames_recorded.load(Ordering::Relaxed) as f64 / secs
    }

    /// Попыток захвата, не давших записи.
    pub fn failed_attempts(&self) -> u64 {
        self.oversized_frames.load(Ordering::Relaxed)
            + self.malformed_frames.load(Ordering::Relaxed)
            + self.rx_errors.load(Ordering::Relaxed)
            + self.rx_timeouts.load(Ordering::Relaxed)
            + self.transport_errors.load(Ordering::Relaxed)
            + self.write_errors.load(Ordering::Relaxed)
    }

    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> MetricsSummary {
        MetricsSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            frames_recorded: self.frames_recorded.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            rx_errors: self.rx_errors.load(Ordering::Relaxed),
            rx_timeouts: self.rx_timeouts.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            capture_rate_hz: self.capture_rate_hz(elapsed),
        }
    }
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.1}s", self.duration_secs)?;
        writeln!(f, "  Records       : {}", self.frames_recorded)?;
        writeln!(f, "  Oversized     : {}", self.oversized_frames)?;
        writeln!(f, "  Malformed     : {}", self.malformed_frames)?;
        writeln!(f, "  RX errors     : {}", self.rx_errors)?;
        writeln!(f, "  RX timeouts   : {}", self.rx_timeouts)?;
        writeln!(f, "  SPI errors    : {}", self.transport_errors)?;
        writeln!(f, "  Write errors  : {}", self.write_errors)?;
        writeln!(
            f,
            "  Bytes written : {:.1} KB",
            self.bytes_written as f64 / 1e3
        )?;
        writeln!(f, "  Rate          : {:.1} rec/s", self.capture_rate_hz)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_initial_metrics_zero() {
        let metrics = CaptureMetrics::new();
        let summary = metrics.summary(&Instant::now());

        assert_eq!(summary.frames_recorded, 0);
        assert_eq!(summary.bytes_written, 0);
        assert_eq!(summary.capture_rate_hz, 0.0);
        assert_eq!(metrics.failed_attempts(), 0);
    }

    #[test]
    fn test_capture_rate() {
        let metrics = CaptureMetrics::new();
        metrics.frames_recorded.store(20, Ordering::Relaxed);

        let start = Instant::now() - Duration::from_secs(2);
        let summary = metrics.summary(&start);

        // 20 записей / 2 с
        assert!((summary.capture_rate_hz - 10.0).abs() < 0.5);
    }

    #[test]
    fn test_failed_attempts_and_display() {
        let metrics = CaptureMetrics::new();
        metrics.oversized_frames.store(1, Ordering::Relaxed);
        metrics.rx_errors.store(2, Ordering::Relaxed);
        metrics.rx_timeouts.store(3, Ordering::Relaxed);
        metrics.write_errors.store(4, Ordering::Relaxed);

        assert_eq!(metrics.failed_attempts(), 10);

        let text = metrics.summary(&Instant::now()).to_string();
        assert!(text.contains("RX timeouts   : 3"));
        assert!(text.contains("Write errors  : 4"));
    }
}
