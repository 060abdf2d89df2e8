use std::{path::PathBuf, time::Duration};

use cir_core::{CirWindow, ACC_CHUNK};
use cir_hal::DeviceKind;
use cir_types::RadioConfig;

use crate::{RecorderError, RecorderResult};

/// Таймаут ожидания кадра по умолчанию.
pub const DEFAULT_RX_TIMEOUT: Duration = Duration::from_secs(5);

/// Полная конфигурация сессии захвата. Не меняется после старта.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Тип устройства
    pub device: DeviceKind,
    /// Имя эксперимента, префикс имён файлов
    pub experiment: String,
    /// Каталог для файлов записей
    pub output_dir: PathBuf,
    /// Сколько записей сделать (None = до Ctrl+C)
    pub max_captures: Option<u32>,
    /// Параметры радио
    pub radio: RadioConfig,
    /// Выборок в записи (None = вся глубина аккумулятора)
    pub cir_samples: Option<usize>,
    /// Полезных байт за одно чтение аккумулятора
    pub chunk_limit: usize,
    /// Сколько ждать кадр (None = бесконечно)
    pub rx_timeout: Option<Duration>,
    /// Какую часть аккумулятора сохранять
    pub window: CirWindow,
    /// Вывод прогресса каждые N записей (0 = не выводить)
    pub progress_every: u32,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CaptureConfig {
    pub fn new<S: Into<String>>(experiment: S) -> Self {
        Self {
            experiment: experiment.into(),
            ..Self::default()
        }
    }

    /// Глубина аккумулятора при выбранной PRF.
    pub fn depth(&self) -> usize {
        self.radio.prf.cir_samples()
    }

    /// Число выборок в каждой записи.
    pub fn sample_count(&self) -> usize {
        self.cir_samples.unwrap_or_else(|| self.depth())
    }

    pub fn validate(&self) -> RecorderResult<()> {
        self.radio.validate()?;

        if self.experiment.is_empty() {
            return Err(RecorderError::Config("experiment name is empty".into()));
        }

        if self.experiment.contains(['/', '\\']) {
            return Err(RecorderError::Config(format!(
                "experiment name '{}' must not contain path separators",
                self.experiment
            )));
        }

        let n = self.sample_count();
        if n == 0 || n > self.depth() {
            return Err(RecorderError::Config(format!(
                "cir_samples must be in 1..={} for {:?}, got {n}",
                self.depth(),
                self.radio.prf
            )));
        }

        if self.max_captures == Some(0) {
            return Err(RecorderError::Config("capture limit must be > 0".into()));
        }

        if self.chunk_limit == 0 {
            return Err(RecorderError::Config("chunk_limit must be > 0".into()));
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: DeviceKind::Simulated,
            experiment: "capture".to_string(),
            output_dir: PathBuf::from("."),
            max_captures: None,
            radio: RadioConfig::default(),
            cir_samples: None,
            chunk_limit: ACC_CHUNK,
            rx_timeout: Some(DEFAULT_RX_TIMEOUT),
            window: CirWindow::Full,
            progress_every: 100,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
