use std::time::Duration;

use cir_hal::DeviceKind;
use cir_types::RadioConfig;

use crate::{BeaconError, BeaconResult};

/// Что передавать.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeaconMode {
    /// Кадры с растущим счётчиком для приёмника CIR
    Radar { experiment: String },
    /// Кадры с Unix-временем отправки
    Headcount,
}

#[derive(Debug, Clone)]
pub struct BeaconConfig {
    pub device: DeviceKind,
    pub mode: BeaconMode,
    pub radio: RadioConfig,
    /// Сколько кадров отправить (None = до Ctrl+C)
    pub count: Option<u32>,
    /// Пауза между кадрами
    pub interval: Duration,
    /// Сколько ждать окончания передачи (None = бесконечно)
    pub tx_timeout: Option<Duration>,
}

impl BeaconConfig {
    /// Передатчик radar: канал 5, каждые 100 мс, без ограничения.
    pub fn radar<S: Into<String>>(experiment: S) -> Self {
        Self {
            device: DeviceKind::Simulated,
            mode: BeaconMode::Radar {
                experiment: experiment.into(),
            },
            radio: RadioConfig::default(),
            count: None,
            interval: Duration::from_millis(100),
            tx_timeout: Some(Duration::from_secs(1)),
        }
    }

    /// Маяк headcount: канал 2, один кадр.
    pub fn headcount() -> Self {
        Self {
            device: DeviceKind::Simulated,
            mode: BeaconMode::Headcount,
            radio: RadioConfig::headcount(),
            count: Some(1),
            interval: Duration::from_secs(2),
            tx_timeout: Some(Duration::from_secs(1)),
        }
    }

    pub fn validate(&self) -> BeaconResult<()> {
        self.radio.validate()?;

        if self.count == Some(0) {
            return Err(BeaconError::Config("frame count must be > 0".into()));
        }

        if let Some(count) = self.count {
            if count > i32::MAX as u32 {
                return Err(BeaconError::Config(format!(
                    "frame count {count} does not fit the 32-bit frame counter"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let radar = BeaconConfig::radar("exp");
        assert_eq!(radar.radio.channel, 5);
        assert_eq!(radar.count, None);
        assert_eq!(radar.interval, Duration::from_millis(100));
        radar.validate().unwrap();

        let hc = BeaconConfig::headcount();
        assert_eq!(hc.radio.channel, 2);
        assert_eq!(hc.count, Some(1));
        assert_eq!(hc.interval, Duration::from_secs(2));
        hc.validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_count() {
        let mut cfg = BeaconConfig::headcount();
        cfg.count = Some(0);
        assert!(matches!(cfg.validate(), Err(BeaconError::Config(_))));
    }
}
