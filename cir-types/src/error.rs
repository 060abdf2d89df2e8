use thiserror::Error;

/// Результат для операций cirlog
pub type CirResult<T> = std::result::Result<T, CirError>;

/// Типы ошибок захвата CIR.
#[derive(Debug, Error)]
pub enum CirError {
    /// Ошибка транспорта (SPI) или обращения к регистрам
    #[error("Transport error: {0}")]
    Transport(String),

    /// Ожидаемое событие не наступило за отведённое время
    #[error("Wait timed out after {waited_ms} ms")]
    WaitTimeout { waited_ms: u64 },

    /// Принятый кадр короче, чем требует фиксированная раскладка
    #[error("Frame too short: {len} bytes, need at least {required}")]
    FrameTooShort { len: usize, required: usize },

    /// Кадр не помещается в локальный приёмный буфер
    #[error("Frame of {len} bytes exceeds receive buffer of {capacity} bytes")]
    OversizedFrame { len: usize, capacity: usize },

    /// Запись оборвалась на середине (например, диск заполнен)
    #[error("Incomplete record: {written} of {expected} bytes written")]
    IncompleteRecord { written: usize, expected: usize },

    /// Не удалось выделить память под буфер выборок
    #[error("Could not allocate {bytes} bytes")]
    Allocation { bytes: usize },

    /// Некорректная конфигурация
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Нарушение фиксированного формата
    #[error("Format violation: {0}")]
    FormatViolation(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CirError {
    /// Удобные конструкторы
    pub fn transport<S: Into<String>>(s: S) -> Self {
        Self::Transport(s.into())
    }

    pub fn invalid_config<S: Into<String>>(s: S) -> Self {
        Self::InvalidConfig(s.into())
    }

    pub fn format_violation<S: Into<String>>(s: S) -> Self {
        Self::FormatViolation(s.into())
    }

    /// Ошибка относится к одной итерации захвата и не требует остановки.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CirError::Transport(_)
                | CirError::WaitTimeout { .. }
                | CirError::FrameTooShort { .. }
                | CirError::OversizedFrame { .. }
                | CirError::IncompleteRecord { .. }
        )
    }
}
