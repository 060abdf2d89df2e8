use cir_types::CirError;
use thiserror::Error;

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Устройство не найдено или драйвер не подключён
    #[error("UWB device not found: {0}")]
    DeviceNotFound(String),

    /// Ошибка захвата (транспорт, формат, запись)
    #[error("CIR error: {0}")]
    Cir(#[from] CirError),

    /// Ошибка файловой системы
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректные параметры сессии
    #[error("Config error: {0}")]
    Config(String),
}
