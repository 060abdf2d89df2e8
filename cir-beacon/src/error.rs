use cir_types::CirError;

pub type BeaconResult<T> = Result<T, BeaconError>;

#[derive(Debug)]
pub enum BeaconError {
    DeviceNotFound(String),
    Cir(CirError),
    Config(String),
}

impl std::fmt::Display for BeaconError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            BeaconError::DeviceNotFound(s) => write!(f, "UWB device not found: {s}"),
            BeaconError::Cir(e) => write!(f, "Transmit error: {e}"),
            BeaconError::Config(s) => write!(f, "Config error: {s}"),
        }
    }
}

impl std::error::Error for BeaconError {}

impl From<CirError> for BeaconError {
    fn from(e: CirError) -> Self {
        BeaconError::Cir(e)
    }
}
