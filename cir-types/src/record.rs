use crate::CirSample;

/// Маска значимых бит метки времени DW1000 (40 бит).
pub const TIMESTAMP_MASK: u64 = (1 << 40) - 1;

/// Запись захвата: одна на каждый принятый кадр.
///
/// На диске: номер кадра, метка времени приёма, затем все выборки CIR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    /// Номер кадра, извлечённый из принятого сообщения
    pub frame_number: i32,
    /// Метка времени приёма (значимы младшие 40 бит)
    pub rx_timestamp: u64,
    /// Выборки CIR
    pub samples: Vec<CirSample>,
}

impl CaptureRecord {
    pub fn new(
        frame_number: i32,
        rx_timestamp: u64,
        samples: Vec<CirSample>,
    ) -> Self {
        Self {
            frame_number,
            rx_timestamp,
            samples,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Метка времени без старших (незначимых) бит.
    pub fn timestamp_40(&self) -> u64 {
        self.rx_timestamp & TIMESTAMP_MASK
    }
}
