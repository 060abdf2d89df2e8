use cir_core::{timestamp_from_bytes, AccumulatorSource};
use cir_types::{CirResult, RadioConfig, RxDiagnostics, SysStatus};

/// Идентификатор DW1000 в регистре DEV_ID.
pub const DW1000_DEVICE_ID: u32 = 0xDECA_0130;

/// Скорость SPI. Инициализация DW1000 идёт на низкой скорости.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiRate {
    Low,
    High,
}

/// Что загружать при инициализации.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Ничего (передатчики)
    None,
    /// Микрокод LDE: нужен для метки времени приёма и диагностики
    Ucode,
}

/// Тип устройства (выбор при старте).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// Встроенный симулятор (не требует железа).
    Simulated,
    /// DW1000 через драйвер производителя.
    Dw1000,
}

/// Информация об устройстве (для логирования).
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub device_id: u32,
}

/// Абстракция драйвера DW1000.
///
/// Методы соответствуют вызовам драйвера производителя один к одному;
/// никакой логики поверх них здесь нет.
pub trait UwbDevice: AccumulatorSource + Send {
    /// Информация об устройстве
    fn info(&self) -> DeviceInfo;

    /// Аппаратный сброс (линия RSTn)
    fn reset(&mut self) -> CirResult<()>;

    fn set_spi_rate(
        &mut self,
        rate: SpiRate,
    ) -> CirResult<()>;

    fn initialise(
        &mut self,
        mode: LoadMode,
    ) -> CirResult<()>;

    fn configure(
        &mut self,
        config: &RadioConfig,
    ) -> CirResult<()>;

    fn set_leds(
        &mut self,
        mask: u8,
    ) -> CirResult<()>;

    /// Младшие 32 бита SYS_STATUS
    fn read_status(&mut self) -> CirResult<SysStatus>;

    /// Сбрасывает биты записью единиц
    fn clear_status(
        &mut self,
        bits: SysStatus,
    ) -> CirResult<()>;

    /// Немедленно включает приёмник
    fn rx_enable(&mut self) -> CirResult<()>;

    /// Сброс приёмного тракта (переинициализирует LDE)
    fn rx_reset(&mut self) -> CirResult<()>;

    /// Выключает приёмник и передатчик
    fn force_trx_off(&mut self) -> CirResult<()>;

    /// Регистр RX_FINFO
    fn read_rx_frame_info(&mut self) -> CirResult<u32>;

    fn read_rx_data(
        &mut self,
        buf: &mut [u8],
        offset: u16,
    ) -> CirResult<()>;

    /// Сырые 5 байт метки времени приёма
    fn read_rx_timestamp(&mut self) -> CirResult<[u8; 5]>;

    /// Сырые 5 байт метки времени передачи
    fn read_tx_timestamp(&mut self) -> CirResult<[u8; 5]>;

    fn read_diagnostics(&mut self) -> CirResult<RxDiagnostics>;

    fn write_tx_data(
        &mut self,
        data: &[u8],
        offset: u16,
    ) -> CirResult<()>;

    /// Управление кадром: длина (с FCS), смещение в буфере, флаг ranging
    fn write_tx_fctrl(
        &mut self,
        len: usize,
        offset: u16,
        ranging: bool,
    ) -> CirResult<()>;

    /// Немедленно начинает передачу
    fn start_tx(&mut self) -> CirResult<()>;

    fn rx_timestamp_u64(&mut self) -> CirResult<u64> {
        Ok(timestamp_from_bytes(self.read_rx_timestamp()?))
    }

    fn tx_timestamp_u64(&mut self) -> CirResult<u64> {
        Ok(timestamp_from_bytes(self.read_tx_timestamp()?))
    }
}

/// Создаёт нужное устройство.
pub fn create_device(kind: &DeviceKind) -> Result<Box<dyn UwbDevice>, String> {
    match kind {
        #[cfg(feature = "sim")]
        DeviceKind::Simulated => Ok(Box::new(crate::SimulatedDevice::new())),
        #[cfg(not(feature = "sim"))]
        DeviceKind::Simulated => Err("Compiled without simulator support".to_string()),
        DeviceKind::Dw1000 => Err("DW1000 driver binding is not linked into this build".to_string()),
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            DeviceKind::Simulated => write!(f, "sim"),
            DeviceKind::Dw1000 => write!(f, "dw1000"),
        }
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sim" | "simulated" => Ok(DeviceKind::Simulated),
            "dw1000" | "decawave" => Ok(DeviceKind::Dw1000),
            _ => Err(format!("Unknown device type: '{s}'. Use: sim, dw1000")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_fromstr() {
        assert_eq!("sim".parse::<DeviceKind>().unwrap(), DeviceKind::Simulated);
        assert_eq!("DW1000".parse::<DeviceKind>().unwrap(), DeviceKind::Dw1000);
        assert!("hackrf".parse::<DeviceKind>().is_err());
        assert_eq!(DeviceKind::Dw1000.to_string(), "dw1000");
    }

    #[test]
    fn test_create_device() {
        let dev = create_device(&DeviceKind::Simulated).unwrap();
        assert_eq!(dev.info().device_id, DW1000_DEVICE_ID);

        assert!(create_device(&DeviceKind::Dw1000).is_err());
    }
}
