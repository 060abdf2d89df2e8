use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CirError, CirResult};

/// Глубина аккумулятора при PRF 16 МГц (выборок).
pub const CIR_SAMPLES_PRF16: usize = 992;

/// Глубина аккумулятора при PRF 64 МГц (выборок).
pub const CIR_SAMPLES_PRF64: usize = 1016;

/// Частота повторения импульсов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prf {
    #[serde(rename = "16mhz")]
    Mhz16,
    #[serde(rename = "64mhz")]
    Mhz64,
}

/// Длина преамбулы (в символах). Используется только при передаче.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreambleLength {
    #[serde(rename = "64")]
    Symbols64,
    #[serde(rename = "128")]
    Symbols128,
    #[serde(rename = "256")]
    Symbols256,
    #[serde(rename = "512")]
    Symbols512,
    #[serde(rename = "1024")]
    Symbols1024,
    #[serde(rename = "1536")]
    Symbols1536,
    #[serde(rename = "2048")]
    Symbols2048,
    #[serde(rename = "4096")]
    Symbols4096,
}

/// Размер блока захвата преамбулы (PAC). Используется только при приёме.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pac {
    #[serde(rename = "8")]
    Pac8,
    #[serde(rename = "16")]
    Pac16,
    #[serde(rename = "32")]
    Pac32,
    #[serde(rename = "64")]
    Pac64,
}

/// Скорость передачи данных.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataRate {
    #[serde(rename = "110k")]
    Kbps110,
    #[serde(rename = "850k")]
    Kbps850,
    #[serde(rename = "6m8")]
    Mbps6_8,
}

/// Режим PHY заголовка.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhrMode {
    Standard,
    Extended,
}

/// Параметры физического уровня, передаваемые драйверу один раз при старте.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Номер канала (1, 2, 3, 4, 5, 7)
    pub channel: u8,
    pub prf: Prf,
    pub preamble_length: PreambleLength,
    pub pac: Pac,
    /// Код преамбулы передатчика
    pub tx_preamble_code: u8,
    /// Код преамбулы приёмника
    pub rx_preamble_code: u8,
    /// Нестандартный SFD (Decawave)
    pub non_standard_sfd: bool,
    pub data_rate: DataRate,
    pub phr_mode: PhrMode,
    /// Таймаут SFD в символах
    pub sfd_timeout: u16,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Prf {
    /// Сколько выборок CIR держит аккумулятор при данной PRF.
    pub fn cir_samples(&self) -> usize {
        match self {
            Prf::Mhz16 => CIR_SAMPLES_PRF16,
            Prf::Mhz64 => CIR_SAMPLES_PRF64,
        }
    }
}

impl PreambleLength {
    pub fn symbols(&self) -> u16 {
        match self {
            PreambleLength::Symbols64 => 64,
            PreambleLength::Symbols128 => 128,
            PreambleLength::Symbols256 => 256,
            PreambleLength::Symbols512 => 512,
            PreambleLength::Symbols1024 => 1024,
            PreambleLength::Symbols1536 => 1536,
            PreambleLength::Symbols2048 => 2048,
            PreambleLength::Symbols4096 => 4096,
        }
    }
}

impl Pac {
    pub fn symbols(&self) -> u16 {
        match self {
            Pac::Pac8 => 8,
            Pac::Pac16 => 16,
            Pac::Pac32 => 32,
            Pac::Pac64 => 64,
        }
    }
}

impl RadioConfig {
    /// Конфигурация маяка "headcount": то же, что по умолчанию, но канал 2.
    pub fn headcount() -> Self {
        Self {
            channel: 2,
            ..Self::default()
        }
    }

    /// Длина SFD в символах.
    pub fn sfd_length(&self) -> u16 {
        match (self.non_standard_sfd, self.data_rate) {
            (true, DataRate::Kbps110) => 64,
            (true, DataRate::Kbps850) => 16,
            (true, DataRate::Mbps6_8) => 8,
            (false, DataRate::Kbps110) => 64,
            (false, _) => 8,
        }
    }

    /// Таймаут SFD: длина преамбулы + 1 + длина SFD - PAC.
    pub fn recommended_sfd_timeout(&self) -> u16 {
        self.preamble_length.symbols() + 1 + self.sfd_length() - self.pac.symbols()
    }

    /// Загружает параметры из JSON. Отсутствующие поля берутся по умолчанию.
    pub fn from_json_file(path: &Path) -> CirResult<Self> {
        let text = std::fs::read_to_string(path)?;

        let radio: RadioConfig = serde_json::from_str(&text)
            .map_err(|e| CirError::invalid_config(format!("{}: {e}", path.display())))?;

        radio.validate()?;

        Ok(radio)
    }

    /// Проверяет допустимость параметров для DW1000.
    pub fn validate(&self) -> CirResult<()> {
        if !matches!(self.channel, 1 | 2 | 3 | 4 | 5 | 7) {
            return Err(CirError::invalid_config(format!(
                "unsupported channel {}",
                self.channel
            )));
        }

        let codes = match self.prf {
            Prf::Mhz16 => 1..=8,
            Prf::Mhz64 => 9..=24,
        };

        for code in [self.tx_preamble_code, self.rx_preamble_code] {
            if !codes.contains(&code) {
                return Err(CirError::invalid_config(format!(
                    "preamble code {code} not valid for {:?}",
                    self.prf
                )));
            }
        }

        if self.sfd_timeout == 0 {
            return Err(CirError::invalid_config("sfd_timeout must be > 0"));
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for RadioConfig {
    /// Режим 3 EVK1000: канал 5, PRF 64 МГц, 110 кбит/с.
    fn default() -> Self {
        Self {
            channel: 5,
            prf: Prf::Mhz64,
            preamble_length: PreambleLength::Symbols1024,
            pac: Pac::Pac32,
            tx_preamble_code: 9,
            rx_preamble_code: 9,
            non_standard_sfd: true,
            data_rate: DataRate::Kbps110,
            phr_mode: PhrMode::Standard,
            sfd_timeout: 1025 + 64 - 32,
        }
    }
}

impl std::fmt::Display for RadioConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "ch{} {:?} preamble={} pac={} codes={}/{} {:?}",
            self.channel,
            self.prf,
            self.preamble_length.symbols(),
            self.pac.symbols(),
            self.tx_preamble_code,
            self.rx_preamble_code,
            self.data_rate,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
