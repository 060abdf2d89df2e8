use std::ops::{BitAnd, BitOr};

/// Снимок регистра SYS_STATUS (младшие 32 бита).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SysStatus(pub u32);

/// Диагностика последнего принятого кадра (считается микрокодом LDE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxDiagnostics {
    /// Индекс первого пути, фиксированная точка 10.6
    pub first_path: u16,
    /// Амплитуда первого пути (точка 2)
    pub first_path_amp2: u16,
    /// Стандартное отклонение шума
    pub std_noise: u16,
    /// Максимальный уровень шума
    pub max_noise: u16,
    /// Накопленные символы преамбулы
    pub rx_preamble_count: u16,
}

impl SysStatus {
    /// Кадр отправлен
    pub const TXFRS: SysStatus = SysStatus(0x0000_0080);
    /// Кадр принят, CRC в порядке
    pub const RXFCG: SysStatus = SysStatus(0x0000_4000);
    /// Ошибка PHY заголовка
    pub const RXPHE: SysStatus = SysStatus(0x0000_1000);
    /// Ошибка CRC
    pub const RXFCE: SysStatus = SysStatus(0x0000_8000);
    /// Потеря синхронизации Рида-Соломона
    pub const RXRFSL: SysStatus = SysStatus(0x0001_0000);
    /// Ошибка детектора переднего фронта
    pub const LDEERR: SysStatus = SysStatus(0x0004_0000);
    /// Таймаут SFD
    pub const RXSFDTO: SysStatus = SysStatus(0x0400_0000);
    /// Кадр отклонён фильтрацией
    pub const AFFREJ: SysStatus = SysStatus(0x2000_0000);

    /// Все ошибки приёма.
    pub const ALL_RX_ERR: SysStatus = SysStatus(
        Self::RXPHE.0
            | Self::RXFCE.0
            | Self::RXRFSL.0
            | Self::RXSFDTO.0
            | Self::AFFREJ.0
            | Self::LDEERR.0,
    );

    pub const fn empty() -> Self {
        SysStatus(0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Установлен хотя бы один бит из `other`.
    pub fn intersects(
        &self,
        other: SysStatus,
    ) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl RxDiagnostics {
    /// Целая часть индекса первого пути (отбрасываем 6 дробных бит).
    pub fn first_path_index(&self) -> usize {
        (self.first_path >> 6) as usize
    }
}

impl BitOr for SysStatus {
    type Output = SysStatus;

    fn bitor(
        self,
        rhs: SysStatus,
    ) -> SysStatus {
        SysStatus(self.0 | rhs.0)
    }
}

impl BitAnd for SysStatus {
    type Output = SysStatus;

    fn bitand(
        self,
        rhs: SysStatus,
    ) -> SysStatus {
        SysStatus(self.0 & rhs.0)
    }
}

impl std::fmt::Display for SysStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_error_mask() {
        assert_eq!(SysStatus::ALL_RX_ERR.bits(), 0x2405_9000);
        assert!(!SysStatus::ALL_RX_ERR.intersects(SysStatus::RXFCG));
        assert!((SysStatus::RXFCE | SysStatus::TXFRS).intersects(SysStatus::ALL_RX_ERR));
    }

    #[test]
    fn test_first_path_integer_part() {
        let diag = RxDiagnostics {
            first_path: (745 << 6) | 0x2A,
            ..Default::default()
        };
        assert_eq!(diag.first_path_index(), 745);
    }
}
