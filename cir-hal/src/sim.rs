// Симулятор DW1000 для тестов и работы без железа.
// Поведение повторяет то, что видит код сверху: биты SYS_STATUS появляются
// после нескольких опросов, память аккумулятора читается с мусорным первым
// байтом и ограничением на размер транзакции.

use std::collections::VecDeque;

use cir_core::{AccumulatorSource, RadarFrame, ACC_CHUNK};
use cir_types::{CirError, CirResult, RadioConfig, RxDiagnostics, SysStatus, SAMPLE_SIZE, TIMESTAMP_MASK};

use crate::{DeviceInfo, LoadMode, SpiRate, UwbDevice, DW1000_DEVICE_ID};

/// Значение мусорного байта в начале каждого чтения аккумулятора.
pub const SIM_DUMMY_BYTE: u8 = 0x5A;

/// Биты RX_FINFO выше длины кадра (RXPRFR = 64 МГц), чтобы код сверху
/// обязан был маскировать длину.
const SIM_FINFO_HIGH_BITS: u32 = 0b10 << 18;

/// Что произойдёт после очередного `rx_enable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// Кадр с хорошим CRC
    Frame {
        payload: Vec<u8>,
        rx_timestamp: u64,
        /// Индекс первого пути, фиксированная точка 10.6
        first_path: u16,
    },
    /// Ошибка приёма с указанными битами статуса
    RxError(SysStatus),
    /// Ничего не приходит
    Silence,
}

/// Генерация кадров и CIR без железа.
pub struct SimulatedDevice {
    /// События приёма по порядку
    pub script: VecDeque<SimEvent>,
    /// Когда сценарий пуст, генерировать кадры radar (иначе тишина)
    pub generate: bool,
    /// Сколько опросов статуса проходит до события
    pub polls_until_event: u32,
    /// Максимум полезных байт за одно чтение аккумулятора
    pub max_transfer: usize,
    /// Следующее чтение аккумулятора завершится ошибкой транспорта
    pub fail_next_acc_read: bool,
    /// Выполнено чтений аккумулятора
    pub acc_reads: usize,
    /// Передача не завершается: TXFRS не выставляется
    pub tx_stalled: bool,
    /// Выполнено чтений диагностики
    pub diag_reads: usize,
    /// Отправленные кадры (без учёта FCS)
    pub sent: Vec<Vec<u8>>,

    spi_rate: SpiRate,
    initialised: bool,
    config: Option<RadioConfig>,
    leds: u8,
    status: u32,
    rx_enabled: bool,
    pending: Option<SimEvent>,
    polls_left: u32,
    rx_buffer: Vec<u8>,
    rx_timestamp: u64,
    diagnostics: RxDiagnostics,
    accumulator: Vec<u8>,
    tx_buffer: Vec<u8>,
    tx_len: usize,
    tx_timestamp: u64,
    generated: i32,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimEvent {
    /// Кадр radar с заданным счётчиком.
    pub fn radar(
        frame_count: i32,
        rx_timestamp: u64,
    ) -> Self {
        let payload = RadarFrame {
            sequence: frame_count as u8,
            frame_count,
        }
        .encode()
        .map(|b| b.to_vec())
        .unwrap_or_default();

        SimEvent::Frame {
            payload,
            rx_timestamp,
            first_path: ((700 + (frame_count.unsigned_abs() % 20)) << 6) as u16,
        }
    }
}

impl SimulatedDevice {
    /// Бесконечный генератор кадров radar.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            generate: true,
            polls_until_event: 3,
            max_transfer: ACC_CHUNK,
            fail_next_acc_read: false,
            acc_reads: 0,
            tx_stalled: false,
            diag_reads: 0,
            sent: Vec::new(),
            spi_rate: SpiRate::Low,
            initialised: false,
            config: None,
            leds: 0,
            status: 0,
            rx_enabled: false,
            pending: None,
            polls_left: 0,
            rx_buffer: Vec::new(),
            rx_timestamp: 0,
            diagnostics: RxDiagnostics::default(),
            accumulator: Vec::new(),
            tx_buffer: vec![0u8; 1024],
            tx_len: 0,
            tx_timestamp: 0,
            generated: 0,
        }
    }

    /// Только заданные события, затем тишина.
    pub fn scripted<I: IntoIterator<Item = SimEvent>>(events: I) -> Self {
        Self {
            script: events.into_iter().collect(),
            generate: false,
            ..Self::new()
        }
    }

    /// Текущее содержимое памяти аккумулятора.
    pub fn accumulator(&self) -> &[u8] {
        &self.accumulator
    }

    pub fn leds(&self) -> u8 {
        self.leds
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&RadioConfig> {
        self.config.as_ref()
    }

    fn next_event(&mut self) -> SimEvent {
        if let Some(ev) = self.script.pop_front() {
            return ev;
        }

        if self.generate {
            self.generated = self.generated.wrapping_add(1);
            let ts = (self.generated as u64).wrapping_mul(0x0000_0012_3456_789B) & TIMESTAMP_MASK;
            return SimEvent::radar(self.generated, ts);
        }

        SimEvent::Silence
    }

    fn deliver(
        &mut self,
        event: SimEvent,
    ) {
        match event {
            SimEvent::Frame {
                payload,
                rx_timestamp,
                first_path,
            } => {
                self.rx_buffer = payload;
                self.rx_timestamp = rx_timestamp & TIMESTAMP_MASK;
                self.diagnostics = RxDiagnostics {
                    first_path,
                    first_path_amp2: 9_000,
                    std_noise: 40,
                    max_noise: 180,
                    rx_preamble_count: 1_000,
                };
                self.fill_accumulator((first_path >> 6) as usize, rx_timestamp);
                self.status |= SysStatus::RXFCG.bits();
                self.rx_enabled = false;
            }
            SimEvent::RxError(bits) => {
                self.status |= bits.bits();
                self.rx_enabled = false;
            }
            SimEvent::Silence => {
                // остаёмся в приёме
                self.pending = Some(SimEvent::Silence);
            }
        }
    }

    /// Синтетическая CIR: шум + затухающий импульс на первом пути.
    fn fill_accumulator(
        &mut self,
        first_path: usize,
        seed: u64,
    ) {
        let depth = self.config.as_ref().map_or(0, |c| c.prf.cir_samples());
        let mut state = seed | 1;

        self.accumulator.clear();
        self.accumulator.reserve(depth * SAMPLE_SIZE);

        for i in 0..depth {
            // LCG для воспроизводимого шума
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let noise_r = ((state >> 33) % 64) as i16 - 32;
            let noise_i = ((state >> 45) % 64) as i16 - 32;

            let pulse = if i >= first_path {
                let k = (i - first_path) as i32;
                (8_000 >> k.min(15)) as i16
            } else {
                0
            };

            self.accumulator.extend_from_slice(&(pulse + noise_r).to_ne_bytes());
            self.accumulator
                .extend_from_slice(&(pulse / 2 + noise_i).to_ne_bytes());
        }
    }

    fn ensure_configured(&self) -> CirResult<()> {
        if self.config.is_none() {
            return Err(CirError::transport("device is not configured"));
        }
        Ok(())
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Реализация драйвера
////////////////////////////////////////////////////////////////////////////////

impl AccumulatorSource for SimulatedDevice {
    fn read_accumulator(
        &mut self,
        offset: u16,
        buf: &mut [u8],
    ) -> CirResult<()> {
        self.acc_reads += 1;

        if std::mem::take(&mut self.fail_next_acc_read) {
            return Err(CirError::transport("SPI transfer failed"));
        }

        let n = buf.len().saturating_sub(1);
        if buf.is_empty() || n > self.max_transfer {
            return Err(CirError::transport(format!(
                "transfer of {n} bytes exceeds limit of {}",
                self.max_transfer
            )));
        }

        let off = offset as usize;
        let src = self.accumulator.get(off..off + n).ok_or_else(|| {
            CirError::transport(format!("read {off}..{} past accumulator", off + n))
        })?;

        buf[0] = SIM_DUMMY_BYTE;
        buf[1..].copy_from_slice(src);

        Ok(())
    }
}

impl UwbDevice for SimulatedDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Simulated DW1000".to_string(),
            device_id: DW1000_DEVICE_ID,
        }
    }

    fn reset(&mut self) -> CirResult<()> {
        *self = Self {
            script: std::mem::take(&mut self.script),
            generate: self.generate,
            polls_until_event: self.polls_until_event,
            max_transfer: self.max_transfer,
            fail_next_acc_read: self.fail_next_acc_read,
            acc_reads: self.acc_reads,
            tx_stalled: self.tx_stalled,
            diag_reads: self.diag_reads,
            sent: std::mem::take(&mut self.sent),
            generated: self.generated,
            ..Self::new()
        };
        Ok(())
    }

    fn set_spi_rate(
        &mut self,
        rate: SpiRate,
    ) -> CirResult<()> {
        self.spi_rate = rate;
        Ok(())
    }

    fn initialise(
        &mut self,
        _mode: LoadMode,
    ) -> CirResult<()> {
        if self.spi_rate != SpiRate::Low {
            return Err(CirError::transport("initialise requires low SPI rate"));
        }
        self.initialised = true;
        Ok(())
    }

    fn configure(
        &mut self,
        config: &RadioConfig,
    ) -> CirResult<()> {
        if !self.initialised {
            return Err(CirError::transport("device is not initialised"));
        }
        self.config = Some(config.clone());
        self.accumulator = vec![0u8; config.prf.cir_samples() * SAMPLE_SIZE];
        Ok(())
    }

    fn set_leds(
        &mut self,
        mask: u8,
    ) -> CirResult<()> {
        self.leds = mask;
        Ok(())
    }

    fn read_status(&mut self) -> CirResult<SysStatus> {
        if self.rx_enabled {
            if self.polls_left > 0 {
                self.polls_left -= 1;
            } else if let Some(ev) = self.pending.take() {
                self.deliver(ev);
            }
        }

        Ok(SysStatus(self.status))
    }

    fn clear_status(
        &mut self,
        bits: SysStatus,
    ) -> CirResult<()> {
        self.status &= !bits.bits();
        Ok(())
    }

    fn rx_enable(&mut self) -> CirResult<()> {
        self.ensure_configured()?;

        let event = self.next_event();
        self.pending = Some(event);
        self.polls_left = self.polls_until_event;
        self.rx_enabled = true;

        Ok(())
    }

    fn rx_reset(&mut self) -> CirResult<()> {
        self.rx_enabled = false;
        self.pending = None;
        Ok(())
    }

    fn force_trx_off(&mut self) -> CirResult<()> {
        self.rx_enabled = false;
        self.pending = None;
        self.status &= !(SysStatus::RXFCG | SysStatus::ALL_RX_ERR | SysStatus::TXFRS).bits();
        Ok(())
    }

    fn read_rx_frame_info(&mut self) -> CirResult<u32> {
        Ok(self.rx_buffer.len() as u32 | SIM_FINFO_HIGH_BITS)
    }

    fn read_rx_data(
        &mut self,
        buf: &mut [u8],
        offset: u16,
    ) -> CirResult<()> {
        let off = offset as usize;
        let src = self
            .rx_buffer
            .get(off..off + buf.len())
            .ok_or_else(|| CirError::transport("read past received frame"))?;

        buf.copy_from_slice(src);
        Ok(())
    }

    fn read_rx_timestamp(&mut self) -> CirResult<[u8; 5]> {
        let b = self.rx_timestamp.to_le_bytes();
        Ok([b[0], b[1], b[2], b[3], b[4]])
    }

    fn read_tx_timestamp(&mut self) -> CirResult<[u8; 5]> {
        let b = self.tx_timestamp.to_le_bytes();
        Ok([b[0], b[1], b[2], b[3], b[4]])
    }

    fn read_diagnostics(&mut self) -> CirResult<RxDiagnostics> {
        self.diag_reads += 1;
        Ok(self.diagnostics)
    }

    fn write_tx_data(
        &mut self,
        data: &[u8],
        offset: u16,
    ) -> CirResult<()> {
        let off = offset as usize;
        let dst = self
            .tx_buffer
            .get_mut(off..off + data.len())
            .ok_or_else(|| CirError::transport("write past TX buffer"))?;

        dst.copy_from_slice(data);
        Ok(())
    }

    fn write_tx_fctrl(
        &mut self,
        len: usize,
        offset: u16,
        _ranging: bool,
    ) -> CirResult<()> {
        if offset != 0 || len > self.tx_buffer.len() || len < 2 {
            return Err(CirError::transport(format!("bad frame control len={len} offset={offset}")));
        }
        self.tx_len = len;
        Ok(())
    }

    fn start_tx(&mut self) -> CirResult<()> {
        self.ensure_configured()?;

        if self.tx_len < 2 {
            return Err(CirError::transport("frame control not written"));
        }

        if self.tx_stalled {
            return Ok(());
        }

        // два последних байта под FCS, их дописывает железо
        self.sent.push(self.tx_buffer[..self.tx_len - 2].to_vec());
        self.tx_timestamp = (self.tx_timestamp + 0x0000_0100_0000_0000 / 1_000) & TIMESTAMP_MASK;
        self.status |= SysStatus::TXFRS.bits();

        Ok(())
    }
}
