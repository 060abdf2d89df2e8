//! Чтение памяти аккумулятора порциями.
//!
//! Транспорт (SPI) за одну транзакцию передаёт не более [`ACC_CHUNK`] байт
//! полезных данных, а первый байт каждой транзакции мусорный и
//! отбрасывается.

use cir_types::{CirBuffer, CirError, CirResult, RxDiagnostics, SAMPLE_SIZE};

/// Максимум полезных байт за одну транзакцию.
pub const ACC_CHUNK: usize = 64;

/// Источник данных аккумулятора (драйвер устройства).
pub trait AccumulatorSource {
    /// Заполняет `buf`: `buf[0]` содержит мусорный байт, далее `buf.len() - 1`
    /// байт аккумулятора начиная с `offset`.
    fn read_accumulator(
        &mut self,
        offset: u16,
        buf: &mut [u8],
    ) -> CirResult<()>;
}

/// Итог одного чтения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadSummary {
    /// Выполнено транзакций
    pub chunks: usize,
    /// Скопировано полезных байт
    pub bytes: usize,
    /// Смещение в памяти устройства после последней порции
    pub end_offset: usize,
    /// Полезных байт в последней порции
    pub last_chunk: usize,
}

/// Какую часть аккумулятора сохранять.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CirWindow {
    /// С нулевой выборки
    #[default]
    Full,
    /// Окно, начинающееся за `before` выборок до первого пути
    AroundFirstPath { before: usize },
}

/// Собирает непрерывный буфер из порций ограниченного размера.
#[derive(Debug, Clone)]
pub struct AccumulatorReader {
    chunk_limit: usize,
    scratch: Vec<u8>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl AccumulatorReader {
    pub fn new(chunk_limit: usize) -> CirResult<Self> {
        if chunk_limit == 0 {
            return Err(CirError::invalid_config("chunk limit must be > 0"));
        }

        Ok(Self {
            chunk_limit,
            scratch: vec![0u8; chunk_limit + 1],
        })
    }

    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Читает `dest.len()` байт начиная с `start_offset`.
    ///
    /// Ошибка транспорта прерывает чтение и возвращается как есть;
    /// содержимое `dest` в этом случае не определено.
    pub fn read_into<S: AccumulatorSource + ?Sized>(
        &mut self,
        source: &mut S,
        start_offset: usize,
        dest: &mut [u8],
    ) -> CirResult<ReadSummary> {
        let end = start_offset
            .checked_add(dest.len())
            .filter(|&end| end <= u16::MAX as usize + 1)
            .ok_or_else(|| {
                CirError::format_violation(format!(
                    "accumulator range at {start_offset} (+{} bytes) exceeds 16-bit addressing",
                    dest.len()
                ))
            })?;

        let mut summary = ReadSummary {
            end_offset: start_offset,
            ..Default::default()
        };
        let mut written = 0;

        while written < dest.len() {
            let to_read = (dest.len() - written).min(self.chunk_limit);
            let offset = (start_offset + written) as u16;

            let window = &mut self.scratch[..to_read + 1];
            window.fill(0);
            source.read_accumulator(offset, window)?;

            dest[written..written + to_read].copy_from_slice(&window[1..]);

            written += to_read;
            summary.chunks += 1;
            summary.last_chunk = to_read;
        }

        summary.bytes = written;
        summary.end_offset = end;

        Ok(summary)
    }

    /// Заполняет `cir` начиная с выборки `first_sample`.
    pub fn read_cir<S: AccumulatorSource + ?Sized>(
        &mut self,
        source: &mut S,
        first_sample: usize,
        cir: &mut CirBuffer,
    ) -> CirResult<ReadSummary> {
        let offset = first_sample
            .checked_mul(SAMPLE_SIZE)
            .ok_or_else(|| CirError::format_violation("first sample out of range"))?;

        self.read_into(source, offset, cir.as_bytes_mut())
    }
}

impl CirWindow {
    /// Нужна ли диагностика для выбора окна.
    pub fn needs_diagnostics(&self) -> bool {
        matches!(self, CirWindow::AroundFirstPath { .. })
    }

    /// Первая выборка окна длиной `window_len` в аккумуляторе глубиной `depth`.
    pub fn start_sample(
        &self,
        diagnostics: Option<&RxDiagnostics>,
        window_len: usize,
        depth: usize,
    ) -> usize {
        match (self, diagnostics) {
            (CirWindow::AroundFirstPath { before }, Some(diag)) => diag
                .first_path_index()
                .saturating_sub(*before)
                .min(depth.saturating_sub(window_len)),
            _ => 0,
        }
    }
}

impl Default for AccumulatorReader {
    fn default() -> Self {
        Self {
            chunk_limit: ACC_CHUNK,
            scratch: vec![0u8; ACC_CHUNK + 1],
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
