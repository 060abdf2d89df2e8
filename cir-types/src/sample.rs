use crate::{CirError, CirResult};

/// Размер одной комплексной выборки в байтах (I16 + Q16).
pub const SAMPLE_SIZE: usize = 4;

/// Одна комплексная выборка импульсной характеристики канала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CirSample {
    pub real: i16,
    pub imag: i16,
}

/// Буфер выборок CIR фиксированной длины.
///
/// Хранится в "сыром" виде: чередующиеся пары 16-битных чисел в порядке
/// байт хоста, ровно так, как их отдаёт память аккумулятора.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CirBuffer {
    data: Vec<u8>,
    sample_count: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CirSample {
    pub fn new(
        real: i16,
        imag: i16,
    ) -> Self {
        Self { real, imag }
    }

    pub fn from_ne_bytes(b: [u8; SAMPLE_SIZE]) -> Self {
        Self {
            real: i16::from_ne_bytes([b[0], b[1]]),
            imag: i16::from_ne_bytes([b[2], b[3]]),
        }
    }

    pub fn to_ne_bytes(self) -> [u8; SAMPLE_SIZE] {
        let r = self.real.to_ne_bytes();
        let i = self.imag.to_ne_bytes();
        [r[0], r[1], i[0], i[1]]
    }

    /// Квадрат модуля (без переполнения: i16² + i16² < u32::MAX).
    pub fn power(&self) -> u32 {
        let r = self.real as i32;
        let i = self.imag as i32;
        (r * r) as u32 + (i * i) as u32
    }
}

impl CirBuffer {
    /// Выделяет обнулённый буфер на `sample_count` выборок.
    ///
    /// Нехватка памяти возвращается как [`CirError::Allocation`], а не
    /// аварийно завершает процесс.
    pub fn new(sample_count: usize) -> CirResult<Self> {
        let bytes = sample_count
            .checked_mul(SAMPLE_SIZE)
            .ok_or(CirError::Allocation { bytes: usize::MAX })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| CirError::Allocation { bytes })?;
        data.resize(bytes, 0);

        Ok(Self { data, sample_count })
    }

    pub fn from_samples(samples: &[CirSample]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();

        Self {
            data,
            sample_count: samples.len(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Размер в байтах, всегда `4 * sample_count`.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Обнуляет содержимое перед очередным захватом.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn sample(
        &self,
        index: usize,
    ) -> Option<CirSample> {
        let off = index.checked_mul(SAMPLE_SIZE)?;
        let b = self.data.get(off..off + SAMPLE_SIZE)?;

        Some(CirSample::from_ne_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn samples(&self) -> impl Iterator<Item = CirSample> + '_ {
        self.data
            .chunks_exact(SAMPLE_SIZE)
            .map(|b| CirSample::from_ne_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Самый мощный отвод CIR: (индекс, выборка).
    pub fn peak(&self) -> Option<(usize, CirSample)> {
        self.samples()
            .enumerate()
            .max_by_key(|(i, s)| (s.power(), std::cmp::Reverse(*i)))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_invariant() {
        let buf = CirBuffer::new(1016).unwrap();

        assert_eq!(buf.sample_count(), 1016);
        assert_eq!(buf.byte_len(), 4 * 1016);
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clear_zeroes_previous_capture() {
        let mut buf = CirBuffer::new(4).unwrap();
        buf.as_bytes_mut().fill(0xAA);
        buf.clear();

        assert!(buf.samples().all(|s| s == CirSample::default()));
        assert_eq!(buf.byte_len(), 16);
    }

    #[test]
    fn test_sample_access_native_order() {
        let samples = [CirSample::new(-1, 2), CirSample::new(i16::MAX, i16::MIN)];
        let buf = CirBuffer::from_samples(&samples);

        assert_eq!(buf.sample(0), Some(samples[0]));
        assert_eq!(buf.sample(1), Some(samples[1]));
        assert_eq!(buf.sample(2), None);
        assert_eq!(&buf.as_bytes()[0..2], &(-1i16).to_ne_bytes());
    }

    #[test]
    fn test_peak_prefers_first_of_equal_taps() {
        let samples = [
            CirSample::new(1, 1),
            CirSample::new(300, -400),
            CirSample::new(-400, 300),
            CirSample::new(2, 0),
        ];
        let buf = CirBuffer::from_samples(&samples);

        assert_eq!(buf.peak(), Some((1, samples[1])));
        assert_eq!(CirBuffer::new(0).unwrap().peak(), None);
    }

    #[test]
    fn test_power_extremes() {
        let s = CirSample::new(i16::MIN, i16::MIN);
        assert_eq!(s.power(), 2 * 32_768 * 32_768);
    }
}
