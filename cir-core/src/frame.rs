//! Кадры, которыми обмениваются передатчики и приёмник.
//!
//! Оба кадра по 12 байт, последние два зарезервированы под FCS, который
//! DW1000 дописывает сам. Многобайтовые поля в порядке байт хоста.
//!
//! ```text
//! Radar:     [0xC5][SEQ]['D' 'E' 'C' 'A'][COUNT i32][FCS FCS]
//! Headcount: [0xAB][SEQ][UNIX_SECS u64          ][FCS FCS]
//! ```

use cir_types::{CirResult, TIMESTAMP_MASK};

use crate::{read_i32_at, read_u64_at, read_u8_at, write_i32_at, write_u64_at, write_u8_at};

/// Длина кадра вместе с FCS.
pub const FRAME_LEN: usize = 12;

/// Индекс порядкового номера кадра.
pub const FRAME_SN_IDX: usize = 1;

/// Индекс счётчика кадров в кадре radar.
pub const RADAR_FRAME_DATA_IDX: usize = 6;

/// Индекс метки времени в кадре headcount.
pub const HEADCOUNT_TS_IDX: usize = 2;

const RADAR_TEMPLATE: [u8; FRAME_LEN] = [0xC5, 0, b'D', b'E', b'C', b'A', 0, 0, 0, 0, 0, 0];
const HEADCOUNT_TEMPLATE: [u8; FRAME_LEN] = [0xAB, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Кадр передатчика radar: порядковый номер и счётчик отправленных кадров.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadarFrame {
    pub sequence: u8,
    pub frame_count: i32,
}

/// Кадр маяка headcount: порядковый номер и Unix-время отправки (секунды).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadcountFrame {
    pub sequence: u8,
    pub unix_secs: u64,
}

impl RadarFrame {
    pub fn encode(&self) -> CirResult<[u8; FRAME_LEN]> {
        let mut buf = RADAR_TEMPLATE;

        write_u8_at(&mut buf, FRAME_SN_IDX, self.sequence)?;
        write_i32_at(&mut buf, RADAR_FRAME_DATA_IDX, self.frame_count)?;

        Ok(buf)
    }

    /// Разбирает принятый кадр. Короткий кадр: [`cir_types::CirError::FrameTooShort`].
    pub fn decode(buf: &[u8]) -> CirResult<Self> {
        Ok(Self {
            sequence: read_u8_at(buf, FRAME_SN_IDX)?,
            frame_count: read_i32_at(buf, RADAR_FRAME_DATA_IDX)?,
        })
    }
}

impl HeadcountFrame {
    pub fn encode(&self) -> CirResult<[u8; FRAME_LEN]> {
        let mut buf = HEADCOUNT_TEMPLATE;

        write_u8_at(&mut buf, FRAME_SN_IDX, self.sequence)?;
        write_u64_at(&mut buf, HEADCOUNT_TS_IDX, self.unix_secs)?;

        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> CirResult<Self> {
        Ok(Self {
            sequence: read_u8_at(buf, FRAME_SN_IDX)?,
            unix_secs: read_u64_at(buf, HEADCOUNT_TS_IDX)?,
        })
    }
}

/// Собирает 40-битную метку времени из 5 байт регистра (младший байт первый).
pub fn timestamp_from_bytes(raw: [u8; 5]) -> u64 {
    let ts = raw
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64);

    ts & TIMESTAMP_MASK
}

#[cfg(test)]
mod tests {
    use cir_types::CirError;

    use super::*;

    #[test]
    fn test_radar_frame_layout() {
        let frame = RadarFrame {
            sequence: 7,
            frame_count: 0x1122_3344,
        };
        let bytes = frame.encode().unwrap();

        assert_eq!(bytes[0], 0xC5);
        assert_eq!(bytes[1], 7);
        assert_eq!(&bytes[2..6], b"DECA");
        assert_eq!(&bytes[6..10], &0x1122_3344i32.to_ne_bytes());
        assert_eq!(&bytes[10..12], &[0, 0]);
        assert_eq!(RadarFrame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_radar_decode_bounds_checked() {
        let err = RadarFrame::decode(&[0xC5, 1, b'D', b'E', b'C', b'A', 0, 0]).unwrap_err();

        assert!(matches!(
            err,
            CirError::FrameTooShort {
                len: 8,
                required: 10
            }
        ));
        assert!(RadarFrame::decode(&[]).is_err());
    }

    #[test]
    fn test_headcount_frame_layout() {
        let frame = HeadcountFrame {
            sequence: 0,
            unix_secs: 1_704_067_200,
        };
        let bytes = frame.encode().unwrap();

        assert_eq!(bytes[0], 0xAB);
        assert_eq!(&bytes[2..10], &1_704_067_200u64.to_ne_bytes());
        assert_eq!(HeadcountFrame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_timestamp_from_bytes() {
        assert_eq!(timestamp_from_bytes([0x01, 0x02, 0x03, 0x04, 0x05]), 0x05_0403_0201);
        assert_eq!(timestamp_from_bytes([0xFF; 5]), 0xFF_FFFF_FFFF);
        assert_eq!(timestamp_from_bytes([0; 5]), 0);
    }
}
