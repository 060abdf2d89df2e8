//! Формат файла записи CIR
//!
//! Один файл на каждый принятый кадр. Позиционный формат без заголовка и без
//! префикса длины; все числа в порядке байт хоста.
//!
//! ```text
//! [0..4]    FRAME_NUMBER   i32        номер кадра
//! [4..12]   RX_TIMESTAMP   u64        метка приёма (младшие 40 бит)
//! [12..]    CIR            N × (i16, i16) выборки (real, imag)
//! ```

use std::io::{Cursor, Read};

use byteorder::{ByteOrder, NativeEndian, ReadBytesExt};
use cir_types::{CaptureRecord, CirBuffer, CirError, CirResult, CirSample, SAMPLE_SIZE};

/// Размер полей перед выборками: номер кадра + метка времени.
pub const RECORD_HEADER_SIZE: usize = 4 + 8;

/// Ёмкость локального приёмного буфера (байт).
pub const RX_BUF_LEN: usize = 24;

/// Маска длины кадра в регистре RX_FINFO.
pub const RX_FINFO_RXFL_MASK_1023: u32 = 0x3FF;

/// Суффикс имени файла записи.
pub const CIR_FILE_SUFFIX: &str = "_cir.bin";

/// Полный размер записи для `sample_count` выборок: `12 + 4N`.
pub fn record_size(sample_count: usize) -> usize {
    RECORD_HEADER_SIZE + SAMPLE_SIZE * sample_count
}

/// Сериализует поля перед выборками.
pub fn encode_header(
    frame_number: i32,
    rx_timestamp: u64,
) -> [u8; RECORD_HEADER_SIZE] {
    let mut buf = [0u8; RECORD_HEADER_SIZE];

    NativeEndian::write_i32(&mut buf[0..4], frame_number);
    NativeEndian::write_u64(&mut buf[4..12], rx_timestamp);

    buf
}

/// Сериализует запись целиком.
pub fn encode_record(
    frame_number: i32,
    rx_timestamp: u64,
    cir: &CirBuffer,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(record_size(cir.sample_count()));

    buf.extend_from_slice(&encode_header(frame_number, rx_timestamp));
    buf.extend_from_slice(cir.as_bytes());

    buf
}

/// Десериализует запись с известным числом выборок.
pub fn decode_record_with(
    buf: &[u8],
    sample_count: usize,
) -> CirResult<CaptureRecord> {
    let expected = record_size(sample_count);

    if buf.len() != expected {
        return Err(CirError::format_violation(format!(
            "record of {} bytes, expected {expected} for {sample_count} samples",
            buf.len()
        )));
    }

    let mut cur = Cursor::new(buf);
    let frame_number = cur.read_i32::<NativeEndian>()?;
    let rx_timestamp = cur.read_u64::<NativeEndian>()?;

    let mut samples = Vec::with_capacity(sample_count);
    let mut pair = [0u8; SAMPLE_SIZE];

    for _ in 0..sample_count {
        cur.read_exact(&mut pair)?;
        samples.push(CirSample::from_ne_bytes(pair));
    }

    Ok(CaptureRecord::new(frame_number, rx_timestamp, samples))
}

/// Десериализует запись, выводя число выборок из её длины.
pub fn decode_record(buf: &[u8]) -> CirResult<CaptureRecord> {
    let sample_count = sample_count_for_len(buf.len())?;

    decode_record_with(buf, sample_count)
}

/// Число выборок для записи длиной `len` байт.
pub fn sample_count_for_len(len: usize) -> CirResult<usize> {
    if len < RECORD_HEADER_SIZE {
        return Err(CirError::format_violation(format!(
            "record of {len} bytes is shorter than the {RECORD_HEADER_SIZE}-byte header"
        )));
    }

    let payload = len - RECORD_HEADER_SIZE;

    if payload % SAMPLE_SIZE != 0 {
        return Err(CirError::format_violation(format!(
            "sample area of {payload} bytes is not a multiple of {SAMPLE_SIZE}"
        )));
    }

    Ok(payload / SAMPLE_SIZE)
}
