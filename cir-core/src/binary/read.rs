use byteorder::{ByteOrder, NativeEndian};
use cir_types::{CirError, CirResult};

fn field<'a>(
    buf: &'a [u8],
    off: usize,
    size: usize,
) -> CirResult<&'a [u8]> {
    buf.get(off..off + size).ok_or(CirError::FrameTooShort {
        len: buf.len(),
        required: off + size,
    })
}

pub fn read_u8_at(
    buf: &[u8],
    off: usize,
) -> CirResult<u8> {
    Ok(field(buf, off, 1)?[0])
}

pub fn read_i32_at(
    buf: &[u8],
    off: usize,
) -> CirResult<i32> {
    Ok(NativeEndian::read_i32(field(buf, off, 4)?))
}

pub fn read_u64_at(
    buf: &[u8],
    off: usize,
) -> CirResult<u64> {
    Ok(NativeEndian::read_u64(field(buf, off, 8)?))
}
