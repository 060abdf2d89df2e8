use byteorder::{ByteOrder, NativeEndian};
use cir_types::{CirError, CirResult};

fn field_mut<'a>(
    buf: &'a mut [u8],
    off: usize,
    size: usize,
) -> CirResult<&'a mut [u8]> {
    let len = buf.len();

    buf.get_mut(off..off + size).ok_or(CirError::FrameTooShort {
        len,
        required: off + size,
    })
}

pub fn write_u8_at(
    buf: &mut [u8],
    off: usize,
    val: u8,
) -> CirResult<()> {
    field_mut(buf, off, 1)?[0] = val;
    Ok(())
}

pub fn write_i32_at(
    buf: &mut [u8],
    off: usize,
    val: i32,
) -> CirResult<()> {
    NativeEndian::write_i32(field_mut(buf, off, 4)?, val);
    Ok(())
}

pub fn write_u64_at(
    buf: &mut [u8],
    off: usize,
    val: u64,
) -> CirResult<()> {
    NativeEndian::write_u64(field_mut(buf, off, 8)?, val);
    Ok(())
}
