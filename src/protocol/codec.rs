//! Byte-order helpers: component A.
//!
//! Pure, stateless reads over byte slices. PostgreSQL uses big-endian
//! (network byte order) for all integers on the wire.

use zerocopy::FromBytes;
use zerocopy::byteorder::big_endian::{I32 as I32BE, U16 as U16BE, U32 as U32BE};

use crate::error::Error;

/// Read a 16-bit big-endian unsigned integer from the first two bytes.
#[inline]
pub fn read_u16_be(data: &[u8]) -> Result<(u16, &[u8]), Error> {
    if data.len() < 2 {
        return Err(short_buffer("read_u16_be", 2, data.len()));
    }
    let value = U16BE::ref_from_bytes(&data[..2])?.get();
    Ok((value, &data[2..]))
}

/// Read a 32-bit big-endian unsigned integer from the first four bytes.
#[inline]
pub fn read_u32_be(data: &[u8]) -> Result<(u32, &[u8]), Error> {
    if data.len() < 4 {
        return Err(short_buffer("read_u32_be", 4, data.len()));
    }
    let value = U32BE::ref_from_bytes(&data[..4])?.get();
    Ok((value, &data[4..]))
}

/// Read a 32-bit big-endian signed integer from the first four bytes.
///
/// Used for Bind parameter lengths, which are a signed Int32 on the wire.
#[inline]
pub fn read_i32_be(data: &[u8]) -> Result<(i32, &[u8]), Error> {
    if data.len() < 4 {
        return Err(short_buffer("read_i32_be", 4, data.len()));
    }
    let value = I32BE::ref_from_bytes(&data[..4])?.get();
    Ok((value, &data[4..]))
}

/// Read `len` raw bytes.
#[inline]
pub fn read_bytes(data: &[u8], len: usize) -> Result<(&[u8], &[u8]), Error> {
    if data.len() < len {
        return Err(short_buffer("read_bytes", len, data.len()));
    }
    Ok((&data[..len], &data[len..]))
}

/// Read the bytes up to (not including) the first NUL, advancing past it.
///
/// Fails with `InvalidString` (io::ErrorKind::InvalidData) if no NUL byte
/// remains in `data`.
#[inline]
pub fn read_cstring(data: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    match memchr::memchr(0, data) {
        Some(pos) => Ok((&data[..pos], &data[pos + 1..])),
        None => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "read_cstring: no NUL terminator found",
        ))),
    }
}

/// Read a NUL-terminated string and validate it as UTF-8.
#[inline]
pub fn read_cstr(data: &[u8]) -> Result<(&str, &[u8]), Error> {
    let (bytes, rest) = read_cstring(data)?;
    let s = simdutf8::compat::from_utf8(bytes).map_err(|e| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("read_cstr: invalid UTF-8: {e}"),
        ))
    })?;
    Ok((s, rest))
}

fn short_buffer(what: &str, need: usize, have: usize) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("{what}: buffer too short: {have} < {need}"),
    ))
}
