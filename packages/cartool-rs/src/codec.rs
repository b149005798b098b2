//! Fixed-width field primitives shared by every binary Cartool format.
//!
//! All fields are little-endian. A short read anywhere in a header or
//! payload is reported as [`CartoolError::Format`]: a file that ends before
//! its declared size is corrupt, not an I/O failure.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

use crate::error::{CartoolError, Result};
use crate::types::Dimensionality;

/// Width of the magic identifier at the start of tagged formats
pub const TAG_LEN: usize = 4;

fn eof_as_format(err: std::io::Error, what: &str) -> CartoolError {
    if err.kind() == ErrorKind::UnexpectedEof {
        CartoolError::format(format!("file ended while reading {}", what))
    } else {
        CartoolError::Io(err)
    }
}

/// Read exactly `len` bytes without trusting `len` for the allocation size
pub fn read_bytes<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| eof_as_format(e, what))?;

    if buffer.len() < len {
        return Err(CartoolError::format(format!(
            "truncated {}: expected {} bytes, found {}",
            what,
            len,
            buffer.len()
        )));
    }
    Ok(buffer)
}

/// Read an `n`-character magic tag
pub fn read_tag<R: Read>(reader: &mut R, n: usize) -> Result<String> {
    let bytes = read_bytes(reader, n, "magic tag")?;
    String::from_utf8(bytes)
        .map_err(|_| CartoolError::format("magic tag is not valid ASCII"))
}

/// Read a 4-byte tag and check it against the accepted set
pub fn expect_tag<R: Read>(reader: &mut R, accepted: &[&str], format_name: &str) -> Result<String> {
    let tag = read_tag(reader, TAG_LEN)?;
    if !accepted.contains(&tag.as_str()) {
        return Err(CartoolError::format(format!(
            "{:?} is not a valid {} tag (expected one of {:?})",
            tag, format_name, accepted
        )));
    }
    Ok(tag)
}

pub fn write_tag<W: Write>(writer: &mut W, tag: &str) -> Result<()> {
    writer.write_all(tag.as_bytes())?;
    Ok(())
}

pub fn read_u16<R: Read>(reader: &mut R, what: &str) -> Result<u16> {
    reader
        .read_u16::<LittleEndian>()
        .map_err(|e| eof_as_format(e, what))
}

pub fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    reader
        .read_u32::<LittleEndian>()
        .map_err(|e| eof_as_format(e, what))
}

pub fn read_f32<R: Read>(reader: &mut R, what: &str) -> Result<f32> {
    reader
        .read_f32::<LittleEndian>()
        .map_err(|e| eof_as_format(e, what))
}

pub fn read_f64<R: Read>(reader: &mut R, what: &str) -> Result<f64> {
    reader
        .read_f64::<LittleEndian>()
        .map_err(|e| eof_as_format(e, what))
}

/// Read a `u32` count field as a `usize`
pub fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let value = read_u32(reader, what)?;
    usize::try_from(value)
        .map_err(|_| CartoolError::format(format!("{} ({}) does not fit in memory", what, value)))
}

pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_u16::<LittleEndian>(value)?;
    Ok(())
}

pub fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<()> {
    writer.write_f32::<LittleEndian>(value)?;
    Ok(())
}

pub fn write_f64<W: Write>(writer: &mut W, value: f64) -> Result<()> {
    writer.write_f64::<LittleEndian>(value)?;
    Ok(())
}

/// Write a count as `u32`, rejecting values the format cannot hold
pub fn write_count<W: Write>(writer: &mut W, value: usize, what: &str) -> Result<()> {
    let value = u32::try_from(value).map_err(|_| {
        CartoolError::argument(format!("{} ({}) exceeds the u32 header field", what, value))
    })?;
    writer.write_u32::<LittleEndian>(value)?;
    Ok(())
}

/// Read a NUL-padded name field of `width` bytes.
///
/// The field is split on NUL and the first non-empty segment is kept.
/// A field with no non-empty segment is a format error.
pub fn read_fixed_name<R: Read>(reader: &mut R, width: usize, what: &str) -> Result<String> {
    let bytes = read_bytes(reader, width, what)?;
    let segment = bytes
        .split(|&b| b == 0)
        .find(|segment| !segment.is_empty())
        .ok_or_else(|| CartoolError::format(format!("{} is empty", what)))?;

    std::str::from_utf8(segment)
        .map(str::to_string)
        .map_err(|_| CartoolError::format(format!("{} is not valid UTF-8", what)))
}

/// A name that survives a `width`-byte NUL-padded field unchanged
pub fn check_fixed_name(name: &str, width: usize, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CartoolError::argument(format!("{} is empty", what)));
    }
    if name.contains('\0') {
        return Err(CartoolError::argument(format!("{} {:?} contains a NUL byte", what, name)));
    }
    if name.len() > width {
        return Err(CartoolError::argument(format!(
            "{} {:?} is {} bytes long, the field holds {}",
            what,
            name,
            name.len(),
            width
        )));
    }
    Ok(())
}

/// Write `name` into exactly `width` bytes, truncated on a character
/// boundary and right-padded with `pad`
pub fn write_fixed_name<W: Write>(writer: &mut W, name: &str, width: usize, pad: u8) -> Result<()> {
    let mut end = name.len().min(width);
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    let mut buffer = vec![pad; width];
    buffer[..end].copy_from_slice(&name.as_bytes()[..end]);
    writer.write_all(&buffer)?;
    Ok(())
}

pub fn read_flag_byte<R: Read>(reader: &mut R) -> Result<Dimensionality> {
    let flag = reader
        .read_u8()
        .map_err(|e| eof_as_format(e, "scalar flag"))?;
    Dimensionality::from_flag(flag)
}

pub fn write_flag_byte<W: Write>(writer: &mut W, dimensionality: Dimensionality) -> Result<()> {
    writer.write_u8(dimensionality.flag())?;
    Ok(())
}

/// Product of declared dimensions; overflow means the header is corrupt
pub fn element_count(dims: &[usize], what: &str) -> Result<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)).ok_or_else(|| {
        CartoolError::format(format!("declared {} size {:?} overflows", what, dims))
    })
}

pub fn read_f32_payload<R: Read>(reader: &mut R, count: usize, what: &str) -> Result<Vec<f32>> {
    let len = count
        .checked_mul(4)
        .ok_or_else(|| CartoolError::format(format!("declared {} size overflows", what)))?;
    let bytes = read_bytes(reader, len, what)?;

    let mut values = vec![0f32; count];
    LittleEndian::read_f32_into(&bytes, &mut values);
    Ok(values)
}

pub fn read_f64_payload<R: Read>(reader: &mut R, count: usize, what: &str) -> Result<Vec<f64>> {
    let len = count
        .checked_mul(8)
        .ok_or_else(|| CartoolError::format(format!("declared {} size overflows", what)))?;
    let bytes = read_bytes(reader, len, what)?;

    let mut values = vec![0f64; count];
    LittleEndian::read_f64_into(&bytes, &mut values);
    Ok(values)
}

pub fn write_f32_payload<W, I>(writer: &mut W, values: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = f32>,
{
    for value in values {
        writer.write_f32::<LittleEndian>(value)?;
    }
    Ok(())
}

pub fn write_f64_payload<W, I>(writer: &mut W, values: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = f64>,
{
    for value in values {
        writer.write_f64::<LittleEndian>(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_tag() {
        let mut cursor = Cursor::new(b"RI01rest".to_vec());
        assert_eq!(read_tag(&mut cursor, 4).unwrap(), "RI01");
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_expect_tag_rejects_unknown() {
        let mut cursor = Cursor::new(b"XX99".to_vec());
        let result = expect_tag(&mut cursor, &["IS01", "IS02", "IS03"], "inverse solution");
        assert!(matches!(result, Err(CartoolError::Format(_))));
    }

    #[test]
    fn test_short_tag_is_format_error() {
        let mut cursor = Cursor::new(b"RI".to_vec());
        let result = read_tag(&mut cursor, 4);
        assert!(matches!(result, Err(CartoolError::Format(_))));
    }

    #[test]
    fn test_truncated_u32_is_format_error() {
        let mut cursor = Cursor::new(vec![1u8, 0]);
        let result = read_u32(&mut cursor, "n_channels");
        assert!(matches!(result, Err(CartoolError::Format(_))));
    }

    #[test]
    fn test_fixed_name_takes_first_segment() {
        let mut field = b"Fp1".to_vec();
        field.resize(8, 0);
        let mut cursor = Cursor::new(field);
        assert_eq!(read_fixed_name(&mut cursor, 8, "channel name").unwrap(), "Fp1");
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_fixed_name_skips_leading_nul() {
        let mut cursor = Cursor::new(b"\0\0Cz\0\0\0\0".to_vec());
        assert_eq!(read_fixed_name(&mut cursor, 8, "channel name").unwrap(), "Cz");
    }

    #[test]
    fn test_fixed_name_all_nul_fails() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let result = read_fixed_name(&mut cursor, 16, "solution point name");
        assert!(matches!(result, Err(CartoolError::Format(_))));
    }

    #[test]
    fn test_write_fixed_name_pads_and_truncates() {
        let mut out = Vec::new();
        write_fixed_name(&mut out, "Fp1", 8, b' ').unwrap();
        assert_eq!(out, b"Fp1     ");

        let mut out = Vec::new();
        write_fixed_name(&mut out, "VeryLongName", 8, 0).unwrap();
        assert_eq!(out, b"VeryLong");
    }

    #[test]
    fn test_write_fixed_name_respects_char_boundary() {
        let mut out = Vec::new();
        // 'é' is two bytes; cutting at 4 would split it
        write_fixed_name(&mut out, "abcé", 4, 0).unwrap();
        assert_eq!(out, b"abc\0");
    }

    #[test]
    fn test_check_fixed_name() {
        assert!(check_fixed_name("Fp1", 8, "channel name").is_ok());
        assert!(check_fixed_name("12345678", 8, "channel name").is_ok());
        for name in ["", "123456789", "Fp\01"] {
            assert!(matches!(
                check_fixed_name(name, 8, "channel name"),
                Err(CartoolError::Argument(_))
            ));
        }
        // width counts bytes, not characters
        assert!(check_fixed_name("éééé", 4, "channel name").is_err());
    }

    #[test]
    fn test_flag_byte() {
        let mut cursor = Cursor::new(vec![0x01, 0x00, 0x02]);
        assert_eq!(read_flag_byte(&mut cursor).unwrap(), Dimensionality::Scalar);
        assert_eq!(read_flag_byte(&mut cursor).unwrap(), Dimensionality::Vectorial);
        assert!(matches!(read_flag_byte(&mut cursor), Err(CartoolError::Format(_))));
    }

    #[test]
    fn test_payload_round_trip() {
        let values = vec![1.5f32, -2.25, 0.0, 1e-7];
        let mut out = Vec::new();
        write_f32_payload(&mut out, values.iter().copied()).unwrap();
        assert_eq!(out.len(), 16);

        let decoded = read_f32_payload(&mut Cursor::new(out), 4, "payload").unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_truncated_payload() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        let result = read_f64_payload(&mut cursor, 2, "leadfield payload");
        assert!(matches!(result, Err(CartoolError::Format(_))));
    }

    #[test]
    fn test_element_count_overflow() {
        let result = element_count(&[usize::MAX, 3], "payload");
        assert!(matches!(result, Err(CartoolError::Format(_))));
        assert_eq!(element_count(&[3, 5000, 2048], "payload").unwrap(), 30_720_000);
    }
}
