//! String codecs shared by every layer of the format: NUL-terminated
//! codepage strings (optionally padded to even length), NUL16-terminated
//! UTF-16LE strings, length-prefixed strings and fixed-size NUL-padded
//! buffers.

mod fixed_size_string;
mod null_terminated_string;
mod sized_string;
mod string_encoding;

pub use fixed_size_string::*;
pub use null_terminated_string::*;
pub use sized_string::*;
pub use string_encoding::*;

use std::io::{self, Read};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use encoding_rs::Encoding;

/// Read a NUL-terminated single-byte string. With `padding`, one extra byte
/// is consumed whenever the consumed length including the terminator is odd,
/// restoring even alignment.
pub(crate) fn read_cstring<R: Read>(
    reader: &mut R,
    encoding: &'static Encoding,
    padding: bool,
) -> io::Result<String> {
    let mut buffer = Vec::new();
    loop {
        let c = reader.read_u8()?;
        if c == 0 {
            break;
        }
        buffer.push(c);
    }
    if padding && buffer.len() % 2 == 0 {
        let _ = reader.read_u8()?;
    }
    let (cow, _, _) = encoding.decode(&buffer);
    Ok(cow.into_owned())
}

/// The writing counterpart of [`read_cstring`].
pub(crate) fn put_cstring(buf: &mut Vec<u8>, s: &str, encoding: &'static Encoding, padding: bool) {
    let (encoded, _, _) = encoding.encode(s);
    buf.extend_from_slice(&encoded);
    buf.push(0);
    if padding && encoded.len() % 2 == 0 {
        buf.push(0);
    }
}

/// Read byte pairs until a NUL16 terminator and decode them as UTF-16LE.
pub(crate) fn read_cunicode<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut units = Vec::new();
    loop {
        let unit = reader.read_u16::<LE>()?;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    Ok(String::from_utf16_lossy(&units))
}

/// Write a string as UTF-16LE followed by a NUL16 terminator.
pub(crate) fn put_cunicode(buf: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16() {
        buf.write_u16::<LE>(unit).unwrap();
    }
    buf.write_u16::<LE>(0).unwrap();
}

/// Write a character-count-prefixed string; UTF-16LE code units for
/// [`StringEncoding::Unicode`], codepage bytes otherwise.
pub(crate) fn put_sized_string(buf: &mut Vec<u8>, s: &str, encoding: StringEncoding) {
    match encoding {
        StringEncoding::Unicode => {
            let count = s.encode_utf16().count() as u16;
            buf.write_u16::<LE>(count).unwrap();
            for unit in s.encode_utf16() {
                buf.write_u16::<LE>(unit).unwrap();
            }
        }
        StringEncoding::CodePage(codepage) => {
            let (encoded, _, _) = codepage.encode(s);
            buf.write_u16::<LE>(encoded.len() as u16).unwrap();
            buf.extend_from_slice(&encoded);
        }
    }
}

/// Write a string into a fixed-size NUL-padded buffer. Fails when the
/// encoded form does not fit.
pub(crate) fn put_fixed_size_string(
    buf: &mut Vec<u8>,
    s: &str,
    size: usize,
    encoding: StringEncoding,
) -> crate::Result<()> {
    let encoded: Vec<u8> = match encoding {
        StringEncoding::Unicode => s.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect(),
        StringEncoding::CodePage(codepage) => codepage.encode(s).0.into_owned(),
    };
    if encoded.len() > size {
        return Err(crate::Error::Validation(format!(
            "string of {} bytes does not fit into a {size} byte buffer",
            encoded.len()
        )));
    }
    buf.extend_from_slice(&encoded);
    buf.resize(buf.len() + size - encoded.len(), 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1251;
    use std::io::Cursor;

    #[test]
    fn cstring_padding_keeps_even_alignment() {
        let mut buf = Vec::new();
        put_cstring(&mut buf, "hi", WINDOWS_1251, true);
        // two bytes, terminator, one pad byte
        assert_eq!(buf, b"hi\x00\x00");
        let mut buf = Vec::new();
        put_cstring(&mut buf, "abc", WINDOWS_1251, true);
        assert_eq!(buf, b"abc\x00");

        let mut r = Cursor::new(b"hi\x00\x00rest".to_vec());
        assert_eq!(read_cstring(&mut r, WINDOWS_1251, true).unwrap(), "hi");
        assert_eq!(r.position(), 4);
    }

    #[test]
    fn cunicode_round_trip() {
        let mut buf = Vec::new();
        put_cunicode(&mut buf, "Calculator");
        let mut r = Cursor::new(buf);
        assert_eq!(read_cunicode(&mut r).unwrap(), "Calculator");
    }
}
