use binread::BinRead;
use encoding_rs::{Encoding, UTF_16LE};

use crate::strings::{put_fixed_size_string, FixedSizeString, StringEncoding};

#[cfg(feature = "serde")]
use serde::Serialize;

/// The EnvironmentVariableDataBlock structure specifies a path to
/// environment variable information when the link target refers to a
/// location that has a corresponding environment variable.
///
/// The payload is a 260-byte code-page buffer followed by a 520-byte
/// UTF-16LE buffer, both NUL-padded; the serialized block is therefore
/// always 0x314 bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(import(default_codepage: &'static Encoding))]
pub struct EnvironmentVariableDataBlock {
    /// The target path in the system default code page.
    #[br(args(260, default_codepage), map = |s: FixedSizeString| s.to_string())]
    target_ansi: String,
    /// The target path as Unicode.
    #[br(args(520, UTF_16LE), map = |s: FixedSizeString| s.to_string())]
    target_unicode: String,
}

impl EnvironmentVariableDataBlock {
    /// A block echoing `target` in both encodings.
    pub fn new(target: &str) -> Self {
        Self {
            target_ansi: target.to_string(),
            target_unicode: target.to_string(),
        }
    }

    /// The target path in the system default code page, trailing NULs
    /// stripped.
    pub fn target_ansi(&self) -> &str {
        &self.target_ansi
    }

    /// The Unicode target path, trailing NULs stripped.
    pub fn target_unicode(&self) -> &str {
        &self.target_unicode
    }

    /// The preferred target: unicode when present, the code page form
    /// otherwise.
    pub fn target(&self) -> &str {
        if self.target_unicode.is_empty() {
            &self.target_ansi
        } else {
            &self.target_unicode
        }
    }

    pub(crate) fn payload_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(780);
        put_fixed_size_string(&mut out, &self.target_ansi, 260, StringEncoding::CodePage(codepage))?;
        put_fixed_size_string(&mut out, &self.target_unicode, 520, StringEncoding::Unicode)?;
        debug_assert_eq!(out.len() + 8, 0x314);
        Ok(out)
    }
}

impl std::fmt::Display for EnvironmentVariableDataBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EnvironmentVariableDataBlock\n TargetAnsi: {}\n TargetUnicode: {}",
            self.target_ansi, self.target_unicode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binread::BinReaderExt;
    use encoding_rs::WINDOWS_1251;
    use std::io::Cursor;

    #[test]
    fn fixed_payload_size() {
        let block = EnvironmentVariableDataBlock::new("\\\\192.168.1.1\\SHARE\\path\\file.txt");
        let payload = block.payload_bytes(WINDOWS_1251).unwrap();
        assert_eq!(payload.len(), 780);

        let mut cursor = Cursor::new(payload);
        let reread: EnvironmentVariableDataBlock =
            cursor.read_le_args((WINDOWS_1251,)).unwrap();
        assert_eq!(reread, block);
        assert_eq!(reread.target(), "\\\\192.168.1.1\\SHARE\\path\\file.txt");
    }

    #[test]
    fn oversized_target_is_rejected() {
        let block = EnvironmentVariableDataBlock::new(&"x".repeat(300));
        assert!(block.payload_bytes(WINDOWS_1251).is_err());
    }
}
