use binread::BinRead;
use encoding_rs::{Encoding, UTF_16LE};

use crate::strings::{put_fixed_size_string, FixedSizeString, StringEncoding};

#[cfg(feature = "serde")]
use serde::Serialize;

/// The IconEnvironmentDataBlock structure specifies the path to an icon,
/// encoded using environment variables so it resolves across machines.
/// Same fixed 0x314-byte layout as the environment-variable block.
#[derive(Clone, Debug, Default, PartialEq, Eq, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(import(default_codepage: &'static Encoding))]
pub struct IconEnvironmentDataBlock {
    /// The icon path in the system default code page.
    #[br(args(260, default_codepage), map = |s: FixedSizeString| s.to_string())]
    target_ansi: String,
    /// The icon path as Unicode.
    #[br(args(520, UTF_16LE), map = |s: FixedSizeString| s.to_string())]
    target_unicode: String,
}

impl IconEnvironmentDataBlock {
    /// A block echoing `target` in both encodings.
    pub fn new(target: &str) -> Self {
        Self {
            target_ansi: target.to_string(),
            target_unicode: target.to_string(),
        }
    }

    pub fn target_ansi(&self) -> &str {
        &self.target_ansi
    }

    pub fn target_unicode(&self) -> &str {
        &self.target_unicode
    }

    pub(crate) fn payload_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(780);
        put_fixed_size_string(&mut out, &self.target_ansi, 260, StringEncoding::CodePage(codepage))?;
        put_fixed_size_string(&mut out, &self.target_unicode, 520, StringEncoding::Unicode)?;
        debug_assert_eq!(out.len() + 8, 0x314);
        Ok(out)
    }
}

impl std::fmt::Display for IconEnvironmentDataBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IconEnvironmentDataBlock\n TargetAnsi: {}\n TargetUnicode: {}",
            self.target_ansi, self.target_unicode
        )
    }
}
