use encoding_rs::Encoding;

use crate::LinkFlags;

/// Selects how a string is encoded on disk.
#[derive(Copy, Clone, Debug)]
pub enum StringEncoding {
    /// A single-byte code page.
    CodePage(&'static Encoding),

    /// UNICODE (UTF-16LE on Windows).
    Unicode,
}

impl StringEncoding {
    /// The encoding of the STRING_DATA section is chosen once per file by
    /// the `IS_UNICODE` link flag.
    pub fn from_flags(link_flags: LinkFlags, codepage: &'static Encoding) -> Self {
        if link_flags.contains(LinkFlags::IS_UNICODE) {
            Self::Unicode
        } else {
            Self::CodePage(codepage)
        }
    }
}
