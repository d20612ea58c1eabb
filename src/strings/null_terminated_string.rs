use core::fmt::Display;

use binread::BinRead;

use crate::strings::{read_cstring, read_cunicode, StringEncoding};

/// A string of unknown length which is NULL-terminated.
#[derive(Clone, Debug)]
pub struct NullTerminatedString(String);

impl BinRead for NullTerminatedString {
    type Args = (StringEncoding,);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        match args.0 {
            StringEncoding::CodePage(codepage) => {
                Ok(Self(read_cstring(reader, codepage, false)?))
            }
            StringEncoding::Unicode => Ok(Self(read_cunicode(reader)?)),
        }
    }
}

impl Display for NullTerminatedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for NullTerminatedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
