use std::fmt::Display;

use binread::{BinRead, BinReaderExt};
use encoding_rs::UTF_16LE;
use log::trace;

use crate::strings::StringEncoding;

/// A string which is not NULL-terminated, but whose character count is
/// stored in the two bytes preceding it.
#[derive(Clone, Debug)]
pub struct SizedString(String);

impl BinRead for SizedString {
    type Args = (StringEncoding,);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let count_characters: u16 = reader.read_le()?;
        trace!(
            "reading sized string of size '{count_characters}' at 0x{:08x}",
            reader.stream_position()?
        );

        match args.0 {
            StringEncoding::CodePage(codepage) => {
                let mut buffer = vec![0; count_characters.into()];
                reader.read_exact(&mut buffer)?;
                let (cow, _, _) = codepage.decode(&buffer);
                Ok(Self(cow.into_owned()))
            }
            StringEncoding::Unicode => {
                let mut buffer = vec![0; usize::from(count_characters) * 2];
                reader.read_exact(&mut buffer)?;
                let (cow, _, _) = UTF_16LE.decode(&buffer);
                Ok(Self(cow.into_owned()))
            }
        }
    }
}

impl Display for SizedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for SizedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
