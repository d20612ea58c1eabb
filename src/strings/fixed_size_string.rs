use core::fmt::Display;

use binread::BinRead;
use encoding_rs::Encoding;

/// A string stored in a buffer of a fixed size, padded with NUL bytes.
/// The trailing padding is stripped on read.
#[derive(Clone, Debug)]
pub struct FixedSizeString(String);

impl BinRead for FixedSizeString {
    type Args = (usize, &'static Encoding);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let (count, encoding) = args;
        let mut buffer = vec![0; count];
        reader.read_exact(&mut buffer)?;

        let (cow, _, _) = encoding.decode(&buffer);
        Ok(Self(cow.trim_end_matches('\0').to_string()))
    }
}

impl Display for FixedSizeString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for FixedSizeString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
