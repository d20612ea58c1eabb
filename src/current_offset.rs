use binread::BinRead;

/// Captures the absolute stream position at the point it is read. Used by
/// structures whose internal offsets are relative to their own start.
#[derive(Clone, Copy, Debug)]
pub struct CurrentOffset(u64);

impl BinRead for CurrentOffset {
    type Args = ();

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        _args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        Ok(Self(reader.stream_position()?))
    }
}

impl AsRef<u64> for CurrentOffset {
    fn as_ref(&self) -> &u64 {
        &self.0
    }
}
