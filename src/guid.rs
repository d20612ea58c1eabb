use std::fmt::Display;
use std::str::FromStr;

use binread::BinRead;
use uuid::{Builder, Uuid};

/// A GUID in its on-disk form: the first three fields little-endian, the
/// last two big-endian. The text form is brace-wrapped and uppercase, e.g.
/// `{20D04FE0-3AEA-1069-A2D8-08002B30309D}`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Guid(Uuid);

impl Guid {
    /// Wrap a [`Uuid`]; usable in const context.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Reconstruct a GUID from its 16 mixed-endian wire bytes.
    pub fn from_guid_bytes(bytes: [u8; 16]) -> Self {
        Self(Builder::from_bytes_le(bytes).into_uuid())
    }

    /// The 16 mixed-endian wire bytes of this GUID.
    pub fn to_guid_bytes(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for Guid {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl BinRead for Guid {
    type Args = ();

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        _args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let mut bytes = [0; 16];
        reader.read_exact(&mut bytes)?;
        Ok(Self::from_guid_bytes(bytes))
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buffer = Uuid::encode_buffer();
        write!(f, "{{{}}}", self.0.hyphenated().encode_upper(&mut buffer))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_byte_round_trip() {
        let guid: Guid = "{20D04FE0-3AEA-1069-A2D8-08002B30309D}".parse().unwrap();
        let bytes = guid.to_guid_bytes();
        assert_eq!(&bytes[0..8], &[0xE0, 0x4F, 0xD0, 0x20, 0xEA, 0x3A, 0x69, 0x10]);
        assert_eq!(Guid::from_guid_bytes(bytes), guid);
        assert_eq!(guid.to_string(), "{20D04FE0-3AEA-1069-A2D8-08002B30309D}");
    }

    #[test]
    fn rejects_garbage() {
        assert!("{not-a-guid}".parse::<Guid>().is_err());
    }
}
