use std::fmt;

use binread::{BinRead, BinReaderExt};
use byteorder::{ByteOrder, WriteBytesExt, LE};
use chrono::NaiveDateTime;
use uuid::uuid;

use crate::{FileTime, Guid};

#[cfg(feature = "serde")]
use serde::Serialize;

/// `'1SPS'`, the version word of every serialized property store.
const STORE_VERSION: u32 = 0x5350_5331;

/// The format GUID that marks a store as string-keyed.
const STRING_NAMES_FORMAT_ID: Guid =
    Guid::from_uuid(uuid!("d5cdd505-2e9c-101b-9397-08002b2cf9ae"));

/// A typed value conforming to [MS-OLEPS] section 2.15: a 16-bit type code,
/// two bytes of padding, and the raw value bytes. Unknown type codes keep
/// their bytes verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TypedPropertyValue {
    property_type: u16,
    value: Vec<u8>,
}

/// A [`TypedPropertyValue`] interpreted according to its type code.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum DecodedPropertyValue {
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    Str(String),
    FileTime(NaiveDateTime),
    Guid(Guid),
    /// Any type code without a decoder.
    Raw(Vec<u8>),
}

impl TypedPropertyValue {
    pub fn new(property_type: u16, value: Vec<u8>) -> Self {
        Self {
            property_type,
            value,
        }
    }

    /// A value of type 0x1F: a count-prefixed, NUL16-terminated UTF-16LE
    /// string with two alignment bytes when the character count is odd.
    pub fn from_string(value: &str) -> Self {
        let mut out = Self::new(0, Vec::new());
        out.set_string(value);
        out
    }

    pub fn property_type(&self) -> u16 {
        self.property_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Replace this value with a 0x1F string value.
    pub fn set_string(&mut self, value: &str) {
        self.property_type = 0x1f;
        let chars = value.encode_utf16().count();
        let mut buf = Vec::new();
        buf.write_u32::<LE>(chars as u32 + 2).unwrap();
        for unit in value.encode_utf16() {
            buf.write_u16::<LE>(unit).unwrap();
        }
        // terminator, included in the count
        buf.extend_from_slice(&[0, 0, 0, 0]);
        // alignment, not included
        if chars % 2 == 1 {
            buf.extend_from_slice(&[0, 0]);
        }
        self.value = buf;
    }

    pub(crate) fn parse(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::new(0, data.to_vec());
        }
        Self {
            property_type: LE::read_u16(&data[0..2]),
            value: data[4..].to_vec(),
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.value.len() + 4);
        out.write_u16::<LE>(self.property_type).unwrap();
        out.write_u16::<LE>(0).unwrap();
        out.extend_from_slice(&self.value);
        out
    }

    /// Interpret the raw bytes according to the type code.
    pub fn decoded(&self) -> DecodedPropertyValue {
        let v = self.value.as_slice();
        match self.property_type {
            0x13 | 0x17 if v.len() >= 4 => DecodedPropertyValue::U32(LE::read_u32(v)),
            0x16 if v.len() >= 4 => DecodedPropertyValue::I32(LE::read_i32(v)),
            0x14 if v.len() >= 8 => DecodedPropertyValue::I64(LE::read_i64(v)),
            0x15 if v.len() >= 8 => DecodedPropertyValue::U64(LE::read_u64(v)),
            0x1f if v.len() >= 4 => {
                let units: Vec<u16> = v[4..]
                    .chunks_exact(2)
                    .map(LE::read_u16)
                    .collect();
                DecodedPropertyValue::Str(
                    String::from_utf16_lossy(&units).trim_end_matches('\0').to_string(),
                )
            }
            0x40 if v.len() >= 8 => {
                DecodedPropertyValue::FileTime(FileTime::from(LE::read_u64(v)).datetime())
            }
            0x48 if v.len() >= 16 => {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(&v[..16]);
                DecodedPropertyValue::Guid(Guid::from_guid_bytes(bytes))
            }
            _ => DecodedPropertyValue::Raw(self.value.clone()),
        }
    }
}

impl fmt::Display for TypedPropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}: ", self.property_type)?;
        match self.decoded() {
            DecodedPropertyValue::U32(v) => write!(f, "{v}"),
            DecodedPropertyValue::I32(v) => write!(f, "{v}"),
            DecodedPropertyValue::U64(v) => write!(f, "{v}"),
            DecodedPropertyValue::I64(v) => write!(f, "{v}"),
            DecodedPropertyValue::Str(v) => write!(f, "{v}"),
            DecodedPropertyValue::FileTime(v) => write!(f, "{v}"),
            DecodedPropertyValue::Guid(v) => write!(f, "{v}"),
            DecodedPropertyValue::Raw(v) => write!(f, "{v:02x?}"),
        }
    }
}

/// How the properties of a store are keyed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PropertyKey {
    /// Integer-keyed, the common case.
    Id(u32),
    /// String-keyed; only used by stores with the
    /// `{D5CDD505-2E9C-101B-9397-08002B2CF9AE}` format GUID.
    Name(String),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One serialized property storage: a format GUID and its typed properties.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PropertyStore {
    format_id: Guid,
    properties: Vec<(PropertyKey, TypedPropertyValue)>,
}

impl PropertyStore {
    pub fn new(format_id: Guid, properties: Vec<(PropertyKey, TypedPropertyValue)>) -> Self {
        Self {
            format_id,
            properties,
        }
    }

    pub fn format_id(&self) -> Guid {
        self.format_id
    }

    /// Whether the properties are keyed by name rather than integer id.
    pub fn is_strings(&self) -> bool {
        self.format_id == STRING_NAMES_FORMAT_ID
    }

    pub fn properties(&self) -> &[(PropertyKey, TypedPropertyValue)] {
        &self.properties
    }

    /// Read one store; `None` marks the terminating zero size word.
    fn read_from<R: std::io::Read + std::io::Seek>(
        reader: &mut R,
    ) -> binread::BinResult<Option<Self>> {
        let size: u32 = reader.read_le()?;
        if size == 0 {
            return Ok(None);
        }
        let version: u32 = reader.read_le()?;
        if version != STORE_VERSION {
            return Err(binread::Error::AssertFail {
                pos: reader.stream_position()?,
                message: format!("bad property store version 0x{version:08x}"),
            });
        }
        let format_id: Guid = reader.read_le()?;
        let is_strings = format_id == STRING_NAMES_FORMAT_ID;
        let mut properties = Vec::new();
        loop {
            let value_size: u32 = reader.read_le()?;
            if value_size == 0 {
                break;
            }
            if value_size < 9 {
                return Err(binread::Error::AssertFail {
                    pos: reader.stream_position()?,
                    message: format!("bad property value size {value_size}"),
                });
            }
            let (key, typed_size) = if is_strings {
                let name_size: u32 = reader.read_le()?;
                let _reserved: u8 = reader.read_le()?;
                let mut name_bytes = vec![0u8; name_size as usize];
                reader.read_exact(&mut name_bytes)?;
                let units: Vec<u16> = name_bytes.chunks_exact(2).map(LE::read_u16).collect();
                let key = PropertyKey::Name(
                    String::from_utf16_lossy(&units).trim_end_matches('\0').to_string(),
                );
                (key, value_size.saturating_sub(9 + name_size))
            } else {
                let id: u32 = reader.read_le()?;
                let _reserved: u8 = reader.read_le()?;
                (PropertyKey::Id(id), value_size - 9)
            };
            let mut value_bytes = vec![0u8; typed_size as usize];
            reader.read_exact(&mut value_bytes)?;
            properties.push((key, TypedPropertyValue::parse(&value_bytes)));
        }
        Ok(Some(Self {
            format_id,
            properties,
        }))
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (key, value) in &self.properties {
            let value_bytes = value.to_bytes();
            match key {
                PropertyKey::Name(name) => {
                    let name_bytes: Vec<u8> =
                        name.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect();
                    body.write_u32::<LE>(9 + name_bytes.len() as u32 + value_bytes.len() as u32)
                        .unwrap();
                    body.write_u32::<LE>(name_bytes.len() as u32).unwrap();
                    body.push(0);
                    body.extend_from_slice(&name_bytes);
                }
                PropertyKey::Id(id) => {
                    body.write_u32::<LE>(9 + value_bytes.len() as u32).unwrap();
                    body.write_u32::<LE>(*id).unwrap();
                    body.push(0);
                }
            }
            body.extend_from_slice(&value_bytes);
        }
        body.write_u32::<LE>(0).unwrap();

        let mut out = Vec::with_capacity(body.len() + 24);
        out.write_u32::<LE>(24 + body.len() as u32).unwrap();
        out.write_u32::<LE>(STORE_VERSION).unwrap();
        out.extend_from_slice(&self.format_id.to_guid_bytes());
        out.extend_from_slice(&body);
        out
    }
}

impl fmt::Display for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " PropertyStore\n  FormatID: {}", self.format_id)?;
        for (key, value) in &self.properties {
            write!(f, "\n  {key:>3} = {value}")?;
        }
        Ok(())
    }
}

/// A PropertyStoreDataBlock: zero or more property stores terminated by a
/// zero size word.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PropertyStoreDataBlock {
    stores: Vec<PropertyStore>,
}

impl PropertyStoreDataBlock {
    pub fn new(stores: Vec<PropertyStore>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[PropertyStore] {
        &self.stores
    }

    pub(crate) fn payload_bytes(&self) -> crate::Result<Vec<u8>> {
        let mut out = Vec::new();
        for store in &self.stores {
            out.extend_from_slice(&store.to_bytes());
        }
        out.write_u32::<LE>(0)?;
        Ok(out)
    }
}

impl BinRead for PropertyStoreDataBlock {
    type Args = ();

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        _args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let mut stores = Vec::new();
        while let Some(store) = PropertyStore::read_from(reader)? {
            stores.push(store);
        }
        Ok(Self { stores })
    }
}

impl fmt::Display for PropertyStoreDataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyStoreDataBlock")?;
        for store in &self.stores {
            write!(f, "\n {store}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_back(data: &[u8]) -> PropertyStoreDataBlock {
        let mut cursor = Cursor::new(data);
        cursor.read_le::<PropertyStoreDataBlock>().unwrap()
    }

    #[test]
    fn integer_keyed_store_round_trip() {
        let store = PropertyStore::new(
            "{446D16B1-8DAD-4870-A748-402EA43D788C}".parse().unwrap(),
            vec![(
                PropertyKey::Id(104),
                TypedPropertyValue::new(0x13, 0x0badu32.to_le_bytes().to_vec()),
            )],
        );
        let block = PropertyStoreDataBlock::new(vec![store]);
        let reread = read_back(&block.payload_bytes().unwrap());
        assert_eq!(reread, block);
        let (key, value) = &reread.stores()[0].properties()[0];
        assert_eq!(key, &PropertyKey::Id(104));
        assert_eq!(value.decoded(), DecodedPropertyValue::U32(0x0bad));
    }

    #[test]
    fn string_keyed_store_round_trip() {
        let store = PropertyStore::new(
            STRING_NAMES_FORMAT_ID,
            vec![(
                PropertyKey::Name("Prop".to_string()),
                TypedPropertyValue::from_string("value"),
            )],
        );
        assert!(store.is_strings());
        let block = PropertyStoreDataBlock::new(vec![store]);
        let reread = read_back(&block.payload_bytes().unwrap());
        assert_eq!(reread, block);
        let (key, value) = &reread.stores()[0].properties()[0];
        assert_eq!(key, &PropertyKey::Name("Prop".to_string()));
        assert_eq!(value.decoded(), DecodedPropertyValue::Str("value".to_string()));
    }

    #[test]
    fn unknown_type_codes_keep_raw_bytes() {
        let value = TypedPropertyValue::new(0x42, vec![9, 9, 9]);
        let reparsed = TypedPropertyValue::parse(&value.to_bytes());
        assert_eq!(reparsed, value);
        assert_eq!(reparsed.decoded(), DecodedPropertyValue::Raw(vec![9, 9, 9]));
    }

    #[test]
    fn typed_decoders() {
        assert_eq!(
            TypedPropertyValue::new(0x15, 7u64.to_le_bytes().to_vec()).decoded(),
            DecodedPropertyValue::U64(7)
        );
        assert_eq!(
            TypedPropertyValue::new(0x16, (-5i32).to_le_bytes().to_vec()).decoded(),
            DecodedPropertyValue::I32(-5)
        );
        assert_eq!(
            TypedPropertyValue::new(0x14, (-5i64).to_le_bytes().to_vec()).decoded(),
            DecodedPropertyValue::I64(-5)
        );
        let guid: Guid = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}".parse().unwrap();
        assert_eq!(
            TypedPropertyValue::new(0x48, guid.to_guid_bytes().to_vec()).decoded(),
            DecodedPropertyValue::Guid(guid)
        );
    }
}
