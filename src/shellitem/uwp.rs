use std::fmt;
use std::io::{Cursor, Read};

use binread::BinReaderExt;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::trace;

use crate::strings::{put_cunicode, read_cunicode};
use crate::Guid;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Sub-block tags whose payload is a counted UTF-16LE string.
const STRING_TYPES: [u8; 11] = [0x11, 0x15, 0x05, 0x0f, 0x0c, 0x02, 0x0d, 0x13, 0x0b, 0x14, 0x0a];

/// The value carried by a [`UwpSubBlock`]: either a decoded string or the
/// raw payload for tags without a known layout.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum UwpValue {
    Str(String),
    Bytes(Vec<u8>),
}

/// A single typed property of a UWP application description.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UwpSubBlock {
    block_type: u8,
    value: UwpValue,
}

impl UwpSubBlock {
    pub fn new(block_type: u8, value: UwpValue) -> Self {
        Self { block_type, value }
    }

    /// The 1-byte tag of this block.
    pub fn block_type(&self) -> u8 {
        self.block_type
    }

    pub fn value(&self) -> &UwpValue {
        &self.value
    }

    /// The symbolic name of this block's tag.
    pub fn name(&self) -> &'static str {
        match self.block_type {
            0x11 => "PackageFamilyName",
            0x15 => "PackageFullName",
            0x05 => "Target",
            0x0f => "Location",
            0x20 => "RandomGuid",
            0x0c => "Square150x150Logo",
            0x02 => "Square44x44Logo",
            0x0d => "Wide310x150Logo",
            0x13 => "Square310x310Logo",
            0x14 => "Square71x71Logo",
            0x0a | 0x0b => "DisplayName",
            0x64 => "RandomByte",
            _ => "UNKNOWN",
        }
    }

    fn parse(data: &[u8]) -> crate::Result<Self> {
        let mut buf = Cursor::new(data);
        let block_type = buf.read_u8()?;
        trace!("uwp sub block 0x{block_type:02x}");
        let mut value = UwpValue::Bytes(data[1..].to_vec());
        if STRING_TYPES.contains(&block_type) && data.len() >= 13 {
            let _unknown = buf.read_u32::<LE>()?;
            let value_type = buf.read_u32::<LE>()?;
            if value_type == 0x1f {
                let _char_count = buf.read_u32::<LE>()?;
                value = UwpValue::Str(read_cunicode(&mut buf)?);
            }
        }
        Ok(Self { block_type, value })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match &self.value {
            UwpValue::Str(s) => {
                let char_count = s.encode_utf16().count() as u32 + 1;
                out.push(self.block_type);
                out.write_u32::<LE>(0).unwrap();
                out.write_u32::<LE>(0x1f).unwrap();
                out.write_u32::<LE>(char_count).unwrap();
                put_cunicode(&mut out, s);
                if char_count % 2 == 1 {
                    out.write_u16::<LE>(0).unwrap();
                }
            }
            UwpValue::Bytes(bytes) if !bytes.is_empty() => {
                out.push(self.block_type);
                out.extend_from_slice(bytes);
            }
            UwpValue::Bytes(_) => {}
        }
        out
    }
}

impl fmt::Display for UwpSubBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UwpSubBlock {} (0x{:x}): ", self.name(), self.block_type)?;
        match &self.value {
            UwpValue::Str(s) => write!(f, "{s}"),
            UwpValue::Bytes(b) => write!(f, "{b:02x?}"),
        }
    }
}

/// A `1SPS` property group inside a UWP segment, keyed by a format GUID.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UwpMainBlock {
    guid: Guid,
    blocks: Vec<UwpSubBlock>,
}

impl UwpMainBlock {
    const MAGIC: [u8; 4] = *b"1SPS";

    pub fn new(guid: Guid, blocks: Vec<UwpSubBlock>) -> Self {
        Self { guid, blocks }
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn blocks(&self) -> &[UwpSubBlock] {
        &self.blocks
    }

    fn parse(data: &[u8]) -> crate::Result<Self> {
        let mut buf = Cursor::new(data);
        let mut magic = [0u8; 4];
        buf.read_exact(&mut magic)?;
        let guid: Guid = buf.read_le()?;
        let mut blocks = Vec::new();
        loop {
            let sub_block_size = buf.read_u32::<LE>()?;
            if sub_block_size < 4 {
                break;
            }
            let mut sub_block_data = vec![0u8; sub_block_size as usize - 4];
            buf.read_exact(&mut sub_block_data)?;
            blocks.push(UwpSubBlock::parse(&sub_block_data)?);
        }
        Ok(Self { guid, blocks })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&Self::MAGIC);
        out.extend_from_slice(&self.guid.to_guid_bytes());
        for block in &self.blocks {
            let bytes = block.to_bytes();
            out.write_u32::<LE>(bytes.len() as u32 + 4).unwrap();
            out.extend_from_slice(&bytes);
        }
        out.write_u32::<LE>(0).unwrap();
        out
    }
}

impl fmt::Display for UwpMainBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<UwpMainBlock> {}:", self.guid)?;
        for block in &self.blocks {
            write!(f, "\n      {block}")?;
        }
        Ok(())
    }
}

/// The ID-list entry describing a Universal Windows Platform application:
/// an `APPS` frame holding a sequence of [`UwpMainBlock`]s.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UwpSegmentEntry {
    blocks: Vec<UwpMainBlock>,
}

impl UwpSegmentEntry {
    const MAGIC: [u8; 4] = *b"APPS";
    const HEADER: [u8; 10] = [0x08, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

    /// Byte offset of the `APPS` magic inside the raw entry, used for
    /// dispatch.
    pub(crate) fn matches(data: &[u8]) -> bool {
        data.len() >= 8 && data[4..8] == Self::MAGIC
    }

    /// Build a UWP segment the way the shell does: one main block with the
    /// package family name, launch target and optional install location,
    /// plus an optional logo block.
    pub fn create(
        package_family_name: &str,
        target: &str,
        location: Option<&str>,
        logo44x44: Option<&str>,
    ) -> Self {
        let mut blocks = vec![
            UwpSubBlock::new(0x11, UwpValue::Str(package_family_name.to_string())),
            UwpSubBlock::new(
                0x0e,
                UwpValue::Bytes(vec![
                    0x00, 0x00, 0x00, 0x00, 0x13, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
                ]),
            ),
            UwpSubBlock::new(0x05, UwpValue::Str(target.to_string())),
        ];
        if let Some(location) = location {
            // needed to resolve relative icon paths
            blocks.push(UwpSubBlock::new(0x0f, UwpValue::Str(location.to_string())));
        }
        let mut segment = Self::default();
        segment.blocks.push(UwpMainBlock::new(
            "{9F4C2855-9F79-4B39-A8D0-E1D42DE1D5F3}".parse().unwrap(),
            blocks,
        ));
        if let Some(logo) = logo44x44 {
            segment.blocks.push(UwpMainBlock::new(
                "{86D40B4D-9069-443C-819A-2A54090DCCEC}".parse().unwrap(),
                vec![UwpSubBlock::new(0x02, UwpValue::Str(logo.to_string()))],
            ));
        }
        segment
    }

    pub fn blocks(&self) -> &[UwpMainBlock] {
        &self.blocks
    }

    /// The first string value stored under the given sub-block name, across
    /// all main blocks.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.blocks
            .iter()
            .flat_map(UwpMainBlock::blocks)
            .find(|block| block.name() == name)
            .and_then(|block| match block.value() {
                UwpValue::Str(s) => Some(s.as_str()),
                UwpValue::Bytes(_) => None,
            })
    }

    pub(crate) fn parse(data: &[u8]) -> crate::Result<Self> {
        let mut buf = Cursor::new(data);
        let _unknown = buf.read_u16::<LE>()?;
        let _size = buf.read_u16::<LE>()?;
        let mut magic = [0u8; 4];
        buf.read_exact(&mut magic)?;
        let _blocks_size = buf.read_u16::<LE>()?;
        let mut header = [0u8; 10];
        buf.read_exact(&mut header)?;
        let mut blocks = Vec::new();
        loop {
            let block_size = buf.read_u32::<LE>()?;
            if block_size < 4 {
                break;
            }
            let mut block_data = vec![0u8; block_size as usize - 4];
            buf.read_exact(&mut block_data)?;
            blocks.push(UwpMainBlock::parse(&block_data)?);
        }
        Ok(Self { blocks })
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let blocks_bytes: Vec<Vec<u8>> = self.blocks.iter().map(UwpMainBlock::to_bytes).collect();
        let blocks_size: usize =
            blocks_bytes.iter().map(|block| block.len() + 4).sum::<usize>() + 4;
        let size = 2 + Self::MAGIC.len() + 2 + Self::HEADER.len() + blocks_size;

        let mut out = Vec::new();
        out.write_u16::<LE>(0).unwrap();
        out.write_u16::<LE>(size as u16).unwrap();
        out.extend_from_slice(&Self::MAGIC);
        out.write_u16::<LE>(blocks_size as u16).unwrap();
        out.extend_from_slice(&Self::HEADER);
        for block in &blocks_bytes {
            out.write_u32::<LE>(block.len() as u32 + 4).unwrap();
            out.extend_from_slice(block);
        }
        out.write_u32::<LE>(0).unwrap();
        out.write_u16::<LE>(0).unwrap();
        out
    }
}

impl fmt::Display for UwpSegmentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<UwpSegmentEntry>:")?;
        for block in &self.blocks {
            write!(f, "\n    {block}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_reparse() {
        let segment = UwpSegmentEntry::create(
            "Microsoft.WindowsCalculator_8wekyb3d8bbwe",
            "Microsoft.WindowsCalculator_8wekyb3d8bbwe!App",
            Some("C:\\Program Files\\WindowsApps\\Microsoft.WindowsCalculator_10.2008.2.0_x64__8wekyb3d8bbwe"),
            None,
        );
        let bytes = segment.to_bytes();
        assert!(UwpSegmentEntry::matches(&bytes));
        let reread = UwpSegmentEntry::parse(&bytes).unwrap();
        assert_eq!(
            reread.property("PackageFamilyName"),
            Some("Microsoft.WindowsCalculator_8wekyb3d8bbwe")
        );
        assert_eq!(
            reread.property("Target"),
            Some("Microsoft.WindowsCalculator_8wekyb3d8bbwe!App")
        );
        assert!(reread.property("Location").unwrap().starts_with("C:\\Program Files"));
        assert_eq!(reread, segment);
    }

    #[test]
    fn display_name_sub_block() {
        let main = UwpMainBlock::new(
            "{9F4C2855-9F79-4B39-A8D0-E1D42DE1D5F3}".parse().unwrap(),
            vec![UwpSubBlock::new(0x0b, UwpValue::Str("Calculator".to_string()))],
        );
        let mut segment = UwpSegmentEntry::default();
        segment.blocks.push(main);
        let reread = UwpSegmentEntry::parse(&segment.to_bytes()).unwrap();
        assert_eq!(reread.property("DisplayName"), Some("Calculator"));
    }
}
