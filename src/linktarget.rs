use binread::{BinRead, BinReaderExt};
use byteorder::{WriteBytesExt, LE};
use encoding_rs::Encoding;
#[allow(unused)]
use log::{debug, error, info, trace, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::itemid::ItemID;
use crate::shellitem::{
    DriveEntry, PathSegmentEntry, RootEntry, RootLocation, ShellItem, UwpSegmentEntry,
};

/// The LinkTargetIDList structure specifies the target of the link. The
/// presence of this optional structure is signalled by the
/// HasLinkTargetIDList bit in the header.
///
/// Each item is stored as its payload prefixed by a `u16` equal to
/// payload + 2; the list ends with a `u16` zero and the whole thing is
/// preceded by a `u16` byte count.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LinkTargetIdList {
    items: Vec<ShellItem>,
}

impl LinkTargetIdList {
    pub fn new(items: Vec<ShellItem>) -> Self {
        Self { items }
    }

    /// The interpreted entries of this list.
    pub fn items(&self) -> &[ShellItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<ShellItem> {
        &mut self.items
    }

    /// Join the entries into a display path: roots as `%NAME%`, drives as
    /// their `C:` text, path segments as their long name.
    pub fn get_path(&self) -> String {
        let segments: Vec<String> = self
            .items
            .iter()
            .filter_map(ShellItem::path_segment)
            .collect();
        segments.join("\\")
    }

    /// An absolute list must pair its MY_COMPUTER root with a drive or a
    /// known-folder reference.
    fn validate(&self) -> crate::Result<()> {
        let my_computer_root = matches!(
            self.items.first(),
            Some(ShellItem::Root(root)) if root.location() == Some(RootLocation::MyComputer)
        );
        if !my_computer_root {
            return Ok(());
        }
        match self.items.get(1) {
            Some(ShellItem::Drive(_)) => Ok(()),
            Some(ShellItem::Path(path))
                if path.full_name().is_some_and(|name| name.starts_with("::")) =>
            {
                Ok(())
            }
            _ => Err(crate::Error::Validation(
                "a drive is required for absolute links".to_string(),
            )),
        }
    }

    fn interpret(raw: &[ItemID], codepage: &'static Encoding) -> crate::Result<Vec<ShellItem>> {
        let mut items = Vec::new();
        let mut rest = raw;
        if let Some(first) = raw.first() {
            if first.data().first() == Some(&RootEntry::TYPE_BYTE) {
                let root = RootEntry::parse(first.data())?;
                let location = root.location();
                items.push(ShellItem::Root(root));
                match location {
                    Some(RootLocation::MyComputer) => {
                        let second = raw.get(1).ok_or_else(|| {
                            crate::Error::Validation(
                                "an absolute link requires a second element".to_string(),
                            )
                        })?;
                        if second.data().len() == DriveEntry::WIRE_LEN {
                            items.push(ShellItem::Drive(DriveEntry::parse(second.data())?));
                        } else if second.data().starts_with(&[0x2e, 0x80]) {
                            items.push(ShellItem::Path(PathSegmentEntry::parse(
                                second.data(),
                                codepage,
                            )?));
                        } else {
                            return Err(crate::Error::Validation(
                                "this seems to be an absolute link which requires a drive as \
                                 second element"
                                    .to_string(),
                            ));
                        }
                        rest = &raw[2..];
                    }
                    Some(RootLocation::NetworkPlaces) => {
                        return Err(crate::Error::Unsupported(
                            "ID lists rooted at network places",
                        ));
                    }
                    _ => rest = &raw[1..],
                }
            }
        }
        for item in rest {
            if UwpSegmentEntry::matches(item.data()) {
                items.push(ShellItem::Uwp(UwpSegmentEntry::parse(item.data())?));
            } else {
                items.push(ShellItem::Path(PathSegmentEntry::parse(
                    item.data(),
                    codepage,
                )?));
            }
        }
        Ok(items)
    }

    /// The wire form including the leading byte-count prefix.
    pub(crate) fn to_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        self.validate()?;
        let mut list = Vec::new();
        for item in &self.items {
            let bytes = item.to_bytes(codepage)?;
            list.write_u16::<LE>(bytes.len() as u16 + 2)?;
            list.extend_from_slice(&bytes);
        }
        list.write_u16::<LE>(0)?;

        let mut out = Vec::with_capacity(list.len() + 2);
        out.write_u16::<LE>(list.len() as u16)?;
        out.append(&mut list);
        Ok(out)
    }
}

impl BinRead for LinkTargetIdList {
    type Args = (&'static Encoding,);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let size: u16 = reader.read_le()?;
        trace!("ID list size: {size}");
        let mut raw = Vec::new();
        let mut bytes_to_read = size;
        while bytes_to_read > 0 {
            // any number of ItemID structures followed by a 2-byte
            // TerminalID; less than 2 bytes left means a broken list
            if bytes_to_read < 2 {
                return Err(binread::error::Error::AssertFail {
                    pos: reader.stream_position()?,
                    message: "not enough bytes to read".to_string(),
                });
            }
            let item: ItemID = reader.read_le()?;
            if *item.size() == 0 {
                break;
            }
            bytes_to_read = bytes_to_read.saturating_sub(*item.size());
            raw.push(item);
        }

        let items = Self::interpret(&raw, args.0).map_err(|e| binread::error::Error::AssertFail {
            pos: 0,
            message: e.to_string(),
        })?;
        Ok(Self { items })
    }
}

impl std::fmt::Display for LinkTargetIdList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<LinkTargetIDList>:")?;
        for item in &self.items {
            write!(f, "\n  {item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shellitem::PathSegmentKind;
    use encoding_rs::WINDOWS_1251;
    use std::io::Cursor;

    fn read_back(data: &[u8]) -> LinkTargetIdList {
        let mut cursor = Cursor::new(data);
        cursor
            .read_le_args::<LinkTargetIdList>((WINDOWS_1251,))
            .unwrap()
    }

    #[test]
    fn absolute_list_round_trips() {
        let list = LinkTargetIdList::new(vec![
            ShellItem::Root(RootEntry::new(RootLocation::MyComputer)),
            ShellItem::Drive(DriveEntry::new("C:").unwrap()),
            ShellItem::Path(PathSegmentEntry::new(PathSegmentKind::Folder, "Windows")),
            ShellItem::Path(PathSegmentEntry::new(PathSegmentKind::File, "explorer.exe")),
        ]);
        let bytes = list.to_bytes(WINDOWS_1251).unwrap();
        let reread = read_back(&bytes);
        assert_eq!(reread.get_path(), "%MY_COMPUTER%\\C:\\Windows\\explorer.exe");
        assert_eq!(reread.items().len(), 4);
    }

    #[test]
    fn drive_is_required_for_absolute_lists() {
        let list = LinkTargetIdList::new(vec![
            ShellItem::Root(RootEntry::new(RootLocation::MyComputer)),
            ShellItem::Path(PathSegmentEntry::new(PathSegmentKind::Folder, "Windows")),
        ]);
        assert!(matches!(
            list.to_bytes(WINDOWS_1251),
            Err(crate::Error::Validation(_))
        ));
    }

    #[test]
    fn known_folder_is_a_valid_second_element() {
        let list = LinkTargetIdList::new(vec![
            ShellItem::Root(RootEntry::new(RootLocation::MyComputer)),
            ShellItem::Path(PathSegmentEntry::new(
                PathSegmentKind::RootKnownFolder,
                "::{374DE290-123F-4565-9164-39C4925E467B}",
            )),
            ShellItem::Path(PathSegmentEntry::new(
                PathSegmentKind::File,
                "2020M09_01_contract.pdf",
            )),
        ]);
        let bytes = list.to_bytes(WINDOWS_1251).unwrap();
        let reread = read_back(&bytes);
        assert_eq!(
            reread.get_path(),
            "%MY_COMPUTER%\\::{374DE290-123F-4565-9164-39C4925E467B}\\2020M09_01_contract.pdf"
        );
    }
}
