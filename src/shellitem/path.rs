use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use binread::BinReaderExt;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use getset::{Getters, Setters};
use log::trace;

use crate::strings::{put_cstring, put_cunicode, read_cstring, read_cunicode};
use crate::{DosDateTime, Error, Guid};

#[cfg(feature = "serde")]
use serde::Serialize;

const TYPE_KNOWN_FOLDER: u16 = 0x0000;
const TYPE_FOLDER: u16 = 0x31;
const TYPE_FILE: u16 = 0x32;
const TYPE_ROOT_KNOWN_FOLDER: u16 = 0x802e;

/// Set on the type word when the short name is stored as UTF-16LE.
const UNICODE_FLAG: u16 = 0x04;

const EXTENSION_SIGNATURE: u32 = 0xbeef_0004;
const KNOWN_FOLDER_SIGNATURE: u32 = 0x23fe_bbee;
const ROOT_KNOWN_FOLDER_EXTENSION: u32 = 0xbeef_0026;

/// What a path segment refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PathSegmentKind {
    File,
    Folder,
    /// A known-folder GUID reference.
    KnownFolder,
    /// A known-folder GUID reference at the root of the list, carrying a
    /// `0xBEEF0026` extension.
    RootKnownFolder,
}

/// One file or folder level of the target path, or a known-folder GUID
/// reference. File and folder segments carry the target's size, three DOS
/// timestamps, the 8.3 short name and the long name, plus an optional
/// localized name.
///
/// The embedded `0xBEEF0004` extension is read at versions 3, 7, 8 and 9 but
/// always written back at version 3, so higher-version fields do not survive
/// a save.
#[derive(Clone, Debug, Default, PartialEq, Getters, Setters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub", set = "pub")]
pub struct PathSegmentEntry {
    kind: Option<PathSegmentKind>,
    file_size: Option<u32>,
    modified: Option<DosDateTime>,
    created: Option<DosDateTime>,
    accessed: Option<DosDateTime>,
    short_name: Option<String>,
    #[getset(skip)]
    full_name: Option<String>,
    localized_name: Option<String>,
}

impl PathSegmentEntry {
    /// A bare entry of the given kind and name; timestamps and size are
    /// filled with defaults at serialization time.
    pub fn new(kind: PathSegmentKind, name: &str) -> Self {
        Self {
            kind: Some(kind),
            short_name: Some(name.to_string()),
            full_name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// An entry describing `path`, sized and timestamped from the
    /// filesystem when the path exists. Without `is_file`, a leaf whose name
    /// contains a dot past its first character is treated as a file.
    pub fn create_for_path(path: &str, is_file: Option<bool>) -> Self {
        let mut entry = Self::default();
        let name = path
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(path)
            .to_string();
        let is_file = match std::fs::metadata(path) {
            Ok(meta) => {
                entry.file_size = Some(meta.len() as u32);
                entry.modified = Some(system_time_or_now(meta.modified().ok()));
                entry.created = Some(system_time_or_now(meta.created().ok()));
                entry.accessed = Some(system_time_or_now(meta.accessed().ok()));
                is_file.unwrap_or(!meta.is_dir())
            }
            Err(_) => {
                let now = DosDateTime::now();
                entry.file_size = Some(0);
                entry.modified = Some(now);
                entry.created = Some(now);
                entry.accessed = Some(now);
                is_file.unwrap_or_else(|| name.chars().skip(1).any(|c| c == '.'))
            }
        };
        entry.kind = Some(if is_file {
            PathSegmentKind::File
        } else {
            PathSegmentKind::Folder
        });
        entry.short_name = Some(name.clone());
        entry.full_name = Some(name);
        entry
    }

    /// The long name of this segment.
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Replace the long name of this segment.
    pub fn set_full_name(&mut self, full_name: Option<String>) {
        self.full_name = full_name;
    }

    pub(crate) fn parse(data: &[u8], codepage: &'static Encoding) -> crate::Result<Self> {
        let mut buf = Cursor::new(data);
        let type_word = buf.read_u16::<LE>()?;
        trace!("path segment with type word 0x{type_word:04x}");

        if type_word == TYPE_ROOT_KNOWN_FOLDER {
            let guid: Guid = buf.read_le()?;
            // a 0xBEEF0026 block with zeroed timestamps follows; nothing in
            // it is exposed
            return Ok(Self {
                kind: Some(PathSegmentKind::RootKnownFolder),
                full_name: Some(format!("::{guid}")),
                ..Self::default()
            });
        }

        if type_word == TYPE_KNOWN_FOLDER {
            let _extra_size = buf.read_u16::<LE>()?;
            let extra_signature = buf.read_u32::<LE>()?;
            let mut entry = Self {
                kind: Some(PathSegmentKind::KnownFolder),
                ..Self::default()
            };
            if extra_signature == KNOWN_FOLDER_SIGNATURE {
                let _unknown = buf.read_u16::<LE>()?;
                let _guid_len = buf.read_u16::<LE>()?;
                let guid: Guid = buf.read_le()?;
                entry.full_name = Some(format!("::{guid}"));
            }
            return Ok(entry);
        }

        let short_name_is_unicode = type_word & UNICODE_FLAG != 0;
        let mut entry = Self {
            kind: Some(if type_word & 0x01 != 0 {
                PathSegmentKind::Folder
            } else {
                PathSegmentKind::File
            }),
            ..Self::default()
        };
        entry.file_size = Some(buf.read_u32::<LE>()?);
        entry.modified = Some(buf.read_le()?);
        let _attributes = buf.read_u16::<LE>()?;
        entry.short_name = Some(if short_name_is_unicode {
            read_cunicode(&mut buf)?
        } else {
            read_cstring(&mut buf, codepage, true)?
        });

        let _extension_size = buf.read_u16::<LE>()?;
        let extension_version = buf.read_u16::<LE>()?;
        let extension_signature = buf.read_u32::<LE>()?;
        if extension_signature == EXTENSION_SIGNATURE {
            entry.created = Some(buf.read_le()?);
            entry.accessed = Some(buf.read_le()?);
            let _offset_unicode = buf.read_u16::<LE>()?;
            if extension_version >= 7 {
                let _offset_ansi = buf.read_u16::<LE>()?;
                let _file_reference = buf.read_u64::<LE>()?;
                let _unknown = buf.read_u64::<LE>()?;
            }
            let mut long_string_size = 0;
            if extension_version >= 3 {
                long_string_size = buf.read_u16::<LE>()?;
            }
            if extension_version >= 9 {
                let _unknown = buf.read_u32::<LE>()?;
            }
            if extension_version >= 8 {
                let _unknown = buf.read_u32::<LE>()?;
            }
            if extension_version >= 3 {
                entry.full_name = Some(read_cunicode(&mut buf)?);
                if long_string_size > 0 {
                    entry.localized_name = Some(if extension_version >= 7 {
                        read_cunicode(&mut buf)?
                    } else {
                        read_cstring(&mut buf, codepage, false)?
                    });
                }
                let _version_offset = buf.read_u16::<LE>()?;
            }
        }
        Ok(entry)
    }

    fn checked_fields(
        &self,
    ) -> crate::Result<(PathSegmentKind, u32, DosDateTime, DosDateTime, DosDateTime, String, String)>
    {
        let kind = self
            .kind
            .ok_or(Error::MissingInformation("path segment kind"))?;
        let full_name = self
            .full_name
            .clone()
            .ok_or(Error::MissingInformation("path segment full name"))?;
        let file_size = match self.file_size {
            Some(size) => size,
            None if kind != PathSegmentKind::File => 0,
            None => return Err(Error::MissingInformation("file size")),
        };
        let now = DosDateTime::now();
        Ok((
            kind,
            file_size,
            self.modified.unwrap_or(now),
            self.created.unwrap_or(now),
            self.accessed.unwrap_or(now),
            self.short_name.clone().unwrap_or_else(|| full_name.clone()),
            full_name,
        ))
    }

    fn known_folder_guid(full_name: &str) -> crate::Result<Guid> {
        Guid::from_str(full_name.trim_start_matches(':'))
    }

    pub(crate) fn to_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        let (kind, file_size, modified, created, accessed, short_name, full_name) =
            self.checked_fields()?;
        let mut out = Vec::new();

        match kind {
            PathSegmentKind::KnownFolder => {
                out.write_u16::<LE>(TYPE_KNOWN_FOLDER)?;
                out.write_u16::<LE>(0x1a)?;
                out.write_u32::<LE>(KNOWN_FOLDER_SIGNATURE)?;
                out.write_u16::<LE>(0x00)?;
                out.write_u16::<LE>(0x10)?; // guid size
                out.extend_from_slice(&Self::known_folder_guid(&full_name)?.to_guid_bytes());
                return Ok(out);
            }
            PathSegmentKind::RootKnownFolder => {
                out.write_u16::<LE>(TYPE_ROOT_KNOWN_FOLDER)?;
                out.extend_from_slice(&Self::known_folder_guid(&full_name)?.to_guid_bytes());
                out.write_u16::<LE>(0x26)?; // extension size
                out.write_u16::<LE>(0x01)?; // version
                out.write_u32::<LE>(ROOT_KNOWN_FOLDER_EXTENSION)?;
                out.write_u32::<LE>(0x11)?;
                out.write_u64::<LE>(0)?; // created
                out.write_u64::<LE>(0)?; // modified
                out.write_u64::<LE>(0)?; // accessed
                out.write_u16::<LE>(0x14)?;
                return Ok(out);
            }
            PathSegmentKind::File | PathSegmentKind::Folder => {}
        }

        let short_chars = short_name.chars().count();
        let short_name_is_unicode = !short_name.is_ascii();
        let short_name_len = if short_name_is_unicode {
            (short_chars + 1) * 2
        } else {
            let len = short_chars + 1;
            len + len % 2
        };

        let mut type_word = match kind {
            PathSegmentKind::Folder => TYPE_FOLDER,
            _ => TYPE_FILE,
        };
        if short_name_is_unicode {
            type_word |= UNICODE_FLAG;
        }
        out.write_u16::<LE>(type_word)?;
        out.write_u32::<LE>(file_size)?;
        modified.write_to(&mut out);
        out.write_u16::<LE>(0x10)?;
        if short_name_is_unicode {
            put_cunicode(&mut out, &short_name);
        } else {
            put_cstring(&mut out, &short_name, codepage, true);
        }

        // the extension is always written at version 3
        out.write_u16::<LE>(24 + 2 * short_chars as u16)?;
        out.write_u16::<LE>(0x03)?;
        out.write_u32::<LE>(EXTENSION_SIGNATURE)?;
        created.write_to(&mut out);
        accessed.write_to(&mut out);
        out.write_u16::<LE>(0x14)?; // offset_unicode, fixed layout
        out.write_u16::<LE>(0)?; // no localized name
        put_cunicode(&mut out, &full_name);
        out.write_u16::<LE>(0x0e + short_name_len as u16)?;
        Ok(out)
    }
}

fn system_time_or_now(time: Option<std::time::SystemTime>) -> DosDateTime {
    match time {
        Some(time) => DosDateTime::from(DateTime::<Utc>::from(time).naive_utc()),
        None => DosDateTime::now(),
    }
}

impl fmt::Display for PathSegmentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<PathSegmentEntry: {}>",
            self.full_name.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use encoding_rs::WINDOWS_1251;

    fn sample_time() -> DosDateTime {
        DosDateTime::from(
            NaiveDate::from_ymd_opt(2020, 9, 1)
                .unwrap()
                .and_hms_opt(10, 30, 20)
                .unwrap(),
        )
    }

    #[test]
    fn file_entry_round_trip() {
        let mut entry = PathSegmentEntry::new(PathSegmentKind::File, "file.txt");
        entry.set_file_size(Some(823));
        entry.set_modified(Some(sample_time()));
        entry.set_created(Some(sample_time()));
        entry.set_accessed(Some(sample_time()));

        let bytes = entry.to_bytes(WINDOWS_1251).unwrap();
        assert_eq!(bytes[0], 0x32);
        let reread = PathSegmentEntry::parse(&bytes, WINDOWS_1251).unwrap();
        assert_eq!(reread.kind(), &Some(PathSegmentKind::File));
        assert_eq!(reread.full_name(), Some("file.txt"));
        assert_eq!(reread.short_name(), &Some("file.txt".to_string()));
        assert_eq!(reread.file_size(), &Some(823));
        assert_eq!(reread.modified(), &Some(sample_time()));
        assert_eq!(reread.accessed(), &Some(sample_time()));
    }

    #[test]
    fn folder_entry_defaults() {
        let entry = PathSegmentEntry::new(PathSegmentKind::Folder, "folder");
        let bytes = entry.to_bytes(WINDOWS_1251).unwrap();
        assert_eq!(bytes[0], 0x31);
        let reread = PathSegmentEntry::parse(&bytes, WINDOWS_1251).unwrap();
        assert_eq!(reread.kind(), &Some(PathSegmentKind::Folder));
        assert_eq!(reread.file_size(), &Some(0));
    }

    #[test]
    fn non_ascii_name_promotes_to_unicode() {
        let entry = PathSegmentEntry::new(PathSegmentKind::File, "докуมент.txt");
        let bytes = entry.to_bytes(WINDOWS_1251).unwrap();
        assert_eq!(bytes[0] & 0x04, 0x04);
        let reread = PathSegmentEntry::parse(&bytes, WINDOWS_1251).unwrap();
        assert_eq!(reread.full_name(), Some("докуมент.txt"));
        assert_eq!(reread.short_name(), &Some("докуมент.txt".to_string()));
    }

    #[test]
    fn missing_full_name_is_an_error() {
        let entry = PathSegmentEntry::default();
        assert!(matches!(
            entry.to_bytes(WINDOWS_1251),
            Err(Error::MissingInformation(_))
        ));
    }

    #[test]
    fn root_known_folder_round_trip() {
        let entry = PathSegmentEntry::new(
            PathSegmentKind::RootKnownFolder,
            "::{374DE290-123F-4565-9164-39C4925E467B}",
        );
        let bytes = entry.to_bytes(WINDOWS_1251).unwrap();
        assert_eq!(&bytes[0..2], &[0x2e, 0x80]);
        let reread = PathSegmentEntry::parse(&bytes, WINDOWS_1251).unwrap();
        assert_eq!(
            reread.full_name(),
            Some("::{374DE290-123F-4565-9164-39C4925E467B}")
        );
    }
}
