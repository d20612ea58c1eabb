use binread::{BinRead, BinReaderExt};
use encoding_rs::Encoding;

use crate::strings::{put_sized_string, SizedString, StringEncoding};
use crate::LinkFlags;

/// The STRING_DATA section: up to five character-count-prefixed strings in
/// the fixed order Name, RelativePath, WorkingDir, Arguments, IconLocation,
/// each present only when its link flag is set. All five share the encoding
/// chosen by the `IS_UNICODE` flag.
#[derive(Debug, Default)]
pub(crate) struct StringData {
    pub name_string: Option<String>,
    pub relative_path: Option<String>,
    pub working_dir: Option<String>,
    pub command_line_arguments: Option<String>,
    pub icon_location: Option<String>,
}

impl BinRead for StringData {
    type Args = (LinkFlags, &'static Encoding);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let (link_flags, codepage) = args;
        let encoding = StringEncoding::from_flags(link_flags, codepage);
        let read_if = |flag: LinkFlags,
                           reader: &mut R|
         -> binread::prelude::BinResult<Option<String>> {
            if link_flags.contains(flag) {
                let s: SizedString = reader.read_le_args((encoding,))?;
                Ok(Some(s.to_string()))
            } else {
                Ok(None)
            }
        };
        Ok(Self {
            name_string: read_if(LinkFlags::HAS_NAME, reader)?,
            relative_path: read_if(LinkFlags::HAS_RELATIVE_PATH, reader)?,
            working_dir: read_if(LinkFlags::HAS_WORKING_DIR, reader)?,
            command_line_arguments: read_if(LinkFlags::HAS_ARGUMENTS, reader)?,
            icon_location: read_if(LinkFlags::HAS_ICON_LOCATION, reader)?,
        })
    }
}

/// Serialize one string the way the STRING_DATA section stores it.
pub(crate) fn to_data(s: &str, link_flags: LinkFlags, codepage: &'static Encoding) -> Vec<u8> {
    let mut out = Vec::new();
    put_sized_string(&mut out, s, StringEncoding::from_flags(link_flags, codepage));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1251;
    use std::io::Cursor;

    #[test]
    fn reads_only_flagged_fields() {
        let flags = LinkFlags::IS_UNICODE | LinkFlags::HAS_NAME | LinkFlags::HAS_ARGUMENTS;
        let mut data = to_data("desc", flags, WINDOWS_1251);
        data.extend_from_slice(&to_data("-x", flags, WINDOWS_1251));

        let mut cursor = Cursor::new(data);
        let parsed: StringData = cursor.read_le_args((flags, WINDOWS_1251)).unwrap();
        assert_eq!(parsed.name_string.as_deref(), Some("desc"));
        assert_eq!(parsed.relative_path, None);
        assert_eq!(parsed.command_line_arguments.as_deref(), Some("-x"));
    }

    #[test]
    fn codepage_round_trip() {
        let flags = LinkFlags::HAS_NAME;
        let data = to_data("имя", flags, WINDOWS_1251);
        // one byte per character plus the two-byte count
        assert_eq!(data.len(), 5);
        let mut cursor = Cursor::new(data);
        let parsed: StringData = cursor.read_le_args((flags, WINDOWS_1251)).unwrap();
        assert_eq!(parsed.name_string.as_deref(), Some("имя"));
    }
}
