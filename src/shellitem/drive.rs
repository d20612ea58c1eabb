use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A drive letter entry, the second element of an absolute ID list.
///
/// On disk it is 23 bytes: the type byte `0x2F`, the drive letter with a
/// colon, a backslash, and 19 NUL bytes. The text form accepts `C`, `c:`,
/// `C:\` and the like, normalized to an uppercase `C:`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DriveEntry {
    drive: String,
}

impl DriveEntry {
    pub(crate) const WIRE_LEN: usize = 23;

    /// Build a drive entry from a textual drive specification.
    pub fn new(drive: &str) -> crate::Result<Self> {
        let drive = drive.trim();
        let mut chars = drive.chars();
        let letter = chars.next().filter(char::is_ascii_alphabetic);
        let rest_ok = chars.all(|c| matches!(c, ':' | '/' | '\\'));
        match letter {
            Some(letter) if rest_ok => Ok(Self {
                drive: format!("{}:", letter.to_ascii_uppercase()),
            }),
            _ => Err(crate::Error::Validation(format!(
                "this is not a valid drive: {drive}"
            ))),
        }
    }

    pub(crate) fn parse(data: &[u8]) -> crate::Result<Self> {
        if data.len() != Self::WIRE_LEN {
            return Err(crate::Error::Validation(format!(
                "a drive entry is {} bytes, got {}",
                Self::WIRE_LEN,
                data.len()
            )));
        }
        Ok(Self {
            drive: String::from_utf8_lossy(&data[1..3]).into_owned(),
        })
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0x2f];
        out.extend_from_slice(self.drive.as_bytes());
        out.push(b'\\');
        out.resize(Self::WIRE_LEN, 0);
        out
    }

    /// The drive in its `C:` form.
    pub fn drive(&self) -> &str {
        &self.drive
    }
}

impl fmt::Display for DriveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<DriveEntry: {}>", self.drive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_forms_normalize() {
        for text in ["c", "C:", "c:\\", "C/"] {
            assert_eq!(DriveEntry::new(text).unwrap().drive(), "C:");
        }
        assert!(DriveEntry::new("CD:").is_err());
        assert!(DriveEntry::new("1:").is_err());
    }

    #[test]
    fn binary_round_trip() {
        let entry = DriveEntry::new("z").unwrap();
        let bytes = entry.to_bytes();
        assert_eq!(bytes.len(), DriveEntry::WIRE_LEN);
        assert_eq!(&bytes[..4], b"\x2fZ:\\");
        assert_eq!(DriveEntry::parse(&bytes).unwrap(), entry);
    }
}
