//! The polymorphic members of the link target ID list. Each entry is stored
//! as a length-prefixed blob; the first bytes of the payload decide which
//! variant it is.

mod drive;
mod path;
mod root;
mod uwp;

pub use drive::DriveEntry;
pub use path::{PathSegmentEntry, PathSegmentKind};
pub use root::{RootEntry, RootLocation};
pub use uwp::{UwpMainBlock, UwpSegmentEntry, UwpSubBlock, UwpValue};

use std::fmt;

use encoding_rs::Encoding;

#[cfg(feature = "serde")]
use serde::Serialize;

/// One entry of the link target ID list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ShellItem {
    /// A named root location, e.g. My Computer.
    Root(RootEntry),
    /// A drive letter under a My Computer root.
    Drive(DriveEntry),
    /// A file, folder or known-folder path segment.
    Path(PathSegmentEntry),
    /// A Universal Windows Platform application.
    Uwp(UwpSegmentEntry),
}

impl ShellItem {
    /// The raw payload of this entry, without the enclosing length prefix.
    pub(crate) fn to_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        match self {
            Self::Root(entry) => Ok(entry.to_bytes()),
            Self::Drive(entry) => Ok(entry.to_bytes()),
            Self::Path(entry) => entry.to_bytes(codepage),
            Self::Uwp(entry) => Ok(entry.to_bytes()),
        }
    }

    /// The segment this entry contributes to the synthesized path.
    pub(crate) fn path_segment(&self) -> Option<String> {
        match self {
            Self::Root(entry) => Some(format!("%{}%", entry.name())),
            Self::Drive(entry) => Some(entry.drive().to_string()),
            Self::Path(entry) => entry.full_name().map(str::to_string),
            Self::Uwp(entry) => Some(entry.to_string()),
        }
    }
}

impl fmt::Display for ShellItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(entry) => entry.fmt(f),
            Self::Drive(entry) => entry.fmt(f),
            Self::Path(entry) => entry.fmt(f),
            Self::Uwp(entry) => entry.fmt(f),
        }
    }
}
