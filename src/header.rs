#![allow(missing_docs)]
use std::fmt;
use std::str::FromStr;

use binread::BinRead;
use bitflags::bitflags;
use byteorder::{ByteOrder, LE};
use getset::{CopyGetters, MutGetters, Setters};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use crate::binread_flags::binread_flags;
use crate::FileTime;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The first four bytes of every shell link file.
pub(crate) const SIGNATURE: [u8; 4] = [0x4c, 0x00, 0x00, 0x00];

/// The fixed class identifier following the signature.
pub(crate) const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x46,
];

/// A ShellLinkHeader structure (section 2.1), which contains identification
/// information, timestamps, and flags that specify the presence of optional
/// structures.
///
/// The signature and class GUID preceding these fields are validated
/// separately; parsing starts at the LinkFlags word.
#[derive(Clone, Copy, Debug, PartialEq, BinRead, CopyGetters, MutGetters, Setters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
#[getset(get_copy = "pub", get_mut = "pub", set = "pub")]
pub struct ShellLinkHeader {
    /// A LinkFlags structure (section 2.1.1) that specifies information about
    /// the shell link and the presence of optional portions of the structure.
    link_flags: LinkFlags,

    /// A FileAttributesFlags structure (section 2.1.2) that specifies
    /// information about the link target.
    file_attributes: FileAttributeFlags,

    /// The creation time of the link target in UTC. Zero means no creation
    /// time is set.
    creation_time: FileTime,

    /// The access time of the link target in UTC.
    access_time: FileTime,

    /// The write time of the link target in UTC.
    write_time: FileTime,

    /// The size, in bytes, of the link target, truncated to 32 bits.
    file_size: u32,

    /// The index of an icon within a given icon location.
    icon_index: i32,

    /// The expected window state of an application launched by the link.
    /// Values outside the defined set read as `Normal`.
    #[br(map = |raw: u32| ShowCommand::from_u32(raw).unwrap_or(ShowCommand::Normal))]
    show_command: ShowCommand,

    /// The keystrokes that launch the application referenced by the shortcut.
    /// Followed on disk by ten reserved zero bytes.
    #[br(pad_after = 10)]
    hotkey: HotkeyFlags,
}

impl ShellLinkHeader {
    /// Set or clear some link flags.
    pub fn update_link_flags(&mut self, link_flags: LinkFlags, value: bool) {
        self.link_flags.set(link_flags, value);
    }
}

impl Default for ShellLinkHeader {
    /// A blank header: unicode strings, normal attributes, all timestamps set
    /// to now.
    fn default() -> Self {
        Self {
            link_flags: LinkFlags::IS_UNICODE,
            file_attributes: FileAttributeFlags::FILE_ATTRIBUTE_NORMAL,
            creation_time: FileTime::now(),
            access_time: FileTime::now(),
            write_time: FileTime::now(),
            file_size: 0,
            icon_index: 0,
            show_command: ShowCommand::Normal,
            hotkey: HotkeyFlags::new(HotkeyKey::NoKeyAssigned, HotkeyModifiers::NO_MODIFIER),
        }
    }
}

impl From<&ShellLinkHeader> for [u8; 0x4c] {
    /// The full 76-byte header, including signature and class GUID.
    fn from(val: &ShellLinkHeader) -> Self {
        let mut header_data = [0u8; 0x4c];
        header_data[0..4].copy_from_slice(&SIGNATURE);
        header_data[4..20].copy_from_slice(&LINK_CLSID);
        LE::write_u32(&mut header_data[20..], val.link_flags.bits());
        LE::write_u32(&mut header_data[24..], val.file_attributes.bits());
        LE::write_u64(&mut header_data[28..], val.creation_time.into());
        LE::write_u64(&mut header_data[36..], val.access_time.into());
        LE::write_u64(&mut header_data[44..], val.write_time.into());
        LE::write_u32(&mut header_data[52..], val.file_size);
        LE::write_i32(&mut header_data[56..], val.icon_index);
        LE::write_u32(&mut header_data[60..], val.show_command as u32);
        LE::write_u16(&mut header_data[64..], val.hotkey.to_flags_u16());
        header_data
    }
}

bitflags! {
    /// The LinkFlags structure defines bits that specify which shell link
    /// structures are present in the file format after the ShellLinkHeader
    /// structure (section 2.1). The wire value stores the flag declared at
    /// position `i` in bit `i`.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct LinkFlags: u32 {
        /// A LinkTargetIDList structure (section 2.2) follows the header.
        const HAS_LINK_TARGET_ID_LIST           = 1 << 0;
        /// A LinkInfo structure (section 2.3) is present.
        const HAS_LINK_INFO                     = 1 << 1;
        /// A NAME_STRING StringData structure (section 2.4) is present.
        const HAS_NAME                          = 1 << 2;
        /// A RELATIVE_PATH StringData structure is present.
        const HAS_RELATIVE_PATH                 = 1 << 3;
        /// A WORKING_DIR StringData structure is present.
        const HAS_WORKING_DIR                   = 1 << 4;
        /// A COMMAND_LINE_ARGUMENTS StringData structure is present.
        const HAS_ARGUMENTS                     = 1 << 5;
        /// An ICON_LOCATION StringData structure is present.
        const HAS_ICON_LOCATION                 = 1 << 6;
        /// The StringData section contains Unicode-encoded strings rather
        /// than strings in the system default code page.
        const IS_UNICODE                        = 1 << 7;
        /// The LinkInfo structure (section 2.3) is ignored.
        const FORCE_NO_LINK_INFO                = 1 << 8;
        /// An EnvironmentVariableDataBlock (section 2.5.4) is present.
        const HAS_EXP_STRING                    = 1 << 9;
        /// A 16-bit target is run in a separate virtual machine.
        const RUN_IN_SEPARATE_PROCESS           = 1 << 10;
        /// A bit that is undefined and MUST be ignored.
        const UNUSED1                           = 1 << 11;
        /// A DarwinDataBlock (section 2.5.3) is present.
        const HAS_DARWIN_ID                     = 1 << 12;
        /// The application is run as a different user.
        const RUN_AS_USER                       = 1 << 13;
        /// An IconEnvironmentDataBlock (section 2.5.5) is present.
        const HAS_EXP_ICON                      = 1 << 14;
        /// The file system location is represented in the shell namespace.
        const NO_PIDL_ALIAS                     = 1 << 15;
        /// A bit that is undefined and MUST be ignored.
        const UNUSED2                           = 1 << 16;
        /// A ShimDataBlock (section 2.5.8) is present.
        const RUN_WITH_SHIM_LAYER               = 1 << 17;
        /// The TrackerDataBlock (section 2.5.10) is ignored.
        const FORCE_NO_LINK_TRACK               = 1 << 18;
        /// Target properties are collected into the PropertyStoreDataBlock
        /// (section 2.5.7) when the link target is set.
        const ENABLE_TARGET_METADATA            = 1 << 19;
        /// The EnvironmentVariableDataBlock is ignored.
        const DISABLE_LINK_PATH_TRACKING        = 1 << 20;
        /// The SpecialFolderDataBlock and KnownFolderDataBlock are ignored.
        const DISABLE_KNOWN_FOLDER_TRACKING     = 1 << 21;
        /// The unaliased form of a known folder IDList is used.
        const DISABLE_KNOWN_FOLDER_ALIAS        = 1 << 22;
        /// Creating a link that references another link is enabled.
        const ALLOW_LINK_TO_LINK                = 1 << 23;
        /// The unaliased form of a known folder or the target IDList is used
        /// on save.
        const UNALIAS_ON_SAVE                   = 1 << 24;
        /// The path in the EnvironmentVariableDataBlock is used instead of
        /// the target IDList.
        const PREFER_ENVIRONMENT_PATH           = 1 << 25;
        /// For UNC targets on the local machine, the local path IDList in the
        /// PropertyStoreDataBlock is stored as well.
        const KEEP_LOCAL_ID_LIST_FOR_UNC_TARGET = 1 << 26;
    }
}

binread_flags!(LinkFlags, u32);

bitflags! {
    /// The FileAttributesFlags structure defines bits that specify the file
    /// attributes of the link target, if the target is a file system item.
    /// The attributes may be out of sync with the target itself.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct FileAttributeFlags: u32 {
        /// The file or directory is read-only.
        const FILE_ATTRIBUTE_READONLY               = 1 << 0;
        /// The file or directory is hidden.
        const FILE_ATTRIBUTE_HIDDEN                 = 1 << 1;
        /// The file or directory is used by the operating system.
        const FILE_ATTRIBUTE_SYSTEM                 = 1 << 2;
        /// A bit that MUST be zero.
        const RESERVED1                             = 1 << 3;
        /// The link target is a directory instead of a file.
        const FILE_ATTRIBUTE_DIRECTORY              = 1 << 4;
        /// The file or directory is marked for backup or removal.
        const FILE_ATTRIBUTE_ARCHIVE                = 1 << 5;
        /// A bit that MUST be zero.
        const RESERVED2                             = 1 << 6;
        /// No other flags are set. If this bit is 1, all others MUST be clear.
        const FILE_ATTRIBUTE_NORMAL                 = 1 << 7;
        /// The file is being used for temporary storage.
        const FILE_ATTRIBUTE_TEMPORARY              = 1 << 8;
        /// The file is a sparse file.
        const FILE_ATTRIBUTE_SPARSE_FILE            = 1 << 9;
        /// The file or directory has an associated reparse point.
        const FILE_ATTRIBUTE_REPARSE_POINT          = 1 << 10;
        /// The file or directory is compressed.
        const FILE_ATTRIBUTE_COMPRESSED             = 1 << 11;
        /// The data of the file is not immediately available.
        const FILE_ATTRIBUTE_OFFLINE                = 1 << 12;
        /// The contents of the file need to be indexed.
        const FILE_ATTRIBUTE_NOT_CONTENT_INDEXED    = 1 << 13;
        /// The file or directory is encrypted.
        const FILE_ATTRIBUTE_ENCRYPTED              = 1 << 14;
    }
}

binread_flags!(FileAttributeFlags, u32);

/// The HotkeyFlags structure specifies input generated by a combination of
/// keyboard keys being pressed.
///
/// The text form is `[MOD+]*KEY` with modifiers in the fixed order
/// `CONTROL+SHIFT+ALT+`, e.g. `CONTROL+ALT+F5`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HotkeyFlags {
    /// An unknown key byte reads as no key assigned.
    #[br(map = |raw: u8| HotkeyKey::from_u8(raw).unwrap_or(HotkeyKey::NoKeyAssigned))]
    low_byte: HotkeyKey,
    #[br(map = |raw: u8| HotkeyModifiers::from_bits_truncate(raw))]
    high_byte: HotkeyModifiers,
}

impl HotkeyFlags {
    /// Create a new HotkeyFlags instance.
    pub fn new(key: HotkeyKey, modifiers: HotkeyModifiers) -> Self {
        Self {
            low_byte: key,
            high_byte: modifiers,
        }
    }

    /// Convert these HotkeyFlags to the u16 representation for saving.
    pub(crate) fn to_flags_u16(self) -> u16 {
        self.low_byte as u16 + ((self.high_byte.bits() as u16) << 8)
    }

    /// The primary key assigned to the hotkey.
    pub fn key(&self) -> HotkeyKey {
        self.low_byte
    }

    /// Set the hotkey primary key.
    pub fn set_key(&mut self, key: HotkeyKey) {
        self.low_byte = key;
    }

    /// The modifiers (Control, Shift, Alt) for this hotkey.
    pub fn modifiers(&self) -> HotkeyModifiers {
        self.high_byte
    }

    /// Set the hotkey modifiers.
    pub fn set_modifiers(&mut self, modifiers: HotkeyModifiers) {
        self.high_byte = modifiers;
    }

    /// The text form, or `None` when no key is assigned.
    pub fn to_hot_key_string(&self) -> Option<String> {
        let name = self.low_byte.name()?;
        Some(format!("{}{}", self.high_byte, name))
    }
}

impl FromStr for HotkeyFlags {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::new(HotkeyKey::NoKeyAssigned, HotkeyModifiers::NO_MODIFIER));
        }
        let mut parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.pop().unwrap_or_default();
        let key = HotkeyKey::from_name(&key_part.to_uppercase())
            .ok_or_else(|| crate::Error::InvalidKey(key_part.to_string()))?;
        let mut modifiers = HotkeyModifiers::NO_MODIFIER;
        for part in parts {
            modifiers |= match part.to_uppercase().as_str() {
                "CONTROL" => HotkeyModifiers::HOTKEYF_CONTROL,
                "SHIFT" => HotkeyModifiers::HOTKEYF_SHIFT,
                "ALT" => HotkeyModifiers::HOTKEYF_ALT,
                _ => return Err(crate::Error::InvalidKey(part.to_string())),
            };
        }
        Ok(Self::new(key, modifiers))
    }
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
/// An 8-bit unsigned integer that specifies a virtual key code that
/// corresponds to a key on the keyboard.
pub enum HotkeyKey {
    NoKeyAssigned = 0x00,
    Key0 = 0x30,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA = 0x41,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,
    F1 = 0x70,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    NumLock = 0x90,
    ScrollLock,
}

impl HotkeyKey {
    const NAMES: [(HotkeyKey, &'static str); 2] =
        [(HotkeyKey::NumLock, "NUM LOCK"), (HotkeyKey::ScrollLock, "SCROLL LOCK")];

    /// The symbolic name of this key, `None` for `NoKeyAssigned`.
    pub fn name(&self) -> Option<String> {
        let code = *self as u8;
        Some(match code {
            0x30..=0x39 | 0x41..=0x5a => (code as char).to_string(),
            0x70..=0x87 => format!("F{}", code - 0x6f),
            _ => Self::NAMES.iter().find(|(k, _)| k == self)?.1.to_string(),
        })
    }

    /// Reverse lookup by symbolic name.
    pub fn from_name(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        match bytes {
            [c @ (b'0'..=b'9' | b'A'..=b'Z')] => Self::from_u8(*c),
            _ if name.starts_with('F') => {
                let n: u8 = name[1..].parse().ok()?;
                if (1..=24).contains(&n) {
                    Self::from_u8(0x6f + n)
                } else {
                    None
                }
            }
            _ => Self::NAMES.iter().find(|(_, n)| *n == name).map(|(k, _)| *k),
        }
    }
}

bitflags! {
    /// An 8-bit unsigned integer whose bits correspond to modifier keys.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct HotkeyModifiers: u8 {
        /// No modifier key is being used.
        const NO_MODIFIER       = 0x00;
        /// The "SHIFT" key on the keyboard.
        const HOTKEYF_SHIFT     = 0x01;
        /// The "CTRL" key on the keyboard.
        const HOTKEYF_CONTROL   = 0x02;
        /// The "ALT" key on the keyboard.
        const HOTKEYF_ALT       = 0x04;
    }
}

binread_flags!(HotkeyModifiers, u8);

impl fmt::Display for HotkeyModifiers {
    /// Stringifies as `CONTROL+SHIFT+ALT+` in that fixed order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Self::HOTKEYF_CONTROL) {
            write!(f, "CONTROL+")?;
        }
        if self.contains(Self::HOTKEYF_SHIFT) {
            write!(f, "SHIFT+")?;
        }
        if self.contains(Self::HOTKEYF_ALT) {
            write!(f, "ALT+")?;
        }
        Ok(())
    }
}

/// The expected window state of an application launched by the link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ShowCommand {
    /// The window is open in a normal fashion.
    #[default]
    Normal = 0x01,
    /// The window is maximized and has keyboard focus.
    Maximized = 0x03,
    /// The window is minimized and not given keyboard focus.
    Minimized = 0x07,
}

impl fmt::Display for ShowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "Normal",
            Self::Maximized => "Maximized",
            Self::Minimized => "Minimized",
        })
    }
}

impl FromStr for ShowCommand {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(Self::Normal),
            "Maximized" => Ok(Self::Maximized),
            "Minimized" => Ok(Self::Minimized),
            other => Err(crate::Error::Validation(format!(
                "not a valid window mode: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binread::BinReaderExt;
    use std::io::{Cursor, Seek, SeekFrom};

    #[test]
    fn header_round_trip() {
        let mut header = ShellLinkHeader::default();
        header.set_link_flags(LinkFlags::IS_UNICODE | LinkFlags::HAS_NAME);
        header.set_file_size(1234);
        header.set_icon_index(-2);
        header.set_show_command(ShowCommand::Maximized);
        header.set_hotkey("CONTROL+ALT+Q".parse().unwrap());

        let data: [u8; 0x4c] = (&header).into();
        assert_eq!(&data[0..4], &SIGNATURE);
        assert_eq!(&data[4..20], &LINK_CLSID);

        let mut cursor = Cursor::new(&data[..]);
        cursor.seek(SeekFrom::Start(20)).unwrap();
        let reread: ShellLinkHeader = cursor.read_le().unwrap();
        assert_eq!(reread, header);
        assert_eq!(cursor.position(), 0x4c);
    }

    #[test]
    fn hot_key_text_forms() {
        let hk: HotkeyFlags = "CONTROL+SHIFT+F5".parse().unwrap();
        assert_eq!(hk.key(), HotkeyKey::F5);
        assert_eq!(hk.to_hot_key_string().unwrap(), "CONTROL+SHIFT+F5");

        let hk: HotkeyFlags = "NUM LOCK".parse().unwrap();
        assert_eq!(hk.key(), HotkeyKey::NumLock);

        assert!("CONTROL+BANANA".parse::<HotkeyFlags>().is_err());
        assert!("HYPER+A".parse::<HotkeyFlags>().is_err());
    }

    #[test]
    fn unknown_show_command_reads_as_normal() {
        let mut data = [0u8; 56];
        data[40] = 0x42; // show command
        let mut cursor = Cursor::new(&data[..]);
        let header: ShellLinkHeader = cursor.read_le().unwrap();
        assert_eq!(header.show_command(), ShowCommand::Normal);
    }
}
