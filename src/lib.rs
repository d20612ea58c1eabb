#![warn(missing_docs)]

//! # Shell Link parser and writer for Rust.
//!
//! Works on any OS - although only really useful in Windows, this library
//! can parse and write .lnk files, the shell links that Windows shortcuts
//! are stored as.
//!
//! To get started, see the [Lnk](struct.Lnk.html) struct.
//!
//! The full specification of these files can be found at
//! [Microsoft's Website](https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-shllink/16cb4ca1-9339-4d0c-a68d-bf1d6cc0f943).
//!
//! ## Read Example
//!
//! ```no_run
//! use shlink::Lnk;
//!
//! let shortcut = Lnk::open("tests/local_file.lnk").unwrap();
//! println!("{shortcut}");
//! println!("resolves to {}", shortcut.path());
//! ```
//!
//! ## Write Example
//!
//! ```no_run
//! use shlink::helpers;
//!
//! let lnk = helpers::for_file("C:\\Windows\\explorer.exe", None, &Default::default()).unwrap();
//! lnk.save("explorer.lnk").unwrap();
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use binread::BinReaderExt;
use encoding_rs::Encoding;
#[allow(unused)]
use log::{debug, error, info, trace, warn};
use thiserror::Error;

mod header;
pub use header::{
    FileAttributeFlags, HotkeyFlags, HotkeyKey, HotkeyModifiers, LinkFlags, ShellLinkHeader,
    ShowCommand,
};

/// The LinkTargetIDList structure specifies the target of the link.
pub mod linktarget;
pub use linktarget::LinkTargetIdList;

/// The entries a LinkTargetIDList is made of.
pub mod shellitem;
pub use shellitem::ShellItem;

/// The LinkInfo structure specifies information necessary to resolve a
/// link target if it is not found in its original location.
pub mod linkinfo;
pub use linkinfo::{DriveType, LinkInfo};

mod stringdata;

/// Structures from the ExtraData section of the shell link.
pub mod extradata;
pub use extradata::ExtraData;

mod filetime;
pub use filetime::FileTime;

mod dostime;
pub use dostime::DosDateTime;

mod guid;
pub use guid::Guid;

/// Helpers that build complete links for common cases.
pub mod helpers;

mod current_offset;
mod itemid;
mod strings;

use crate::stringdata::StringData;

#[macro_use]
mod binread_flags;

/// The code page used for non-unicode strings when none is specified.
pub static DEFAULT_CODEPAGE: &Encoding = &encoding_rs::WINDOWS_1251_INIT;

/// The error type for shell link parsing and writing errors.
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O operation failed.
    #[error("An IO error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// The signature or class GUID at the start of the file is wrong.
    #[error("The parsed file isn't a shell link.")]
    NotAShellLink,

    /// A layer of the binary format could not be decoded.
    #[error("Error while parsing: {0}")]
    BinRead(#[from] binread::Error),

    /// A field expected to hold a GUID could not be parsed as one.
    #[error("Invalid GUID: {0}")]
    InvalidGuid(#[from] uuid::Error),

    /// A serializer was invoked on an entry lacking a required field.
    #[error("Missing information: {0}")]
    MissingInformation(&'static str),

    /// A hot key string references an unknown key or modifier name.
    #[error("Invalid hot key: {0}")]
    InvalidKey(String),

    /// A structural constraint of the format was violated.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A structure the library does not decode.
    #[error("Unsupported structure: {0}")]
    Unsupported(&'static str),
}

/// Shorthand for results carrying a shell link [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A shell link: the parsed in-memory form of a `.lnk` file.
///
/// The object is a plain aggregate; the setters of the optional sections
/// keep the corresponding [`LinkFlags`] bits in sync, so a populated link
/// can always be serialized back with [`Lnk::save`] or [`Lnk::to_bytes`].
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Lnk {
    header: ShellLinkHeader,
    shell_item_id_list: Option<LinkTargetIdList>,
    link_info: Option<LinkInfo>,
    description: Option<String>,
    relative_path: Option<String>,
    work_dir: Option<String>,
    arguments: Option<String>,
    icon: Option<String>,
    extra_data: Option<ExtraData>,
    #[cfg_attr(feature = "serde", serde(skip))]
    file: Option<PathBuf>,
    #[cfg_attr(feature = "serde", serde(skip))]
    codepage: &'static Encoding,
}

impl Default for Lnk {
    /// A blank link for manual configuration.
    fn default() -> Self {
        Self {
            header: ShellLinkHeader::default(),
            shell_item_id_list: None,
            link_info: None,
            description: None,
            relative_path: None,
            work_dir: None,
            arguments: None,
            icon: None,
            extra_data: None,
            file: None,
            codepage: DEFAULT_CODEPAGE,
        }
    }
}

impl Lnk {
    /// Open and parse a shell link. When the path cannot be opened and does
    /// not end in `.lnk`, the open is retried once with the extension
    /// appended.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_codepage(path, DEFAULT_CODEPAGE)
    }

    /// [`Lnk::open`] with an explicit code page for non-unicode strings.
    pub fn open_with_codepage<P: AsRef<Path>>(
        path: P,
        codepage: &'static Encoding,
    ) -> Result<Self> {
        let mut path = path.as_ref().to_path_buf();
        debug!("Opening {path:?}");
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(_) if path.extension().map(|ext| ext != "lnk").unwrap_or(true) => {
                let mut retry = path.into_os_string();
                retry.push(".lnk");
                path = PathBuf::from(retry);
                debug!("Retrying as {path:?}");
                File::open(&path)?
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);
        let mut lnk = Self::from_reader_with_codepage(&mut reader, codepage)?;
        lnk.file = Some(path);
        Ok(lnk)
    }

    /// Parse a shell link from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::from_reader(&mut Cursor::new(data))
    }

    /// Parse a shell link from any seekable reader. The reader stays owned
    /// by the caller.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Self::from_reader_with_codepage(reader, DEFAULT_CODEPAGE)
    }

    /// [`Lnk::from_reader`] with an explicit code page for non-unicode
    /// strings.
    pub fn from_reader_with_codepage<R: Read + Seek>(
        reader: &mut R,
        codepage: &'static Encoding,
    ) -> Result<Self> {
        let mut signature = [0u8; 4];
        let mut clsid = [0u8; 16];
        reader.read_exact(&mut signature)?;
        reader.read_exact(&mut clsid)?;
        if signature != header::SIGNATURE || clsid != header::LINK_CLSID {
            return Err(Error::NotAShellLink);
        }

        let shell_link_header: ShellLinkHeader = reader.read_le()?;
        debug!("Shell header: {shell_link_header:#?}");
        let link_flags = shell_link_header.link_flags();

        let mut shell_item_id_list = None;
        if link_flags.contains(LinkFlags::HAS_LINK_TARGET_ID_LIST) {
            debug!("A LinkTargetIDList is marked as present. Parsing now.");
            let list: LinkTargetIdList = reader.read_le_args((codepage,))?;
            trace!("{list:?}");
            shell_item_id_list = Some(list);
        }

        let mut link_info = None;
        if link_flags.contains(LinkFlags::HAS_LINK_INFO)
            && !link_flags.contains(LinkFlags::FORCE_NO_LINK_INFO)
        {
            debug!("LinkInfo is marked as present. Parsing now.");
            let info: LinkInfo = reader.read_le_args((codepage,))?;
            trace!("{info:?}");
            link_info = Some(info);
        }

        let string_data: StringData = reader.read_le_args((link_flags, codepage))?;
        let extra_data: ExtraData = reader.read_le_args((codepage,))?;

        Ok(Self {
            header: shell_link_header,
            shell_item_id_list,
            link_info,
            description: string_data.name_string,
            relative_path: string_data.relative_path,
            work_dir: string_data.working_dir,
            arguments: string_data.command_line_arguments,
            icon: string_data.icon_location,
            extra_data: Some(extra_data),
            file: None,
            codepage,
        })
    }

    /// Serialize the whole link to its on-disk byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let link_flags = self.header.link_flags();
        let mut out = Vec::new();
        let header_data: [u8; 0x4c] = (&self.header).into();
        out.extend_from_slice(&header_data);

        if link_flags.contains(LinkFlags::HAS_LINK_TARGET_ID_LIST) {
            let list = self
                .shell_item_id_list
                .as_ref()
                .ok_or(Error::MissingInformation("link target ID list"))?;
            out.extend_from_slice(&list.to_bytes(self.codepage)?);
        }

        if link_flags.contains(LinkFlags::HAS_LINK_INFO)
            && !link_flags.contains(LinkFlags::FORCE_NO_LINK_INFO)
        {
            let info = self
                .link_info
                .as_ref()
                .ok_or(Error::MissingInformation("link info"))?;
            out.extend_from_slice(&info.to_bytes(self.codepage)?);
        }

        for (flag, field, what) in [
            (LinkFlags::HAS_NAME, &self.description, "name"),
            (LinkFlags::HAS_RELATIVE_PATH, &self.relative_path, "relative path"),
            (LinkFlags::HAS_WORKING_DIR, &self.work_dir, "working directory"),
            (LinkFlags::HAS_ARGUMENTS, &self.arguments, "arguments"),
            (LinkFlags::HAS_ICON_LOCATION, &self.icon, "icon location"),
        ] {
            if link_flags.contains(flag) {
                let value = field.as_deref().ok_or(Error::MissingInformation(what))?;
                out.extend_from_slice(&stringdata::to_data(value, link_flags, self.codepage));
            }
        }

        match &self.extra_data {
            Some(extra_data) => out.extend_from_slice(&extra_data.to_bytes(self.codepage)?),
            // a bare terminal block
            None => out.extend_from_slice(&[0, 0, 0, 0]),
        }
        Ok(out)
    }

    /// Write the link to the given path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        debug!("Saving to {:?}", path.as_ref());
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Write the link to the given path, appending `.lnk` when absent.
    pub fn save_with_ext<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.extension().map(|ext| ext == "lnk").unwrap_or(false) {
            self.save(path)
        } else {
            let mut with_ext = path.as_os_str().to_owned();
            with_ext.push(".lnk");
            self.save(PathBuf::from(with_ext))
        }
    }

    /// Write the link back to the file it was opened from.
    pub fn save_to_source(&self) -> Result<()> {
        let path = self
            .file
            .as_ref()
            .ok_or(Error::MissingInformation("no file specified for saving"))?;
        self.save(path)
    }

    /// Get the header of the shell link.
    pub fn header(&self) -> &ShellLinkHeader {
        &self.header
    }

    /// Get a mutable instance of the shell link's header.
    pub fn header_mut(&mut self) -> &mut ShellLinkHeader {
        &mut self.header
    }

    /// The code page used for non-unicode strings.
    pub fn codepage(&self) -> &'static Encoding {
        self.codepage
    }

    /// Get the link target ID list.
    pub fn shell_item_id_list(&self) -> Option<&LinkTargetIdList> {
        self.shell_item_id_list.as_ref()
    }

    /// Set the link target ID list, updating `HAS_LINK_TARGET_ID_LIST`.
    pub fn set_shell_item_id_list(&mut self, list: Option<LinkTargetIdList>) {
        self.header
            .update_link_flags(LinkFlags::HAS_LINK_TARGET_ID_LIST, list.is_some());
        self.shell_item_id_list = list;
    }

    /// Get the link info structure.
    pub fn link_info(&self) -> Option<&LinkInfo> {
        self.link_info.as_ref()
    }

    /// Set the link info structure. `HAS_LINK_INFO` tracks presence and
    /// `FORCE_NO_LINK_INFO` absence.
    pub fn set_link_info(&mut self, link_info: Option<LinkInfo>) {
        self.header
            .update_link_flags(LinkFlags::HAS_LINK_INFO, link_info.is_some());
        self.header
            .update_link_flags(LinkFlags::FORCE_NO_LINK_INFO, link_info.is_none());
        self.link_info = link_info;
    }

    /// Get the extra data blocks.
    pub fn extra_data(&self) -> Option<&ExtraData> {
        self.extra_data.as_ref()
    }

    /// Replace the extra data blocks.
    pub fn set_extra_data(&mut self, extra_data: Option<ExtraData>) {
        self.extra_data = extra_data;
    }

    /// The link's description, if set.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the link's description, updating `HAS_NAME`.
    pub fn set_description(&mut self, description: Option<String>) {
        self.header
            .update_link_flags(LinkFlags::HAS_NAME, description.is_some());
        self.description = description;
    }

    /// The link's relative path, if set.
    pub fn relative_path(&self) -> Option<&str> {
        self.relative_path.as_deref()
    }

    /// Set the link's relative path, updating `HAS_RELATIVE_PATH`.
    pub fn set_relative_path(&mut self, relative_path: Option<String>) {
        self.header
            .update_link_flags(LinkFlags::HAS_RELATIVE_PATH, relative_path.is_some());
        self.relative_path = relative_path;
    }

    /// The link's working directory, if set.
    pub fn work_dir(&self) -> Option<&str> {
        self.work_dir.as_deref()
    }

    /// Set the link's working directory, updating `HAS_WORKING_DIR`.
    pub fn set_work_dir(&mut self, work_dir: Option<String>) {
        self.header
            .update_link_flags(LinkFlags::HAS_WORKING_DIR, work_dir.is_some());
        self.work_dir = work_dir;
    }

    /// The link's command-line arguments, if set.
    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    /// Set the link's command-line arguments, updating `HAS_ARGUMENTS`.
    pub fn set_arguments(&mut self, arguments: Option<String>) {
        self.header
            .update_link_flags(LinkFlags::HAS_ARGUMENTS, arguments.is_some());
        self.arguments = arguments;
    }

    /// The link's icon location, if set.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Set the link's icon location, updating `HAS_ICON_LOCATION`.
    pub fn set_icon(&mut self, icon: Option<String>) {
        self.header
            .update_link_flags(LinkFlags::HAS_ICON_LOCATION, icon.is_some());
        self.icon = icon;
    }

    /// The expected window state of the launched application.
    pub fn window_mode(&self) -> ShowCommand {
        self.header.show_command()
    }

    /// Set the expected window state.
    pub fn set_window_mode(&mut self, mode: ShowCommand) {
        self.header.set_show_command(mode);
    }

    /// The hot key in its `[MOD+]*KEY` text form, or `None` when no key is
    /// assigned.
    pub fn hot_key(&self) -> Option<String> {
        self.header.hotkey().to_hot_key_string()
    }

    /// Set the hot key from its text form. Unknown key or modifier names
    /// fail with [`Error::InvalidKey`].
    pub fn set_hot_key(&mut self, hot_key: Option<&str>) -> Result<()> {
        let flags: HotkeyFlags = hot_key.unwrap_or_default().parse()?;
        self.header.set_hotkey(flags);
        Ok(())
    }

    /// The best-effort effective path of the link target.
    ///
    /// A link can store its target in several places at once; the priority
    /// order mirrors what Explorer displays: a full local ID-list path, a
    /// known-folder ID-list path, the LinkInfo path, the environment
    /// variable block, and finally the raw ID-list path.
    pub fn path(&self) -> String {
        let id_list_path = self.shell_item_id_list.as_ref().map(LinkTargetIdList::get_path);
        if let Some(p) = &id_list_path {
            if p.starts_with("%MY_COMPUTER%") {
                // full local path has priority
                return p.get(14..).unwrap_or_default().to_string();
            }
            if p.starts_with("%USERPROFILE%\\::") {
                // a KNOWN_FOLDER path also beats link info
                return p.get(14..).unwrap_or_default().to_string();
            }
        }
        if let Some(link_info_path) = self
            .link_info
            .as_ref()
            .map(LinkInfo::path)
            .filter(|p| !p.is_empty())
        {
            return link_info_path;
        }
        if let Some(env_path) = self
            .extra_data
            .as_ref()
            .and_then(ExtraData::environment_props)
            .map(|block| block.target().trim_matches('\0').to_string())
            .filter(|p| !p.is_empty())
        {
            // some links carry their path only in the environment block
            return env_path;
        }
        id_list_path.unwrap_or_default()
    }
}

impl std::fmt::Display for Lnk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Target file:")?;
        write!(f, "{:?}", self.header.file_attributes())?;
        write!(f, "\nCreation Time: {}", self.header.creation_time().datetime())?;
        write!(f, "\nModification Time: {}", self.header.write_time().datetime())?;
        write!(f, "\nAccess Time: {}", self.header.access_time().datetime())?;
        write!(f, "\nFile size: {}", self.header.file_size())?;
        write!(f, "\nWindow mode: {}", self.window_mode())?;
        write!(f, "\nHotkey: {}\n", self.hot_key().unwrap_or_default())?;
        match &self.link_info {
            Some(info) => write!(f, "{info}")?,
            None => write!(f, "File Location Info: <not specified>")?,
        }
        if let Some(list) = &self.shell_item_id_list {
            write!(f, "\n{list}")?;
        }
        if let Some(description) = &self.description {
            write!(f, "\nDescription: {description}")?;
        }
        if let Some(relative_path) = &self.relative_path {
            write!(f, "\nRelative Path: {relative_path}")?;
        }
        if let Some(work_dir) = &self.work_dir {
            write!(f, "\nWorking Directory: {work_dir}")?;
        }
        if let Some(arguments) = &self.arguments {
            write!(f, "\nCommandline Arguments: {arguments}")?;
        }
        if let Some(icon) = &self.icon {
            write!(f, "\nIcon: {icon}")?;
        }
        write!(f, "\nUsed Path: {}", self.path())?;
        if let Some(extra_data) = &self.extra_data {
            write!(f, "{extra_data}")?;
        }
        Ok(())
    }
}
