//! Builders for the common kinds of links: local files and folders, UNC
//! shares, and UWP applications.

use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;

use crate::extradata::{EnvironmentVariableDataBlock, ExtraData, ExtraDataBlock};
use crate::shellitem::{
    DriveEntry, PathSegmentEntry, PathSegmentKind, RootEntry, RootLocation, ShellItem,
    UwpSegmentEntry,
};
use crate::{
    DosDateTime, FileAttributeFlags, LinkFlags, LinkInfo, LinkTargetIdList, Lnk, Result,
    ShowCommand,
};

/// Split a windows-style path at its last separator, keeping the separator
/// on drive and UNC roots.
fn split_path(p: &str) -> (&str, &str) {
    match p.rfind(['\\', '/']) {
        None => ("", p),
        Some(at) => {
            let base = &p[at + 1..];
            let dir = &p[..at + 1];
            let stripped = dir.trim_end_matches(['\\', '/']);
            if stripped.is_empty() || stripped.ends_with(':') {
                (dir, base)
            } else {
                (stripped, base)
            }
        }
    }
}

/// Every prefix of a path, shortest first: `C:\a\b.txt` yields `C:\`,
/// `C:\a`, `C:\a\b.txt`.
pub fn path_levels(p: &str) -> Vec<String> {
    let mut levels = Vec::new();
    let mut current = p.to_string();
    loop {
        let (dir, base) = split_path(&current);
        levels.push(current.clone());
        if base.is_empty() || dir.is_empty() {
            break;
        }
        current = dir.to_string();
    }
    levels.reverse();
    levels
}

/// Whether the text names a drive root like `C:` or `c:\`.
pub fn is_drive(data: &str) -> bool {
    let mut chars = data.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && matches!(chars.next(), Some(':'))
        && matches!(chars.next(), None | Some('\\'))
        && chars.next().is_none()
}

/// The optional attributes of a link built by [`for_file`].
#[derive(Clone, Debug, Default)]
pub struct LinkOptions<'a> {
    /// Command-line arguments passed to the target.
    pub arguments: Option<&'a str>,
    /// The link description.
    pub description: Option<&'a str>,
    /// The icon file to display.
    pub icon_file: Option<&'a str>,
    /// The index of the icon within the icon file.
    pub icon_index: i32,
    /// The working directory of the launched target.
    pub work_dir: Option<&'a str>,
    /// The initial window state.
    pub window_mode: Option<ShowCommand>,
    /// Whether the target leaf is a file. Without it the leaf is a file
    /// when its name contains a dot past the first character.
    pub is_file: Option<bool>,
}

/// Build a link for a local path or a UNC target, and save it when
/// `lnk_name` is given.
///
/// UNC targets (`\\server\share\…`) are stored as a remote [`LinkInfo`]
/// whose share name is the first four `\`-separated segments uppercased,
/// plus an [`EnvironmentVariableDataBlock`] echoing the full target. Local
/// targets get an absolute ID list: a MY_COMPUTER root, the drive, one
/// forced-folder segment per intermediate level and a leaf typed by
/// `options.is_file`.
pub fn for_file(target_file: &str, lnk_name: Option<&Path>, options: &LinkOptions) -> Result<Lnk> {
    let mut lnk = Lnk::default();
    lnk.set_link_info(None);

    if target_file.starts_with("\\\\") {
        debug!("creating a remote link to {target_file}");
        let parts: Vec<&str> = target_file.split('\\').collect();
        let share_name = parts
            .iter()
            .take(4)
            .copied()
            .collect::<Vec<_>>()
            .join("\\")
            .to_uppercase();
        let base_name = parts.iter().skip(4).copied().collect::<Vec<_>>().join("\\");
        lnk.set_link_info(Some(LinkInfo::new_remote(&share_name, &base_name)));
        // explorer requires the environment block and HasExpString for
        // these links to resolve
        lnk.set_extra_data(Some(ExtraData::new(vec![ExtraDataBlock::EnvironmentProps(
            EnvironmentVariableDataBlock::new(target_file),
        )])));
        lnk.header_mut()
            .update_link_flags(LinkFlags::HAS_EXP_STRING, true);
    } else {
        debug!("creating a local link to {target_file}");
        let levels = path_levels(target_file);
        let mut items = vec![
            ShellItem::Root(RootEntry::new(RootLocation::MyComputer)),
            ShellItem::Drive(DriveEntry::new(&levels[0])?),
        ];
        for (index, level) in levels.iter().enumerate().skip(1) {
            let is_last = index == levels.len() - 1;
            // everything before the leaf is a directory
            let is_file = if is_last { options.is_file } else { Some(false) };
            items.push(ShellItem::Path(PathSegmentEntry::create_for_path(
                level, is_file,
            )));
        }
        lnk.set_shell_item_id_list(Some(LinkTargetIdList::new(items)));
    }

    if let Some(arguments) = options.arguments {
        lnk.set_arguments(Some(arguments.to_string()));
    }
    if let Some(description) = options.description {
        lnk.set_description(Some(description.to_string()));
    }
    if let Some(icon_file) = options.icon_file {
        lnk.set_icon(Some(icon_file.to_string()));
    }
    lnk.header_mut().set_icon_index(options.icon_index);
    if let Some(work_dir) = options.work_dir {
        lnk.set_work_dir(Some(work_dir.to_string()));
    }
    if let Some(window_mode) = options.window_mode {
        lnk.set_window_mode(window_mode);
    }
    if let Some(lnk_name) = lnk_name {
        lnk.save(lnk_name)?;
    }
    Ok(lnk)
}

/// One level of an explicitly described path, for [`from_segment_list`].
#[derive(Clone, Debug)]
pub struct SegmentSpec {
    /// Whether this level is a file or a folder.
    pub kind: PathSegmentKind,
    /// The name of this level.
    pub name: String,
    /// The file size; ignored for folders.
    pub size: u32,
    /// Creation timestamp.
    pub created: NaiveDateTime,
    /// Modification timestamp.
    pub modified: NaiveDateTime,
    /// Access timestamp.
    pub accessed: NaiveDateTime,
}

/// Build a link from explicit path segments. With a drive the link is
/// absolute; without one it is relative. Correct dates are not crucial for
/// working links.
pub fn from_segment_list(
    drive: Option<&str>,
    segments: &[SegmentSpec],
    lnk_name: Option<&Path>,
) -> Result<Lnk> {
    let mut lnk = Lnk::default();
    let mut items = Vec::new();
    if let Some(drive) = drive {
        items.push(ShellItem::Root(RootEntry::new(RootLocation::MyComputer)));
        items.push(ShellItem::Drive(DriveEntry::new(drive)?));
    }
    for spec in segments {
        let mut segment = PathSegmentEntry::new(spec.kind, &spec.name);
        segment.set_file_size(Some(if spec.kind == PathSegmentKind::Folder {
            0
        } else {
            spec.size
        }));
        segment.set_created(Some(DosDateTime::from(spec.created)));
        segment.set_modified(Some(DosDateTime::from(spec.modified)));
        segment.set_accessed(Some(DosDateTime::from(spec.accessed)));
        items.push(ShellItem::Path(segment));
    }
    lnk.set_shell_item_id_list(Some(LinkTargetIdList::new(items)));
    if segments.last().map(|spec| spec.kind) == Some(PathSegmentKind::Folder) {
        let attributes =
            lnk.header().file_attributes() | FileAttributeFlags::FILE_ATTRIBUTE_DIRECTORY;
        lnk.header_mut().set_file_attributes(attributes);
    }
    if let Some(lnk_name) = lnk_name {
        lnk.save(lnk_name)?;
    }
    Ok(lnk)
}

/// Build a link launching a UWP application.
///
/// `package_family_name` is e.g. `Microsoft.WindowsCalculator_8wekyb3d8bbwe`,
/// `target` the application user model id
/// (`Microsoft.WindowsCalculator_8wekyb3d8bbwe!App`), `location` the install
/// directory and `logo44x44` a logo path relative to it.
pub fn build_uwp(
    package_family_name: &str,
    target: &str,
    location: Option<&str>,
    logo44x44: Option<&str>,
    lnk_name: Option<&Path>,
) -> Result<Lnk> {
    let mut lnk = Lnk::default();
    lnk.header_mut()
        .update_link_flags(LinkFlags::ENABLE_TARGET_METADATA, true);
    lnk.set_shell_item_id_list(Some(LinkTargetIdList::new(vec![
        ShellItem::Root(RootEntry::new(RootLocation::Apps)),
        ShellItem::Uwp(UwpSegmentEntry::create(
            package_family_name,
            target,
            location,
            logo44x44,
        )),
    ])));
    if let Some(lnk_name) = lnk_name {
        lnk.save(lnk_name)?;
    }
    Ok(lnk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_of_an_absolute_path() {
        assert_eq!(
            path_levels("C:\\folder\\file.txt"),
            vec!["C:\\", "C:\\folder", "C:\\folder\\file.txt"]
        );
        assert_eq!(path_levels("C:\\"), vec!["C:\\"]);
    }

    #[test]
    fn drive_detection() {
        assert!(is_drive("C:"));
        assert!(is_drive("z:\\"));
        assert!(!is_drive("C"));
        assert!(!is_drive("C:\\x"));
        assert!(!is_drive("\\\\host"));
    }
}
