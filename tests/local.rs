use std::fs;

#[allow(unused)]
use log::{debug, info};

use shlink::helpers::{self, LinkOptions};
use shlink::shellitem::PathSegmentKind;
use shlink::{Lnk, ShellItem};

fn reparse(lnk: &Lnk) -> Lnk {
    Lnk::parse(&lnk.to_bytes().expect("serialize")).expect("reparse")
}

fn path_kinds(lnk: &Lnk) -> Vec<PathSegmentKind> {
    lnk.shell_item_id_list()
        .expect("ID list")
        .items()
        .iter()
        .filter_map(|item| match item {
            ShellItem::Path(entry) => entry.kind().clone(),
            _ => None,
        })
        .collect()
}

#[test]
fn create_local_file_link() {
    let _ = pretty_env_logger::try_init();

    let lnk = helpers::for_file("C:\\folder\\file.txt", None, &LinkOptions::default()).unwrap();
    assert_eq!(lnk.path(), "C:\\folder\\file.txt");

    let reread = reparse(&lnk);
    assert_eq!(reread.path(), "C:\\folder\\file.txt");
    assert_eq!(
        path_kinds(&reread),
        vec![PathSegmentKind::Folder, PathSegmentKind::File]
    );
}

#[test]
fn create_local_folder_link() {
    let lnk = helpers::for_file("C:\\Windows\\System32", None, &LinkOptions::default()).unwrap();
    let reread = reparse(&lnk);
    assert_eq!(reread.path(), "C:\\Windows\\System32");
    assert_eq!(
        path_kinds(&reread),
        vec![PathSegmentKind::Folder, PathSegmentKind::Folder]
    );
}

#[test]
fn create_local_disk_link() {
    let lnk = helpers::for_file("C:\\", None, &LinkOptions::default()).unwrap();
    assert_eq!(lnk.path(), "C:");
    assert_eq!(reparse(&lnk).path(), "C:");
}

#[test]
fn explicit_kind_overrides_the_dot_heuristic() {
    let options = LinkOptions {
        is_file: Some(false),
        ..LinkOptions::default()
    };
    let lnk = helpers::for_file("C:\\folder\\name.with.dots", None, &options).unwrap();
    assert_eq!(
        path_kinds(&reparse(&lnk)),
        vec![PathSegmentKind::Folder, PathSegmentKind::Folder]
    );
}

#[test]
fn serialization_is_stable() {
    let options = LinkOptions {
        description: Some("stable"),
        work_dir: Some("C:\\folder"),
        ..LinkOptions::default()
    };
    let lnk = helpers::for_file("C:\\folder\\file.txt", None, &options).unwrap();
    let first = lnk.to_bytes().unwrap();
    let second = Lnk::parse(&first).unwrap().to_bytes().unwrap();
    assert_eq!(first, second);
}

#[test]
fn segment_list_link() {
    let stamp = chrono::NaiveDate::from_ymd_opt(2012, 10, 12)
        .unwrap()
        .and_hms_opt(23, 28, 11)
        .unwrap();
    let segment = |kind, name: &str, size| helpers::SegmentSpec {
        kind,
        name: name.to_string(),
        size,
        created: stamp,
        modified: stamp,
        accessed: stamp,
    };
    let lnk = helpers::from_segment_list(
        Some("C:\\"),
        &[
            segment(PathSegmentKind::Folder, "dir", 0),
            segment(PathSegmentKind::File, "file.txt", 823),
        ],
        None,
    )
    .unwrap();
    let reread = reparse(&lnk);
    assert_eq!(reread.path(), "C:\\dir\\file.txt");
    assert_eq!(
        path_kinds(&reread),
        vec![PathSegmentKind::Folder, PathSegmentKind::File]
    );
}

#[test]
fn open_appends_the_extension_once() {
    let dir = std::env::temp_dir().join("shlink-test-open");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("shortcut.lnk");

    helpers::for_file("C:\\folder\\file.txt", Some(&path), &LinkOptions::default()).unwrap();

    // opening without the extension retries with it appended
    let lnk = Lnk::open(dir.join("shortcut")).unwrap();
    assert_eq!(lnk.path(), "C:\\folder\\file.txt");

    let lnk = Lnk::open(&path).unwrap();
    assert_eq!(lnk.path(), "C:\\folder\\file.txt");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn options_reach_the_saved_link() {
    let options = LinkOptions {
        arguments: Some("-x 1"),
        description: Some("a description"),
        icon_file: Some("C:\\icons\\app.ico"),
        icon_index: 3,
        work_dir: Some("C:\\folder"),
        window_mode: Some(shlink::ShowCommand::Minimized),
        is_file: Some(true),
    };
    let reread = reparse(&helpers::for_file("C:\\folder\\app", None, &options).unwrap());
    assert_eq!(reread.arguments(), Some("-x 1"));
    assert_eq!(reread.description(), Some("a description"));
    assert_eq!(reread.icon(), Some("C:\\icons\\app.ico"));
    assert_eq!(reread.header().icon_index(), 3);
    assert_eq!(reread.work_dir(), Some("C:\\folder"));
    assert_eq!(reread.window_mode(), shlink::ShowCommand::Minimized);
    assert_eq!(path_kinds(&reread), vec![PathSegmentKind::Folder, PathSegmentKind::File]);
}
