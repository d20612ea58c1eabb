use shlink::extradata::{
    ExtraData, ExtraDataBlock, PropertyKey, PropertyStore, PropertyStoreDataBlock,
    TypedPropertyValue, UnparsedDataBlock,
};
use shlink::shellitem::{PathSegmentEntry, PathSegmentKind, RootEntry, RootLocation};
use shlink::{
    Error, FileAttributeFlags, LinkFlags, LinkInfo, LinkTargetIdList, Lnk, ShellItem, ShowCommand,
};

fn reparse(lnk: &Lnk) -> Lnk {
    Lnk::parse(&lnk.to_bytes().expect("serialize")).expect("reparse")
}

#[test]
fn blank_link_keeps_its_name() {
    let _ = pretty_env_logger::try_init();

    for is_unicode in [false, true] {
        let mut lnk = Lnk::default();
        lnk.header_mut()
            .update_link_flags(LinkFlags::IS_UNICODE, is_unicode);
        lnk.set_description(Some("Blank name".to_string()));
        let reread = reparse(&lnk);
        assert_eq!(reread.description(), Some("Blank name"));
        assert_eq!(
            reread.header().link_flags().contains(LinkFlags::IS_UNICODE),
            is_unicode
        );
    }
}

#[test]
fn string_fields_and_flags_stay_coupled() {
    let mut lnk = Lnk::default();
    let flags = |lnk: &Lnk| lnk.header().link_flags();

    lnk.set_description(Some("d".into()));
    assert!(flags(&lnk).contains(LinkFlags::HAS_NAME));
    lnk.set_description(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_NAME));

    lnk.set_relative_path(Some(".\\x.exe".into()));
    assert!(flags(&lnk).contains(LinkFlags::HAS_RELATIVE_PATH));
    lnk.set_relative_path(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_RELATIVE_PATH));

    lnk.set_work_dir(Some("C:\\".into()));
    assert!(flags(&lnk).contains(LinkFlags::HAS_WORKING_DIR));
    lnk.set_work_dir(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_WORKING_DIR));

    lnk.set_arguments(Some("-v".into()));
    assert!(flags(&lnk).contains(LinkFlags::HAS_ARGUMENTS));
    lnk.set_arguments(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_ARGUMENTS));

    lnk.set_icon(Some("x.ico".into()));
    assert!(flags(&lnk).contains(LinkFlags::HAS_ICON_LOCATION));
    lnk.set_icon(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_ICON_LOCATION));

    lnk.set_shell_item_id_list(Some(LinkTargetIdList::default()));
    assert!(flags(&lnk).contains(LinkFlags::HAS_LINK_TARGET_ID_LIST));
    lnk.set_shell_item_id_list(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_LINK_TARGET_ID_LIST));

    lnk.set_link_info(Some(LinkInfo::new_remote("\\\\A\\B", "c.txt")));
    assert!(flags(&lnk).contains(LinkFlags::HAS_LINK_INFO));
    assert!(!flags(&lnk).contains(LinkFlags::FORCE_NO_LINK_INFO));
    lnk.set_link_info(None);
    assert!(!flags(&lnk).contains(LinkFlags::HAS_LINK_INFO));
    assert!(flags(&lnk).contains(LinkFlags::FORCE_NO_LINK_INFO));
}

#[test]
fn hot_key_round_trip() {
    let mut lnk = Lnk::default();
    lnk.set_hot_key(Some("CONTROL+ALT+F5")).unwrap();
    assert_eq!(lnk.hot_key().as_deref(), Some("CONTROL+ALT+F5"));
    assert_eq!(reparse(&lnk).hot_key().as_deref(), Some("CONTROL+ALT+F5"));

    lnk.set_hot_key(None).unwrap();
    assert_eq!(lnk.hot_key(), None);

    assert!(matches!(
        lnk.set_hot_key(Some("SUPER+Q")),
        Err(Error::InvalidKey(_))
    ));
    assert!(matches!(
        lnk.set_hot_key(Some("CONTROL+OOPS")),
        Err(Error::InvalidKey(_))
    ));
}

#[test]
fn header_fields_round_trip() {
    let mut lnk = Lnk::default();
    lnk.header_mut()
        .set_file_attributes(FileAttributeFlags::FILE_ATTRIBUTE_ARCHIVE);
    lnk.header_mut().set_file_size(0x1234);
    lnk.header_mut().set_icon_index(-1);
    lnk.set_window_mode(ShowCommand::Maximized);

    let reread = reparse(&lnk);
    assert_eq!(
        reread.header().file_attributes(),
        FileAttributeFlags::FILE_ATTRIBUTE_ARCHIVE
    );
    assert_eq!(reread.header().file_size(), 0x1234);
    assert_eq!(reread.header().icon_index(), -1);
    assert_eq!(reread.window_mode(), ShowCommand::Maximized);
    assert_eq!(
        reread.header().creation_time(),
        lnk.header().creation_time()
    );
    assert_eq!(reread.header().write_time(), lnk.header().write_time());
}

#[test]
fn unknown_extra_blocks_survive_in_order() {
    let mut lnk = Lnk::default();
    lnk.set_extra_data(Some(ExtraData::new(vec![
        ExtraDataBlock::Unparsed(UnparsedDataBlock {
            signature: 0xa000_0003,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        }),
        ExtraDataBlock::Unparsed(UnparsedDataBlock {
            signature: 0xdead_0001,
            data: vec![1, 2, 3],
        }),
    ])));

    let reread = reparse(&lnk);
    let signatures: Vec<u32> = reread
        .extra_data()
        .unwrap()
        .blocks()
        .iter()
        .map(ExtraDataBlock::signature)
        .collect();
    assert_eq!(signatures, vec![0xa000_0003, 0xdead_0001]);
    assert_eq!(reread.extra_data(), lnk.extra_data());
}

#[test]
fn property_store_round_trip() {
    let store = PropertyStore::new(
        "{446D16B1-8DAD-4870-A748-402EA43D788C}".parse().unwrap(),
        vec![
            (
                PropertyKey::Id(104),
                TypedPropertyValue::new(0x13, 42u32.to_le_bytes().to_vec()),
            ),
            (
                PropertyKey::Id(105),
                TypedPropertyValue::from_string("C:\\Users\\someone"),
            ),
        ],
    );
    let mut lnk = Lnk::default();
    lnk.set_extra_data(Some(ExtraData::new(vec![
        ExtraDataBlock::PropertyStoreProps(PropertyStoreDataBlock::new(vec![store])),
    ])));

    let reread = reparse(&lnk);
    assert_eq!(reread.extra_data(), lnk.extra_data());
}

#[test]
fn known_folder_link_resolves_like_explorer() {
    // the shape of links in the Recent folder: a USERPROFILE root followed
    // by a known-folder GUID and the document name
    let mut lnk = Lnk::default();
    lnk.set_shell_item_id_list(Some(LinkTargetIdList::new(vec![
        ShellItem::Root(RootEntry::new(RootLocation::UserProfile)),
        ShellItem::Path(PathSegmentEntry::new(
            PathSegmentKind::RootKnownFolder,
            "::{374DE290-123F-4565-9164-39C4925E467B}",
        )),
        ShellItem::Path(PathSegmentEntry::new(
            PathSegmentKind::File,
            "2020M09_01_contract.pdf",
        )),
    ])));

    let expected = "::{374DE290-123F-4565-9164-39C4925E467B}\\2020M09_01_contract.pdf";
    assert_eq!(lnk.path(), expected);
    assert_eq!(reparse(&lnk).path(), expected);
}

#[test]
fn link_info_beats_the_id_list_for_network_targets() {
    // a mounted share stores a drive-letter path in LinkInfo and the UNC
    // form in the ID list; the local path wins
    let mut lnk = Lnk::default();
    lnk.set_link_info(Some(LinkInfo::new_local(
        "Z:\\Downloads\\folder1\\file1.txt",
        shlink::DriveType::DriveRemote,
        0,
        "",
    )));
    assert_eq!(lnk.path(), "Z:\\Downloads\\folder1\\file1.txt");
}

#[test]
fn not_a_shell_link() {
    assert!(matches!(
        Lnk::parse(b"MZ\x00\x00 definitely not a shortcut"),
        Err(Error::NotAShellLink)
    ));
    let mut data = vec![0x4c, 0, 0, 0];
    data.extend_from_slice(&[0u8; 72]);
    assert!(matches!(Lnk::parse(&data), Err(Error::NotAShellLink)));
}
