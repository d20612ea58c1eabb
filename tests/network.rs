use shlink::extradata::ExtraDataBlock;
use shlink::helpers::{self, LinkOptions};
use shlink::{LinkFlags, Lnk};

const TARGET: &str = "\\\\192.168.1.1\\SHARE\\path\\file.txt";

fn reparse(lnk: &Lnk) -> Lnk {
    Lnk::parse(&lnk.to_bytes().expect("serialize")).expect("reparse")
}

#[test]
fn create_network_link() {
    let _ = pretty_env_logger::try_init();

    let lnk = helpers::for_file(TARGET, None, &LinkOptions::default()).unwrap();
    assert!(lnk.header().link_flags().contains(LinkFlags::HAS_EXP_STRING));
    assert!(lnk.header().link_flags().contains(LinkFlags::HAS_LINK_INFO));
    assert_eq!(lnk.path(), TARGET);

    let info = lnk.link_info().unwrap();
    assert!(info.is_remote());
    assert_eq!(info.network_share_name(), "\\\\192.168.1.1\\SHARE");
    assert_eq!(info.base_name(), "path\\file.txt");
}

#[test]
fn network_link_round_trip() {
    let lnk = helpers::for_file(TARGET, None, &LinkOptions::default()).unwrap();
    let reread = reparse(&lnk);

    // the base-name offset defect makes the LinkInfo path stop at the share
    assert_eq!(reread.path(), "\\\\192.168.1.1\\SHARE\\");

    // the full target still round-trips through the environment block
    let blocks = reread.extra_data().unwrap().blocks();
    assert_eq!(blocks.len(), 1);
    assert!(matches!(blocks[0], ExtraDataBlock::EnvironmentProps(_)));
    let env = reread.extra_data().unwrap().environment_props().unwrap();
    assert_eq!(env.target_unicode(), TARGET);
    assert_eq!(env.target_ansi(), TARGET);
}

#[test]
fn share_name_is_uppercased() {
    let lnk = helpers::for_file(
        "\\\\server\\share\\file.doc",
        None,
        &LinkOptions::default(),
    )
    .unwrap();
    let info = lnk.link_info().unwrap();
    assert_eq!(info.network_share_name(), "\\\\SERVER\\SHARE");
    assert_eq!(info.base_name(), "file.doc");
    // the environment block keeps the original case
    let env = lnk.extra_data().unwrap().environment_props().unwrap();
    assert_eq!(env.target_unicode(), "\\\\server\\share\\file.doc");
}
