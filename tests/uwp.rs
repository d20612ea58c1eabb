use shlink::helpers;
use shlink::shellitem::RootLocation;
use shlink::{LinkFlags, Lnk, ShellItem};

const FAMILY: &str = "Microsoft.WindowsCalculator_8wekyb3d8bbwe";
const TARGET: &str = "Microsoft.WindowsCalculator_8wekyb3d8bbwe!App";
const LOCATION: &str =
    "C:\\Program Files\\WindowsApps\\Microsoft.WindowsCalculator_10.2008.2.0_x64__8wekyb3d8bbwe";

#[test]
fn uwp_link_round_trip() {
    let _ = pretty_env_logger::try_init();

    let lnk = helpers::build_uwp(FAMILY, TARGET, Some(LOCATION), Some("Assets\\Calc.png"), None)
        .unwrap();
    assert!(lnk
        .header()
        .link_flags()
        .contains(LinkFlags::ENABLE_TARGET_METADATA));

    let reread = Lnk::parse(&lnk.to_bytes().unwrap()).unwrap();
    let items = reread.shell_item_id_list().unwrap().items();
    assert_eq!(items.len(), 2);

    let ShellItem::Root(root) = &items[0] else {
        panic!("first item should be the APPS root");
    };
    assert_eq!(root.location(), Some(RootLocation::Apps));

    let ShellItem::Uwp(segment) = &items[1] else {
        panic!("second item should be the UWP segment");
    };
    assert_eq!(segment.property("PackageFamilyName"), Some(FAMILY));
    assert_eq!(segment.property("Target"), Some(TARGET));
    assert_eq!(segment.property("Location"), Some(LOCATION));
    assert_eq!(segment.property("Square44x44Logo"), Some("Assets\\Calc.png"));
}
