mod common;

use anyhow::Result;
use common::{embed, init_logging};
use frame_sync::sim::SimBrowser;
use frame_sync::{
    FragmentFrameSpec, FragmentHints, FrameBinding, FrameContract, FrameElement, BrowsingContext,
    owning_binding,
};

#[test]
fn src_opens_fragment_at_host_local_path() -> Result<()> {
    init_logging();
    let browser = SimBrowser::new();
    let host = browser.open("https://host.test/app/users/5")?;
    let contract = FrameContract::default();

    let attrs = FragmentFrameSpec::new("/fragment", "/app").build(&host, &contract)?;

    assert_eq!(
        attrs.src,
        "/fragment/users/5?_kap_fragment=true&_kap_basepath=%2Ffragment"
    );
    assert_eq!(attrs.class, "fragment-frame");
    assert_eq!(attrs.base_path, "/fragment");
    assert_eq!(attrs.parent_path, "/app");
    Ok(())
}

#[test]
fn src_keeps_existing_query_and_hash() -> Result<()> {
    init_logging();
    let browser = SimBrowser::new();
    let host = browser.open("https://host.test/app/users/5?tab=2#top")?;
    let contract = FrameContract::default();

    let attrs = FragmentFrameSpec::new("fragment", "/app/")
        .with_class("  wide bordered ")
        .build(&host, &contract)?;

    assert_eq!(
        attrs.src,
        "/fragment/users/5?tab=2&_kap_fragment=true&_kap_basepath=%2Ffragment#top"
    );
    assert_eq!(attrs.class, "fragment-frame wide bordered");
    Ok(())
}

#[test]
fn base_path_nests_under_host_base() -> Result<()> {
    init_logging();
    let browser = SimBrowser::new();
    let host = browser.open("https://host.test/portal/app")?;
    host.set_base_href(Some("/portal"));
    let contract = FrameContract::default();

    let attrs = FragmentFrameSpec::new("/fragment", "/portal/app").build(&host, &contract)?;

    assert_eq!(attrs.base_path, "/portal/fragment");
    assert!(attrs.src.starts_with("/portal/fragment/?"));
    assert!(attrs.src.ends_with("_kap_basepath=%2Fportal%2Ffragment"));
    Ok(())
}

#[test]
fn attributes_are_readable_as_a_binding() -> Result<()> {
    init_logging();
    let browser = SimBrowser::new();
    let host = browser.open("https://host.test/app")?;
    let contract = FrameContract::default();
    let fragment = embed(&host, FragmentFrameSpec::new("/fragment", "/app").with_class("wide"), &[])?;

    let frames = host.frames()?;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].has_class("fragment-frame")?);
    assert!(frames[0].has_class("wide")?);
    assert!(!frames[0].has_class("fragment")?);

    let expected = FrameBinding {
        base_path: "/fragment".to_owned(),
        parent_path: "/app".to_owned(),
    };
    assert_eq!(FrameBinding::read(&frames[0], &contract)?, expected);
    assert_eq!(owning_binding(&fragment, &contract)?, Some(expected));
    Ok(())
}

#[test]
fn missing_attributes_default_to_root() -> Result<()> {
    init_logging();
    let browser = SimBrowser::new();
    let host = browser.open("https://host.test/")?;
    let bare = browser.embed(&host, &[("src".to_owned(), "/plain".to_owned())])?;
    let contract = FrameContract::default();

    assert_eq!(owning_binding(&bare, &contract)?, Some(FrameBinding::default()));
    let frame = bare.frame_element()?.expect("framed window");
    assert_eq!(frame.attribute(&contract.base_path_attr)?, None);
    Ok(())
}

#[test]
fn hints_round_trip_through_src() -> Result<()> {
    init_logging();
    let browser = SimBrowser::new();
    let host = browser.open("https://host.test/app/x")?;
    let contract = FrameContract::default();
    let attrs = FragmentFrameSpec::new("/my fragment", "/app").build(&host, &contract)?;

    let hints = FragmentHints::from_path(&attrs.src, &contract);
    assert!(hints.is_fragment);
    assert_eq!(hints.base_path.as_deref(), Some("/my fragment"));

    assert_eq!(FragmentHints::from_path("/app/x", &contract), FragmentHints::default());
    let not_fragment = FragmentHints::from_path("/a?_kap_fragment=false#x", &contract);
    assert!(!not_fragment.is_fragment);
    assert_eq!(not_fragment.base_path, None);
    Ok(())
}
