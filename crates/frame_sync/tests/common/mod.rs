#![allow(dead_code, reason = "Each test binary uses a different subset of the helpers")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use frame_sync::sim::{SimBrowser, SimWindow};
use frame_sync::{FragmentFrameSpec, FrameContract};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A host window with one fragment embedded in it.
pub struct Embedded {
    pub browser: SimBrowser,
    pub host: SimWindow,
    pub fragment: SimWindow,
}

/// Open `host_url` and embed a fragment with `base_path`/`top_path`, the way a host page would.
pub fn host_with_fragment(host_url: &str, base_path: &str, top_path: &str) -> Result<Embedded> {
    let browser = SimBrowser::new();
    let host = browser.open(host_url)?;
    let fragment = embed(&host, FragmentFrameSpec::new(base_path, top_path), &[])?;
    Ok(Embedded {
        browser,
        host,
        fragment,
    })
}

/// Embed a fragment into `host`, with extra attributes appended.
pub fn embed(host: &SimWindow, spec: FragmentFrameSpec, extra: &[(&str, &str)]) -> Result<SimWindow> {
    let contract = FrameContract::default();
    let mut attributes = spec.build(host, &contract)?.to_attributes(&contract);
    attributes.extend(extra.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())));
    Ok(host.browser().embed(host, &attributes)?)
}

/// Shared log of paths handed to a navigation callback.
pub fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |path: &str| sink.borrow_mut().push(path.to_owned()))
}
