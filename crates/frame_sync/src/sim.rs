//! In-memory multi-window browser.
//!
//! Models just enough of a browser for synchronization to be exercised
//! without one: windows nested through `<iframe>` elements, per-window
//! origins, history entries, `<base href>`, and a queued event loop.
//!
//! Handles remember which window is accessing them, so reaching into a window
//! or document of another origin fails the way a browser's security check
//! would. Dispatched events are queued and only delivered by
//! [`SimBrowser::run_until_idle`], mirroring fire-and-forget dispatch to
//! another window's event loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use indextree::{Arena, Node, NodeId};
use log::{debug, warn};
use url::Url;

use crate::context::{BrowsingContext, EventListener, FrameElement, ListenerId};
use crate::error::{FrameAccessError, FrameSyncError};
use crate::path::to_full_path;

/// Events delivered per [`SimBrowser::run_until_idle`] call before giving up.
pub const MAX_EVENTS_PER_RUN: usize = 1024;

struct SimFrameData {
    attributes: Vec<(String, String)>,
    detached: bool,
}

impl SimFrameData {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct SimWindowData {
    url: Url,
    base_href: Option<String>,
    /// Element in the parent document that hosts this window.
    frame: Option<SimFrameData>,
    history: Vec<Url>,
    replaced: usize,
    listeners: Vec<(String, ListenerId, EventListener)>,
}

#[derive(Default)]
struct BrowserState {
    windows: Arena<SimWindowData>,
    queue: VecDeque<(NodeId, String)>,
    next_listener: u64,
    /// Top-level windows report themselves as their parent.
    self_parented: bool,
}

impl BrowserState {
    fn window(&self, id: NodeId) -> Result<&SimWindowData, FrameAccessError> {
        self.windows
            .get(id)
            .filter(|node| !node.is_removed())
            .map(Node::get)
            .ok_or_else(|| FrameAccessError::Unavailable("window was closed".to_owned()))
    }

    fn window_mut(&mut self, id: NodeId) -> Result<&mut SimWindowData, FrameAccessError> {
        self.windows
            .get_mut(id)
            .filter(|node| !node.is_removed())
            .map(Node::get_mut)
            .ok_or_else(|| FrameAccessError::Unavailable("window was closed".to_owned()))
    }

    fn origin(&self, id: NodeId) -> Result<String, FrameAccessError> {
        Ok(self.window(id)?.url.origin().ascii_serialization())
    }

    fn check_access(&self, accessor: NodeId, target: NodeId) -> Result<(), FrameAccessError> {
        let accessor_origin = self.origin(accessor)?;
        let target_origin = self.origin(target)?;
        if accessor_origin == target_origin {
            Ok(())
        } else {
            Err(FrameAccessError::CrossOrigin {
                accessor: accessor_origin,
                target: target_origin,
            })
        }
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.windows.get(id).and_then(Node::parent)
    }
}

/// A simulated browser holding any number of top-level windows.
#[derive(Clone, Default)]
pub struct SimBrowser {
    state: Rc<RefCell<BrowserState>>,
}

impl SimBrowser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A browser whose top-level windows are their own parent, as in a DOM.
    #[must_use]
    pub fn self_parented() -> Self {
        let browser = Self::default();
        browser.state.borrow_mut().self_parented = true;
        browser
    }

    /// Open a top-level window at an absolute URL.
    ///
    /// # Errors
    /// Fails when `url` is not an absolute URL.
    pub fn open(&self, url: &str) -> Result<SimWindow, FrameSyncError> {
        let url = parse_absolute(url)?;
        let id = self.state.borrow_mut().windows.new_node(SimWindowData {
            history: vec![url.clone()],
            url,
            base_href: None,
            frame: None,
            replaced: 0,
            listeners: Vec::new(),
        });
        Ok(self.handle(id, id))
    }

    /// Append an `<iframe>` with `attributes` to `host`'s document and load its `src`.
    ///
    /// `src` is resolved against the host's address. The returned handle is
    /// the embedded window as seen by its own scripts.
    ///
    /// # Errors
    /// Fails without a `src` attribute, when it cannot be resolved, or when
    /// the host is closed.
    pub fn embed(
        &self,
        host: &SimWindow,
        attributes: &[(String, String)],
    ) -> Result<SimWindow, FrameSyncError> {
        let src = attributes
            .iter()
            .find(|(key, _)| key == "src")
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| FrameSyncError::MalformedUrl {
                input: String::new(),
                reason: "frame has no src attribute".to_owned(),
            })?;
        let mut state = self.state.borrow_mut();
        let url = state
            .window(host.id)?
            .url
            .join(src)
            .map_err(|err| FrameSyncError::MalformedUrl {
                input: src.to_owned(),
                reason: err.to_string(),
            })?;
        let id = state.windows.new_node(SimWindowData {
            history: vec![url.clone()],
            url,
            base_href: None,
            frame: Some(SimFrameData {
                attributes: attributes.to_vec(),
                detached: false,
            }),
            replaced: 0,
            listeners: Vec::new(),
        });
        host.id.append(id, &mut state.windows);
        debug!(target: "frame_sync::sim", "Embedded frame {src}");
        Ok(self.handle(id, id))
    }

    /// Deliver queued events until none are left, returning how many were delivered.
    ///
    /// Listeners run with no borrow of the browser held, so they may navigate,
    /// replace history and dispatch further events.
    pub fn run_until_idle(&self) -> usize {
        let mut delivered = 0;
        while delivered < MAX_EVENTS_PER_RUN {
            let Some((target, event)) = self.state.borrow_mut().queue.pop_front() else {
                return delivered;
            };
            let listeners: Vec<EventListener> = self
                .state
                .borrow()
                .window(target)
                .map(|window| {
                    window
                        .listeners
                        .iter()
                        .filter(|(name, _, _)| *name == event)
                        .map(|(_, _, listener)| Rc::clone(listener))
                        .collect()
                })
                .unwrap_or_default();
            for listener in listeners {
                listener();
            }
            delivered += 1;
        }
        warn!(target: "frame_sync::sim", "Event queue still busy after {MAX_EVENTS_PER_RUN} events");
        delivered
    }

    /// Number of events waiting for delivery.
    pub fn pending_events(&self) -> usize {
        self.state.borrow().queue.len()
    }

    fn handle(&self, id: NodeId, accessor: NodeId) -> SimWindow {
        SimWindow {
            browser: self.clone(),
            id,
            accessor,
        }
    }
}

fn parse_absolute(url: &str) -> Result<Url, FrameSyncError> {
    Url::parse(url).map_err(|err| FrameSyncError::MalformedUrl {
        input: url.to_owned(),
        reason: err.to_string(),
    })
}

/// A window of a [`SimBrowser`] as seen from `accessor`'s scripts.
#[derive(Clone)]
pub struct SimWindow {
    browser: SimBrowser,
    id: NodeId,
    accessor: NodeId,
}

/// An `<iframe>` element of a [`SimBrowser`] as seen from `accessor`'s scripts.
#[derive(Clone)]
pub struct SimFrame {
    browser: SimBrowser,
    /// Window loaded in the frame; the element itself lives in its parent.
    content: NodeId,
    accessor: NodeId,
}

impl SimWindow {
    pub fn browser(&self) -> &SimBrowser {
        &self.browser
    }

    /// Current address. Harness view: no origin check.
    pub fn href(&self) -> String {
        self.browser
            .state
            .borrow()
            .window(self.id)
            .map(|window| window.url.to_string())
            .unwrap_or_default()
    }

    /// Current path. Harness view: no origin check.
    pub fn path(&self) -> String {
        to_full_path(&self.href()).unwrap_or_default()
    }

    /// Number of entries in the session history.
    pub fn history_len(&self) -> usize {
        self.read(|window| window.history.len())
    }

    /// Number of history replacements performed on this window.
    pub fn replace_count(&self) -> usize {
        self.read(|window| window.replaced)
    }

    /// Number of listeners attached for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.read(|window| window.listeners.iter().filter(|(name, _, _)| name == event).count())
    }

    /// Set the document's `<base href>`.
    pub fn set_base_href(&self, href: Option<&str>) {
        if let Ok(window) = self.browser.state.borrow_mut().window_mut(self.id) {
            window.base_href = href.map(str::to_owned);
        }
    }

    /// Push a new history entry, as a router does for a regular navigation.
    ///
    /// # Errors
    /// Fails when `path` cannot be resolved against the current address.
    pub fn navigate(&self, path: &str) -> Result<(), FrameSyncError> {
        let mut state = self.browser.state.borrow_mut();
        let window = state.window_mut(self.id)?;
        let url = window.url.join(path).map_err(|err| FrameSyncError::MalformedUrl {
            input: path.to_owned(),
            reason: err.to_string(),
        })?;
        window.history.push(url.clone());
        window.url = url;
        Ok(())
    }

    /// Remove this window's `<iframe>` from its parent document.
    pub fn detach_frame(&self) {
        if let Ok(window) = self.browser.state.borrow_mut().window_mut(self.id) {
            if let Some(frame) = window.frame.as_mut() {
                frame.detached = true;
            }
        }
    }

    fn read<T: Default>(&self, read: impl FnOnce(&SimWindowData) -> T) -> T {
        self.browser.state.borrow().window(self.id).map(read).unwrap_or_default()
    }

    fn checked<T>(
        &self,
        op: impl FnOnce(&mut BrowserState) -> Result<T, FrameAccessError>,
    ) -> Result<T, FrameAccessError> {
        let mut state = self.browser.state.borrow_mut();
        state.check_access(self.accessor, self.id)?;
        op(&mut state)
    }
}

impl BrowsingContext for SimWindow {
    type Frame = SimFrame;

    fn same_context(&self, other: &Self) -> bool {
        self.id == other.id && Rc::ptr_eq(&self.browser.state, &other.browser.state)
    }

    fn parent(&self) -> Option<Self> {
        let state = self.browser.state.borrow();
        match state.parent_of(self.id) {
            Some(parent) => Some(self.browser.handle(parent, self.accessor)),
            None if state.self_parented => Some(self.browser.handle(self.id, self.accessor)),
            None => None,
        }
    }

    fn frame_element(&self) -> Result<Option<SimFrame>, FrameAccessError> {
        let state = self.browser.state.borrow();
        let Some(parent) = state.parent_of(self.id) else {
            return Ok(None);
        };
        // The element belongs to the parent document.
        state.check_access(self.accessor, parent)?;
        Ok(Some(SimFrame {
            browser: self.browser.clone(),
            content: self.id,
            accessor: self.accessor,
        }))
    }

    fn location_href(&self) -> Result<String, FrameAccessError> {
        self.checked(|state| Ok(state.window(self.id)?.url.to_string()))
    }

    fn base_href(&self) -> Result<Option<String>, FrameAccessError> {
        self.checked(|state| Ok(state.window(self.id)?.base_href.clone()))
    }

    fn frames(&self) -> Result<Vec<SimFrame>, FrameAccessError> {
        self.checked(|state| {
            Ok(self
                .id
                .children(&state.windows)
                .filter(|child| {
                    state
                        .window(*child)
                        .ok()
                        .and_then(|window| window.frame.as_ref())
                        .is_some_and(|frame| !frame.detached)
                })
                .map(|child| SimFrame {
                    browser: self.browser.clone(),
                    content: child,
                    accessor: self.accessor,
                })
                .collect())
        })
    }

    fn replace_state(&self, path: &str) -> Result<(), FrameAccessError> {
        self.checked(|state| {
            let window = state.window_mut(self.id)?;
            let url = window
                .url
                .join(path)
                .map_err(|err| FrameAccessError::Unavailable(format!("bad history url {path}: {err}")))?;
            if url.origin() != window.url.origin() {
                return Err(FrameAccessError::Unavailable(format!(
                    "history url {url} changes the origin"
                )));
            }
            if let Some(entry) = window.history.last_mut() {
                entry.clone_from(&url);
            }
            window.url = url;
            window.replaced += 1;
            Ok(())
        })
    }

    fn dispatch_event(&self, event: &str) -> Result<(), FrameAccessError> {
        self.checked(|state| {
            state.queue.push_back((self.id, event.to_owned()));
            Ok(())
        })
    }

    fn add_event_listener(
        &self,
        event: &str,
        listener: EventListener,
    ) -> Result<ListenerId, FrameAccessError> {
        self.checked(|state| {
            state.next_listener += 1;
            let id = ListenerId(state.next_listener);
            state
                .window_mut(self.id)?
                .listeners
                .push((event.to_owned(), id, listener));
            Ok(id)
        })
    }

    fn remove_event_listener(&self, event: &str, id: ListenerId) {
        if let Ok(window) = self.browser.state.borrow_mut().window_mut(self.id) {
            window
                .listeners
                .retain(|(name, listener_id, _)| !(name == event && *listener_id == id));
        }
    }
}

impl SimFrame {
    fn with_element<T>(
        &self,
        read: impl FnOnce(&SimFrameData) -> T,
    ) -> Result<T, FrameAccessError> {
        let state = self.browser.state.borrow();
        let owner = state
            .parent_of(self.content)
            .ok_or_else(|| FrameAccessError::Unavailable("frame has no owner document".to_owned()))?;
        state.check_access(self.accessor, owner)?;
        let frame = state
            .window(self.content)?
            .frame
            .as_ref()
            .ok_or_else(|| FrameAccessError::Unavailable("window is not framed".to_owned()))?;
        if frame.detached {
            return Err(FrameAccessError::Detached);
        }
        Ok(read(frame))
    }
}

impl FrameElement for SimFrame {
    type Window = SimWindow;

    fn attribute(&self, name: &str) -> Result<Option<String>, FrameAccessError> {
        self.with_element(|frame| frame.attribute(name).map(str::to_owned))
    }

    fn has_class(&self, class: &str) -> Result<bool, FrameAccessError> {
        self.with_element(|frame| {
            frame
                .attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|token| token == class))
        })
    }

    fn content_window(&self) -> Result<Option<SimWindow>, FrameAccessError> {
        self.with_element(|_| ())?;
        Ok(Some(self.browser.handle(self.content, self.accessor)))
    }
}
