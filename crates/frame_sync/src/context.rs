//! Browsing context abstraction.
//!
//! Every operation in this crate takes an explicit window context instead of
//! reaching for ambient globals. A browser binding implements these traits
//! over real `Window`/`HTMLIFrameElement` objects; [`crate::sim`] implements
//! them over an in-memory multi-window model.

use std::rc::Rc;

use crate::error::FrameAccessError;

/// Handle returned when registering an event listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Payload-free event listener. Listeners re-read `location` themselves.
pub type EventListener = Rc<dyn Fn()>;

/// An `<iframe>` element as seen from some window.
pub trait FrameElement: Clone {
    /// Window type of the frame's content.
    type Window: BrowsingContext<Frame = Self>;

    /// Read an attribute. `Ok(None)` when the attribute is absent.
    ///
    /// # Errors
    /// Fails when the element's document is not accessible or the element is detached.
    fn attribute(&self, name: &str) -> Result<Option<String>, FrameAccessError>;

    /// Whether the element's class list contains `class`.
    ///
    /// # Errors
    /// Fails when the element's document is not accessible or the element is detached.
    fn has_class(&self, class: &str) -> Result<bool, FrameAccessError>;

    /// The window loaded in this frame, if any.
    ///
    /// # Errors
    /// Fails when the element is detached.
    fn content_window(&self) -> Result<Option<Self::Window>, FrameAccessError>;
}

/// A window with a location, a history and an event target.
pub trait BrowsingContext: Clone {
    /// Frame element type used by this context.
    type Frame: FrameElement<Window = Self>;

    /// Whether both handles refer to the same window.
    fn same_context(&self, other: &Self) -> bool;

    /// The parent window.
    ///
    /// A top-level window returns `None` or itself, as `window.parent` does in a DOM.
    fn parent(&self) -> Option<Self>;

    /// The `<iframe>` element that owns this window in its parent's document.
    ///
    /// # Errors
    /// Fails when the parent document is cross-origin or otherwise unreachable.
    fn frame_element(&self) -> Result<Option<Self::Frame>, FrameAccessError>;

    /// The full current address (`location.href`).
    ///
    /// # Errors
    /// Fails when the window is cross-origin to the accessor.
    fn location_href(&self) -> Result<String, FrameAccessError>;

    /// `href` of the first `<base>` element in the document head.
    ///
    /// # Errors
    /// Fails when the document is not accessible.
    fn base_href(&self) -> Result<Option<String>, FrameAccessError>;

    /// All `<iframe>` elements of this window's document, in document order.
    ///
    /// # Errors
    /// Fails when the document is not accessible.
    fn frames(&self) -> Result<Vec<Self::Frame>, FrameAccessError>;

    /// Replace the current history entry's address without adding an entry.
    ///
    /// # Errors
    /// Fails when the window is cross-origin to the accessor.
    fn replace_state(&self, path: &str) -> Result<(), FrameAccessError>;

    /// Dispatch a payload-free event on this window.
    ///
    /// # Errors
    /// Fails when the window is cross-origin to the accessor.
    fn dispatch_event(&self, event: &str) -> Result<(), FrameAccessError>;

    /// Register a listener for `event` on this window.
    ///
    /// # Errors
    /// Fails when the window is cross-origin to the accessor.
    fn add_event_listener(
        &self,
        event: &str,
        listener: EventListener,
    ) -> Result<ListenerId, FrameAccessError>;

    /// Remove a previously registered listener. Unknown ids are ignored.
    fn remove_event_listener(&self, event: &str, id: ListenerId);

    /// The parent window, unless it is this window itself.
    fn distinct_parent(&self) -> Option<Self> {
        self.parent().filter(|parent| !parent.same_context(self))
    }

    /// Whether this window has no parent other than itself.
    fn is_top_level(&self) -> bool {
        self.distinct_parent().is_none()
    }
}
