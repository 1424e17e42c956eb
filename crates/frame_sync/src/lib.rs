//! Address bar synchronization between a host window and embedded fragment frames.
//!
//! A fragment is an application running inside an `<iframe>` of a host
//! application. Both sides route independently; this crate keeps their
//! locations mirrored so deep links and back/forward keep working across the
//! frame boundary without reloading either document.
//!
//! - `path`: path extraction, joining, prefix stripping and comparison
//! - `frame`: frame bindings and base paths read off `<iframe>` attributes
//! - `sync`: the push/pull engine ([`FrameSync`])
//! - `embed`: initial `src` and attributes for a fragment frame
//! - `router`: wiring a client-side router to the engine
//! - `sim`: an in-memory multi-window browser implementing [`BrowsingContext`]
//!
//! Frames are assumed to be same-origin. Cross-origin access is reported as
//! [`FrameAccessError`] and degrades to "not synchronized".

pub mod config;
pub mod context;
pub mod embed;
pub mod error;
pub mod frame;
pub mod path;
pub mod registry;
pub mod router;
pub mod sim;
pub mod sync;

pub use config::{CONTRACT_VERSION, EVENT_HISTORY_STATE_CHANGED, FrameContract, QUERY_BASEPATH, QUERY_FRAGMENT};
pub use context::{BrowsingContext, EventListener, FrameElement, ListenerId};
pub use embed::{FragmentFrameAttributes, FragmentFrameSpec, FragmentHints};
pub use error::{FrameAccessError, FrameSyncError};
pub use frame::{FrameBinding, base_path, full_path, owning_binding, path_in_parent};
pub use path::{
    is_same_path, is_same_path_with, join_paths, normalize_path, normalize_path_with,
    remove_path_prefix, strip_reserved_with, to_full_path,
};
pub use registry::FragmentRegistry;
pub use router::{HistoryNavigator, LocationSync, Navigator};
pub use sync::{FrameSync, Subscription, SyncOutcome, SyncReport, replace_state_on_window};
