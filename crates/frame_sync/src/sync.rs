//! Location synchronization between a window, its parent and its fragments.
//!
//! Push: [`FrameSync::on_self_navigation`] mirrors this window's path down into
//! every fragment frame and up into the parent. Pull:
//! [`FrameSync::on_parent_navigation`] reports the local path whenever a
//! relative replaced this window's history.
//!
//! Every mutation is gated on [`FrameContract::is_same_path`], so a pass that
//! resolves to a window's current path neither writes history nor fires the
//! navigation event. This is what stops host and fragment from bouncing
//! updates back and forth.

use std::rc::Rc;

use log::{debug, warn};
use tracing::debug_span;

use crate::config::FrameContract;
use crate::context::{BrowsingContext, EventListener, FrameElement, ListenerId};
use crate::error::{FrameAccessError, FrameSyncError};
use crate::frame::{FrameBinding, base_path, full_path, path_in_parent};
use crate::path::{history_path, join_paths, remove_path_prefix};
use crate::registry::{FragmentRegistry, frame_key, marker_frames};

/// Result of synchronizing one relative window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not applicable: no parent, or the path lies outside the fragment's prefix.
    #[default]
    Skipped,
    /// The relative already shows the target path.
    Unchanged,
    /// History was replaced and the navigation event dispatched.
    Replaced {
        /// Path written into the relative's history.
        target: String,
    },
    /// The relative could not be read or written.
    Failed {
        /// Why access failed.
        reason: String,
    },
}

impl SyncOutcome {
    /// Whether history was written.
    #[must_use]
    pub const fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Outcome of one push pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Per fragment, in the order they were attempted.
    pub downward: Vec<(String, SyncOutcome)>,
    /// Towards the parent window.
    pub upward: SyncOutcome,
}

impl SyncReport {
    /// Number of history entries replaced by this pass.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.downward
            .iter()
            .map(|(_, outcome)| outcome)
            .chain([&self.upward])
            .filter(|outcome| outcome.is_replaced())
            .count()
    }
}

/// Replace `win`'s history with `path` and fire the navigation event on it.
///
/// Does nothing when `win` already shows `path`. Returns `false` only when
/// `win` could not be read or written.
pub fn replace_state_on_window<C: BrowsingContext>(
    win: &C,
    path: &str,
    contract: &FrameContract,
) -> bool {
    !matches!(replace_on(win, path, contract), SyncOutcome::Failed { .. })
}

fn replace_on<C: BrowsingContext>(win: &C, path: &str, contract: &FrameContract) -> SyncOutcome {
    match try_replace(win, path, contract) {
        Ok(Some(target)) => SyncOutcome::Replaced { target },
        Ok(None) => SyncOutcome::Unchanged,
        Err(err) => {
            warn!(target: "frame_sync", "Failed to replace history state with {path}: {err}");
            SyncOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

fn try_replace<C: BrowsingContext>(
    win: &C,
    path: &str,
    contract: &FrameContract,
) -> Result<Option<String>, FrameSyncError> {
    let current = full_path(win)?;
    if contract.is_same_path(&current, path) {
        return Ok(None);
    }
    let target = history_path(contract.strip_reserved(path));
    win.replace_state(&target)?;
    win.dispatch_event(&contract.event_name)?;
    debug!(target: "frame_sync", "Replaced history state {current} -> {target}");
    Ok(Some(target))
}

/// Synchronization engine for one window.
///
/// Holds no navigation state of its own: every pass re-reads the locations
/// and frame bindings involved.
pub struct FrameSync<C: BrowsingContext> {
    context: C,
    contract: FrameContract,
    fragments: FragmentRegistry<C::Frame>,
}

impl<C: BrowsingContext> Clone for FrameSync<C> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            contract: self.contract.clone(),
            fragments: self.fragments.clone(),
        }
    }
}

impl<C: BrowsingContext> FrameSync<C> {
    /// Engine for `context` using the default contract.
    pub fn new(context: C) -> Self {
        Self::with_contract(context, FrameContract::default())
    }

    pub fn with_contract(context: C, contract: FrameContract) -> Self {
        Self {
            context,
            contract,
            fragments: FragmentRegistry::new(),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn contract(&self) -> &FrameContract {
        &self.contract
    }

    pub fn fragments(&self) -> &FragmentRegistry<C::Frame> {
        &self.fragments
    }

    /// Registered fragments. When empty, the first frame carrying the marker
    /// class is synchronized instead.
    pub fn fragments_mut(&mut self) -> &mut FragmentRegistry<C::Frame> {
        &mut self.fragments
    }

    /// Local path of this window: its full path minus its base path.
    ///
    /// # Errors
    /// Fails when this window's location cannot be read.
    pub fn local_path(&self) -> Result<String, FrameSyncError> {
        let full = full_path(&self.context)?;
        Ok(remove_path_prefix(&full, &base_path(&self.context, &self.contract)))
    }

    /// Propagate this window's current path to its fragments, then to its parent.
    ///
    /// Must run after every committed navigation of this window. A failure
    /// towards one relative does not stop the others.
    pub fn on_self_navigation(&self) -> SyncReport {
        let _span = debug_span!("frame_sync::push").entered();
        let full = match full_path(&self.context) {
            Ok(full) => full,
            Err(err) => {
                warn!(target: "frame_sync", "Cannot read own location: {err}");
                return SyncReport {
                    downward: Vec::new(),
                    upward: SyncOutcome::Failed {
                        reason: err.to_string(),
                    },
                };
            }
        };
        SyncReport {
            downward: self.sync_to_fragments(&full),
            upward: self.sync_to_parent(&full),
        }
    }

    fn fragment_targets(&self) -> Vec<(String, C::Frame)> {
        if !self.fragments.is_empty() {
            return self
                .fragments
                .iter()
                .map(|(id, frame)| (id.to_owned(), frame.clone()))
                .collect();
        }
        match marker_frames(&self.context, &self.contract) {
            Ok(frames) => frames
                .into_iter()
                .take(1)
                .map(|(index, frame)| (frame_key(&frame, &self.contract, index), frame))
                .collect(),
            Err(err) => {
                warn!(target: "frame_sync", "Cannot enumerate fragment frames: {err}");
                Vec::new()
            }
        }
    }

    fn sync_to_fragments(&self, full: &str) -> Vec<(String, SyncOutcome)> {
        self.fragment_targets()
            .into_iter()
            .map(|(id, frame)| {
                let outcome = self.sync_fragment(full, &frame);
                (id, outcome)
            })
            .collect()
    }

    fn sync_fragment(&self, full: &str, frame: &C::Frame) -> SyncOutcome {
        let binding = match FrameBinding::read(frame, &self.contract) {
            Ok(binding) => binding,
            Err(err) => return access_failed("read fragment binding", &err),
        };
        if !full.starts_with(&binding.parent_path) {
            return SyncOutcome::Skipped;
        }
        let window = match frame.content_window() {
            Ok(Some(window)) => window,
            Ok(None) => return SyncOutcome::Skipped,
            Err(err) => return access_failed("reach fragment window", &err),
        };
        let local = remove_path_prefix(full, &binding.parent_path);
        replace_on(&window, &join_paths(&binding.base_path, &local), &self.contract)
    }

    fn sync_to_parent(&self, full: &str) -> SyncOutcome {
        let Some(parent) = self.context.distinct_parent() else {
            return SyncOutcome::Skipped;
        };
        let local = remove_path_prefix(full, &base_path(&self.context, &self.contract));
        let top = join_paths(&path_in_parent(&self.context, &self.contract), &local);
        replace_on(&parent, &top, &self.contract)
    }
}

impl<C: BrowsingContext + 'static> FrameSync<C> {
    /// Call `callback` with this window's local path whenever a relative
    /// replaced its history.
    ///
    /// The listener stays attached until the returned [`Subscription`] is
    /// dropped or unsubscribed.
    ///
    /// # Errors
    /// Fails when the listener cannot be attached.
    pub fn on_parent_navigation<F>(&self, callback: F) -> Result<Subscription<C>, FrameAccessError>
    where
        F: Fn(&str) + 'static,
    {
        let context = self.context.clone();
        let contract = self.contract.clone();
        let handler: EventListener = Rc::new(move || match full_path(&context) {
            Ok(full) => callback(&remove_path_prefix(&full, &base_path(&context, &contract))),
            Err(err) => warn!(target: "frame_sync", "Ignoring navigation event: {err}"),
        });
        let id = self.context.add_event_listener(&self.contract.event_name, handler)?;
        Ok(Subscription {
            context: self.context.clone(),
            event: self.contract.event_name.clone(),
            id: Some(id),
        })
    }
}

fn access_failed(action: &str, err: &FrameAccessError) -> SyncOutcome {
    warn!(target: "frame_sync", "Failed to {action}: {err}");
    SyncOutcome::Failed {
        reason: err.to_string(),
    }
}

/// Attached navigation listener. Detaches on drop.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription<C: BrowsingContext> {
    context: C,
    event: String,
    id: Option<ListenerId>,
}

impl<C: BrowsingContext> Subscription<C> {
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Detach the listener now.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            self.context.remove_event_listener(&self.event, id);
        }
    }
}

impl<C: BrowsingContext> Drop for Subscription<C> {
    fn drop(&mut self) {
        self.detach();
    }
}
