//! Glue between a client-side router and the sync engine.
//!
//! A router owns navigation inside one window. It has to do two things for
//! synchronization to work: navigate (with replace semantics) when a relative
//! changed this window's path, and report every navigation it commits.
//! [`LocationSync`] wires both up for any [`Navigator`].

use log::warn;

use crate::context::BrowsingContext;
use crate::error::FrameAccessError;
use crate::frame::{base_path, full_path};
use crate::path::join_paths;
use crate::sync::{FrameSync, Subscription, SyncReport};

/// Navigation trigger of a client-side router.
pub trait Navigator {
    /// Navigate to a path local to the router's basename, replacing the
    /// current history entry.
    fn navigate_replace(&self, path: &str);
}

impl<F: Fn(&str)> Navigator for F {
    fn navigate_replace(&self, path: &str) {
        self(path);
    }
}

/// Keeps a router and the sync engine of its window connected.
///
/// Mounting subscribes to parent navigation; dropping detaches the listener.
pub struct LocationSync<C: BrowsingContext + 'static> {
    engine: FrameSync<C>,
    subscription: Subscription<C>,
}

impl<C: BrowsingContext + 'static> LocationSync<C> {
    /// Subscribe `navigator` to navigation coming from relatives of the engine's window.
    ///
    /// # Errors
    /// Fails when the listener cannot be attached.
    pub fn mount<N: Navigator + 'static>(
        engine: FrameSync<C>,
        navigator: N,
    ) -> Result<Self, FrameAccessError> {
        let subscription =
            engine.on_parent_navigation(move |path| navigator.navigate_replace(path))?;
        Ok(Self {
            engine,
            subscription,
        })
    }

    /// Report a committed navigation of this window.
    pub fn location_changed(&self) -> SyncReport {
        self.engine.on_self_navigation()
    }

    /// Basename the router should resolve its routes under.
    pub fn router_basename(&self) -> String {
        base_path(self.engine.context(), self.engine.contract())
    }

    pub fn engine(&self) -> &FrameSync<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FrameSync<C> {
        &mut self.engine
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_active()
    }
}

/// Minimal router that writes local paths straight into its window's history.
///
/// Stands in for a client router in hosts that do their own rendering: a
/// navigation replaces the current entry under the window's base path and is
/// then reported to the engine like any committed navigation.
#[derive(Clone)]
pub struct HistoryNavigator<C: BrowsingContext> {
    engine: FrameSync<C>,
}

impl<C: BrowsingContext> HistoryNavigator<C> {
    pub fn new(engine: FrameSync<C>) -> Self {
        Self { engine }
    }
}

impl<C: BrowsingContext> Navigator for HistoryNavigator<C> {
    fn navigate_replace(&self, path: &str) {
        let ctx = self.engine.context();
        let contract = self.engine.contract();
        let target = join_paths(&base_path(ctx, contract), path);
        let unchanged = full_path(ctx)
            .map(|current| contract.is_same_path(&current, &target))
            .unwrap_or(false);
        if !unchanged {
            if let Err(err) = ctx.replace_state(&target) {
                warn!(target: "frame_sync", "Router failed to navigate to {target}: {err}");
                return;
            }
        }
        let _report = self.engine.on_self_navigation();
    }
}
