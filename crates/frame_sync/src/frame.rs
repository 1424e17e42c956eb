//! Reading frame bindings and base paths off frame elements.
//!
//! The accessors here never fail: DOM access errors are logged and degraded
//! to the document defaults. [`owning_binding`] exposes the underlying result
//! for callers that need to tell "not nested" apart from "access denied".

use log::{debug, warn};

use crate::config::FrameContract;
use crate::context::{BrowsingContext, FrameElement};
use crate::error::{FrameAccessError, FrameSyncError};
use crate::path::to_full_path;

/// Path used whenever nothing more specific is configured.
pub const ROOT_PATH: &str = "/";

/// Path metadata attached to a fragment's `<iframe>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBinding {
    /// Prefix under which the embedded window resolves its own routes.
    pub base_path: String,
    /// Prefix the embedded window occupies in its parent's address space.
    pub parent_path: String,
}

impl Default for FrameBinding {
    fn default() -> Self {
        Self {
            base_path: ROOT_PATH.to_owned(),
            parent_path: ROOT_PATH.to_owned(),
        }
    }
}

impl FrameBinding {
    /// Read the binding from a frame element. Absent or empty attributes mean `/`.
    ///
    /// # Errors
    /// Returns the access error if the element cannot be read.
    pub fn read<F: FrameElement>(
        frame: &F,
        contract: &FrameContract,
    ) -> Result<Self, FrameAccessError> {
        Ok(Self {
            base_path: attribute_or_root(frame, &contract.base_path_attr)?,
            parent_path: attribute_or_root(frame, &contract.parent_path_attr)?,
        })
    }
}

fn attribute_or_root<F: FrameElement>(frame: &F, name: &str) -> Result<String, FrameAccessError> {
    Ok(frame
        .attribute(name)?
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| ROOT_PATH.to_owned()))
}

/// Binding of the frame element that owns `ctx`.
///
/// `Ok(None)` for top-level windows and windows without an owning element.
///
/// # Errors
/// Returns the access error when the owning element exists but cannot be read.
pub fn owning_binding<C: BrowsingContext>(
    ctx: &C,
    contract: &FrameContract,
) -> Result<Option<FrameBinding>, FrameAccessError> {
    if ctx.is_top_level() {
        return Ok(None);
    }
    let Some(frame) = ctx.frame_element()? else {
        return Ok(None);
    };
    FrameBinding::read(&frame, contract).map(Some)
}

/// Current path of `ctx`, without scheme, host or port.
///
/// # Errors
/// Fails when the location cannot be read or is not a valid URL.
pub fn full_path<C: BrowsingContext>(ctx: &C) -> Result<String, FrameSyncError> {
    to_full_path(&ctx.location_href()?)
}

/// Prefix under which `ctx` resolves its local paths.
///
/// Nested windows read it from their owning frame element; top-level windows
/// (and nested ones whose frame cannot be read) use the document's
/// `<base href>`, then `/`.
pub fn base_path<C: BrowsingContext>(ctx: &C, contract: &FrameContract) -> String {
    match owning_binding(ctx, contract) {
        Ok(Some(binding)) => return binding.base_path,
        Ok(None) => {}
        Err(err) => {
            warn!(target: "frame_sync", "Failed to get base path from frame element: {err}");
        }
    }
    document_base_path(ctx)
}

/// Prefix that `ctx` occupies in its parent's address space; `/` when top-level.
pub fn path_in_parent<C: BrowsingContext>(ctx: &C, contract: &FrameContract) -> String {
    match owning_binding(ctx, contract) {
        Ok(Some(binding)) => binding.parent_path,
        Ok(None) => ROOT_PATH.to_owned(),
        Err(err) => {
            warn!(target: "frame_sync", "Failed to get parent path from frame element: {err}");
            ROOT_PATH.to_owned()
        }
    }
}

fn document_base_path<C: BrowsingContext>(ctx: &C) -> String {
    let href = match ctx.base_href() {
        Ok(Some(href)) if !href.is_empty() => href,
        Ok(_) => return ROOT_PATH.to_owned(),
        Err(err) => {
            warn!(target: "frame_sync", "Failed to read <base href>: {err}");
            return ROOT_PATH.to_owned();
        }
    };
    // An absolute <base href> still only contributes its path.
    match to_full_path(&href) {
        Ok(path) if !path.is_empty() => path,
        Ok(_) => ROOT_PATH.to_owned(),
        Err(err) => {
            debug!(target: "frame_sync", "Using <base href> verbatim: {err}");
            href
        }
    }
}
