//! Registry of fragment frames a host window keeps in sync.

use std::collections::BTreeMap;

use log::debug;

use crate::config::FrameContract;
use crate::context::{BrowsingContext, FrameElement};
use crate::error::FrameAccessError;

/// Fragment frames keyed by identity. Iteration follows key order.
#[derive(Clone, Debug)]
pub struct FragmentRegistry<F> {
    entries: BTreeMap<String, F>,
}

impl<F> Default for FragmentRegistry<F> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<F: FrameElement> FragmentRegistry<F> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `frame` under `id`, returning the frame it replaced.
    pub fn register(&mut self, id: impl Into<String>, frame: F) -> Option<F> {
        self.entries.insert(id.into(), frame)
    }

    /// Forget the frame registered under `id`.
    pub fn unregister(&mut self, id: &str) -> Option<F> {
        self.entries.remove(id)
    }

    /// The frame registered under `id`.
    pub fn get(&self, id: &str) -> Option<&F> {
        self.entries.get(id)
    }

    /// Number of registered frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no frame is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered frames in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &F)> {
        self.entries.iter().map(|(id, frame)| (id.as_str(), frame))
    }

    /// Register every marker-class frame of `host` that is not registered yet.
    ///
    /// Frames are keyed by their `id` attribute, or by marker class and
    /// document position when they have none. Returns how many were added.
    ///
    /// # Errors
    /// Fails when the host document cannot be enumerated.
    pub fn discover<C>(&mut self, host: &C, contract: &FrameContract) -> Result<usize, FrameAccessError>
    where
        C: BrowsingContext<Frame = F>,
    {
        let mut added = 0;
        for (index, frame) in marker_frames(host, contract)? {
            let key = frame_key(&frame, contract, index);
            if self.entries.contains_key(&key) {
                continue;
            }
            debug!(target: "frame_sync", "Registered fragment frame {key}");
            self.entries.insert(key, frame);
            added += 1;
        }
        Ok(added)
    }
}

/// Frames of `host` carrying the marker class, with their document position.
///
/// Frames whose class list cannot be read are skipped.
pub(crate) fn marker_frames<C: BrowsingContext>(
    host: &C,
    contract: &FrameContract,
) -> Result<Vec<(usize, C::Frame)>, FrameAccessError> {
    Ok(host
        .frames()?
        .into_iter()
        .enumerate()
        .filter(|(_, frame)| frame.has_class(&contract.marker_class).unwrap_or(false))
        .collect())
}

pub(crate) fn frame_key<F: FrameElement>(frame: &F, contract: &FrameContract, index: usize) -> String {
    match frame.attribute("id") {
        Ok(Some(id)) if !id.is_empty() => id,
        _ => format!("{}-{index}", contract.marker_class),
    }
}
