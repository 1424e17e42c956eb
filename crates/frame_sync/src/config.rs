//! The frame contract shared by the embedding side and the sync engine.
//!
//! Attribute names, the fragment marker class, the navigation event name and
//! the reserved query keys are all string conventions that host and fragment
//! must agree on. They are grouped here under an explicit version so both
//! sides can be configured from code, from JSON, or from the environment.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::FrameSyncError;

/// Version of the default contract defined by this crate.
pub const CONTRACT_VERSION: u32 = 1;

/// Attribute holding the base path a fragment resolves its own routes under.
pub const DEFAULT_BASE_PATH_ATTR: &str = "data-base-path";
/// Attribute holding the prefix a fragment occupies in its parent's address space.
pub const DEFAULT_PARENT_PATH_ATTR: &str = "data-parent-path";
/// Class token that marks an iframe as a synchronized fragment.
pub const DEFAULT_MARKER_CLASS: &str = "fragment-frame";
/// Window-scoped event fired after a history replace from another frame.
pub const EVENT_HISTORY_STATE_CHANGED: &str = "history-state-changed";
/// Query flag telling an embedded document it runs as a fragment.
pub const QUERY_FRAGMENT: &str = "_kap_fragment";
/// Query key carrying the encoded base path of a fragment.
pub const QUERY_BASEPATH: &str = "_kap_basepath";

/// String conventions for inter-frame synchronization.
///
/// The reserved query keys are stripped by path normalization so that their
/// presence never makes two otherwise equal paths compare as different.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameContract {
    /// Contract version, bumped whenever a name below changes meaning.
    pub version: u32,
    /// Frame attribute holding the fragment's base path.
    pub base_path_attr: String,
    /// Frame attribute holding the fragment's prefix in the parent.
    pub parent_path_attr: String,
    /// Class token identifying fragment frames for downward sync.
    pub marker_class: String,
    /// Name of the navigation event.
    pub event_name: String,
    /// Query key flagging a fragment document.
    pub fragment_query_key: String,
    /// Query key carrying the encoded base path.
    pub base_path_query_key: String,
}

impl Default for FrameContract {
    fn default() -> Self {
        Self {
            version: CONTRACT_VERSION,
            base_path_attr: DEFAULT_BASE_PATH_ATTR.to_owned(),
            parent_path_attr: DEFAULT_PARENT_PATH_ATTR.to_owned(),
            marker_class: DEFAULT_MARKER_CLASS.to_owned(),
            event_name: EVENT_HISTORY_STATE_CHANGED.to_owned(),
            fragment_query_key: QUERY_FRAGMENT.to_owned(),
            base_path_query_key: QUERY_BASEPATH.to_owned(),
        }
    }
}

impl FrameContract {
    /// Load a contract from environment variables, falling back to the defaults.
    ///
    /// Reads the following environment variables:
    /// - `FRAME_SYNC_BASE_PATH_ATTR`: base path attribute (default: `data-base-path`)
    /// - `FRAME_SYNC_PARENT_PATH_ATTR`: parent path attribute (default: `data-parent-path`)
    /// - `FRAME_SYNC_MARKER_CLASS`: fragment marker class (default: `fragment-frame`)
    /// - `FRAME_SYNC_EVENT`: navigation event name (default: `history-state-changed`)
    /// - `FRAME_SYNC_RESERVED_KEYS`: `<fragment-key>,<base-path-key>`, either may be left empty
    ///
    /// Empty values are ignored. `version` is not read from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`FrameContract::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut contract = Self::default();
        let read = |name: &str| lookup(name).filter(|val| !val.trim().is_empty());
        if let Some(val) = read("FRAME_SYNC_BASE_PATH_ATTR") {
            contract.base_path_attr = val;
        }
        if let Some(val) = read("FRAME_SYNC_PARENT_PATH_ATTR") {
            contract.parent_path_attr = val;
        }
        if let Some(val) = read("FRAME_SYNC_MARKER_CLASS") {
            contract.marker_class = val;
        }
        if let Some(val) = read("FRAME_SYNC_EVENT") {
            contract.event_name = val;
        }
        if let Some(val) = read("FRAME_SYNC_RESERVED_KEYS") {
            let mut keys = val.split(',').map(str::trim);
            if let Some(fragment_key) = keys.next().filter(|key| !key.is_empty()) {
                contract.fragment_query_key = fragment_key.to_owned();
            }
            if let Some(base_key) = keys.next().filter(|key| !key.is_empty()) {
                contract.base_path_query_key = base_key.to_owned();
            }
        }
        contract
    }

    /// Decode a contract from JSON. Missing fields take their default value.
    ///
    /// # Errors
    /// Returns `FrameSyncError::InvalidContract` if the document is not valid JSON
    /// for this shape.
    pub fn from_json(json: &str) -> Result<Self, FrameSyncError> {
        serde_json::from_str(json).map_err(|err| FrameSyncError::InvalidContract(err.to_string()))
    }

    /// Query keys removed before any path comparison.
    #[must_use]
    pub fn reserved_query_keys(&self) -> [&str; 2] {
        [self.fragment_query_key.as_str(), self.base_path_query_key.as_str()]
    }

    /// Normalize a path under this contract's reserved keys.
    #[must_use]
    pub fn normalize(&self, path: &str) -> String {
        crate::path::normalize_path_with(path, &self.reserved_query_keys())
    }

    /// Drop this contract's reserved keys from a path, keeping the query order.
    #[must_use]
    pub fn strip_reserved(&self, path: &str) -> String {
        crate::path::strip_reserved_with(path, &self.reserved_query_keys())
    }

    /// Compare two paths under this contract's reserved keys.
    #[must_use]
    pub fn is_same_path(&self, left: &str, right: &str) -> bool {
        self.normalize(left) == self.normalize(right)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, val)| ((*name).to_owned(), (*val).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn default_contract_is_version_one() {
        let contract = FrameContract::default();
        assert_eq!(contract.version, CONTRACT_VERSION);
        assert_eq!(contract.reserved_query_keys(), [QUERY_FRAGMENT, QUERY_BASEPATH]);
        assert_eq!(contract.marker_class, "fragment-frame");
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let contract = FrameContract::from_json(r#"{"version":2,"marker_class":"embed"}"#)
            .unwrap();
        assert_eq!(contract.version, 2);
        assert_eq!(contract.marker_class, "embed");
        assert_eq!(contract.base_path_attr, DEFAULT_BASE_PATH_ATTR);
        assert_eq!(contract.event_name, EVENT_HISTORY_STATE_CHANGED);
    }

    #[test]
    fn json_rejects_garbage() {
        let err = FrameContract::from_json("{not json").unwrap_err();
        assert!(matches!(err, FrameSyncError::InvalidContract(_)));
    }

    #[test]
    fn custom_reserved_keys_are_stripped() {
        let contract = FrameContract {
            fragment_query_key: "embed".to_owned(),
            ..FrameContract::default()
        };
        assert!(contract.is_same_path("/a?embed=1", "/a"));
        assert!(!contract.is_same_path("/a?_kap_fragment=true", "/a"));
    }

    #[test]
    fn environment_overrides_names() {
        let contract = FrameContract::from_lookup(lookup(&[
            ("FRAME_SYNC_BASE_PATH_ATTR", "data-base"),
            ("FRAME_SYNC_PARENT_PATH_ATTR", "data-parent"),
            ("FRAME_SYNC_MARKER_CLASS", "embed"),
            ("FRAME_SYNC_EVENT", "route-changed"),
            ("FRAME_SYNC_RESERVED_KEYS", " frag , base "),
        ]));
        assert_eq!(contract.version, CONTRACT_VERSION);
        assert_eq!(contract.base_path_attr, "data-base");
        assert_eq!(contract.parent_path_attr, "data-parent");
        assert_eq!(contract.marker_class, "embed");
        assert_eq!(contract.event_name, "route-changed");
        assert_eq!(contract.reserved_query_keys(), ["frag", "base"]);
    }

    #[test]
    fn environment_ignores_empty_values() {
        let contract = FrameContract::from_lookup(lookup(&[
            ("FRAME_SYNC_MARKER_CLASS", "  "),
            ("FRAME_SYNC_EVENT", ""),
            ("FRAME_SYNC_RESERVED_KEYS", ",only-base"),
        ]));
        assert_eq!(contract.marker_class, DEFAULT_MARKER_CLASS);
        assert_eq!(contract.event_name, EVENT_HISTORY_STATE_CHANGED);
        assert_eq!(contract.reserved_query_keys(), [QUERY_FRAGMENT, "only-base"]);
        assert_eq!(FrameContract::from_lookup(lookup(&[])), FrameContract::default());
    }
}
