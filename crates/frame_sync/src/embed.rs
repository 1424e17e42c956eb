//! Building the initial address and attributes of a fragment `<iframe>`.

use url::form_urlencoded;

use crate::config::FrameContract;
use crate::context::BrowsingContext;
use crate::error::FrameSyncError;
use crate::frame::{base_path, full_path};
use crate::path::{join_paths, remove_path_prefix};

/// Description of a fragment a host wants to embed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentFrameSpec {
    /// Fragment base path, relative to the host's own base path.
    pub base_path: String,
    /// Prefix the fragment occupies in the host's address space.
    pub top_path: String,
    /// Extra class tokens appended after the marker class.
    pub class_name: Option<String>,
}

/// Attributes for the fragment `<iframe>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentFrameAttributes {
    pub src: String,
    pub class: String,
    /// Resolved base path, written to the base path attribute.
    pub base_path: String,
    /// Written to the parent path attribute.
    pub parent_path: String,
}

impl FragmentFrameAttributes {
    /// Attribute name/value pairs under `contract`'s naming.
    #[must_use]
    pub fn to_attributes(&self, contract: &FrameContract) -> Vec<(String, String)> {
        vec![
            ("src".to_owned(), self.src.clone()),
            ("class".to_owned(), self.class.clone()),
            (contract.base_path_attr.clone(), self.base_path.clone()),
            (contract.parent_path_attr.clone(), self.parent_path.clone()),
        ]
    }
}

impl FragmentFrameSpec {
    pub fn new(base_path: impl Into<String>, top_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            top_path: top_path.into(),
            class_name: None,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Resolve the frame's attributes against the host window's current location.
    ///
    /// The `src` opens the fragment directly at the host's current local path,
    /// with the fragment flag and the encoded base path appended to its query.
    ///
    /// # Errors
    /// Fails when the host's location cannot be read or parsed.
    pub fn build<C: BrowsingContext>(
        &self,
        host: &C,
        contract: &FrameContract,
    ) -> Result<FragmentFrameAttributes, FrameSyncError> {
        let base = join_paths(&base_path(host, contract), &self.base_path);
        let local = remove_path_prefix(&full_path(host)?, &self.top_path);
        let target = join_paths(&base, &local);

        let (target, fragment) = match target.split_once('#') {
            Some((target, fragment)) => (target.to_owned(), Some(fragment.to_owned())),
            None => (target, None),
        };
        let mut src = target;
        src.push(if src.contains('?') { '&' } else { '?' });
        src.push_str(&contract.fragment_query_key);
        src.push_str("=true&");
        src.push_str(&contract.base_path_query_key);
        src.push('=');
        src.push_str(&urlencoding::encode(&base));
        if let Some(fragment) = fragment {
            src.push('#');
            src.push_str(&fragment);
        }

        let class = match self.class_name.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{} {extra}", contract.marker_class),
            _ => contract.marker_class.clone(),
        };

        Ok(FragmentFrameAttributes {
            src,
            class,
            base_path: base,
            parent_path: self.top_path.clone(),
        })
    }
}

/// Fragment hints carried in the reserved query keys of an address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentHints {
    /// The document was opened as an embedded fragment.
    pub is_fragment: bool,
    /// Decoded base path the host assigned to the fragment.
    pub base_path: Option<String>,
}

impl FragmentHints {
    /// Read the hints from a path or its query.
    #[must_use]
    pub fn from_path(path: &str, contract: &FrameContract) -> Self {
        let without_fragment = path.split_once('#').map_or(path, |(rest, _)| rest);
        let Some((_, query)) = without_fragment.split_once('?') else {
            return Self::default();
        };
        let mut hints = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == contract.fragment_query_key.as_str() {
                hints.is_fragment = value == "true";
            } else if key == contract.base_path_query_key.as_str() && !value.is_empty() {
                hints.base_path = Some(value.into_owned());
            }
        }
        hints
    }
}
