//! Path helpers: extraction from URLs, joining, prefix stripping and comparison.
//!
//! A path here is always `pathname[?query][#fragment]` with no scheme, host or
//! port. Normalized forms are only used for comparison, never for display.
//! The value written into another frame's history is the history form, which
//! keeps the query as written.

use url::{Url, form_urlencoded};

use crate::config::{QUERY_BASEPATH, QUERY_FRAGMENT};
use crate::error::FrameSyncError;

/// Reserved query keys of the default contract.
pub const RESERVED_QUERY_KEYS: [&str; 2] = [QUERY_FRAGMENT, QUERY_BASEPATH];

/// Strip scheme, host and port from an address.
///
/// `about:` documents (blank and sandboxed frames) have the empty path, and
/// input that already starts with `/` is returned unchanged.
///
/// # Errors
/// Returns `FrameSyncError::MalformedUrl` when the input is neither rooted nor
/// a parseable absolute URL.
pub fn to_full_path(href: &str) -> Result<String, FrameSyncError> {
    if href.starts_with("about:") {
        return Ok(String::new());
    }
    if href.starts_with('/') {
        return Ok(href.to_owned());
    }
    let url = Url::parse(href).map_err(|err| FrameSyncError::MalformedUrl {
        input: href.to_owned(),
        reason: err.to_string(),
    })?;
    let mut out = url.path().to_owned();
    if let Some(query) = url.query().filter(|query| !query.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment().filter(|fragment| !fragment.is_empty()) {
        out.push('#');
        out.push_str(fragment);
    }
    Ok(out)
}

/// Join two paths with exactly one separator between them.
pub fn join_paths(base: &str, local: &str) -> String {
    let local = local.strip_prefix('/').unwrap_or(local);
    let mut out = String::with_capacity(base.len() + local.len() + 1);
    out.push_str(base);
    if !out.ends_with('/') {
        out.push('/');
    }
    out.push_str(local);
    out
}

/// Remove `prefix` from the start of `path`, ignoring a trailing `/` on the prefix.
///
/// A path that does not start with the prefix is returned unchanged.
pub fn remove_path_prefix(path: &str, prefix: &str) -> String {
    let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
    path.strip_prefix(prefix).unwrap_or(path).to_owned()
}

/// Normalize a path for comparison using the default reserved query keys.
pub fn normalize_path(path: &str) -> String {
    normalize_path_with(path, &RESERVED_QUERY_KEYS)
}

/// Normalize a path for comparison.
///
/// Strips one trailing `/` from the pathname, drops the `reserved` query keys,
/// re-serializes the remaining pairs sorted by key and keeps the fragment.
pub fn normalize_path_with(path: &str, reserved: &[&str]) -> String {
    let (pathname, query, fragment) = split_path(path);
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .collect();
    // Stable: repeated keys keep their relative order.
    pairs.sort_by(|left, right| left.0.cmp(&right.0));
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    assemble(pathname, &query, fragment)
}

/// History form of a path under an explicit reserved key set.
///
/// Strips one trailing `/` from the pathname and drops the `reserved` query
/// keys like [`normalize_path_with`], but keeps the remaining pairs in the
/// order and spelling they were written in.
pub fn strip_reserved_with(path: &str, reserved: &[&str]) -> String {
    let (pathname, query, fragment) = split_path(path);
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_reserved_pair(pair, reserved))
        .collect();
    assemble(pathname, &kept.join("&"), fragment)
}

fn is_reserved_pair(pair: &str, reserved: &[&str]) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(key, _)| reserved.contains(&&*key))
}

/// Split `pathname?query#fragment`. Missing parts are empty.
fn split_path(path: &str) -> (&str, &str, &str) {
    let (rest, fragment) = path.split_once('#').unwrap_or((path, ""));
    let (pathname, query) = rest.split_once('?').unwrap_or((rest, ""));
    (pathname, query, fragment)
}

fn assemble(pathname: &str, query: &str, fragment: &str) -> String {
    let mut out = pathname.strip_suffix('/').unwrap_or(pathname).to_owned();
    if !query.is_empty() {
        out.push('?');
        out.push_str(query);
    }
    if !fragment.is_empty() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Compare two paths by their normalized forms under the default reserved keys.
pub fn is_same_path(left: &str, right: &str) -> bool {
    normalize_path(left) == normalize_path(right)
}

/// Compare two paths by their normalized forms under an explicit reserved key set.
pub fn is_same_path_with(left: &str, right: &str, reserved: &[&str]) -> bool {
    normalize_path_with(left, reserved) == normalize_path_with(right, reserved)
}

/// Turn a stripped path into something a history entry can hold.
///
/// Stripping the root leaves the empty string, which a history replace would
/// resolve to the current document instead of `/`.
pub(crate) fn history_path(stripped: String) -> String {
    if stripped.starts_with('/') {
        stripped
    } else {
        format!("/{stripped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_path_of_about_documents_is_empty() {
        assert_eq!(to_full_path("about:blank").unwrap(), "");
        assert_eq!(to_full_path("about:srcdoc").unwrap(), "");
    }

    #[test]
    fn rooted_paths_pass_through() {
        assert_eq!(to_full_path("/x/y?q=1").unwrap(), "/x/y?q=1");
        assert_eq!(to_full_path("/").unwrap(), "/");
    }

    #[test]
    fn absolute_urls_lose_origin() {
        assert_eq!(
            to_full_path("https://host.test:8443/app/users/5?tab=2#top").unwrap(),
            "/app/users/5?tab=2#top"
        );
        assert_eq!(to_full_path("http://host.test").unwrap(), "/");
        assert_eq!(to_full_path("http://host.test/a?#").unwrap(), "/a");
    }

    #[test]
    fn relative_garbage_is_malformed() {
        let err = to_full_path("users/5").unwrap_err();
        assert!(matches!(err, FrameSyncError::MalformedUrl { .. }));
    }

    #[test]
    fn join_uses_a_single_separator() {
        assert_eq!(join_paths("/fragment", "users/5"), "/fragment/users/5");
        assert_eq!(join_paths("/fragment/", "/users/5"), "/fragment/users/5");
        assert_eq!(join_paths("/", "/users"), "/users");
        assert_eq!(join_paths("/app", ""), "/app/");
    }

    #[test]
    fn prefix_removal_ignores_trailing_separator() {
        assert_eq!(remove_path_prefix("/app/users/5", "/app/"), "/users/5");
        assert_eq!(remove_path_prefix("/app/users/5", "/app"), "/users/5");
        assert_eq!(remove_path_prefix("/other/5", "/app"), "/other/5");
        assert_eq!(remove_path_prefix("/users/5", "/"), "/users/5");
    }

    #[test]
    fn join_then_strip_round_trips() {
        for (base, local) in [("/fragment", "/users/5"), ("/a/b", "/c?d=1"), ("/", "/x#y")] {
            let joined = join_paths(base, local);
            let stripped = remove_path_prefix(&joined, base);
            assert_eq!(stripped, normalize_path(local));
            assert_eq!(join_paths(base, &stripped), joined);
        }
    }

    #[test]
    fn normalize_strips_trailing_slash_and_reserved_keys() {
        assert_eq!(normalize_path("/app/"), "/app");
        assert_eq!(normalize_path("/app/?_kap_fragment=true"), "/app");
        assert_eq!(
            normalize_path("/app?b=2&_kap_basepath=%2Ffragment&a=1#h"),
            "/app?a=1&b=2#h"
        );
        assert_eq!(normalize_path("/app/#h"), "/app#h");
    }

    #[test]
    fn history_form_keeps_query_as_written() {
        let reserved = RESERVED_QUERY_KEYS;
        assert_eq!(
            strip_reserved_with("/list/?z=1&_kap_fragment=true&a=2&flag#h", &reserved),
            "/list?z=1&a=2&flag#h"
        );
        assert_eq!(strip_reserved_with("/?_kap_basepath=%2Ff", &reserved), "");
        assert_eq!(strip_reserved_with("/a?q=x%20y&&b", &reserved), "/a?q=x%20y&b");
        assert!(is_same_path(
            &strip_reserved_with("/list?z=1&a=2", &reserved),
            "/list?a=2&z=1"
        ));
    }

    #[test]
    fn same_path_ignores_reserved_keys_and_order() {
        for path in ["", "/app", "/app/users/5"] {
            assert!(is_same_path(path, &format!("{path}/")));
        }
        assert!(is_same_path("/app", "/app?_kap_fragment=x"));
        assert!(is_same_path("/app?a=1&b=2", "/app?b=2&a=1"));
        assert!(!is_same_path("/app?a=1", "/app?a=2"));
        assert!(!is_same_path("/app#one", "/app#two"));
    }

    #[test]
    fn history_path_restores_root() {
        assert_eq!(history_path(normalize_path("/")), "/");
        assert_eq!(history_path(normalize_path("/?q=1")), "/?q=1");
        assert_eq!(history_path(normalize_path("/a/")), "/a");
    }
}
