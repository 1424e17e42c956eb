//! Error types for frame access and path parsing.
//!
//! DOM access failures (`FrameAccessError`) are expected at runtime and are
//! degraded to safe defaults by the reader and the sync engine. Parsing
//! failures (`FrameSyncError`) indicate a configuration mistake and are
//! returned to the caller.

use thiserror::Error;

/// Why a frame element, or the window behind it, could not be accessed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameAccessError {
    /// The accessing window and the target do not share an origin.
    #[error("blocked cross-origin access from {accessor} to {target}")]
    CrossOrigin {
        /// Origin of the window performing the access.
        accessor: String,
        /// Origin of the window being accessed.
        target: String,
    },
    /// The frame element was removed from its document.
    #[error("frame element is detached from its document")]
    Detached,
    /// The window or element is gone or otherwise not reachable.
    #[error("frame unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to callers of the path and embedding APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameSyncError {
    /// Input that is neither a rooted path nor a parseable absolute URL.
    #[error("malformed url {input:?}: {reason}")]
    MalformedUrl {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },
    /// A window's location could not be read.
    #[error(transparent)]
    Access(#[from] FrameAccessError),
    /// A contract document could not be decoded.
    #[error("invalid frame contract: {0}")]
    InvalidContract(String),
}
