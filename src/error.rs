//! Error types for uxlink.

use crate::guid::GuidParseError;
use crate::linkage::{Capability, LinkageStatus};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using uxlink's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for linkage operations.
///
/// Load-time failures are raised from `open`/`initialize`. Per-entry
/// binding problems never surface here; they are recorded in the
/// bind report instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The dynamic library could not be resolved or mapped.
    #[error("failed to load library `{path}` (requested version {version}): {reason}")]
    Load {
        /// Path handed to the OS loader.
        path: PathBuf,
        /// Version token the client asked for.
        version: f64,
        /// Loader error text.
        reason: String,
    },

    /// A required entry point is not exported by the library.
    #[error("library `{path}` has no entry point `{symbol}` (requested version {version}): {reason}")]
    MissingSymbol {
        /// Path of the loaded library.
        path: PathBuf,
        /// Name of the missing symbol.
        symbol: String,
        /// Version token the client asked for.
        version: f64,
        /// Loader error text.
        reason: String,
    },

    /// The library refused to fill the linkage table.
    #[error("library rejected linkage request for version {version}: {status}")]
    Linkage {
        /// Version token the client asked for.
        version: f64,
        /// Status code returned by the fill entry point.
        status: LinkageStatus,
    },

    /// The fill call disagreed with the size the library reported.
    #[error("linkage table for version {version} was not {expected} entries long")]
    SizeMismatch {
        /// Version token the client asked for.
        version: f64,
        /// Entry count from the size query.
        expected: usize,
    },

    /// The size query answered a count the client cannot allocate.
    #[error("library reported {count} linkage entries for version {version}, too many to allocate")]
    TableTooLarge {
        /// Version token the client asked for.
        version: f64,
        /// Entry count from the size query.
        count: usize,
    },

    /// The library wrote past the entry count it reported.
    #[error("library wrote past the {count} linkage entries it reported for version {version}")]
    TableOverrun {
        /// Version token the client asked for.
        version: f64,
        /// Entry count from the size query.
        count: usize,
    },

    /// A capability slot was invoked that the library never published.
    #[error("capability `{0}` is not bound")]
    UnboundCapability(Capability),

    /// Slots were requested while no library is bound.
    #[error("client interface is not bound to a library")]
    NotBound,

    /// `initialize` was called on an interface that is already bound.
    #[error("client interface is already bound to `{library}`")]
    AlreadyBound {
        /// Name of the library currently bound.
        library: String,
    },

    /// Capabilities the client requires were not published.
    #[error("library `{library}` (version {version}) does not provide required capabilities: {missing:?}")]
    MissingCapabilities {
        /// Name of the library.
        library: String,
        /// Version token the client asked for.
        version: f64,
        /// Required capabilities left unbound.
        missing: Vec<Capability>,
    },

    /// Text was not a valid interface identity.
    #[error(transparent)]
    InvalidGuid(#[from] GuidParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_carries_context() {
        let err = Error::Load {
            path: PathBuf::from("missing.so"),
            version: 1.0,
            reason: "cannot open shared object file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing.so"));
        assert!(msg.contains("version 1"));
        assert!(msg.contains("cannot open shared object file"));
    }

    #[test]
    fn test_unbound_capability_message() {
        let err = Error::UnboundCapability(Capability::Save);
        assert_eq!(err.to_string(), "capability `save` is not bound");
    }
}
