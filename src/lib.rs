//! # uxlink
//!
//! GUID-indexed, version-negotiated linkage between a GUI client API and a
//! separately compiled rendering library.
//!
//! The client identifies every interface by a 16-byte GUID. At load time
//! it asks the library how many records it publishes for a version token,
//! hands it a buffer of exactly that size, and binds each `(GUID, pointer)`
//! record it understands into a typed slot. Records it does not understand
//! are skipped, so older and newer clients and libraries keep working
//! together with fewer capabilities.
//!
//! ## Features
//!
//! - **Stable boundary**: only identities and raw pointers cross it
//! - **Version negotiation**: size query, then fill into a client buffer
//! - **Typed slots**: signatures checked at compile time on both sides
//! - **Library side**: publisher and `export_linkage!` for a `cdylib`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uxlink::prelude::*;
//!
//! let config = ClientConfig::new("ux_render").with_version(1.0);
//! let mut surface = unsafe { SurfaceArea::open(&config, &BinderTable::standard())? };
//!
//! surface
//!     .stream_input(SurfaceAreaTitle::new("hello"))?
//!     .stream_input(StrokePath::new(PainterBrush::rgb(1.0, 0.0, 0.0)))?
//!     .notify_complete()?;
//!
//! let linkage = surface.linkage()?;
//! if linkage.is_bound(Capability::Rotate) {
//!     linkage.rotate(std::f64::consts::FRAC_PI_4)?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod attributes;
pub mod client;
pub mod error;
pub mod guid;
pub mod library;
pub mod linkage;
pub mod observability;
pub mod resource;
pub mod surface;
pub mod typed_index;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attributes::*;
    pub use crate::client::{ClientConfig, ClientInterface, LinkState};
    pub use crate::error::{Error, Result};
    pub use crate::guid::{InterfaceGuid, alias};
    pub use crate::library::{LinkagePublisher, PublishLinkage, VersionPolicy};
    pub use crate::linkage::{BinderTable, Capability, EntryPoints, LibraryLinkage, cap};
    pub use crate::resource::{Ownership, ResourceEnvelope, StreamInput};
    pub use crate::surface::SurfaceArea;
    pub use crate::typed_index::TypedIndex;
}

pub use error::{Error, Result};
