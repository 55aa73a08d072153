//! GUID-indexed linkage between the client API and a rendering library.
//!
//! The library publishes a table of `(alias, target, pointer)` records for
//! a requested version token. The client walks the table and, through a
//! [`BinderTable`], moves each pointer it understands into a typed slot of
//! [`LibraryLinkage`]. Nothing but identities and raw pointers crosses the
//! boundary.
//!
//! # Protocol
//!
//! ```text
//!   client                                 library
//!     │  system_version()                    │
//!     │ ───────────────────────────────────▶ │
//!     │  guid_interface_linkage_size(v) = n  │
//!     │ ───────────────────────────────────▶ │
//!     │  guid_interface_linkage(v, buf, n)   │
//!     │ ───────────────────────────────────▶ │ writes n records
//!     │                                      │
//!     │  for each record: binder[target]     │
//! ```
//!
//! Unknown targets are skipped, so a newer client runs on an older library
//! with the missing capabilities left unbound, and the other way round.

mod abi;
mod binder;
mod capability;
mod entry;

pub use abi::{
    EntryPoints, LINKAGE_FILL_SYMBOL, LINKAGE_SIZE_SYMBOL, LinkageFillFn, LinkageSizeFn,
    LinkageStatus, RawPointer, SYSTEM_VERSION_SYMBOL, SystemVersionFn,
};
pub use binder::{BindOutcome, BindReport, Binder, BinderTable};
pub use capability::{Capability, CapabilitySignature, LibraryLinkage, cap};
pub use entry::{LinkTable, LinkTableEntry};
