//! Client-side loading, negotiation and binding.
//!
//! A [`ClientInterface`] owns exactly one library. [`ClientConfig`] names
//! it and the version to request; [`LoadedLibrary`] keeps it mapped and
//! holds its resolved entry points.

mod config;
mod interface;
mod library;

pub use config::{ClientConfig, LinkageSymbols};
pub use interface::{ClientInterface, LinkState};
pub use library::LoadedLibrary;
