//! Client configuration.

use crate::linkage::{
    Capability, LINKAGE_FILL_SYMBOL, LINKAGE_SIZE_SYMBOL, SYSTEM_VERSION_SYMBOL,
};
use std::path::{Path, PathBuf};

/// Names of the three negotiation entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageSymbols {
    /// Library version query.
    pub system_version: String,
    /// Table size query.
    pub linkage_size: String,
    /// Table fill call.
    pub fill_linkage: String,
}

impl Default for LinkageSymbols {
    fn default() -> Self {
        Self {
            system_version: SYSTEM_VERSION_SYMBOL.to_string(),
            linkage_size: LINKAGE_SIZE_SYMBOL.to_string(),
            fill_linkage: LINKAGE_FILL_SYMBOL.to_string(),
        }
    }
}

/// How a [`ClientInterface`](super::ClientInterface) finds and negotiates
/// with its library.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Library path, or a bare name such as `"ux_render"` that is mapped
    /// to the platform file name and looked up in `search_paths`.
    pub library: String,
    /// Version token sent to the library.
    pub version: f64,
    /// Directories searched for a bare library name, in order.
    pub search_paths: Vec<PathBuf>,
    /// Entry point names.
    pub symbols: LinkageSymbols,
    /// Capabilities that must be bound for negotiation to succeed.
    pub required: Vec<Capability>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            library: String::new(),
            version: 1.0,
            search_paths: vec![PathBuf::from(".")],
            symbols: LinkageSymbols::default(),
            required: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `library` with default settings.
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            ..Default::default()
        }
    }

    /// Set the requested version token.
    pub fn with_version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    /// Append a search directory.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Replace the search directories.
    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Override the entry point names.
    pub fn with_symbols(mut self, symbols: LinkageSymbols) -> Self {
        self.symbols = symbols;
        self
    }

    /// Require a capability.
    pub fn require(mut self, capability: Capability) -> Self {
        if !self.required.contains(&capability) {
            self.required.push(capability);
        }
        self
    }

    /// Whether `library` is a bare name rather than a path.
    pub fn is_bare_name(&self) -> bool {
        let path = Path::new(&self.library);
        path.components().count() == 1 && path.extension().is_none()
    }

    /// The path handed to the loader.
    ///
    /// Paths are used as given. A bare name becomes the platform file name
    /// (`libname.so`, `name.dll`, `libname.dylib`) in the first search
    /// directory that holds it; when none does, the file name alone is
    /// returned so the OS loader applies its own search.
    pub fn resolve_path(&self) -> PathBuf {
        if !self.is_bare_name() {
            return PathBuf::from(&self.library);
        }
        let file_name = libloading::library_filename(&self.library);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(file_name))
    }
}
