//! Dynamic library loading using libloading.

use super::config::{ClientConfig, LinkageSymbols};
use crate::error::{Error, Result};
use crate::linkage::{EntryPoints, LinkageFillFn, LinkageSizeFn, SystemVersionFn};
use libloading::Library;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a library's entry points live.
enum Origin {
    /// A shared library opened by this process.
    Dynamic(Library),
    /// Functions linked into the process.
    InProcess,
}

/// A library whose three entry points have been resolved.
///
/// Dynamic libraries stay loaded until [`LoadedLibrary::close`] or drop.
/// Every pointer obtained from the entry points is only valid while this
/// value is alive.
pub struct LoadedLibrary {
    origin: Origin,
    name: String,
    path: PathBuf,
    entry_points: EntryPoints,
}

impl LoadedLibrary {
    /// Open the library named by `config` and resolve its entry points.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers. The library must be
    /// trusted and its entry points must have the documented signatures.
    pub unsafe fn open(config: &ClientConfig) -> Result<Self> {
        let path = config.resolve_path();
        debug!(path = %path.display(), "opening library");

        // SAFETY: Caller guarantees the library is trusted.
        let library = unsafe { Library::new(&path) }.map_err(|e| Error::Load {
            path: path.clone(),
            version: config.version,
            reason: e.to_string(),
        })?;

        // SAFETY: Caller guarantees the exported symbols have these types.
        let entry_points = unsafe { resolve(&library, &config.symbols, &path, config.version)? };

        Ok(Self {
            origin: Origin::Dynamic(library),
            name: config.library.clone(),
            path,
            entry_points,
        })
    }

    /// Wrap entry points linked into the process.
    pub fn in_process(name: impl Into<String>, entry_points: EntryPoints) -> Self {
        let name = name.into();
        Self {
            origin: Origin::InProcess,
            path: PathBuf::from(&name),
            name,
            entry_points,
        }
    }

    /// The configured library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the library was opened from disk.
    pub fn is_dynamic(&self) -> bool {
        matches!(self.origin, Origin::Dynamic(_))
    }

    /// The resolved entry points.
    pub fn entry_points(&self) -> EntryPoints {
        self.entry_points
    }

    /// Unload the library.
    pub fn close(self) {
        if let Origin::Dynamic(library) = self.origin {
            if let Err(e) = library.close() {
                warn!(library = %self.name, error = %e, "failed to unload library");
            }
        }
    }
}

/// Resolve the three entry points.
///
/// # Safety
///
/// Each symbol must have the signature of its entry point type.
unsafe fn resolve(
    library: &Library,
    symbols: &LinkageSymbols,
    path: &Path,
    version: f64,
) -> Result<EntryPoints> {
    // SAFETY: Forwarded from the caller.
    unsafe {
        Ok(EntryPoints {
            system_version: symbol::<SystemVersionFn>(library, &symbols.system_version, path, version)?,
            linkage_size: symbol::<LinkageSizeFn>(library, &symbols.linkage_size, path, version)?,
            fill_linkage: symbol::<LinkageFillFn>(library, &symbols.fill_linkage, path, version)?,
        })
    }
}

/// Look up one function symbol and copy it out of the `Symbol` wrapper.
///
/// # Safety
///
/// The symbol must have type `F`.
unsafe fn symbol<F: Copy>(library: &Library, name: &str, path: &Path, version: f64) -> Result<F> {
    // SAFETY: Forwarded from the caller.
    let symbol = unsafe { library.get::<F>(name.as_bytes()) }.map_err(|e| Error::MissingSymbol {
        path: path.to_path_buf(),
        symbol: name.to_string(),
        version,
        reason: e.to_string(),
    })?;
    Ok(*symbol)
}

impl std::fmt::Debug for LoadedLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::LinkTableEntry;

    unsafe extern "C" fn version() -> f64 {
        3.0
    }
    unsafe extern "C" fn size(_: f64) -> usize {
        0
    }
    unsafe extern "C" fn fill(_: f64, _: *mut LinkTableEntry, _: usize) -> i32 {
        0
    }

    #[test]
    fn test_open_missing_library() {
        let config = ClientConfig::new("/nonexistent/libux_missing.so").with_version(1.5);
        let err = unsafe { LoadedLibrary::open(&config) }.unwrap_err();
        match err {
            Error::Load { path, version, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/libux_missing.so"));
                assert_eq!(version, 1.5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_in_process() {
        let entry_points = EntryPoints {
            system_version: version,
            linkage_size: size,
            fill_linkage: fill,
        };
        let library = LoadedLibrary::in_process("builtin", entry_points);
        assert_eq!(library.name(), "builtin");
        assert!(!library.is_dynamic());
        assert_eq!(unsafe { (library.entry_points().system_version)() }, 3.0);
        library.close();
    }
}
