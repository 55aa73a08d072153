//! The client side of the linkage protocol.

use super::config::ClientConfig;
use super::library::LoadedLibrary;
use crate::error::{Error, Result};
use crate::linkage::{
    BindReport, BinderTable, Capability, EntryPoints, LibraryLinkage, LinkTable, LinkageStatus,
};
use crate::observability::{
    instrument_negotiation, span_bind, trace_bind_report, trace_error, trace_state_change,
};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Lifecycle of a [`ClientInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No library has been bound yet.
    Unloaded,
    /// A library is loaded and its table is bound.
    Bound,
    /// The library was unloaded and every slot cleared.
    Terminated,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkState::Unloaded => "unloaded",
            LinkState::Bound => "bound",
            LinkState::Terminated => "terminated",
        })
    }
}

/// What one successful negotiation produced.
struct Negotiated {
    system_version: f64,
    linkage: LibraryLinkage,
    report: BindReport,
}

/// Owns one library and the capability slots bound from it.
///
/// The slots are only reachable through [`ClientInterface::linkage`], which
/// borrows the interface, so the library cannot be unloaded while a caller
/// holds a callable. After [`ClientInterface::terminate`] the same call
/// returns [`Error::NotBound`].
///
/// # Example
///
/// ```rust,ignore
/// use uxlink::prelude::*;
///
/// let config = ClientConfig::new("ux_render").require(Capability::InputResource);
/// let client = unsafe { ClientInterface::open(&config, &BinderTable::standard())? };
/// client.linkage()?.save()?;
/// ```
pub struct ClientInterface {
    state: LinkState,
    library: Option<LoadedLibrary>,
    linkage: LibraryLinkage,
    requested_version: f64,
    system_version: f64,
    report: BindReport,
    required: Vec<Capability>,
    bound_required: Vec<Capability>,
}

impl ClientInterface {
    /// An interface with no library.
    pub fn new() -> Self {
        Self {
            state: LinkState::Unloaded,
            library: None,
            linkage: LibraryLinkage::default(),
            requested_version: 0.0,
            system_version: 0.0,
            report: BindReport::default(),
            required: Vec::new(),
            bound_required: Vec::new(),
        }
    }

    /// Capabilities every negotiation of this interface must bind, in
    /// addition to those named by the configuration.
    pub fn with_required(mut self, required: impl IntoIterator<Item = Capability>) -> Self {
        self.required = required.into_iter().collect();
        self
    }

    /// Load a library and bind its table.
    ///
    /// # Safety
    ///
    /// See [`ClientInterface::initialize`].
    pub unsafe fn open(config: &ClientConfig, binders: &BinderTable) -> Result<Self> {
        let mut client = Self::new();
        // SAFETY: Forwarded from the caller.
        unsafe { client.initialize(config, binders)? };
        Ok(client)
    }

    /// Load the configured library, negotiate and bind.
    ///
    /// On error nothing is kept: the library is unloaded and the interface
    /// stays in its previous state.
    ///
    /// # Safety
    ///
    /// The library must be trusted. Its entry points must have the
    /// documented signatures, and every pointer it publishes must implement
    /// the signature of the capability it is published under.
    pub unsafe fn initialize(&mut self, config: &ClientConfig, binders: &BinderTable) -> Result<()> {
        self.ensure_unbound()?;
        let _span = instrument_negotiation(&config.library, config.version);

        // SAFETY: Forwarded from the caller.
        let library = unsafe { LoadedLibrary::open(config) }.inspect_err(|e| trace_error(&config.library, e))?;

        let mut required = self.required.clone();
        required.extend(config.required.iter().filter(|c| !self.required.contains(c)));

        // SAFETY: Forwarded from the caller.
        unsafe { self.bind_library(library, config.version, binders, required) }
    }

    /// Negotiate with entry points linked into the process.
    ///
    /// Runs the same steps as [`ClientInterface::initialize`] without
    /// loading anything.
    ///
    /// # Safety
    ///
    /// Same contract as [`ClientInterface::initialize`] for `entry_points`.
    pub unsafe fn attach(
        &mut self,
        name: &str,
        entry_points: EntryPoints,
        version: f64,
        binders: &BinderTable,
    ) -> Result<()> {
        self.ensure_unbound()?;
        let _span = instrument_negotiation(name, version);

        let library = LoadedLibrary::in_process(name, entry_points);
        let required = self.required.clone();
        // SAFETY: Forwarded from the caller.
        unsafe { self.bind_library(library, version, binders, required) }
    }

    /// Query and bind the loaded library's table again.
    ///
    /// The slots are replaced by what the current table binds. The
    /// capabilities required when the library was bound, including those
    /// named by its configuration, must still bind. On error the previous
    /// slots are kept.
    ///
    /// # Safety
    ///
    /// Same contract as [`ClientInterface::initialize`] for `binders`.
    pub unsafe fn rebind(&mut self, binders: &BinderTable) -> Result<BindReport> {
        let library = match (&self.state, &self.library) {
            (LinkState::Bound, Some(library)) => library,
            _ => return Err(Error::NotBound),
        };
        let name = library.name().to_string();
        let version = self.requested_version;
        let _span = instrument_negotiation(&name, version);

        // SAFETY: Forwarded from the caller.
        let negotiated = unsafe { negotiate(library, version, binders) }
            .and_then(|n| validate(n, &name, version, &self.bound_required))
            .inspect_err(|e| trace_error(&name, e))?;

        self.system_version = negotiated.system_version;
        self.linkage = negotiated.linkage;
        self.report = negotiated.report;
        Ok(self.report.clone())
    }

    /// Clear every slot and unload the library.
    ///
    /// Idempotent. Called on drop.
    pub fn terminate(&mut self) {
        let Some(library) = self.library.take() else {
            return;
        };
        let name = library.name().to_string();
        self.linkage = LibraryLinkage::default();
        self.report = BindReport::default();
        self.bound_required.clear();
        library.close();
        trace_state_change(&name, &self.state.to_string(), &LinkState::Terminated.to_string());
        self.state = LinkState::Terminated;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether a library is bound.
    pub fn is_bound(&self) -> bool {
        self.state == LinkState::Bound
    }

    /// The bound capability slots.
    pub fn linkage(&self) -> Result<&LibraryLinkage> {
        if self.is_bound() {
            Ok(&self.linkage)
        } else {
            Err(Error::NotBound)
        }
    }

    /// Whether `capability` is bound. Always `false` when not bound.
    pub fn has(&self, capability: Capability) -> bool {
        self.is_bound() && self.linkage.is_bound(capability)
    }

    /// Version the library reported about itself.
    pub fn system_version(&self) -> Option<f64> {
        self.is_bound().then_some(self.system_version)
    }

    /// Version token sent in the last successful negotiation.
    pub fn requested_version(&self) -> Option<f64> {
        self.is_bound().then_some(self.requested_version)
    }

    /// Capabilities the bound library must keep publishing across
    /// [`ClientInterface::rebind`]. Empty when not bound.
    pub fn required(&self) -> &[Capability] {
        &self.bound_required
    }

    /// Configured name of the bound library.
    pub fn library_name(&self) -> Option<&str> {
        self.library.as_ref().map(LoadedLibrary::name)
    }

    /// Path the bound library was loaded from.
    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_ref().map(LoadedLibrary::path)
    }

    /// Outcome of the last bind walk.
    pub fn report(&self) -> Option<&BindReport> {
        self.is_bound().then_some(&self.report)
    }

    fn ensure_unbound(&self) -> Result<()> {
        match &self.library {
            Some(library) => Err(Error::AlreadyBound {
                library: library.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Negotiate against `library` and commit everything on success.
    ///
    /// # Safety
    ///
    /// See [`ClientInterface::initialize`].
    unsafe fn bind_library(
        &mut self,
        library: LoadedLibrary,
        version: f64,
        binders: &BinderTable,
        required: Vec<Capability>,
    ) -> Result<()> {
        let name = library.name().to_string();

        // SAFETY: Forwarded from the caller.
        let negotiated = match unsafe { negotiate(&library, version, binders) }
            .and_then(|n| validate(n, &name, version, &required))
        {
            Ok(negotiated) => negotiated,
            Err(e) => {
                trace_error(&name, &e);
                library.close();
                return Err(e);
            }
        };

        trace_state_change(&name, &self.state.to_string(), &LinkState::Bound.to_string());
        self.library = Some(library);
        self.linkage = negotiated.linkage;
        self.report = negotiated.report;
        self.system_version = negotiated.system_version;
        self.requested_version = version;
        self.bound_required = required;
        self.state = LinkState::Bound;
        Ok(())
    }
}

/// Size query, fill and bind walk.
///
/// # Safety
///
/// See [`ClientInterface::initialize`].
unsafe fn negotiate(library: &LoadedLibrary, version: f64, binders: &BinderTable) -> Result<Negotiated> {
    let entry_points = library.entry_points();

    // SAFETY: Caller guarantees the entry point signatures.
    let system_version = unsafe { (entry_points.system_version)() };
    // SAFETY: As above.
    let count = unsafe { (entry_points.linkage_size)(version) };
    debug!(system_version, count, "library answered size query");

    let mut table = LinkTable::with_len(count).ok_or(Error::TableTooLarge { version, count })?;
    // SAFETY: `table` holds `count` writable records followed by the guard.
    let code = unsafe { (entry_points.fill_linkage)(version, table.as_mut_ptr(), count) };
    match LinkageStatus::from_raw(code) {
        LinkageStatus::Ok => {}
        LinkageStatus::SizeMismatch => {
            return Err(Error::SizeMismatch {
                version,
                expected: count,
            });
        }
        status => return Err(Error::Linkage { version, status }),
    }
    if !table.guard_intact() {
        return Err(Error::TableOverrun { version, count });
    }

    let _span = span_bind(library.name(), count).entered();
    let mut linkage = LibraryLinkage::default();
    // SAFETY: Caller guarantees each published pointer matches its GUID,
    // and `library` outlives the returned slots once committed.
    let report = unsafe { binders.bind_table(&table, &mut linkage) };
    trace_bind_report(library.name(), &report);

    Ok(Negotiated {
        system_version,
        linkage,
        report,
    })
}

/// Check that every required capability was bound.
fn validate(negotiated: Negotiated, library: &str, version: f64, required: &[Capability]) -> Result<Negotiated> {
    let missing: Vec<Capability> = required
        .iter()
        .copied()
        .filter(|c| !negotiated.linkage.is_bound(*c))
        .collect();
    if missing.is_empty() {
        Ok(negotiated)
    } else {
        Err(Error::MissingCapabilities {
            library: library.to_string(),
            version,
            missing,
        })
    }
}

impl Default for ClientInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ClientInterface {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl fmt::Debug for ClientInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientInterface")
            .field("state", &self.state)
            .field("library", &self.library_name())
            .field("requested_version", &self.requested_version)
            .field("bound", &self.linkage)
            .finish()
    }
}
