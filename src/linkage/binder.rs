//! The GUID→binder dispatch map.
//!
//! Which identities a library publishes is open ended; how each one is
//! bound is a closed set known when the client is compiled. The table
//! below joins the two. It is built once, explicitly, and then only read,
//! so it can be shared across threads without locking.

use super::abi::RawPointer;
use super::capability::{Capability, LibraryLinkage};
use super::entry::LinkTableEntry;
use crate::guid::InterfaceGuid;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Moves a raw pointer into its typed slot.
pub type Binder = unsafe fn(&mut LibraryLinkage, RawPointer);

/// Outcome of binding one link table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The record filled a slot.
    Bound(Capability),
    /// The target GUID has no binder. Not an error.
    Unknown(InterfaceGuid),
    /// The record's alias names a layout this client does not understand.
    ForeignFormat(InterfaceGuid),
    /// A known capability was published with a null pointer.
    NullPointer(Capability),
}

/// Summary of one walk over a link table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindReport {
    /// Records in the table.
    pub published: usize,
    /// Capabilities bound, in table order.
    pub bound: Vec<Capability>,
    /// Target GUIDs without a binder.
    pub skipped: Vec<InterfaceGuid>,
    /// Records with an unrecognised format alias.
    pub foreign_records: usize,
    /// Known capabilities published with a null pointer.
    pub null_pointers: Vec<Capability>,
}

impl BindReport {
    fn record(&mut self, outcome: BindOutcome) {
        match outcome {
            BindOutcome::Bound(cap) => self.bound.push(cap),
            BindOutcome::Unknown(guid) => self.skipped.push(guid),
            BindOutcome::ForeignFormat(_) => self.foreign_records += 1,
            BindOutcome::NullPointer(cap) => self.null_pointers.push(cap),
        }
    }
}

/// Immutable map from capability GUID to its binder.
#[derive(Clone)]
pub struct BinderTable {
    binders: HashMap<InterfaceGuid, (Capability, Binder)>,
}

impl BinderTable {
    /// A table that binds nothing.
    pub fn empty() -> Self {
        Self {
            binders: HashMap::new(),
        }
    }

    /// A table that binds every capability this client knows.
    pub fn standard() -> Self {
        Self::from_capabilities(Capability::ALL.iter().copied())
    }

    /// A table that binds exactly the given capabilities.
    pub fn from_capabilities(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let binders = capabilities
            .into_iter()
            .map(|c| (c.guid(), (c, c.binder())))
            .collect();
        Self { binders }
    }

    /// Add a capability.
    pub fn with(mut self, capability: Capability) -> Self {
        self.binders
            .insert(capability.guid(), (capability, capability.binder()));
        self
    }

    /// Remove a capability, as an older client would lack it.
    pub fn without(mut self, capability: Capability) -> Self {
        self.binders.remove(&capability.guid());
        self
    }

    /// Number of known capabilities.
    pub fn len(&self) -> usize {
        self.binders.len()
    }

    /// Whether the table binds nothing.
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    /// Whether `guid` has a binder.
    pub fn contains(&self, guid: &InterfaceGuid) -> bool {
        self.binders.contains_key(guid)
    }

    /// The capability and binder registered for `guid`.
    pub fn lookup(&self, guid: &InterfaceGuid) -> Option<(Capability, Binder)> {
        self.binders.get(guid).copied()
    }

    /// Known capabilities, in slot order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| self.contains(&c.guid()))
            .collect()
    }

    /// Bind one record into `linkage`.
    ///
    /// Unbindable records leave `linkage` untouched.
    ///
    /// # Safety
    ///
    /// The record's pointer must implement the signature registered for its
    /// target GUID and stay valid for as long as `linkage` is used.
    pub unsafe fn bind_entry(
        &self,
        entry: &LinkTableEntry,
        linkage: &mut LibraryLinkage,
    ) -> BindOutcome {
        if !entry.is_current_format() {
            warn!(alias = %entry.alias, guid = %entry.target, "skipping link record of unknown format");
            return BindOutcome::ForeignFormat(entry.alias);
        }

        let Some((capability, binder)) = self.lookup(&entry.target) else {
            debug!(guid = %entry.target, "no binder for published interface");
            return BindOutcome::Unknown(entry.target);
        };

        if entry.pointer.is_null() {
            warn!(capability = %capability, "library published a null pointer");
            return BindOutcome::NullPointer(capability);
        }

        // SAFETY: Non-null, and the caller guarantees the signature matches.
        unsafe { binder(linkage, entry.pointer) };
        debug!(capability = %capability, "bound capability");
        BindOutcome::Bound(capability)
    }

    /// Bind every record of a filled table.
    ///
    /// # Safety
    ///
    /// See [`BinderTable::bind_entry`]; applies to every record.
    pub unsafe fn bind_table<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a LinkTableEntry>,
        linkage: &mut LibraryLinkage,
    ) -> BindReport {
        let mut report = BindReport::default();
        for entry in entries {
            report.published += 1;
            // SAFETY: Forwarded from the caller.
            let outcome = unsafe { self.bind_entry(entry, linkage) };
            report.record(outcome);
        }
        report
    }
}

impl Default for BinderTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for BinderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderTable")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
