//! Link table records and the client-owned table buffer.

use super::abi::{RawPointer, fn_into_raw};
use super::capability::CapabilitySignature;
use crate::guid::{InterfaceGuid, alias};
use std::ptr;

/// One `(alias, target, pointer)` record published by the library.
///
/// The layout is the whole cross-boundary contract: two 16-byte GUIDs
/// followed by a pointer-width field. Changing it is a breaking ABI
/// change.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTableEntry {
    /// Record format tag, [`alias::LINK_TABLE_ENTRY`] for this layout.
    pub alias: InterfaceGuid,
    /// Identity of the capability the pointer implements.
    pub target: InterfaceGuid,
    /// Function pointer, valid while the library stays loaded.
    pub pointer: RawPointer,
}

// SAFETY: A record only carries identities and a function pointer into
// library code; neither is tied to the thread that produced it.
unsafe impl Send for LinkTableEntry {}
unsafe impl Sync for LinkTableEntry {}

impl LinkTableEntry {
    /// A record with no target and no pointer.
    pub const EMPTY: LinkTableEntry = LinkTableEntry {
        alias: InterfaceGuid::NIL,
        target: InterfaceGuid::NIL,
        pointer: ptr::null(),
    };

    /// Sentinel written after the last record of a [`LinkTable`].
    const GUARD: LinkTableEntry = LinkTableEntry {
        alias: alias::LINK_TABLE_ENTRY,
        target: InterfaceGuid::from_u128(u128::MAX),
        pointer: ptr::null(),
    };

    /// A current-format record for an arbitrary target.
    pub const fn new(target: InterfaceGuid, pointer: RawPointer) -> Self {
        Self {
            alias: alias::LINK_TABLE_ENTRY,
            target,
            pointer,
        }
    }

    /// A record whose pointer is checked against the capability signature.
    pub fn publish<C: CapabilitySignature>(f: C::Fn) -> Self {
        Self::new(C::CAPABILITY.guid(), fn_into_raw(f))
    }

    /// Whether the record uses the layout this crate was built with.
    pub fn is_current_format(&self) -> bool {
        self.alias == alias::LINK_TABLE_ENTRY
    }
}

impl Default for LinkTableEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Client-owned buffer handed to the library's fill call.
///
/// Sized from the size query, plus one trailing guard record that the
/// library must leave untouched.
#[derive(Debug, Clone)]
pub struct LinkTable {
    /// `count` records followed by the guard.
    records: Vec<LinkTableEntry>,
}

impl LinkTable {
    /// Allocate a table for exactly `count` records.
    ///
    /// Returns `None` when `count` records and the guard cannot be
    /// allocated.
    pub fn with_len(count: usize) -> Option<Self> {
        let mut records = Vec::new();
        records.try_reserve_exact(count.checked_add(1)?).ok()?;
        records.resize(count, LinkTableEntry::EMPTY);
        records.push(LinkTableEntry::GUARD);
        Some(Self { records })
    }

    /// Build a filled table directly, as if the library had written it.
    pub fn from_entries(entries: impl IntoIterator<Item = LinkTableEntry>) -> Self {
        let mut records: Vec<LinkTableEntry> = entries.into_iter().collect();
        records.push(LinkTableEntry::GUARD);
        Self { records }
    }

    /// Number of records the library may write.
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pointer passed as the fill call's buffer.
    pub fn as_mut_ptr(&mut self) -> *mut LinkTableEntry {
        self.records.as_mut_ptr()
    }

    /// The records, excluding the guard.
    pub fn entries(&self) -> &[LinkTableEntry] {
        &self.records[..self.len()]
    }

    /// Whether the guard record survived the fill call.
    pub fn guard_intact(&self) -> bool {
        self.records.last() == Some(&LinkTableEntry::GUARD)
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, LinkTableEntry> {
        self.entries().iter()
    }
}

impl<'a> IntoIterator for &'a LinkTable {
    type Item = &'a LinkTableEntry;
    type IntoIter = std::slice::Iter<'a, LinkTableEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
