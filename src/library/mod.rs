//! The library side of the linkage protocol.
//!
//! A rendering library describes what it publishes with a
//! [`LinkagePublisher`]: the records it hands out, grouped into tiers by
//! the version token that introduced them. The publisher answers the size
//! query and fills the client's buffer; [`export_linkage!`] turns it into
//! the three C entry points of a `cdylib`.
//!
//! # Example Library
//!
//! ```rust,ignore
//! use std::sync::LazyLock;
//! use uxlink::library::{LinkagePublisher, PublishLinkage};
//! use uxlink::linkage::cap;
//!
//! unsafe extern "C" fn save() { /* ... */ }
//! unsafe extern "C" fn restore() { /* ... */ }
//!
//! struct Renderer;
//!
//! impl PublishLinkage for Renderer {
//!     fn publisher() -> &'static LinkagePublisher {
//!         static PUBLISHER: LazyLock<LinkagePublisher> = LazyLock::new(|| {
//!             LinkagePublisher::new(1.2)
//!                 .tier(1.0, |t| t.publish::<cap::Save>(save).publish::<cap::Restore>(restore))
//!         });
//!         &PUBLISHER
//!     }
//! }
//!
//! uxlink::export_linkage!(Renderer);
//! ```

use crate::guid::InterfaceGuid;
use crate::linkage::{CapabilitySignature, EntryPoints, LinkTableEntry, LinkageStatus, RawPointer};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Which tiers a version request receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// Every tier introduced at or below the requested version.
    #[default]
    Cumulative,
    /// Only the tier whose version equals the request.
    Exact,
}

/// Records introduced at one version token.
#[derive(Debug, Clone)]
struct Tier {
    version: f64,
    entries: Vec<LinkTableEntry>,
}

/// Collects the records of one tier.
#[derive(Debug, Default)]
pub struct TierBuilder {
    entries: Vec<LinkTableEntry>,
}

impl TierBuilder {
    /// Publish a capability. The function must match its signature.
    pub fn publish<C: CapabilitySignature>(mut self, f: C::Fn) -> Self {
        self.entries.push(LinkTableEntry::publish::<C>(f));
        self
    }

    /// Publish an untyped record, for identities this crate does not know.
    pub fn raw(mut self, target: InterfaceGuid, pointer: RawPointer) -> Self {
        self.entries.push(LinkTableEntry::new(target, pointer));
        self
    }
}

/// What a library publishes, per version.
#[derive(Debug, Clone)]
pub struct LinkagePublisher {
    system_version: f64,
    policy: VersionPolicy,
    tiers: Vec<Tier>,
}

impl LinkagePublisher {
    /// A publisher reporting `system_version` with no records yet.
    pub fn new(system_version: f64) -> Self {
        Self {
            system_version,
            policy: VersionPolicy::default(),
            tiers: Vec::new(),
        }
    }

    /// Set the version policy.
    pub fn policy(mut self, policy: VersionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add the records introduced at `version`.
    pub fn tier(mut self, version: f64, build: impl FnOnce(TierBuilder) -> TierBuilder) -> Self {
        let entries = build(TierBuilder::default()).entries;
        self.tiers.push(Tier { version, entries });
        self
    }

    /// The library's own version.
    pub fn system_version(&self) -> f64 {
        self.system_version
    }

    /// Whether `version` is a token this publisher can answer.
    pub fn supports(version: f64) -> bool {
        version.is_finite()
    }

    /// Records sent for `version`, in publication order.
    pub fn published(&self, version: f64) -> impl Iterator<Item = &LinkTableEntry> + '_ {
        let policy = self.policy;
        self.tiers
            .iter()
            .filter(move |tier| Self::supports(version) && tier_applies(policy, tier.version, version))
            .flat_map(|tier| tier.entries.iter())
    }

    /// Number of records sent for `version`.
    pub fn linkage_size(&self, version: f64) -> usize {
        self.published(version).count()
    }

    /// Write the records for `version` into `buffer`.
    ///
    /// Nothing is written unless `count` equals
    /// [`LinkagePublisher::linkage_size`] for the same version.
    ///
    /// # Safety
    ///
    /// A non-null `buffer` must be valid for `count` record writes.
    pub unsafe fn fill(&self, version: f64, buffer: *mut LinkTableEntry, count: usize) -> LinkageStatus {
        if !Self::supports(version) {
            return LinkageStatus::UnsupportedVersion;
        }
        if buffer.is_null() && count > 0 {
            return LinkageStatus::NullBuffer;
        }
        if count != self.linkage_size(version) {
            return LinkageStatus::SizeMismatch;
        }
        for (i, entry) in self.published(version).enumerate() {
            // SAFETY: `i < count` and the caller guarantees `count` writes.
            unsafe { buffer.add(i).write(*entry) };
        }
        LinkageStatus::Ok
    }
}

fn tier_applies(policy: VersionPolicy, tier: f64, requested: f64) -> bool {
    match policy {
        VersionPolicy::Cumulative => tier <= requested,
        VersionPolicy::Exact => tier == requested,
    }
}

/// A type that owns a library's publisher.
pub trait PublishLinkage {
    /// The publisher, built once.
    fn publisher() -> &'static LinkagePublisher;
}

/// `system_version` entry point for `P`.
///
/// # Safety
///
/// Safe to call; `unsafe` only to match the entry point type.
pub unsafe extern "C" fn system_version_entry<P: PublishLinkage>() -> f64 {
    catch_unwind(|| P::publisher().system_version()).unwrap_or(0.0)
}

/// `guid_interface_linkage_size` entry point for `P`.
///
/// # Safety
///
/// Safe to call; `unsafe` only to match the entry point type.
pub unsafe extern "C" fn linkage_size_entry<P: PublishLinkage>(version: f64) -> usize {
    catch_unwind(|| P::publisher().linkage_size(version)).unwrap_or(0)
}

/// `guid_interface_linkage` entry point for `P`.
///
/// # Safety
///
/// See [`LinkagePublisher::fill`].
pub unsafe extern "C" fn fill_linkage_entry<P: PublishLinkage>(
    version: f64,
    buffer: *mut LinkTableEntry,
    count: usize,
) -> i32 {
    // SAFETY: Forwarded from the caller.
    catch_unwind(AssertUnwindSafe(|| unsafe { P::publisher().fill(version, buffer, count) }))
        .unwrap_or(LinkageStatus::Internal)
        .as_raw()
}

impl EntryPoints {
    /// The entry points of a publisher linked into this process.
    pub fn of<P: PublishLinkage>() -> Self {
        Self {
            system_version: system_version_entry::<P>,
            linkage_size: linkage_size_entry::<P>,
            fill_linkage: fill_linkage_entry::<P>,
        }
    }
}

/// Export a [`PublishLinkage`] type as the three entry points of a `cdylib`.
#[macro_export]
macro_rules! export_linkage {
    ($publisher:ty) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn system_version() -> f64 {
            unsafe { $crate::library::system_version_entry::<$publisher>() }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn guid_interface_linkage_size(version: f64) -> usize {
            unsafe { $crate::library::linkage_size_entry::<$publisher>(version) }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn guid_interface_linkage(
            version: f64,
            buffer: *mut $crate::linkage::LinkTableEntry,
            count: usize,
        ) -> i32 {
            unsafe { $crate::library::fill_linkage_entry::<$publisher>(version, buffer, count) }
        }
    };
}
