//! The C-compatible boundary between client and library.
//!
//! A library exports three entry points. Nothing else is resolved by
//! name; every other capability arrives through the link table.
//!
//! ```c
//! double system_version(void);
//! size_t guid_interface_linkage_size(double requested_version);
//! int32_t guid_interface_linkage(double requested_version,
//!                                link_table_entry_t *buffer, size_t count);
//! ```
//!
//! Library-side failures never unwind across this boundary. The fill entry
//! point returns a [`LinkageStatus`] code instead.

use super::entry::LinkTableEntry;
use std::ffi::c_void;
use std::fmt;

/// An untyped pointer delivered in a link table record.
pub type RawPointer = *const c_void;

/// `system_version() -> f64`
pub type SystemVersionFn = unsafe extern "C" fn() -> f64;

/// `guid_interface_linkage_size(requested_version) -> count`
pub type LinkageSizeFn = unsafe extern "C" fn(f64) -> usize;

/// `guid_interface_linkage(requested_version, buffer, count) -> status`
pub type LinkageFillFn = unsafe extern "C" fn(f64, *mut LinkTableEntry, usize) -> i32;

/// Default exported name of the system version query.
pub const SYSTEM_VERSION_SYMBOL: &str = "system_version";

/// Default exported name of the table size query.
pub const LINKAGE_SIZE_SYMBOL: &str = "guid_interface_linkage_size";

/// Default exported name of the table fill call.
pub const LINKAGE_FILL_SYMBOL: &str = "guid_interface_linkage";

/// Status returned by the fill entry point.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageStatus {
    /// Table written.
    Ok = 0,
    /// `count` did not match the size query for this version.
    SizeMismatch = 1,
    /// `buffer` was null while `count` was non-zero.
    NullBuffer = 2,
    /// The library does not serve this version token.
    UnsupportedVersion = 3,
    /// Any other library-side failure.
    Internal = 4,
}

impl LinkageStatus {
    /// The raw code carried across the boundary.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Decode a raw code. Unknown codes map to [`LinkageStatus::Internal`].
    pub const fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::SizeMismatch,
            2 => Self::NullBuffer,
            3 => Self::UnsupportedVersion,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for LinkageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::SizeMismatch => "entry count does not match the size query",
            Self::NullBuffer => "null table buffer",
            Self::UnsupportedVersion => "unsupported version",
            Self::Internal => "internal library error",
        };
        f.write_str(text)
    }
}

/// The three negotiation entry points of one library.
///
/// Resolved from a dynamic library by the client loader, or built
/// directly from functions linked into the process.
#[derive(Clone, Copy)]
pub struct EntryPoints {
    /// Reports the library's own version.
    pub system_version: SystemVersionFn,
    /// Reports how many records the library publishes for a version.
    pub linkage_size: LinkageSizeFn,
    /// Writes the records into a client-owned buffer.
    pub fill_linkage: LinkageFillFn,
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints")
            .field("system_version", &(self.system_version as RawPointer))
            .field("linkage_size", &(self.linkage_size as RawPointer))
            .field("fill_linkage", &(self.fill_linkage as RawPointer))
            .finish()
    }
}

/// Reinterpret a raw record pointer as a typed function pointer.
///
/// # Safety
///
/// `raw` must be non-null and point to a function whose signature is
/// exactly `F`.
pub(crate) unsafe fn fn_from_raw<F: Copy>(raw: RawPointer) -> F {
    const {
        assert!(std::mem::size_of::<F>() == std::mem::size_of::<RawPointer>());
    }
    // SAFETY: Sizes match (checked above). Caller guarantees `raw` is a
    // valid function of signature `F`.
    unsafe { std::mem::transmute_copy::<RawPointer, F>(&raw) }
}

/// Erase a typed function pointer into a raw record pointer.
pub(crate) fn fn_into_raw<F: Copy>(f: F) -> RawPointer {
    const {
        assert!(std::mem::size_of::<F>() == std::mem::size_of::<RawPointer>());
    }
    // SAFETY: `F` is pointer sized; every pointer-sized value is a valid
    // raw pointer bit pattern.
    unsafe { std::mem::transmute_copy::<F, RawPointer>(&f) }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn answer() -> f64 {
        42.0
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            LinkageStatus::Ok,
            LinkageStatus::SizeMismatch,
            LinkageStatus::NullBuffer,
            LinkageStatus::UnsupportedVersion,
            LinkageStatus::Internal,
        ] {
            assert_eq!(LinkageStatus::from_raw(status.as_raw()), status);
        }
        assert_eq!(LinkageStatus::from_raw(-7), LinkageStatus::Internal);
    }

    #[test]
    fn test_fn_pointer_erasure() {
        let raw = fn_into_raw(answer as SystemVersionFn);
        assert!(!raw.is_null());
        let back: SystemVersionFn = unsafe { fn_from_raw(raw) };
        assert_eq!(unsafe { back() }, 42.0);
    }
}
