//! Typed-index tagging of value objects.
//!
//! Every value object that can cross the boundary names its own
//! [`InterfaceGuid`]. Fixed-layout records also carry that GUID as their
//! first field, so a receiver holding only raw bytes can tell what they
//! are without shared type metadata.

use crate::guid::InterfaceGuid;
use std::mem::size_of;

/// A type with a stable interface identity.
pub trait TypedIndex {
    /// The identity of every value of this type.
    const ALIAS: InterfaceGuid;

    /// The identity of this value.
    fn alias(&self) -> InterfaceGuid {
        Self::ALIAS
    }
}

/// A `#[repr(C)]` record that may be shipped as raw bytes.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]`, start with an [`InterfaceGuid`]
/// field holding [`TypedIndex::ALIAS`], contain no pointers, no padding
/// bytes, and accept every bit pattern in their remaining fields.
pub unsafe trait RawAttribute: TypedIndex + Copy {}

/// View a raw record as bytes.
pub fn as_bytes<T: RawAttribute>(value: &T) -> &[u8] {
    // SAFETY: `RawAttribute` guarantees a padding-free, pointer-free layout,
    // so every byte of `value` is initialised.
    unsafe { std::slice::from_raw_parts((value as *const T).cast::<u8>(), size_of::<T>()) }
}

/// Read the identity at the start of a raw record.
pub fn peek_alias(bytes: &[u8]) -> Option<InterfaceGuid> {
    let head: [u8; 16] = bytes.get(..16)?.try_into().ok()?;
    Some(InterfaceGuid::from_bytes(head))
}

/// Recover a record from raw bytes.
///
/// Returns `None` when the length or the leading identity does not match
/// `T`.
pub fn decode<T: RawAttribute>(bytes: &[u8]) -> Option<T> {
    if bytes.len() != size_of::<T>() || peek_alias(bytes)? != T::ALIAS {
        return None;
    }
    // SAFETY: Length checked, alias checked, and `RawAttribute` guarantees
    // every other bit pattern is valid. The read tolerates misalignment.
    Some(unsafe { std::ptr::read_unaligned(bytes.as_ptr().cast::<T>()) })
}
