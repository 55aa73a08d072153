//! Resource envelopes and the stream-input producers.
//!
//! A producer wraps a payload in a [`ResourceEnvelope`], tags it with who
//! owns the bytes, and hands it to the library through the
//! `input_resource` capability. The envelope only borrows the payload: the
//! library must consume or copy it before the call returns.
//!
//! For [`Ownership::Shared`] payloads the bytes live behind the caller's
//! mutex. The producer holds that mutex for the duration of the call; any
//! other code touching the payload must take the same mutex.

use crate::error::Result;
use crate::guid::{InterfaceGuid, alias};
use crate::linkage::LibraryLinkage;
use crate::typed_index::{RawAttribute, TypedIndex, as_bytes, decode};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

/// Who owns an envelope's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Created by the producer for this call and freed right after it.
    Transient,
    /// Held externally and guarded by a caller-supplied mutex.
    Shared,
}

impl Ownership {
    /// The identity carried in the envelope.
    pub const fn guid(self) -> InterfaceGuid {
        match self {
            Ownership::Transient => alias::CREATED_INTERNALLY_NOT_SHARED,
            Ownership::Shared => alias::SHARED_RESOURCE,
        }
    }

    /// Decode an envelope's ownership tag.
    pub fn from_guid(guid: &InterfaceGuid) -> Option<Self> {
        [Ownership::Transient, Ownership::Shared]
            .into_iter()
            .find(|o| o.guid() == *guid)
    }
}

/// A tagged payload passed by pointer across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ResourceEnvelope<'a> {
    alias: InterfaceGuid,
    payload: InterfaceGuid,
    ownership: InterfaceGuid,
    data: *const u8,
    len: usize,
    _bytes: PhantomData<&'a [u8]>,
}

impl<'a> ResourceEnvelope<'a> {
    /// Wrap `bytes` whose meaning is named by `payload`.
    pub fn new(payload: InterfaceGuid, ownership: Ownership, bytes: &'a [u8]) -> Self {
        Self {
            alias: alias::RESOURCE_ENVELOPE,
            payload,
            ownership: ownership.guid(),
            data: bytes.as_ptr(),
            len: bytes.len(),
            _bytes: PhantomData,
        }
    }

    /// A UTF-8 text payload.
    pub fn text(text: &'a str, ownership: Ownership) -> Self {
        Self::new(alias::RAW_STRING, ownership, text.as_bytes())
    }

    /// An opaque byte payload.
    pub fn bytes(bytes: &'a [u8], ownership: Ownership) -> Self {
        Self::new(alias::RAW_BYTES, ownership, bytes)
    }

    /// A fixed-layout attribute record.
    pub fn attribute<T: RawAttribute>(value: &'a T) -> Self {
        Self::new(T::ALIAS, Ownership::Transient, as_bytes(value))
    }

    /// Recover an envelope on the receiving side.
    ///
    /// Returns `None` for a null pointer, a record that is not an envelope,
    /// or a null payload with non-zero length.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to at least an envelope's worth of
    /// readable memory, and the payload must stay valid for `'b`.
    pub unsafe fn from_raw<'b>(ptr: *const ResourceEnvelope<'_>) -> Option<&'b ResourceEnvelope<'b>> {
        if ptr.is_null() {
            return None;
        }
        // SAFETY: Caller guarantees `ptr` is readable for the envelope layout.
        let envelope = unsafe { &*ptr.cast::<ResourceEnvelope<'b>>() };
        if envelope.alias != alias::RESOURCE_ENVELOPE || (envelope.data.is_null() && envelope.len != 0) {
            return None;
        }
        Some(envelope)
    }

    /// Identity of the payload: [`alias::RAW_STRING`], [`alias::RAW_BYTES`]
    /// or an attribute alias.
    pub fn payload(&self) -> InterfaceGuid {
        self.payload
    }

    /// Ownership tag, if it is one this crate knows.
    pub fn ownership(&self) -> Option<Ownership> {
        Ownership::from_guid(&self.ownership)
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The payload bytes.
    pub fn as_slice(&self) -> &'a [u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: Envelopes are built from a live `&'a [u8]` or validated by
        // `from_raw`, whose caller vouches for the payload.
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }

    /// The payload as text, if it is a valid UTF-8 text payload.
    pub fn as_text(&self) -> Option<&'a str> {
        if self.payload != alias::RAW_STRING {
            return None;
        }
        std::str::from_utf8(self.as_slice()).ok()
    }

    /// The payload as an attribute record of type `T`.
    pub fn decode<T: RawAttribute>(&self) -> Option<T> {
        if self.payload != T::ALIAS {
            return None;
        }
        decode(self.as_slice())
    }
}

impl TypedIndex for ResourceEnvelope<'_> {
    const ALIAS: InterfaceGuid = alias::RESOURCE_ENVELOPE;
}

/// A value that can be streamed to the library.
pub trait StreamInput {
    /// Wrap `self` in an envelope and pass it through `input_resource`.
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()>;
}

impl<T: StreamInput + ?Sized> StreamInput for &T {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        (**self).stream_into(linkage)
    }
}

impl StreamInput for str {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        linkage.input_resource(&ResourceEnvelope::text(self, Ownership::Transient))
    }
}

impl StreamInput for String {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        self.as_str().stream_into(linkage)
    }
}

impl StreamInput for [u8] {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        linkage.input_resource(&ResourceEnvelope::bytes(self, Ownership::Transient))
    }
}

impl StreamInput for Arc<Mutex<String>> {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        let text = self.lock().unwrap_or_else(PoisonError::into_inner);
        linkage.input_resource(&ResourceEnvelope::text(&text, Ownership::Shared))
    }
}

impl StreamInput for Arc<Mutex<Vec<u8>>> {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        let bytes = self.lock().unwrap_or_else(PoisonError::into_inner);
        linkage.input_resource(&ResourceEnvelope::bytes(&bytes, Ownership::Shared))
    }
}
