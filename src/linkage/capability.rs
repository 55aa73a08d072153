//! The closed set of capabilities a library can publish.
//!
//! Each [`Capability`] is tied at compile time to the exact function
//! signature it has on the boundary through a marker type in [`cap`].
//! Binding a record means reinterpreting its pointer as that signature
//! and storing it in the matching [`LibraryLinkage`] slot; publishing goes
//! through the same marker, so a library cannot hand out a pointer of the
//! wrong shape without the compiler noticing.

use super::abi::{RawPointer, fn_from_raw, fn_into_raw};
use super::binder::Binder;
use crate::attributes::{ContentType, Matrix};
use crate::error::{Error, Result};
use crate::guid::{InterfaceGuid, alias};
use crate::resource::ResourceEnvelope;
use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Compile-time description of one capability's slot and signature.
///
/// Implemented only by the markers in [`cap`].
pub trait CapabilitySignature: sealed::Sealed {
    /// The `extern "C"` function type the library publishes.
    type Fn: Copy;

    /// The capability this marker describes.
    const CAPABILITY: Capability;
}

/// Slot access for a marker. Crate-private so a bound callable can only be
/// reached through the wrappers on a borrowed [`LibraryLinkage`].
pub(crate) trait SlotAccess: CapabilitySignature {
    /// Mutable access to the slot on a linkage.
    fn slot(linkage: &mut LibraryLinkage) -> &mut Option<Self::Fn>;

    /// The slot's current value.
    fn bound(linkage: &LibraryLinkage) -> Option<Self::Fn>;
}

/// Store `raw` in the slot described by `C`.
///
/// # Safety
///
/// `raw` must be non-null and point to a function of signature `C::Fn`
/// that stays valid for as long as `linkage` is used.
unsafe fn bind_slot<C: SlotAccess>(linkage: &mut LibraryLinkage, raw: RawPointer) {
    // SAFETY: Caller guarantees `raw` implements `C::Fn`.
    *C::slot(linkage) = Some(unsafe { fn_from_raw::<C::Fn>(raw) });
}

macro_rules! capabilities {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $field:ident = $guid:path, fn($($arg:ty),*);
    )*) => {
        /// A named capability the client knows how to bind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Capability {
            $( $(#[$meta])* $variant, )*
        }

        impl Capability {
            /// Every capability, in slot order.
            pub const ALL: &'static [Capability] = &[$(Capability::$variant),*];

            /// The identity the library publishes this capability under.
            pub const fn guid(self) -> InterfaceGuid {
                match self {
                    $(Capability::$variant => $guid,)*
                }
            }

            /// Slot name, e.g. `"save"`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Capability::$variant => stringify!($field),)*
                }
            }

            /// The binder that moves a raw pointer into this capability's slot.
            pub(crate) fn binder(self) -> Binder {
                match self {
                    $(Capability::$variant => bind_slot::<cap::$variant>,)*
                }
            }
        }

        pub mod cap {
            //! Signature markers, one per [`Capability`](super::Capability).

            use super::*;

            $(
                #[doc = concat!("Signature of [`Capability::", stringify!($variant), "`].")]
                #[derive(Debug, Clone, Copy)]
                pub struct $variant;

                impl sealed::Sealed for $variant {}

                impl CapabilitySignature for $variant {
                    type Fn = unsafe extern "C" fn($($arg),*);

                    const CAPABILITY: Capability = Capability::$variant;
                }

                impl SlotAccess for $variant {
                    fn slot(linkage: &mut LibraryLinkage) -> &mut Option<Self::Fn> {
                        &mut linkage.$field
                    }

                    fn bound(linkage: &LibraryLinkage) -> Option<Self::Fn> {
                        linkage.$field
                    }
                }
            )*
        }

        /// Typed callable slots filled from a library's link table.
        ///
        /// A slot is empty until a record with its GUID is bound. Invoking
        /// an empty slot returns [`Error::UnboundCapability`]; use
        /// [`LibraryLinkage::is_bound`] to check first.
        #[derive(Default)]
        pub struct LibraryLinkage {
            $( $field: Option<unsafe extern "C" fn($($arg),*)>, )*
        }

        impl LibraryLinkage {
            /// Whether the capability's slot holds a callable.
            pub fn is_bound(&self, capability: Capability) -> bool {
                match capability {
                    $(Capability::$variant => self.$field.is_some(),)*
                }
            }

            /// The slot's pointer with its type erased.
            pub fn raw_slot(&self, capability: Capability) -> Option<RawPointer> {
                match capability {
                    $(Capability::$variant => self.$field.map(fn_into_raw),)*
                }
            }
        }
    };
}

// Argument types are spelled out in full: inside `cap`, marker names such
// as `Matrix` shadow the value types of the same name.
capabilities! {
    /// Hand a tagged resource envelope to the library.
    InputResource => input_resource = alias::FN_INPUT_RESOURCE, fn(*const ResourceEnvelope<'_>);
    /// Look up a linked mapped object by numeric key.
    LinkedMappedObjectsFindSize => linked_mapped_objects_find_size =
        alias::FN_LINKED_MAPPED_OBJECTS_FIND_SIZE, fn(usize);
    /// Look up a linked mapped object by string key.
    LinkedMappedObjectsFindString => linked_mapped_objects_find_string =
        alias::FN_LINKED_MAPPED_OBJECTS_FIND_STRING, fn(*const u8, usize);
    /// Push the drawing state.
    Save => save = alias::FN_SAVE, fn();
    /// Pop the drawing state.
    Restore => restore = alias::FN_RESTORE, fn();
    /// Begin an offscreen group.
    Push => push = alias::FN_PUSH, fn(ContentType);
    /// End an offscreen group, optionally painting it.
    Pop => pop = alias::FN_POP, fn(bool);
    /// Scale user space.
    Scale => scale = alias::FN_SCALE, fn(f64, f64);
    /// Multiply the current transform.
    Transform => transform = alias::FN_TRANSFORM, fn(*const crate::attributes::Matrix);
    /// Replace the current transform.
    Matrix => matrix = alias::FN_MATRIX, fn(*const crate::attributes::Matrix);
    /// Reset the current transform.
    Identity => identity = alias::FN_IDENTITY, fn();
    /// Translate user space.
    Translate => translate = alias::FN_TRANSLATE, fn(f64, f64);
    /// Rotate user space, in radians.
    Rotate => rotate = alias::FN_ROTATE, fn(f64);
    /// Convert a user-space point to device space, in place.
    Device => device = alias::FN_DEVICE, fn(*mut f64, *mut f64);
    /// Convert a user-space distance to device space, in place.
    DeviceDistance => device_distance = alias::FN_DEVICE_DISTANCE, fn(*mut f64, *mut f64);
    /// Set the device offset.
    DeviceOffset => device_offset = alias::FN_DEVICE_OFFSET, fn(f64, f64);
    /// Set the device scale.
    DeviceScale => device_scale = alias::FN_DEVICE_SCALE, fn(f64, f64);
    /// Convert a device-space point to user space, in place.
    User => user = alias::FN_USER, fn(*mut f64, *mut f64);
    /// Convert a device-space distance to user space, in place.
    UserDistance => user_distance = alias::FN_USER_DISTANCE, fn(*mut f64, *mut f64);
    /// Tell the library the client finished a batch of input.
    NotifyComplete => notify_complete = alias::FN_NOTIFY_COMPLETE, fn();
}

impl Capability {
    /// The capability published under `guid`, if any.
    pub fn from_guid(guid: &InterfaceGuid) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.guid() == *guid)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Every call below goes through `resolve`, which only yields pointers stored
// by `bind_slot` for the same marker, i.e. published with this signature.
// The owning library stays loaded while `self` is borrowed from its client.
impl LibraryLinkage {
    /// The typed callable for `C`, or [`Error::UnboundCapability`].
    pub(crate) fn resolve<C: SlotAccess>(&self) -> Result<C::Fn> {
        C::bound(self).ok_or(Error::UnboundCapability(C::CAPABILITY))
    }

    /// Capabilities whose slots are filled, in slot order.
    pub fn bound(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| self.is_bound(*c))
            .collect()
    }

    /// Number of filled slots.
    pub fn bound_count(&self) -> usize {
        Capability::ALL.iter().filter(|c| self.is_bound(**c)).count()
    }

    /// Whether no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.bound_count() == 0
    }

    /// Filled slots with their erased pointers.
    pub fn bound_pointers(&self) -> Vec<(Capability, RawPointer)> {
        Capability::ALL
            .iter()
            .filter_map(|c| self.raw_slot(*c).map(|p| (*c, p)))
            .collect()
    }

    /// Forward a resource envelope. The library consumes it before returning.
    pub fn input_resource(&self, envelope: &ResourceEnvelope<'_>) -> Result<()> {
        let f = self.resolve::<cap::InputResource>()?;
        // SAFETY: see impl comment; `envelope` outlives the call.
        unsafe { f(envelope) };
        Ok(())
    }

    /// Look up a linked mapped object by numeric key.
    pub fn linked_mapped_objects_find_size(&self, key: usize) -> Result<()> {
        let f = self.resolve::<cap::LinkedMappedObjectsFindSize>()?;
        // SAFETY: see impl comment.
        unsafe { f(key) };
        Ok(())
    }

    /// Look up a linked mapped object by string key.
    pub fn linked_mapped_objects_find_string(&self, key: &str) -> Result<()> {
        let f = self.resolve::<cap::LinkedMappedObjectsFindString>()?;
        // SAFETY: see impl comment; `key` outlives the call.
        unsafe { f(key.as_ptr(), key.len()) };
        Ok(())
    }

    /// Push the drawing state.
    pub fn save(&self) -> Result<()> {
        let f = self.resolve::<cap::Save>()?;
        // SAFETY: see impl comment.
        unsafe { f() };
        Ok(())
    }

    /// Pop the drawing state.
    pub fn restore(&self) -> Result<()> {
        let f = self.resolve::<cap::Restore>()?;
        // SAFETY: see impl comment.
        unsafe { f() };
        Ok(())
    }

    /// Begin an offscreen group with the given content.
    pub fn push(&self, content: ContentType) -> Result<()> {
        let f = self.resolve::<cap::Push>()?;
        // SAFETY: see impl comment.
        unsafe { f(content) };
        Ok(())
    }

    /// End an offscreen group; `paint` composites it onto the surface.
    pub fn pop(&self, paint: bool) -> Result<()> {
        let f = self.resolve::<cap::Pop>()?;
        // SAFETY: see impl comment.
        unsafe { f(paint) };
        Ok(())
    }

    /// Scale user space.
    pub fn scale(&self, sx: f64, sy: f64) -> Result<()> {
        let f = self.resolve::<cap::Scale>()?;
        // SAFETY: see impl comment.
        unsafe { f(sx, sy) };
        Ok(())
    }

    /// Multiply the current transform by `matrix`.
    pub fn transform(&self, matrix: &Matrix) -> Result<()> {
        let f = self.resolve::<cap::Transform>()?;
        // SAFETY: see impl comment; `matrix` outlives the call.
        unsafe { f(matrix) };
        Ok(())
    }

    /// Replace the current transform with `matrix`.
    pub fn matrix(&self, matrix: &Matrix) -> Result<()> {
        let f = self.resolve::<cap::Matrix>()?;
        // SAFETY: see impl comment; `matrix` outlives the call.
        unsafe { f(matrix) };
        Ok(())
    }

    /// Reset the current transform.
    pub fn identity(&self) -> Result<()> {
        let f = self.resolve::<cap::Identity>()?;
        // SAFETY: see impl comment.
        unsafe { f() };
        Ok(())
    }

    /// Translate user space.
    pub fn translate(&self, tx: f64, ty: f64) -> Result<()> {
        let f = self.resolve::<cap::Translate>()?;
        // SAFETY: see impl comment.
        unsafe { f(tx, ty) };
        Ok(())
    }

    /// Rotate user space by `angle` radians.
    pub fn rotate(&self, angle: f64) -> Result<()> {
        let f = self.resolve::<cap::Rotate>()?;
        // SAFETY: see impl comment.
        unsafe { f(angle) };
        Ok(())
    }

    /// Set the device offset.
    pub fn device_offset(&self, x: f64, y: f64) -> Result<()> {
        let f = self.resolve::<cap::DeviceOffset>()?;
        // SAFETY: see impl comment.
        unsafe { f(x, y) };
        Ok(())
    }

    /// Set the device scale.
    pub fn device_scale(&self, sx: f64, sy: f64) -> Result<()> {
        let f = self.resolve::<cap::DeviceScale>()?;
        // SAFETY: see impl comment.
        unsafe { f(sx, sy) };
        Ok(())
    }

    /// Convert a user-space point to device space.
    pub fn device(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let f = self.resolve::<cap::Device>()?;
        Ok(convert(f, x, y))
    }

    /// Convert a user-space distance to device space.
    pub fn device_distance(&self, dx: f64, dy: f64) -> Result<(f64, f64)> {
        let f = self.resolve::<cap::DeviceDistance>()?;
        Ok(convert(f, dx, dy))
    }

    /// Convert a device-space point to user space.
    pub fn user(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let f = self.resolve::<cap::User>()?;
        Ok(convert(f, x, y))
    }

    /// Convert a device-space distance to user space.
    pub fn user_distance(&self, dx: f64, dy: f64) -> Result<(f64, f64)> {
        let f = self.resolve::<cap::UserDistance>()?;
        Ok(convert(f, dx, dy))
    }

    /// Tell the library the client finished a batch of input.
    pub fn notify_complete(&self) -> Result<()> {
        let f = self.resolve::<cap::NotifyComplete>()?;
        // SAFETY: see impl comment.
        unsafe { f() };
        Ok(())
    }
}

/// Run an in/out coordinate conversion.
fn convert(f: unsafe extern "C" fn(*mut f64, *mut f64), mut x: f64, mut y: f64) -> (f64, f64) {
    // SAFETY: `f` came from `resolve`; both pointers are live locals.
    unsafe { f(&mut x, &mut y) };
    (x, y)
}

impl fmt::Debug for LibraryLinkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bound()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SAVES: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_save() {
        SAVES.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn double_in_place(x: *mut f64, y: *mut f64) {
        unsafe {
            *x *= 2.0;
            *y *= 2.0;
        }
    }

    #[test]
    fn test_capability_guids_unique() {
        let guids: HashSet<_> = Capability::ALL.iter().map(|c| c.guid()).collect();
        assert_eq!(guids.len(), Capability::ALL.len());
    }

    #[test]
    fn test_from_guid() {
        assert_eq!(Capability::from_guid(&alias::FN_ROTATE), Some(Capability::Rotate));
        assert_eq!(Capability::from_guid(&alias::LINE_WIDTH), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Capability::InputResource.name(), "input_resource");
        assert_eq!(Capability::NotifyComplete.to_string(), "notify_complete");
    }

    #[test]
    fn test_empty_linkage_reports_unbound() {
        let linkage = LibraryLinkage::default();
        assert!(linkage.is_empty());
        assert!(!linkage.is_bound(Capability::Save));
        assert!(matches!(
            linkage.save(),
            Err(Error::UnboundCapability(Capability::Save))
        ));
        assert!(matches!(
            linkage.device(1.0, 2.0),
            Err(Error::UnboundCapability(Capability::Device))
        ));
    }

    #[test]
    fn test_bind_slot_makes_callable() {
        let mut linkage = LibraryLinkage::default();
        let raw = fn_into_raw(count_save as unsafe extern "C" fn());
        unsafe { Capability::Save.binder()(&mut linkage, raw) };

        assert!(linkage.is_bound(Capability::Save));
        assert_eq!(linkage.bound(), vec![Capability::Save]);
        assert_eq!(linkage.raw_slot(Capability::Save), Some(raw));

        let before = SAVES.load(Ordering::SeqCst);
        linkage.save().unwrap();
        assert!(SAVES.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn test_resolve_typed_slot() {
        let mut linkage = LibraryLinkage::default();
        assert!(matches!(
            linkage.resolve::<cap::Rotate>(),
            Err(Error::UnboundCapability(Capability::Rotate))
        ));

        let raw = fn_into_raw(count_save as unsafe extern "C" fn());
        unsafe { Capability::Save.binder()(&mut linkage, raw) };
        let save = linkage.resolve::<cap::Save>().unwrap();
        assert_eq!(fn_into_raw(save), raw);
    }

    #[test]
    fn test_in_out_conversion() {
        let mut linkage = LibraryLinkage::default();
        *cap::UserDistance::slot(&mut linkage) = Some(double_in_place);
        assert_eq!(linkage.user_distance(1.5, -3.0).unwrap(), (3.0, -6.0));
    }
}
