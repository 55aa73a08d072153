//! Integration tests for negotiation and binding against in-process libraries.

use std::cell::RefCell;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use uxlink::linkage::{LinkTableEntry, LinkageStatus};
use uxlink::prelude::*;
use uxlink::typed_index;

const FUTURE_GUID: InterfaceGuid =
    InterfaceGuid::from_u128(0x7578_6775_6910_4001_8000_0000_0000_00ff);

static SAVES: AtomicUsize = AtomicUsize::new(0);
static RESTORES: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn save() {
    SAVES.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn restore() {
    RESTORES.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn future() {}

unsafe extern "C" fn notify_complete() {}

unsafe extern "C" fn double(x: *mut f64, y: *mut f64) {
    unsafe {
        *x *= 2.0;
        *y *= 2.0;
    }
}

unsafe extern "C" fn halve(x: *mut f64, y: *mut f64) {
    unsafe {
        *x /= 2.0;
        *y /= 2.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Received {
    payload: InterfaceGuid,
    ownership: Option<Ownership>,
    bytes: Vec<u8>,
}

thread_local! {
    static RECEIVED: RefCell<Vec<Received>> = const { RefCell::new(Vec::new()) };
}

unsafe extern "C" fn input_resource(envelope: *const ResourceEnvelope<'_>) {
    // SAFETY: The client passes a live envelope for the duration of the call.
    let Some(envelope) = (unsafe { ResourceEnvelope::from_raw(envelope) }) else {
        return;
    };
    RECEIVED.with_borrow_mut(|received| {
        received.push(Received {
            payload: envelope.payload(),
            ownership: envelope.ownership(),
            bytes: envelope.as_slice().to_vec(),
        })
    });
}

fn take_received() -> Vec<Received> {
    RECEIVED.with_borrow_mut(std::mem::take)
}

/// Publishes save, restore and one identity no client knows yet, for 1.0.
struct ScenarioLibrary;

impl PublishLinkage for ScenarioLibrary {
    fn publisher() -> &'static LinkagePublisher {
        static PUBLISHER: LazyLock<LinkagePublisher> = LazyLock::new(|| {
            LinkagePublisher::new(1.0).policy(VersionPolicy::Exact).tier(1.0, |t| {
                t.publish::<cap::Save>(save)
                    .publish::<cap::Restore>(restore)
                    .raw(FUTURE_GUID, future as *const std::ffi::c_void)
            })
        });
        &PUBLISHER
    }
}

/// A renderer with stream input, spread over two tiers.
struct Renderer;

impl PublishLinkage for Renderer {
    fn publisher() -> &'static LinkagePublisher {
        static PUBLISHER: LazyLock<LinkagePublisher> = LazyLock::new(|| {
            LinkagePublisher::new(1.4)
                .tier(1.0, |t| {
                    t.publish::<cap::InputResource>(input_resource)
                        .publish::<cap::NotifyComplete>(notify_complete)
                })
                .tier(1.2, |t| t.publish::<cap::Device>(double).publish::<cap::User>(halve))
        });
        &PUBLISHER
    }
}

/// A library with save only.
struct SaveOnly;

impl PublishLinkage for SaveOnly {
    fn publisher() -> &'static LinkagePublisher {
        static PUBLISHER: LazyLock<LinkagePublisher> =
            LazyLock::new(|| LinkagePublisher::new(1.0).tier(1.0, |t| t.publish::<cap::Save>(save)));
        &PUBLISHER
    }
}

/// A library with restore only.
struct RestoreOnly;

impl PublishLinkage for RestoreOnly {
    fn publisher() -> &'static LinkagePublisher {
        static PUBLISHER: LazyLock<LinkagePublisher> = LazyLock::new(|| {
            LinkagePublisher::new(1.0).tier(1.0, |t| t.publish::<cap::Restore>(restore))
        });
        &PUBLISHER
    }
}

unsafe extern "C" fn lying_version() -> f64 {
    1.0
}

unsafe extern "C" fn lying_size(_: f64) -> usize {
    1
}

unsafe extern "C" fn lying_fill(_: f64, buffer: *mut LinkTableEntry, _: usize) -> i32 {
    unsafe {
        buffer.write(LinkTableEntry::publish::<cap::Save>(save));
        buffer.add(1).write(LinkTableEntry::publish::<cap::Restore>(restore));
    }
    LinkageStatus::Ok.as_raw()
}

fn attach<P: PublishLinkage>(name: &str, version: f64, binders: &BinderTable) -> Result<ClientInterface> {
    let mut client = ClientInterface::new();
    unsafe { client.attach(name, EntryPoints::of::<P>(), version, binders)? };
    Ok(client)
}

/// Known records bind, the unknown one is skipped without error.
#[test]
fn test_unknown_records_are_skipped() {
    let binders = BinderTable::empty().with(Capability::Save).with(Capability::Restore);
    let client = attach::<ScenarioLibrary>("scenario", 1.0, &binders).unwrap();

    let report = client.report().unwrap();
    assert_eq!(report.published, 3);
    assert_eq!(report.bound, vec![Capability::Save, Capability::Restore]);
    assert_eq!(report.skipped, vec![FUTURE_GUID]);

    let saves = SAVES.load(Ordering::SeqCst);
    let restores = RESTORES.load(Ordering::SeqCst);
    let linkage = client.linkage().unwrap();
    linkage.save().unwrap();
    linkage.restore().unwrap();
    assert!(SAVES.load(Ordering::SeqCst) > saves);
    assert!(RESTORES.load(Ordering::SeqCst) > restores);
}

/// A version the library publishes nothing for yields a valid, empty client.
#[test]
fn test_empty_table_is_valid() {
    let client = attach::<ScenarioLibrary>("scenario", 2.0, &BinderTable::standard()).unwrap();

    assert_eq!(client.state(), LinkState::Bound);
    assert_eq!(client.requested_version(), Some(2.0));
    assert_eq!(client.report().unwrap().published, 0);
    let linkage = client.linkage().unwrap();
    assert!(linkage.is_empty());
    assert!(matches!(linkage.save(), Err(Error::UnboundCapability(Capability::Save))));
}

/// A missing library fails synchronously and leaves nothing behind.
#[test]
fn test_missing_library() {
    let config = ClientConfig::new("missing.lib");
    let err = unsafe { ClientInterface::open(&config, &BinderTable::standard()) }.unwrap_err();
    assert!(matches!(err, Error::Load { ref path, .. } if path.ends_with("missing.lib")));

    let mut client = ClientInterface::new();
    assert!(unsafe { client.initialize(&config, &BinderTable::standard()) }.is_err());
    assert_eq!(client.state(), LinkState::Unloaded);
    assert!(client.library_name().is_none());
    client.terminate();
    client.terminate();
    drop(client);
}

/// A bare name that is not on disk is reported with its platform file name.
#[test]
fn test_missing_bare_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new("ux_missing_renderer").with_search_paths([dir.path()]);
    let err = unsafe { ClientInterface::open(&config, &BinderTable::standard()) }.unwrap_err();
    match err {
        Error::Load { path, version, .. } => {
            assert_eq!(path, std::path::PathBuf::from(libloading::library_filename("ux_missing_renderer")));
            assert_eq!(version, 1.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// A file that is not a shared library fails to load.
#[test]
fn test_not_a_library() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"definitely not an object file").unwrap();

    let config = ClientConfig::new(file.path().to_str().unwrap());
    let err = unsafe { ClientInterface::open(&config, &BinderTable::standard()) }.unwrap_err();
    assert!(matches!(err, Error::Load { .. }));
}

/// Two clients against two libraries bind disjoint slot sets.
#[test]
fn test_independent_clients() {
    let binders = BinderTable::standard();
    let a = attach::<SaveOnly>("save-only", 1.0, &binders).unwrap();
    let b = attach::<RestoreOnly>("restore-only", 1.0, &binders).unwrap();

    assert_eq!(a.linkage().unwrap().bound(), vec![Capability::Save]);
    assert_eq!(b.linkage().unwrap().bound(), vec![Capability::Restore]);
    assert!(a.linkage().unwrap().restore().is_err());
    assert!(b.linkage().unwrap().save().is_err());

    drop(a);
    assert!(b.linkage().unwrap().restore().is_ok());
    assert_eq!(b.library_name(), Some("restore-only"));
}

/// Terminate makes every slot unreachable.
#[test]
fn test_terminate_invalidates_slots() {
    let mut client = attach::<ScenarioLibrary>("scenario", 1.0, &BinderTable::standard()).unwrap();
    assert!(client.has(Capability::Save));

    client.terminate();
    assert_eq!(client.state(), LinkState::Terminated);
    assert!(!client.has(Capability::Save));
    assert!(matches!(client.linkage(), Err(Error::NotBound)));
    assert!(client.report().is_none());
    assert!(client.system_version().is_none());
}

/// Binding the same table twice yields the same slots.
#[test]
fn test_rebind_is_idempotent() {
    let binders = BinderTable::standard();
    let mut client = attach::<ScenarioLibrary>("scenario", 1.0, &binders).unwrap();
    let before = client.linkage().unwrap().bound_pointers();
    let first = client.report().unwrap().clone();

    let second = unsafe { client.rebind(&binders) }.unwrap();
    assert_eq!(first, second);
    assert_eq!(client.linkage().unwrap().bound_pointers(), before);
}

/// A library that writes past the reported size is rejected.
#[test]
fn test_overrun_rejected() {
    let entry_points = EntryPoints {
        system_version: lying_version,
        linkage_size: lying_size,
        fill_linkage: lying_fill,
    };
    let mut client = ClientInterface::new();
    let err = unsafe { client.attach("liar", entry_points, 1.0, &BinderTable::standard()) }.unwrap_err();
    assert!(matches!(err, Error::TableOverrun { count: 1, .. }));
    assert_eq!(client.state(), LinkState::Unloaded);
}

/// Cumulative tiers: newer versions see more capabilities.
#[test]
fn test_versions_add_capabilities() {
    let old = attach::<Renderer>("renderer", 1.0, &BinderTable::standard()).unwrap();
    let new = attach::<Renderer>("renderer", 1.2, &BinderTable::standard()).unwrap();

    assert!(!old.has(Capability::Device));
    assert_eq!(new.system_version(), Some(1.4));
    let linkage = new.linkage().unwrap();
    assert_eq!(linkage.device(1.5, -2.0).unwrap(), (3.0, -4.0));
    assert_eq!(linkage.user(3.0, -4.0).unwrap(), (1.5, -2.0));
}

/// A surface needs stream input.
#[test]
fn test_surface_requires_input_resource() {
    let err = unsafe { SurfaceArea::attach("save-only", EntryPoints::of::<SaveOnly>(), 1.0, &BinderTable::standard()) }
        .unwrap_err();
    match err {
        Error::MissingCapabilities { library, missing, .. } => {
            assert_eq!(library, "save-only");
            assert_eq!(missing, vec![Capability::InputResource]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// An older client that cannot bind stream input fails the same way.
#[test]
fn test_required_capability_unknown_to_binders() {
    let binders = BinderTable::standard().without(Capability::InputResource);
    let err = unsafe { SurfaceArea::attach("renderer", EntryPoints::of::<Renderer>(), 1.0, &binders) }
        .unwrap_err();
    assert!(matches!(err, Error::MissingCapabilities { .. }));
}

/// Streamed values reach the library tagged and intact.
#[test]
fn test_stream_input() {
    let mut surface =
        unsafe { SurfaceArea::attach("renderer", EntryPoints::of::<Renderer>(), 1.0, &BinderTable::standard()) }
            .unwrap();
    take_received();

    let owned = String::from("owned");
    surface
        .stream_input("hello")
        .unwrap()
        .stream_input(&owned)
        .unwrap()
        .stream_input(LineWidth::new(2.5))
        .unwrap()
        .stream_input(SurfaceAreaTitle::new("demo"))
        .unwrap()
        .stream_input(LineDashes::new(vec![4.0, 2.0], 1.0))
        .unwrap()
        .notify_complete()
        .unwrap();

    let received = take_received();
    assert_eq!(received.len(), 5);

    assert_eq!(received[0].payload, alias::RAW_STRING);
    assert_eq!(received[0].ownership, Some(Ownership::Transient));
    assert_eq!(received[0].bytes, b"hello");
    assert_eq!(received[1].bytes, b"owned");

    assert_eq!(received[2].payload, alias::LINE_WIDTH);
    assert_eq!(
        typed_index::decode::<LineWidth>(&received[2].bytes),
        Some(LineWidth::new(2.5))
    );

    assert_eq!(received[3].payload, alias::SURFACE_AREA_TITLE);
    assert_eq!(received[3].bytes, b"demo");

    assert_eq!(received[4].payload, alias::LINE_DASHES);
    assert_eq!(received[4].bytes.len(), 3 * 8);
}

/// Shared payloads are tagged and read under the caller's mutex.
#[test]
fn test_shared_stream_input() {
    let mut surface =
        unsafe { SurfaceArea::attach("renderer", EntryPoints::of::<Renderer>(), 1.0, &BinderTable::standard()) }
            .unwrap();
    take_received();

    let shared = Arc::new(Mutex::new(String::from("shared text")));
    surface.stream_input(&shared).unwrap();
    shared.lock().unwrap().push_str(" changed");
    surface.stream_input(&shared).unwrap();

    let received = take_received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].ownership, Some(Ownership::Shared));
    assert_eq!(received[0].bytes, b"shared text");
    assert_eq!(received[1].bytes, b"shared text changed");
}

/// Closing the surface invalidates streaming.
#[test]
fn test_closed_surface_rejects_input() {
    let mut surface =
        unsafe { SurfaceArea::attach("renderer", EntryPoints::of::<Renderer>(), 1.0, &BinderTable::standard()) }
            .unwrap();
    surface.close();
    assert!(matches!(surface.stream_input("late"), Err(Error::NotBound)));
    assert_eq!(surface.client().state(), LinkState::Terminated);
}

mod exported {
    uxlink::export_linkage!(super::Renderer);
}

/// The exported C symbols answer like the publisher behind them.
#[test]
fn test_exported_entry_points() {
    let entry_points = EntryPoints {
        system_version: exported::system_version,
        linkage_size: exported::guid_interface_linkage_size,
        fill_linkage: exported::guid_interface_linkage,
    };
    let mut client = ClientInterface::new();
    unsafe { client.attach("exported", entry_points, 1.2, &BinderTable::standard()) }.unwrap();

    assert_eq!(client.system_version(), Some(1.4));
    assert_eq!(client.report().unwrap().published, 4);
    assert!(client.has(Capability::User));
}
