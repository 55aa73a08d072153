//! # Fixture Renderer
//!
//! A minimal rendering library built as a `cdylib`, used by the dynamic
//! loading tests.
//!
//! Version 1.0 publishes `input_resource`, `save`, `restore` and
//! `notify_complete`. Version 1.1 adds `rotate`.
//!
//! Build: `cargo build --example ux_fixture_renderer`

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};
use uxlink::prelude::*;

static SAVES: AtomicU32 = AtomicU32::new(0);
static INPUTS: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn save() {
    SAVES.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn restore() {}

unsafe extern "C" fn rotate(_angle: f64) {}

unsafe extern "C" fn notify_complete() {}

unsafe extern "C" fn input_resource(envelope: *const ResourceEnvelope<'_>) {
    if !envelope.is_null() {
        INPUTS.fetch_add(1, Ordering::SeqCst);
    }
}

/// Number of `save` calls since the library was loaded.
#[unsafe(no_mangle)]
pub extern "C" fn fixture_save_count() -> u32 {
    SAVES.load(Ordering::SeqCst)
}

/// Number of non-null envelopes received since the library was loaded.
#[unsafe(no_mangle)]
pub extern "C" fn fixture_input_count() -> u32 {
    INPUTS.load(Ordering::SeqCst)
}

struct FixtureRenderer;

impl PublishLinkage for FixtureRenderer {
    fn publisher() -> &'static LinkagePublisher {
        static PUBLISHER: LazyLock<LinkagePublisher> = LazyLock::new(|| {
            LinkagePublisher::new(1.1)
                .tier(1.0, |t| {
                    t.publish::<cap::InputResource>(input_resource)
                        .publish::<cap::Save>(save)
                        .publish::<cap::Restore>(restore)
                        .publish::<cap::NotifyComplete>(notify_complete)
                })
                .tier(1.1, |t| t.publish::<cap::Rotate>(rotate))
        });
        &PUBLISHER
    }
}

uxlink::export_linkage!(FixtureRenderer);
