//! # Inspect Library
//!
//! Load a rendering library, negotiate a version and print what it
//! publishes.
//!
//! ```text
//! [client] ── size query, fill ──▶ [libux_render.so]
//! ```
//!
//! Run: `cargo run --example inspect_library -- ./libux_render.so 1.0`
//!
//! Without arguments the demo negotiates with a publisher linked into the
//! demo itself.

use std::env;
use std::sync::LazyLock;
use uxlink::prelude::*;

unsafe extern "C" fn save() {}
unsafe extern "C" fn restore() {}
unsafe extern "C" fn rotate(_angle: f64) {}
unsafe extern "C" fn input_resource(_envelope: *const ResourceEnvelope<'_>) {}

struct Builtin;

impl PublishLinkage for Builtin {
    fn publisher() -> &'static LinkagePublisher {
        static PUBLISHER: LazyLock<LinkagePublisher> = LazyLock::new(|| {
            LinkagePublisher::new(1.1)
                .tier(1.0, |t| {
                    t.publish::<cap::InputResource>(input_resource)
                        .publish::<cap::Save>(save)
                        .publish::<cap::Restore>(restore)
                })
                .tier(1.1, |t| t.publish::<cap::Rotate>(rotate))
        });
        &PUBLISHER
    }
}

fn print_client(client: &ClientInterface) -> Result<()> {
    let report = client.report().ok_or(Error::NotBound)?;
    println!("library:          {}", client.library_name().unwrap_or("?"));
    println!("system version:   {:?}", client.system_version());
    println!("requested:        {:?}", client.requested_version());
    println!("records:          {}", report.published);
    for cap in &report.bound {
        println!("  bound    {:<32} {}", cap.name(), cap.guid());
    }
    for guid in &report.skipped {
        println!("  skipped  {guid}");
    }
    if report.foreign_records > 0 {
        println!("  {} records in an unknown format", report.foreign_records);
    }
    for cap in &report.null_pointers {
        println!("  null     {}", cap.name());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("uxlink=info")
        .init();

    let args: Vec<String> = env::args().collect();
    let binders = BinderTable::standard();

    let client = match args.get(1) {
        Some(library) => {
            let version = match args.get(2) {
                Some(v) => v.parse().unwrap_or_else(|_| {
                    println!("Usage: {} [library] [version]", args[0]);
                    std::process::exit(2);
                }),
                None => 1.0,
            };
            let config = ClientConfig::new(library.as_str()).with_version(version);
            // SAFETY: The user vouches for the library passed on the command line.
            unsafe { ClientInterface::open(&config, &binders)? }
        }
        None => {
            let mut client = ClientInterface::new();
            // SAFETY: `Builtin` publishes functions with matching signatures.
            unsafe { client.attach("builtin", EntryPoints::of::<Builtin>(), 1.1, &binders)? };
            client
        }
    };

    print_client(&client)
}
