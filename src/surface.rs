//! A drawable surface backed by a bound library.

use crate::client::{ClientConfig, ClientInterface};
use crate::error::Result;
use crate::linkage::{BinderTable, Capability, EntryPoints, LibraryLinkage};
use crate::resource::StreamInput;

/// A client interface that accepts streamed input.
///
/// Opening fails unless the library publishes `input_resource`.
///
/// ```rust,ignore
/// use uxlink::prelude::*;
///
/// let mut surface = unsafe { SurfaceArea::open(&ClientConfig::new("ux_render"), &BinderTable::standard())? };
/// surface
///     .stream_input(SurfaceAreaTitle::new("demo"))?
///     .stream_input(LineWidth::new(2.0))?
///     .stream_input("hello")?
///     .notify_complete()?;
/// ```
#[derive(Debug)]
pub struct SurfaceArea {
    client: ClientInterface,
}

impl SurfaceArea {
    /// Load and bind the configured library.
    ///
    /// # Safety
    ///
    /// See [`ClientInterface::initialize`].
    pub unsafe fn open(config: &ClientConfig, binders: &BinderTable) -> Result<Self> {
        let config = config.clone().require(Capability::InputResource);
        // SAFETY: Forwarded from the caller.
        let client = unsafe { ClientInterface::open(&config, binders)? };
        Ok(Self { client })
    }

    /// Bind entry points linked into the process.
    ///
    /// # Safety
    ///
    /// See [`ClientInterface::attach`].
    pub unsafe fn attach(name: &str, entry_points: EntryPoints, version: f64, binders: &BinderTable) -> Result<Self> {
        let mut client = ClientInterface::new().with_required([Capability::InputResource]);
        // SAFETY: Forwarded from the caller.
        unsafe { client.attach(name, entry_points, version, binders)? };
        Ok(Self { client })
    }

    /// Wrap an existing client. `input_resource` is not checked here.
    pub fn from_client(client: ClientInterface) -> Self {
        Self { client }
    }

    /// Stream one value to the library.
    pub fn stream_input(&mut self, input: impl StreamInput) -> Result<&mut Self> {
        input.stream_into(self.client.linkage()?)?;
        Ok(self)
    }

    /// Tell the library a batch of input is complete.
    pub fn notify_complete(&mut self) -> Result<&mut Self> {
        self.client.linkage()?.notify_complete()?;
        Ok(self)
    }

    /// The bound capability slots.
    pub fn linkage(&self) -> Result<&LibraryLinkage> {
        self.client.linkage()
    }

    /// The underlying client.
    pub fn client(&self) -> &ClientInterface {
        &self.client
    }

    /// Unload the library.
    pub fn close(&mut self) {
        self.client.terminate();
    }

    /// Give back the client.
    pub fn into_client(self) -> ClientInterface {
        self.client
    }
}
