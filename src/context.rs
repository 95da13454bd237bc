//! Contexts and the registries they own.
//!
//! A context owns five child registries: command queues, memory objects and
//! samplers are scoped to it; programs and events are shared, because their
//! native notifications cannot name the context.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::Result;
use crate::event::Event;
use crate::ffi::{ClCommandQueue, ClContext, ClDevice, ClEvent, ClMem, ClProgram, ClSampler};
use crate::mem::Mem;
use crate::object::{Lifecycle, ManagedResource};
use crate::owner::{self, impl_owner, Registries, ResourceOwner};
use crate::platform::Platform;
use crate::program::Program;
use crate::queue::CommandQueue;
use crate::registry::HandleRegistry;
use crate::sampler::Sampler;
use crate::types::ResourceKind;

pub(crate) struct ContextRegistries {
    queues: HandleRegistry<CommandQueue>,
    mems: HandleRegistry<Mem>,
    samplers: HandleRegistry<Sampler>,
    programs: HandleRegistry<Program>,
    events: HandleRegistry<Event>,
}

impl ContextRegistries {
    fn new() -> Self {
        Self {
            queues: HandleRegistry::new(),
            mems: HandleRegistry::new(),
            samplers: HandleRegistry::new(),
            programs: HandleRegistry::new(),
            events: HandleRegistry::new(),
        }
    }

    fn detach_all(&self) {
        self.queues.detach_all();
        self.mems.detach_all();
        self.samplers.detach_all();
        self.programs.detach_all();
        self.events.detach_all();
    }
}

/// A native context.
///
/// Children are created through the `adopt_*` methods, which take the handle
/// returned by the native create call and register the new wrapper in one
/// step.
///
/// # Example
///
/// ```
/// use clreg::{ClCommandQueue, ClContext, ClDevice, ClPlatform, Context, Platform};
///
/// let platform = Platform::new(ClPlatform::from_raw(0x1));
/// let ctx = Context::new(ClContext::from_raw(0x100), &platform);
///
/// let queue = ctx.adopt_command_queue(ClCommandQueue::from_raw(0xAAAA), ClDevice::from_raw(0x2))?;
/// let found = ctx.command_queue(ClCommandQueue::from_raw(0xAAAA))?;
/// assert!(std::sync::Arc::ptr_eq(&queue, &found));
/// # Ok::<(), clreg::Error>(())
/// ```
pub struct Context {
    handle: ClContext,
    platform: Weak<Platform>,
    lifecycle: Lifecycle,
    registries: Registries<ContextRegistries>,
}

impl Context {
    /// Wrap a context handle.
    ///
    /// The child registries exist only if `handle` is non-NULL. Contexts are
    /// not registered with their platform; nothing hands out a context handle
    /// except the call that created it.
    pub fn new(handle: ClContext, platform: &Arc<Platform>) -> Arc<Self> {
        let valid = handle.is_valid();
        Arc::new(Self {
            handle,
            platform: Arc::downgrade(platform),
            lifecycle: Lifecycle::new(valid),
            registries: Registries::new(valid, ContextRegistries::new),
        })
    }

    /// The platform this context belongs to, if it is still around.
    pub fn platform(&self) -> Option<Arc<Platform>> {
        self.platform.upgrade()
    }

    /// Add a reference, mirroring a native retain.
    pub fn retain(&self) -> Result<u32> {
        self.lifecycle.retain(Self::KIND, self.handle.raw())
    }

    /// Drop a reference, mirroring a native release.
    ///
    /// On the last reference every scoped child is invalidated and the local
    /// views of programs and events are dropped. Returns `true` when the
    /// native context may be released.
    pub fn release(&self) -> Result<bool> {
        if !self.lifecycle.release(Self::KIND, self.handle.raw())? {
            return Ok(false);
        }
        if let Registries::Live(set) = &self.registries {
            set.detach_all();
        }
        tracing::debug!(handle = self.handle.raw(), "context released");
        Ok(true)
    }

    /// Wrap a command queue created on `device`.
    pub fn adopt_command_queue(
        self: &Arc<Self>,
        handle: ClCommandQueue,
        device: ClDevice,
    ) -> Result<Arc<CommandQueue>> {
        owner::adopt(&**self, handle, || CommandQueue::new(handle, self, device))
    }

    /// Wrap a buffer or image.
    pub fn adopt_mem(self: &Arc<Self>, handle: ClMem) -> Result<Arc<Mem>> {
        owner::adopt(&**self, handle, || Mem::new(handle, self, None))
    }

    /// Wrap a sub-buffer carved out of `parent`.
    pub fn adopt_sub_buffer(self: &Arc<Self>, parent: &Arc<Mem>, handle: ClMem) -> Result<Arc<Mem>> {
        owner::adopt(&**self, handle, || Mem::new(handle, self, Some(parent)))
    }

    /// Wrap a sampler.
    pub fn adopt_sampler(self: &Arc<Self>, handle: ClSampler) -> Result<Arc<Sampler>> {
        owner::adopt(&**self, handle, || Sampler::new(handle, self))
    }

    /// Wrap a program. It becomes resolvable from build notifications.
    pub fn adopt_program(self: &Arc<Self>, handle: ClProgram) -> Result<Arc<Program>> {
        owner::adopt(&**self, handle, || Program::new(handle, self))
    }

    /// Wrap a user event. It becomes resolvable from event notifications.
    pub fn adopt_user_event(self: &Arc<Self>, handle: ClEvent) -> Result<Arc<Event>> {
        owner::adopt(&**self, handle, || Event::new(handle, self, None))
    }

    /// Retrieve a command queue of this context.
    pub fn command_queue(&self, handle: ClCommandQueue) -> Result<Arc<CommandQueue>> {
        ResourceOwner::<CommandQueue>::get_child(self, handle)
    }

    /// Retrieve a memory object of this context.
    pub fn mem(&self, handle: ClMem) -> Result<Arc<Mem>> {
        ResourceOwner::<Mem>::get_child(self, handle)
    }

    /// Retrieve a sampler of this context.
    pub fn sampler(&self, handle: ClSampler) -> Result<Arc<Sampler>> {
        ResourceOwner::<Sampler>::get_child(self, handle)
    }

    /// Retrieve a program created under this context.
    pub fn program(&self, handle: ClProgram) -> Result<Arc<Program>> {
        ResourceOwner::<Program>::get_child(self, handle)
    }

    /// Retrieve an event created under this context.
    pub fn event(&self, handle: ClEvent) -> Result<Arc<Event>> {
        ResourceOwner::<Event>::get_child(self, handle)
    }
}

impl ManagedResource for Context {
    type Handle = ClContext;
    const KIND: ResourceKind = ResourceKind::Context;

    fn handle(&self) -> ClContext {
        self.handle
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl_owner!(Context, CommandQueue, queues);
impl_owner!(Context, Mem, mems);
impl_owner!(Context, Sampler, samplers);
impl_owner!(Context, Program, programs);
impl_owner!(Context, Event, events);

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Context");
        s.field("handle", &self.handle)
            .field("state", &self.lifecycle.state());
        if let Registries::Live(set) = &self.registries {
            s.field("queues", &set.queues.len())
                .field("mems", &set.mems.len())
                .field("samplers", &set.samplers.len())
                .field("programs", &set.programs.len())
                .field("events", &set.events.len());
        }
        s.finish()
    }
}
