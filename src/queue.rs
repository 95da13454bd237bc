//! Command queues.

use std::sync::{Arc, Weak};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::ffi::{ClCommandQueue, ClDevice, ClEvent};
use crate::object::{Lifecycle, ManagedResource};
use crate::owner::{self, impl_child};
use crate::types::ResourceKind;

/// A command queue, scoped to its context.
#[derive(Debug)]
pub struct CommandQueue {
    handle: ClCommandQueue,
    context: Weak<Context>,
    device: ClDevice,
    lifecycle: Lifecycle,
}

impl CommandQueue {
    pub(crate) fn new(handle: ClCommandQueue, context: &Arc<Context>, device: ClDevice) -> Self {
        Self {
            handle,
            context: Arc::downgrade(context),
            device,
            lifecycle: Lifecycle::new(handle.is_valid()),
        }
    }

    /// The owning context, if it is still around.
    pub fn context(&self) -> Option<Arc<Context>> {
        self.context.upgrade()
    }

    /// The device commands on this queue run on.
    pub fn device(&self) -> ClDevice {
        self.device
    }

    /// Wrap the event produced by a command enqueued on this queue.
    ///
    /// The event registers with the queue's context, like any other event, and
    /// keeps a weak link back to this queue.
    pub fn adopt_event(self: &Arc<Self>, handle: ClEvent) -> Result<Arc<Event>> {
        if !self.is_valid() {
            return Err(Error::InvalidOwner {
                owner: ResourceKind::CommandQueue,
                child: ResourceKind::Event,
            });
        }
        let context = self.context().ok_or(Error::InvalidOwner {
            owner: ResourceKind::Context,
            child: ResourceKind::Event,
        })?;
        owner::adopt(&*context, handle, || Event::new(handle, &context, Some(self)))
    }
}

impl_child!(CommandQueue, ClCommandQueue, ResourceKind::CommandQueue, Context, context);
