//! Samplers.

use std::sync::{Arc, Weak};

use crate::context::Context;
use crate::ffi::ClSampler;
use crate::object::Lifecycle;
use crate::owner::impl_child;
use crate::types::ResourceKind;

/// A sampler, scoped to its context.
#[derive(Debug)]
pub struct Sampler {
    handle: ClSampler,
    context: Weak<Context>,
    lifecycle: Lifecycle,
}

impl Sampler {
    pub(crate) fn new(handle: ClSampler, context: &Arc<Context>) -> Self {
        Self {
            handle,
            context: Arc::downgrade(context),
            lifecycle: Lifecycle::new(handle.is_valid()),
        }
    }

    /// The owning context, if it is still around.
    pub fn context(&self) -> Option<Arc<Context>> {
        self.context.upgrade()
    }
}

impl_child!(Sampler, ClSampler, ResourceKind::Sampler, Context, context);
