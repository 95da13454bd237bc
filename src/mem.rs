//! Memory objects.

use std::sync::{Arc, Weak};

use crate::context::Context;
use crate::ffi::ClMem;
use crate::object::Lifecycle;
use crate::owner::impl_child;
use crate::types::ResourceKind;

/// A buffer or image, scoped to its context.
#[derive(Debug)]
pub struct Mem {
    handle: ClMem,
    context: Weak<Context>,
    parent: Option<Weak<Mem>>,
    lifecycle: Lifecycle,
}

impl Mem {
    pub(crate) fn new(handle: ClMem, context: &Arc<Context>, parent: Option<&Arc<Mem>>) -> Self {
        Self {
            handle,
            context: Arc::downgrade(context),
            parent: parent.map(Arc::downgrade),
            lifecycle: Lifecycle::new(handle.is_valid()),
        }
    }

    /// The owning context, if it is still around.
    pub fn context(&self) -> Option<Arc<Context>> {
        self.context.upgrade()
    }

    /// The buffer this one was carved out of, if it is a sub-buffer.
    pub fn parent(&self) -> Option<Arc<Mem>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Check if this is a sub-buffer.
    pub fn is_sub_buffer(&self) -> bool {
        self.parent.is_some()
    }
}

impl_child!(Mem, ClMem, ResourceKind::Mem, Context, context);
