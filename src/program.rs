//! Programs and their kernels.
//!
//! A program is a child of its context, resolvable process-wide so that build
//! notifications can find it, and an owner of the kernels created from it.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::context::Context;
use crate::error::Result;
use crate::ffi::{ClKernel, ClProgram};
use crate::object::Lifecycle;
use crate::owner::{self, impl_child, impl_owner, Registries, ResourceOwner};
use crate::registry::HandleRegistry;
use crate::types::ResourceKind;

/// Hook run when a build started on a program finishes.
///
/// Receives the program and the user data word passed to the build call.
pub type BuildHook = Box<dyn FnOnce(&Program, usize) + Send>;

struct ProgramRegistries {
    kernels: HandleRegistry<Kernel>,
}

/// A program object.
pub struct Program {
    handle: ClProgram,
    context: Weak<Context>,
    lifecycle: Lifecycle,
    registries: Registries<ProgramRegistries>,
    build_hooks: Mutex<Vec<BuildHook>>,
}

impl Program {
    pub(crate) fn new(handle: ClProgram, context: &Arc<Context>) -> Self {
        let valid = handle.is_valid();
        Self {
            handle,
            context: Arc::downgrade(context),
            lifecycle: Lifecycle::new(valid),
            registries: Registries::new(valid, || ProgramRegistries {
                kernels: HandleRegistry::new(),
            }),
            build_hooks: Mutex::new(Vec::new()),
        }
    }

    /// The owning context, if it is still around.
    pub fn context(&self) -> Option<Arc<Context>> {
        self.context.upgrade()
    }

    /// Queue a one-shot hook for the next build notification.
    pub fn on_build_complete<F>(&self, hook: F)
    where
        F: FnOnce(&Program, usize) + Send + 'static,
    {
        self.build_hooks.lock().push(Box::new(hook));
    }

    /// Number of hooks waiting for a build to finish.
    pub fn pending_build_hooks(&self) -> usize {
        self.build_hooks.lock().len()
    }

    /// Run and drain the queued build hooks.
    pub(crate) fn complete_build(&self, user_data: usize) {
        // Taken out first so a hook may queue the next build's hook.
        let hooks = std::mem::take(&mut *self.build_hooks.lock());
        tracing::trace!(handle = self.handle.raw(), hooks = hooks.len(), "build complete");
        for hook in hooks {
            hook(self, user_data);
        }
    }

    /// Wrap a kernel created from this program.
    pub fn adopt_kernel(self: &Arc<Self>, handle: ClKernel) -> Result<Arc<Kernel>> {
        owner::adopt(&**self, handle, || Kernel::new(handle, self))
    }

    /// Retrieve a kernel of this program.
    pub fn kernel(&self, handle: ClKernel) -> Result<Arc<Kernel>> {
        self.get_child(handle)
    }
}

impl_child!(
    Program,
    ClProgram,
    ResourceKind::Program,
    Context,
    context,
    dispatch = crate::dispatch::programs
);
impl_owner!(Program, Kernel, kernels);

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.handle)
            .field("state", &self.lifecycle.state())
            .field("pending_build_hooks", &self.pending_build_hooks())
            .finish_non_exhaustive()
    }
}

/// A kernel, scoped to its program.
#[derive(Debug)]
pub struct Kernel {
    handle: ClKernel,
    program: Weak<Program>,
    lifecycle: Lifecycle,
}

impl Kernel {
    fn new(handle: ClKernel, program: &Arc<Program>) -> Self {
        Self {
            handle,
            program: Arc::downgrade(program),
            lifecycle: Lifecycle::new(handle.is_valid()),
        }
    }

    /// The program this kernel came from, if it is still around.
    pub fn program(&self) -> Option<Arc<Program>> {
        self.program.upgrade()
    }
}

impl_child!(Kernel, ClKernel, ResourceKind::Kernel, Program, program);
