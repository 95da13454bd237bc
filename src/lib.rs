//! Object identity and lifetime bookkeeping for OpenCL-style native handles.
//!
//! This crate sits between a native compute API that hands out opaque handles
//! (contexts, command queues, memory objects, samplers, programs, events) and
//! the Rust wrappers for them. Given a handle returned by a native call it
//! produces exactly one wrapper, and makes that same wrapper reachable again
//! from the handle later, without ever keeping two live wrappers for one
//! native object.
//!
//! Most kinds are looked up through their owner: a context keeps one
//! [`HandleRegistry`] per child kind. Programs and events are also entered in
//! a process-wide [`CallbackDispatchTable`], because build and event
//! notifications carry only the object's own handle and no context.
//!
//! # Example
//!
//! ```
//! use clreg::{ClContext, ClPlatform, ClProgram, Context, Platform};
//!
//! let platform = Platform::new(ClPlatform::from_raw(0x1));
//! let ctx = Context::new(ClContext::from_raw(0x10), &platform);
//!
//! // The native create call returned 0xBEEF.
//! let program = ctx.adopt_program(ClProgram::from_raw(0xBEEF))?;
//! program.on_build_complete(|p, _user_data| {
//!     println!("built {:?}", p);
//! });
//!
//! // Later, on the runtime's thread, with no context in sight:
//! clreg::callback::notify_build_complete(ClProgram::from_raw(0xBEEF), 0)?;
//!
//! assert!(program.release()?);
//! # Ok::<(), clreg::Error>(())
//! ```
//!
//! The native binding itself (create and release calls, info queries,
//! enumeration) is not part of this crate. Binding code passes the handles it
//! gets into the `adopt_*` methods and mirrors native retain/release through
//! the wrappers.

pub mod callback;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod ffi;
pub mod mem;
pub mod object;
mod owner;
pub mod platform;
pub mod program;
pub mod queue;
pub mod registry;
pub mod sampler;
pub mod types;

// Re-export main types at the crate root
pub use context::Context;
pub use dispatch::CallbackDispatchTable;
pub use error::{Error, Result};
pub use event::{Event, EventHook};
pub use ffi::{
    ClCommandQueue, ClContext, ClDevice, ClEvent, ClKernel, ClMem, ClPlatform, ClProgram,
    ClSampler, NativeHandle,
};
pub use mem::Mem;
pub use object::{Lifecycle, ManagedResource};
pub use owner::ResourceOwner;
pub use platform::{Device, Platform};
pub use program::{BuildHook, Kernel, Program};
pub use queue::CommandQueue;
pub use registry::HandleRegistry;
pub use sampler::Sampler;
pub use types::{DispatchOptions, ExecutionStatus, LifecycleState, ResourceKind, Scope};

/// Apply options to the process-wide dispatch tables and bring them up.
///
/// Optional; the tables otherwise start with [`DispatchOptions::default`] on
/// first use. Fails with [`Error::AlreadyInitialized`] once they exist.
pub fn init(options: DispatchOptions) -> Result<()> {
    dispatch::configure(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_after_first_use_fails() {
        dispatch::programs();
        assert_eq!(init(DispatchOptions::default()), Err(Error::AlreadyInitialized));
    }
}
