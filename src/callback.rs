//! Native notification entry points.
//!
//! The runtime calls these on its own threads with nothing but the object's
//! handle, a status where applicable, and the user data pointer given when the
//! callback was installed. The handle is resolved through the process-wide
//! dispatch table and the wrapper's hooks run on the calling thread.
//!
//! A resolve miss is terminal for that one notification: it is logged and
//! dropped, and never reaches the application's call stack.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

use crate::dispatch;
use crate::error::Result;
use crate::ffi::{ClBuildProgramNotify, ClEvent, ClEventNotify, ClInt, ClProgram};
use crate::types::ExecutionStatus;

/// Deliver a build-finished notification for `program`.
pub fn notify_build_complete(program: ClProgram, user_data: usize) -> Result<()> {
    let program = dispatch::programs().resolve(program)?;
    program.complete_build(user_data);
    Ok(())
}

/// Deliver a status change for `event`.
pub fn notify_event_status(event: ClEvent, status: ExecutionStatus, user_data: usize) -> Result<()> {
    let event = dispatch::events().resolve(event)?;
    event.update_status(status, user_data);
    Ok(())
}

/// Build notification trampoline with the native signature.
pub extern "C" fn build_program_notify(program: *mut c_void, user_data: *mut c_void) {
    let handle = ClProgram::from_ptr(program);
    guarded("build", handle.raw(), || {
        notify_build_complete(handle, user_data as usize)
    });
}

/// Event notification trampoline with the native signature.
pub extern "C" fn event_notify(event: *mut c_void, status: ClInt, user_data: *mut c_void) {
    let handle = ClEvent::from_ptr(event);
    guarded("event", handle.raw(), || {
        notify_event_status(handle, ExecutionStatus::from(status), user_data as usize)
    });
}

/// The build trampoline, ready to hand to the native build call.
pub const BUILD_PROGRAM_NOTIFY: ClBuildProgramNotify = Some(build_program_notify);

/// The event trampoline, ready to hand to the native set-callback call.
pub const EVENT_NOTIFY: ClEventNotify = Some(event_notify);

/// Run a dispatch without letting errors or panics cross the FFI boundary.
fn guarded(what: &'static str, handle: u64, dispatch: impl FnOnce() -> Result<()>) {
    match panic::catch_unwind(AssertUnwindSafe(dispatch)) {
        // Resolve misses are already logged by the dispatch table.
        Ok(_) => {}
        Err(_) => {
            tracing::warn!(notification = what, handle, "completion hook panicked, notification dropped");
        }
    }
}
