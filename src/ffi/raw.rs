//! Raw native constants and callback signatures.
//!
//! Only the pieces of the native API that the registry layer touches live
//! here: status codes, command execution states, and the notification
//! function pointer types the runtime invokes on its own threads.

use std::os::raw::{c_int, c_void};

/// Status code returned by native calls.
pub type ClInt = c_int;

// Status codes
pub const CL_SUCCESS: ClInt = 0;
pub const CL_DEVICE_NOT_FOUND: ClInt = -1;
pub const CL_DEVICE_NOT_AVAILABLE: ClInt = -2;
pub const CL_COMPILER_NOT_AVAILABLE: ClInt = -3;
pub const CL_MEM_OBJECT_ALLOCATION_FAILURE: ClInt = -4;
pub const CL_OUT_OF_RESOURCES: ClInt = -5;
pub const CL_OUT_OF_HOST_MEMORY: ClInt = -6;
pub const CL_BUILD_PROGRAM_FAILURE: ClInt = -11;
pub const CL_INVALID_VALUE: ClInt = -30;
pub const CL_INVALID_PLATFORM: ClInt = -32;
pub const CL_INVALID_DEVICE: ClInt = -33;
pub const CL_INVALID_CONTEXT: ClInt = -34;
pub const CL_INVALID_COMMAND_QUEUE: ClInt = -36;
pub const CL_INVALID_MEM_OBJECT: ClInt = -38;
pub const CL_INVALID_SAMPLER: ClInt = -41;
pub const CL_INVALID_PROGRAM: ClInt = -44;
pub const CL_INVALID_KERNEL: ClInt = -48;
pub const CL_INVALID_EVENT: ClInt = -58;

// Command execution status values
pub const CL_COMPLETE: ClInt = 0x0;
pub const CL_RUNNING: ClInt = 0x1;
pub const CL_SUBMITTED: ClInt = 0x2;
pub const CL_QUEUED: ClInt = 0x3;

/// Program build notification: `(program, user_data)`.
pub type ClBuildProgramNotify =
    Option<unsafe extern "C" fn(program: *mut c_void, user_data: *mut c_void)>;

/// Event status notification: `(event, command_exec_status, user_data)`.
pub type ClEventNotify =
    Option<unsafe extern "C" fn(event: *mut c_void, status: ClInt, user_data: *mut c_void)>;
