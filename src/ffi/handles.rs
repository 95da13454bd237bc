//! Handle types for opaque references to native compute objects.
//!
//! Each handle type is a newtype wrapper around u64 to provide type safety.
//! The native layer hands out pointers; a handle is that pointer value widened
//! to 64 bits, with zero reserved for "no object".

use std::ffi::c_void;
use std::fmt::Debug;
use std::hash::Hash;

/// Common behaviour of every typed native handle.
pub trait NativeHandle: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Wrap a raw 64-bit handle value.
    fn from_raw(raw: u64) -> Self;

    /// The raw 64-bit handle value.
    fn raw(self) -> u64;

    /// Check if this handle is valid (non-zero).
    #[inline]
    fn is_valid(&self) -> bool {
        self.raw() != 0
    }
}

/// Macro to define a handle type.
macro_rules! define_handle {
    ($name:ident, $native:literal) => {
        #[doc = concat!("Opaque handle to a native `", $native, "`.")]
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            _h: u64,
        }

        impl $name {
            /// Create an invalid (null) handle.
            #[inline]
            pub const fn invalid() -> Self {
                Self { _h: 0 }
            }

            /// Wrap a raw handle value.
            #[inline]
            pub const fn from_raw(raw: u64) -> Self {
                Self { _h: raw }
            }

            /// Wrap a pointer delivered by the native layer.
            #[inline]
            pub fn from_ptr(ptr: *mut c_void) -> Self {
                Self { _h: ptr as usize as u64 }
            }

            /// The raw handle value.
            #[inline]
            pub const fn raw(&self) -> u64 {
                self._h
            }

            /// Check if this handle is valid (non-zero).
            #[inline]
            pub const fn is_valid(&self) -> bool {
                self._h != 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl NativeHandle for $name {
            #[inline]
            fn from_raw(raw: u64) -> Self {
                Self { _h: raw }
            }

            #[inline]
            fn raw(self) -> u64 {
                self._h
            }
        }
    };
}

define_handle!(ClPlatform, "cl_platform_id");
define_handle!(ClDevice, "cl_device_id");
define_handle!(ClContext, "cl_context");
define_handle!(ClCommandQueue, "cl_command_queue");
define_handle!(ClMem, "cl_mem");
define_handle!(ClSampler, "cl_sampler");
define_handle!(ClProgram, "cl_program");
define_handle!(ClKernel, "cl_kernel");
define_handle!(ClEvent, "cl_event");
