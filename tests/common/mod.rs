//! Stand-in for the native runtime.
//!
//! Hands out handle values the way a driver would and reports failures as
//! status codes, so tests drive the registry exactly like binding code does.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use clreg::ffi::{check_error, ClInt, CL_SUCCESS};

/// A fake runtime with its own handle range.
pub struct FakeRuntime {
    next: AtomicU64,
}

impl FakeRuntime {
    /// Start allocating at `base`. Give every test file its own base so the
    /// process-wide tables never see the same value from two tests.
    pub const fn new(base: u64) -> Self {
        Self {
            next: AtomicU64::new(base),
        }
    }

    /// Simulate a successful create call.
    pub fn create(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Simulate a create call that reports `status`, returning NULL on
    /// failure like the native API does.
    pub fn create_with_status(&self, status: ClInt) -> (u64, ClInt) {
        if status == CL_SUCCESS {
            (self.create(), status)
        } else {
            (0, status)
        }
    }
}

/// Run a create call and map its status the way binding code would.
pub fn checked(call: (u64, ClInt)) -> clreg::Result<u64> {
    check_error(call.1)?;
    Ok(call.0)
}
