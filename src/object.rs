//! The wrapper side of a native handle.
//!
//! Every wrapper type implements [`ManagedResource`] and embeds a
//! [`Lifecycle`], which tracks validity and mirrors the native reference count.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::dispatch::CallbackDispatchTable;
use crate::error::{Error, Result};
use crate::ffi::NativeHandle;
use crate::types::{LifecycleState, ResourceKind};

/// A managed wrapper for one native object.
pub trait ManagedResource: Send + Sync + Sized + 'static {
    /// Typed native handle.
    type Handle: NativeHandle;

    /// Kind of native object.
    const KIND: ResourceKind;

    /// The wrapped native handle.
    fn handle(&self) -> Self::Handle;

    /// Validity and reference count.
    fn lifecycle(&self) -> &Lifecycle;

    /// Process-wide table for kinds resolved from native notifications.
    ///
    /// Owners build a shared registry for kinds that return a table here and a
    /// scoped one for everything else.
    fn dispatch_table() -> Option<&'static CallbackDispatchTable<Self>> {
        None
    }

    /// Check if the wrapper is live.
    fn is_valid(&self) -> bool {
        self.lifecycle().is_valid()
    }

    /// Current lifecycle state.
    fn state(&self) -> LifecycleState {
        self.lifecycle().state()
    }
}

const UNINITIALIZED: u8 = 0;
const VALID: u8 = 1;
const INVALIDATED: u8 = 2;

/// Lifecycle state machine plus native-style reference count.
///
/// `Uninitialized -> Valid -> Invalidated`; no transition leaves a terminal
/// state.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
    refs: AtomicU32,
}

impl Lifecycle {
    /// Start `Valid` with one reference, or `Uninitialized` for a NULL handle.
    pub(crate) fn new(valid: bool) -> Self {
        if valid {
            Self {
                state: AtomicU8::new(VALID),
                refs: AtomicU32::new(1),
            }
        } else {
            Self {
                state: AtomicU8::new(UNINITIALIZED),
                refs: AtomicU32::new(0),
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            VALID => LifecycleState::Valid,
            INVALIDATED => LifecycleState::Invalidated,
            _ => LifecycleState::Uninitialized,
        }
    }

    /// Check if the wrapper is live.
    pub fn is_valid(&self) -> bool {
        self.state.load(Ordering::Acquire) == VALID
    }

    /// Outstanding references.
    pub fn ref_count(&self) -> u32 {
        self.refs.load(Ordering::Acquire)
    }

    /// Add a reference. Returns the new count.
    pub(crate) fn retain(&self, kind: ResourceKind, handle: u64) -> Result<u32> {
        match self.state() {
            LifecycleState::Uninitialized => return Err(Error::InvalidHandle { kind }),
            LifecycleState::Invalidated => return Err(Error::AlreadyReleased { kind, handle }),
            LifecycleState::Valid => {}
        }
        self.refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n == 0 {
                    None
                } else {
                    n.checked_add(1)
                }
            })
            .map(|prev| prev + 1)
            .map_err(|_| Error::AlreadyReleased { kind, handle })
    }

    /// Drop a reference. Returns `true` when that was the last one; the
    /// wrapper is then invalidated.
    ///
    /// A wrapper invalidated by owner teardown still counts down, so callers
    /// balance their native references either way.
    pub(crate) fn release(&self, kind: ResourceKind, handle: u64) -> Result<bool> {
        if self.state() == LifecycleState::Uninitialized {
            return Err(Error::InvalidHandle { kind });
        }
        let prev = self
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map_err(|_| Error::AlreadyReleased { kind, handle })?;
        if prev == 1 {
            self.invalidate();
            return Ok(true);
        }
        Ok(false)
    }

    /// Move `Valid -> Invalidated`. Returns `true` if this call did it.
    pub(crate) fn invalidate(&self) -> bool {
        self.state
            .compare_exchange(VALID, INVALIDATED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: ResourceKind = ResourceKind::Sampler;

    #[test]
    fn test_null_handle_never_leaves_uninitialized() {
        let lc = Lifecycle::new(false);
        assert_eq!(lc.state(), LifecycleState::Uninitialized);
        assert_eq!(lc.retain(KIND, 0), Err(Error::InvalidHandle { kind: KIND }));
        assert_eq!(lc.release(KIND, 0), Err(Error::InvalidHandle { kind: KIND }));
        assert!(!lc.invalidate());
        assert_eq!(lc.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_release_to_zero_invalidates() {
        let lc = Lifecycle::new(true);
        assert_eq!(lc.retain(KIND, 7), Ok(2));
        assert_eq!(lc.release(KIND, 7), Ok(false));
        assert!(lc.is_valid());
        assert_eq!(lc.release(KIND, 7), Ok(true));
        assert_eq!(lc.state(), LifecycleState::Invalidated);
        assert_eq!(
            lc.release(KIND, 7),
            Err(Error::AlreadyReleased { kind: KIND, handle: 7 })
        );
        assert_eq!(
            lc.retain(KIND, 7),
            Err(Error::AlreadyReleased { kind: KIND, handle: 7 })
        );
    }

    #[test]
    fn test_invalidated_by_teardown_still_counts_down() {
        let lc = Lifecycle::new(true);
        lc.retain(KIND, 1).unwrap();
        assert!(lc.invalidate());
        assert!(lc.retain(KIND, 1).is_err());
        assert_eq!(lc.release(KIND, 1), Ok(false));
        assert_eq!(lc.release(KIND, 1), Ok(true));
        assert_eq!(lc.ref_count(), 0);
    }
}
