//! Process-wide callback dispatch tables.
//!
//! Native build and event notifications run on a runtime-owned thread and
//! carry only the object's own handle plus a user data word. There is no
//! context handle to pick a per-context registry with, so programs and events
//! are additionally registered in one table per kind that lives for the whole
//! process. Everything else stays scoped to its owner.
//!
//! The tables are created on first use, or by [`crate::init`], and are never
//! torn down. Entries leave only through an explicit unregister when the
//! native object is released.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::event::Event;
use crate::ffi::NativeHandle;
use crate::object::ManagedResource;
use crate::program::Program;
use crate::types::DispatchOptions;

static OPTIONS: OnceLock<DispatchOptions> = OnceLock::new();
static PROGRAMS: OnceLock<CallbackDispatchTable<Program>> = OnceLock::new();
static EVENTS: OnceLock<CallbackDispatchTable<Event>> = OnceLock::new();

fn options() -> DispatchOptions {
    *OPTIONS.get_or_init(DispatchOptions::default)
}

/// The process-wide program table, consulted by build notifications.
pub fn programs() -> &'static CallbackDispatchTable<Program> {
    PROGRAMS.get_or_init(|| CallbackDispatchTable::new(options()))
}

/// The process-wide event table, consulted by event status notifications.
pub fn events() -> &'static CallbackDispatchTable<Event> {
    EVENTS.get_or_init(|| CallbackDispatchTable::new(options()))
}

/// Fix the options and bring both tables up.
pub(crate) fn configure(opts: DispatchOptions) -> Result<()> {
    OPTIONS.set(opts).map_err(|_| Error::AlreadyInitialized)?;
    programs();
    events();
    tracing::debug!(
        initial_capacity = opts.initial_capacity,
        released_history = opts.released_history,
        "dispatch tables initialized"
    );
    Ok(())
}

/// Handle-keyed table shared by every owner in the process.
pub struct CallbackDispatchTable<T: ManagedResource> {
    inner: RwLock<TableState<T>>,
    history: usize,
}

struct TableState<T: ManagedResource> {
    live: HashMap<T::Handle, Arc<T>>,
    /// Recently unregistered handles, newest sequence number per handle.
    released: HashMap<T::Handle, u64>,
    order: VecDeque<(T::Handle, u64)>,
    seq: u64,
}

impl<T: ManagedResource> CallbackDispatchTable<T> {
    /// Create an empty table.
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            inner: RwLock::new(TableState {
                live: HashMap::with_capacity(options.initial_capacity),
                released: HashMap::new(),
                order: VecDeque::new(),
                seq: 0,
            }),
            history: options.released_history,
        }
    }

    /// Make `resource` resolvable by its handle.
    ///
    /// Only `HandleRegistry` writes here, so the table and every owner's view
    /// change together.
    pub(crate) fn register(&self, resource: Arc<T>) -> Result<()> {
        let handle = resource.handle();
        if !handle.is_valid() {
            return Err(Error::InvalidHandle { kind: T::KIND });
        }
        let mut state = self.inner.write();
        if state.live.contains_key(&handle) {
            return Err(Error::DuplicateHandle {
                kind: T::KIND,
                handle: handle.raw(),
            });
        }
        // The native layer may reuse a value once it has been released.
        state.released.remove(&handle);
        state.live.insert(handle, resource);
        tracing::trace!(kind = %T::KIND, handle = handle.raw(), "registered for dispatch");
        Ok(())
    }

    /// Detach `handle`. No-op if absent.
    pub(crate) fn unregister(&self, handle: T::Handle) -> Option<Arc<T>> {
        let mut state = self.inner.write();
        let removed = state.live.remove(&handle)?;
        if self.history > 0 {
            state.seq += 1;
            let seq = state.seq;
            state.released.insert(handle, seq);
            state.order.push_back((handle, seq));
            while state.order.len() > self.history {
                if let Some((old, old_seq)) = state.order.pop_front() {
                    if state.released.get(&old) == Some(&old_seq) {
                        state.released.remove(&old);
                    }
                }
            }
        }
        tracing::trace!(kind = %T::KIND, handle = handle.raw(), "unregistered from dispatch");
        Some(removed)
    }

    /// Resolve a handle delivered by a native notification.
    ///
    /// Never blocks on a miss. A handle released moments ago is a benign race
    /// with the notification thread and is logged quietly; a handle that was
    /// never registered is logged as an error.
    pub fn resolve(&self, handle: T::Handle) -> Result<Arc<T>> {
        let state = self.inner.read();
        if let Some(resource) = state.live.get(&handle) {
            return Ok(Arc::clone(resource));
        }
        let released = state.released.contains_key(&handle);
        drop(state);

        if released {
            tracing::debug!(
                kind = %T::KIND,
                handle = handle.raw(),
                "notification arrived after release, dropping"
            );
        } else {
            tracing::error!(
                kind = %T::KIND,
                handle = handle.raw(),
                "notification for a handle that was never registered"
            );
        }
        Err(Error::UnknownCallbackHandle {
            kind: T::KIND,
            handle: handle.raw(),
            released,
        })
    }

    /// Plain lookup, absent is not an error.
    pub fn lookup(&self, handle: T::Handle) -> Option<Arc<T>> {
        self.inner.read().live.get(&handle).cloned()
    }

    /// Check if `handle` is currently registered.
    pub fn contains(&self, handle: T::Handle) -> bool {
        self.inner.read().live.contains_key(&handle)
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.inner.read().live.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ManagedResource> fmt::Debug for CallbackDispatchTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("CallbackDispatchTable")
            .field("kind", &T::KIND)
            .field("live", &state.live.len())
            .field("released", &state.released.len())
            .finish()
    }
}
