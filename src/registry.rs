//! Handle to wrapper registries.
//!
//! A [`HandleRegistry`] maps native handles of one kind to the single live
//! wrapper for each. Two backings share the same interface:
//!
//! - *scoped*: the map belongs to one owner. When the owner goes away the
//!   registry invalidates every child still in it.
//! - *shared*: the owner keeps a local view of the children it created, and
//!   every insert and remove is mirrored into a process-wide
//!   [`CallbackDispatchTable`]. Owner teardown drops only the local view; the
//!   table entry stays until the native object is released.
//!
//! The backing is picked once, at construction, from
//! [`ManagedResource::dispatch_table`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dispatch::CallbackDispatchTable;
use crate::error::{Error, Result};
use crate::ffi::NativeHandle;
use crate::object::ManagedResource;
use crate::types::Scope;

enum Backing<T: ManagedResource> {
    Scoped,
    Shared(&'static CallbackDispatchTable<T>),
}

/// Registry of live wrappers of one kind.
pub struct HandleRegistry<T: ManagedResource> {
    local: RwLock<HashMap<T::Handle, Arc<T>>>,
    backing: Backing<T>,
}

impl<T: ManagedResource> HandleRegistry<T> {
    /// Create a registry with the backing the kind calls for.
    pub fn new() -> Self {
        debug_assert_eq!(
            T::dispatch_table().is_some(),
            T::KIND.scope() == Scope::Process,
            "{} dispatch table disagrees with its scope",
            T::KIND
        );
        match T::dispatch_table() {
            Some(table) => Self::shared(table),
            None => Self::scoped(),
        }
    }

    /// Create an owner-private registry.
    pub fn scoped() -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            backing: Backing::Scoped,
        }
    }

    /// Create a registry that writes through to `table`.
    pub fn shared(table: &'static CallbackDispatchTable<T>) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            backing: Backing::Shared(table),
        }
    }

    /// Check if inserts are mirrored into a process-wide table.
    pub fn is_shared(&self) -> bool {
        matches!(self.backing, Backing::Shared(_))
    }

    /// Register `resource` under its own handle.
    ///
    /// Fails with `DuplicateHandle` if the handle is already present, here or
    /// in the shared table; the existing mapping is left untouched.
    pub fn insert(&self, resource: Arc<T>) -> Result<()> {
        let handle = resource.handle();
        if !handle.is_valid() {
            return Err(Error::InvalidHandle { kind: T::KIND });
        }
        let mut local = self.local.write();
        if local.contains_key(&handle) {
            return Err(duplicate::<T>(handle));
        }
        if let Backing::Shared(table) = self.backing {
            table.register(Arc::clone(&resource))?;
        }
        local.insert(handle, resource);
        tracing::trace!(kind = %T::KIND, handle = handle.raw(), shared = self.is_shared(), "registered");
        Ok(())
    }

    /// Return the wrapper for `handle`, building and registering one on first
    /// sight.
    ///
    /// Used for handles that come out of enumeration, where seeing the same
    /// handle twice is expected. Fails with `InvalidHandle`, registering
    /// nothing, if `build` returns a wrapper for another handle.
    pub fn get_or_insert_with(&self, handle: T::Handle, build: impl FnOnce() -> T) -> Result<Arc<T>> {
        if !handle.is_valid() {
            return Err(Error::InvalidHandle { kind: T::KIND });
        }
        if let Some(existing) = self.lookup(handle) {
            return Ok(existing);
        }
        let mut local = self.local.write();
        // Another thread may have won between the read and the write lock.
        if let Some(existing) = local.get(&handle) {
            return Ok(Arc::clone(existing));
        }
        let resource = Arc::new(build());
        if resource.handle() != handle {
            tracing::error!(
                kind = %T::KIND,
                handle = handle.raw(),
                built = resource.handle().raw(),
                "wrapper built for a different handle"
            );
            return Err(Error::InvalidHandle { kind: T::KIND });
        }
        if let Backing::Shared(table) = self.backing {
            table.register(Arc::clone(&resource))?;
        }
        local.insert(handle, Arc::clone(&resource));
        tracing::trace!(kind = %T::KIND, handle = handle.raw(), "registered on first sight");
        Ok(resource)
    }

    /// Look up `handle`. Absent is not an error.
    pub fn lookup(&self, handle: T::Handle) -> Option<Arc<T>> {
        self.local.read().get(&handle).cloned()
    }

    /// Detach `handle`. No-op if absent.
    pub fn remove(&self, handle: T::Handle) -> Option<Arc<T>> {
        let mut local = self.local.write();
        let removed = local.remove(&handle)?;
        if let Backing::Shared(table) = self.backing {
            table.unregister(handle);
        }
        tracing::trace!(kind = %T::KIND, handle = handle.raw(), "unregistered");
        Some(removed)
    }

    /// Check if `handle` is registered.
    pub fn contains(&self, handle: T::Handle) -> bool {
        self.local.read().contains_key(&handle)
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.local.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.local.read().is_empty()
    }

    /// Snapshot of the registered handles, in no particular order.
    pub fn handles(&self) -> Vec<T::Handle> {
        self.local.read().keys().copied().collect()
    }

    /// Empty the registry as part of owner teardown.
    pub(crate) fn detach_all(&self) {
        let drained: Vec<_> = self.local.write().drain().collect();
        self.finish_detach(drained);
    }

    fn finish_detach(&self, drained: Vec<(T::Handle, Arc<T>)>) {
        if drained.is_empty() {
            return;
        }
        match self.backing {
            Backing::Scoped => {
                for (_, child) in &drained {
                    child.lifecycle().invalidate();
                }
                tracing::debug!(kind = %T::KIND, count = drained.len(), "owner gone, children invalidated");
            }
            Backing::Shared(_) => {
                tracing::debug!(kind = %T::KIND, count = drained.len(), "owner gone, local view dropped");
            }
        }
    }
}

impl<T: ManagedResource> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ManagedResource> Drop for HandleRegistry<T> {
    fn drop(&mut self) {
        let drained: Vec<_> = self.local.get_mut().drain().collect();
        self.finish_detach(drained);
    }
}

impl<T: ManagedResource> fmt::Debug for HandleRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("kind", &T::KIND)
            .field("shared", &self.is_shared())
            .field("len", &self.len())
            .finish()
    }
}

fn duplicate<T: ManagedResource>(handle: T::Handle) -> Error {
    Error::DuplicateHandle {
        kind: T::KIND,
        handle: handle.raw(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::ffi::ClKernel;
    use crate::object::Lifecycle;
    use crate::types::{DispatchOptions, LifecycleState, ResourceKind};

    #[derive(Debug)]
    struct Stub {
        handle: ClKernel,
        lifecycle: Lifecycle,
    }

    impl ManagedResource for Stub {
        type Handle = ClKernel;
        const KIND: ResourceKind = ResourceKind::Kernel;

        fn handle(&self) -> ClKernel {
            self.handle
        }

        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }
    }

    fn stub(raw: u64) -> Stub {
        Stub {
            handle: ClKernel::from_raw(raw),
            lifecycle: Lifecycle::new(raw != 0),
        }
    }

    static TABLE: LazyLock<CallbackDispatchTable<Stub>> =
        LazyLock::new(|| CallbackDispatchTable::new(DispatchOptions::default()));

    #[test]
    fn test_kind_without_table_is_scoped() {
        assert!(!HandleRegistry::<Stub>::new().is_shared());
        assert!(HandleRegistry::shared(&*TABLE).is_shared());
    }

    #[test]
    fn test_lookup_returns_same_instance() {
        let reg = HandleRegistry::scoped();
        let p = Arc::new(stub(0xAAAA));
        reg.insert(Arc::clone(&p)).unwrap();
        let found = reg.lookup(ClKernel::from_raw(0xAAAA)).unwrap();
        assert!(Arc::ptr_eq(&p, &found));
        assert!(reg.lookup(ClKernel::from_raw(0xBBBB)).is_none());
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let reg = HandleRegistry::scoped();
        let first = Arc::new(stub(0x10));
        reg.insert(Arc::clone(&first)).unwrap();
        let err = reg.insert(Arc::new(stub(0x10))).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateHandle {
                kind: ResourceKind::Kernel,
                handle: 0x10
            }
        );
        assert!(Arc::ptr_eq(&reg.lookup(ClKernel::from_raw(0x10)).unwrap(), &first));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let reg = HandleRegistry::scoped();
        reg.insert(Arc::new(stub(0x20))).unwrap();
        assert!(reg.remove(ClKernel::from_raw(0x20)).is_some());
        assert!(reg.lookup(ClKernel::from_raw(0x20)).is_none());
        assert!(reg.remove(ClKernel::from_raw(0x20)).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_null_handle_not_registered() {
        let reg = HandleRegistry::scoped();
        assert_eq!(
            reg.insert(Arc::new(stub(0))),
            Err(Error::InvalidHandle { kind: ResourceKind::Kernel })
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_first_sight_builds_once() {
        let reg = HandleRegistry::scoped();
        let a = reg.get_or_insert_with(ClKernel::from_raw(0x30), || stub(0x30)).unwrap();
        let b = reg
            .get_or_insert_with(ClKernel::from_raw(0x30), || panic!("built twice"))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_first_sight_rejects_foreign_wrapper() {
        let reg = HandleRegistry::scoped();
        let err = reg
            .get_or_insert_with(ClKernel::from_raw(0x31), || stub(0x32))
            .unwrap_err();
        assert_eq!(err, Error::InvalidHandle { kind: ResourceKind::Kernel });
        assert!(reg.is_empty());
        assert!(!reg.contains(ClKernel::from_raw(0x32)));
    }

    #[derive(Debug)]
    struct Unshared {
        handle: ClKernel,
        lifecycle: Lifecycle,
    }

    impl ManagedResource for Unshared {
        type Handle = ClKernel;
        const KIND: ResourceKind = ResourceKind::Program;

        fn handle(&self) -> ClKernel {
            self.handle
        }

        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "disagrees with its scope")]
    fn test_process_kind_without_table_is_caught() {
        let _ = HandleRegistry::<Unshared>::new();
    }

    #[test]
    fn test_scoped_drop_invalidates_children() {
        let reg = HandleRegistry::scoped();
        let p = Arc::new(stub(0x40));
        reg.insert(Arc::clone(&p)).unwrap();
        drop(reg);
        assert_eq!(p.state(), LifecycleState::Invalidated);
    }

    #[test]
    fn test_shared_writes_through_and_survives_owner() {
        let reg = HandleRegistry::shared(&*TABLE);
        let p = Arc::new(stub(0x50));
        reg.insert(Arc::clone(&p)).unwrap();
        assert!(Arc::ptr_eq(&TABLE.resolve(ClKernel::from_raw(0x50)).unwrap(), &p));

        drop(reg);
        assert!(p.is_valid());
        assert!(TABLE.contains(ClKernel::from_raw(0x50)));
        TABLE.unregister(ClKernel::from_raw(0x50));
    }

    #[test]
    fn test_shared_duplicate_across_views() {
        let a = HandleRegistry::shared(&*TABLE);
        let b = HandleRegistry::shared(&*TABLE);
        a.insert(Arc::new(stub(0x60))).unwrap();
        assert!(b.insert(Arc::new(stub(0x60))).unwrap_err().is_duplicate_handle());
        assert!(b.is_empty());
        a.remove(ClKernel::from_raw(0x60));
        assert!(!TABLE.contains(ClKernel::from_raw(0x60)));
    }
}
