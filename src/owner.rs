//! Owner side of the hierarchy.
//!
//! An owner holds one [`HandleRegistry`] per child kind it can create. The
//! registries exist only if the owner's own handle was valid at construction;
//! a NULL owner is built in the [`Registries::Poisoned`] state and answers
//! every child query with `InvalidOwner`.

use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::ffi::NativeHandle;
use crate::object::ManagedResource;
use crate::registry::HandleRegistry;
use crate::types::ResourceKind;

/// Child registries of an owner, or nothing for an owner that never became
/// valid.
#[derive(Debug)]
pub(crate) enum Registries<R> {
    Live(R),
    Poisoned,
}

impl<R> Registries<R> {
    /// Build the set only when the owner's handle is valid.
    pub(crate) fn new(valid: bool, build: impl FnOnce() -> R) -> Self {
        if valid {
            Registries::Live(build())
        } else {
            Registries::Poisoned
        }
    }

    pub(crate) fn live(&self, owner: ResourceKind, child: ResourceKind) -> Result<&R> {
        match self {
            Registries::Live(set) => Ok(set),
            Registries::Poisoned => Err(Error::InvalidOwner { owner, child }),
        }
    }
}

/// An object that creates and tracks children of kind `T`.
pub trait ResourceOwner<T: ManagedResource>: ManagedResource {
    /// The registry for `T` children.
    ///
    /// Meant for binding code that creates or destroys native objects; fails
    /// with `InvalidOwner` if this owner is not live.
    fn registry_for(&self) -> Result<&HandleRegistry<T>>;

    /// Retrieve the child registered under `handle`.
    fn get_child(&self, handle: T::Handle) -> Result<Arc<T>> {
        self.registry_for()?
            .lookup(handle)
            .ok_or(Error::ChildNotFound {
                kind: T::KIND,
                handle: handle.raw(),
            })
    }
}

/// Wrap a freshly created native handle and register it, in one step.
///
/// The owner is checked before anything else. A NULL handle yields an invalid
/// wrapper that is not registered.
pub(crate) fn adopt<O, T>(owner: &O, handle: T::Handle, build: impl FnOnce() -> T) -> Result<Arc<T>>
where
    O: ResourceOwner<T>,
    T: ManagedResource,
{
    let registry = owner.registry_for()?;
    let child = Arc::new(build());
    if !handle.is_valid() {
        tracing::debug!(kind = %T::KIND, "native creation returned NULL, wrapper left unregistered");
        return Ok(child);
    }
    registry.insert(Arc::clone(&child))?;
    Ok(child)
}

/// Drop one reference; on the last one, unregister from the owner and, for
/// process-scoped kinds, from the dispatch table even if the owner is gone.
///
/// Returns `true` when the caller must now issue the native release.
pub(crate) fn release_child<O, T>(child: &T, owner: &Weak<O>) -> Result<bool>
where
    O: ResourceOwner<T>,
    T: ManagedResource,
{
    let handle = child.handle();
    if !child.lifecycle().release(T::KIND, handle.raw())? {
        return Ok(false);
    }
    let detached = owner
        .upgrade()
        .and_then(|o| o.registry_for().ok().and_then(|r| r.remove(handle)))
        .is_some();
    if !detached {
        if let Some(table) = T::dispatch_table() {
            table.unregister(handle);
        }
    }
    tracing::trace!(kind = %T::KIND, handle = handle.raw(), "released");
    Ok(true)
}

/// Implement `ManagedResource` plus `retain`/`release` for a child type with
/// fields `handle`, `lifecycle` and a weak owner link.
///
/// Process-scoped kinds pass `dispatch = <fn returning the table>`.
macro_rules! impl_child {
    (@refcount $ty:ident, $kind:expr, $owner:ty, $link:ident) => {
        impl $ty {
            /// Add a reference, mirroring a native retain. Returns the new count.
            pub fn retain(&self) -> $crate::Result<u32> {
                self.lifecycle.retain($kind, self.handle.raw())
            }

            /// Drop a reference, mirroring a native release.
            ///
            /// Returns `true` when this was the last reference: the wrapper is
            /// now invalidated and unregistered, and the native object may be
            /// released.
            pub fn release(&self) -> $crate::Result<bool> {
                $crate::owner::release_child::<$owner, $ty>(self, &self.$link)
            }
        }
    };
    ($ty:ident, $handle:ty, $kind:expr, $owner:ty, $link:ident, dispatch = $table:path) => {
        impl $crate::object::ManagedResource for $ty {
            type Handle = $handle;
            const KIND: $crate::types::ResourceKind = $kind;

            fn handle(&self) -> $handle {
                self.handle
            }

            fn lifecycle(&self) -> &$crate::object::Lifecycle {
                &self.lifecycle
            }

            fn dispatch_table() -> Option<&'static $crate::dispatch::CallbackDispatchTable<Self>> {
                Some($table())
            }
        }

        $crate::owner::impl_child!(@refcount $ty, $kind, $owner, $link);
    };
    ($ty:ident, $handle:ty, $kind:expr, $owner:ty, $link:ident) => {
        impl $crate::object::ManagedResource for $ty {
            type Handle = $handle;
            const KIND: $crate::types::ResourceKind = $kind;

            fn handle(&self) -> $handle {
                self.handle
            }

            fn lifecycle(&self) -> &$crate::object::Lifecycle {
                &self.lifecycle
            }
        }

        $crate::owner::impl_child!(@refcount $ty, $kind, $owner, $link);
    };
}

pub(crate) use impl_child;

/// Implement `ResourceOwner<$child>` for an owner whose `registries` field is
/// a `Registries` of a struct holding the child registry in `$field`.
///
/// A released owner is treated like one that never became valid.
macro_rules! impl_owner {
    ($owner:ty, $child:ty, $field:ident) => {
        impl $crate::owner::ResourceOwner<$child> for $owner {
            fn registry_for(&self) -> $crate::Result<&$crate::registry::HandleRegistry<$child>> {
                use $crate::object::ManagedResource;

                let set = self
                    .registries
                    .live(<$owner>::KIND, <$child>::KIND)?;
                if !self.lifecycle.is_valid() {
                    return Err($crate::Error::InvalidOwner {
                        owner: <$owner>::KIND,
                        child: <$child>::KIND,
                    });
                }
                Ok(&set.$field)
            }
        }
    };
}

pub(crate) use impl_owner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poisoned_registries_report_invalid_owner() {
        let set: Registries<u8> = Registries::new(false, || unreachable!());
        assert_eq!(
            set.live(ResourceKind::Context, ResourceKind::Mem),
            Err(Error::InvalidOwner {
                owner: ResourceKind::Context,
                child: ResourceKind::Mem
            })
        );
        let set = Registries::new(true, || 7u8);
        assert_eq!(set.live(ResourceKind::Context, ResourceKind::Mem), Ok(&7));
    }
}
