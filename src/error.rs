//! Error types for the clreg crate.

use thiserror::Error;

use crate::types::ResourceKind;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The wrapper's native handle is NULL; it never became valid.
    #[error("invalid {kind} handle")]
    InvalidHandle {
        /// Kind of the wrapper.
        kind: ResourceKind,
    },

    /// The handle is already registered for this kind.
    #[error("{kind} handle {handle:#x} is already registered")]
    DuplicateHandle {
        /// Kind of the registry.
        kind: ResourceKind,
        /// Raw handle value.
        handle: u64,
    },

    /// The owner's native creation failed or it has been released, so it
    /// has no child registries.
    #[error("{owner} is invalid and cannot own {child} objects")]
    InvalidOwner {
        /// Kind of the owner.
        owner: ResourceKind,
        /// Kind of child that was requested.
        child: ResourceKind,
    },

    /// No child with this handle is registered under a valid owner.
    #[error("no {kind} with handle {handle:#x} under this owner")]
    ChildNotFound {
        /// Kind of the child.
        kind: ResourceKind,
        /// Raw handle value.
        handle: u64,
    },

    /// A native notification delivered a handle the dispatch table cannot
    /// resolve.
    #[error("{kind} handle {handle:#x} delivered to callback is not registered (released: {released})")]
    UnknownCallbackHandle {
        /// Kind of the dispatch table.
        kind: ResourceKind,
        /// Raw handle value.
        handle: u64,
        /// Whether the handle was registered once and has since been removed.
        released: bool,
    },

    /// Retain or release on a wrapper whose reference count already hit zero.
    #[error("{kind} handle {handle:#x} was already released")]
    AlreadyReleased {
        /// Kind of the wrapper.
        kind: ResourceKind,
        /// Raw handle value.
        handle: u64,
    },

    /// Process-wide options were supplied after the dispatch tables came up.
    #[error("dispatch tables are already initialized")]
    AlreadyInitialized,

    /// A native call reported a failure status.
    #[error("native error {code} ({name})")]
    Native {
        /// Native status code.
        code: i32,
        /// Symbolic name of the status code.
        name: &'static str,
    },
}

impl Error {
    /// Check if this is a duplicate handle error.
    pub fn is_duplicate_handle(&self) -> bool {
        matches!(self, Error::DuplicateHandle { .. })
    }

    /// Check if this is an invalid owner error.
    pub fn is_invalid_owner(&self) -> bool {
        matches!(self, Error::InvalidOwner { .. })
    }

    /// Check if this is a lookup miss under a valid owner.
    pub fn is_child_not_found(&self) -> bool {
        matches!(self, Error::ChildNotFound { .. })
    }

    /// Check if this is a callback resolve miss of any sort.
    pub fn is_unknown_callback_handle(&self) -> bool {
        matches!(self, Error::UnknownCallbackHandle { .. })
    }

    /// Check if this is a callback that lost the race against release.
    ///
    /// Such a notification is dropped without complaint; a miss on a handle
    /// that was never registered is a protocol violation instead.
    pub fn is_benign_race(&self) -> bool {
        matches!(self, Error::UnknownCallbackHandle { released: true, .. })
    }

    /// Check if this is a native status error.
    pub fn is_native(&self) -> bool {
        matches!(self, Error::Native { .. })
    }
}
