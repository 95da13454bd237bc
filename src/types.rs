//! Type definitions and enums.

use std::fmt;

use crate::ffi::{ClInt, CL_COMPLETE, CL_QUEUED, CL_RUNNING, CL_SUBMITTED};

/// Kind of native object a wrapper stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Platform,
    Device,
    Context,
    CommandQueue,
    Mem,
    Sampler,
    Program,
    Kernel,
    Event,
}

impl ResourceKind {
    /// Where wrappers of this kind are looked up.
    ///
    /// Programs and events are resolved from native notifications that carry
    /// only the object's own handle, so they need a process-wide table.
    pub const fn scope(self) -> Scope {
        match self {
            ResourceKind::Program | ResourceKind::Event => Scope::Process,
            _ => Scope::Owner,
        }
    }

    /// Name used in messages and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Platform => "platform",
            ResourceKind::Device => "device",
            ResourceKind::Context => "context",
            ResourceKind::CommandQueue => "command queue",
            ResourceKind::Mem => "memory object",
            ResourceKind::Sampler => "sampler",
            ResourceKind::Program => "program",
            ResourceKind::Kernel => "kernel",
            ResourceKind::Event => "event",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup scope of a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One registry per owning object.
    Owner,
    /// One table for the whole process.
    Process,
}

/// Lifecycle state of a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Native creation returned a NULL handle. Terminal.
    #[default]
    Uninitialized,
    /// Live and registered.
    Valid,
    /// Native object released, wrapper unregistered. Terminal.
    Invalidated,
}

/// Execution status of the command behind an event.
///
/// Native codes order from `Queued` (3) down to `Complete` (0); negative codes
/// are failures, which also count as having finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Complete,
    Running,
    Submitted,
    Queued,
    /// Abnormal termination with a negative native error code.
    Error(i32),
}

impl ExecutionStatus {
    /// Whether an event in this status has gone at least as far as `trigger`.
    pub fn has_reached(self, trigger: ExecutionStatus) -> bool {
        i32::from(self) <= i32::from(trigger)
    }

    /// Whether the command is done, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Complete | ExecutionStatus::Error(_))
    }
}

impl From<ClInt> for ExecutionStatus {
    fn from(code: ClInt) -> Self {
        match code {
            CL_COMPLETE => ExecutionStatus::Complete,
            CL_RUNNING => ExecutionStatus::Running,
            CL_SUBMITTED => ExecutionStatus::Submitted,
            CL_QUEUED => ExecutionStatus::Queued,
            c if c < 0 => ExecutionStatus::Error(c),
            // Positive codes past Queued are not defined; treat as not started.
            _ => ExecutionStatus::Queued,
        }
    }
}

impl From<ExecutionStatus> for ClInt {
    fn from(status: ExecutionStatus) -> ClInt {
        match status {
            ExecutionStatus::Complete => CL_COMPLETE,
            ExecutionStatus::Running => CL_RUNNING,
            ExecutionStatus::Submitted => CL_SUBMITTED,
            ExecutionStatus::Queued => CL_QUEUED,
            ExecutionStatus::Error(code) => code,
        }
    }
}

/// Options for the process-wide callback dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Initial capacity of each table (default: 64).
    pub initial_capacity: usize,
    /// Number of recently unregistered handles each table remembers so a late
    /// notification can be told apart from a bogus one (default: 1024).
    /// Zero disables the history.
    pub released_history: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            released_history: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_programs_and_events_are_process_scoped() {
        let process: Vec<_> = [
            ResourceKind::Platform,
            ResourceKind::Device,
            ResourceKind::Context,
            ResourceKind::CommandQueue,
            ResourceKind::Mem,
            ResourceKind::Sampler,
            ResourceKind::Program,
            ResourceKind::Kernel,
            ResourceKind::Event,
        ]
        .into_iter()
        .filter(|k| k.scope() == Scope::Process)
        .collect();
        assert_eq!(process, vec![ResourceKind::Program, ResourceKind::Event]);
    }

    #[test]
    fn test_status_from_code() {
        assert_eq!(ExecutionStatus::from(0i32), ExecutionStatus::Complete);
        assert_eq!(ExecutionStatus::from(3i32), ExecutionStatus::Queued);
        assert_eq!(ExecutionStatus::from(-5i32), ExecutionStatus::Error(-5));
        assert_eq!(ClInt::from(ExecutionStatus::Error(-5)), -5);
    }

    #[test]
    fn test_status_ordering() {
        assert!(ExecutionStatus::Complete.has_reached(ExecutionStatus::Running));
        assert!(ExecutionStatus::Running.has_reached(ExecutionStatus::Submitted));
        assert!(!ExecutionStatus::Queued.has_reached(ExecutionStatus::Complete));
        assert!(ExecutionStatus::Error(-1).has_reached(ExecutionStatus::Complete));
        assert!(ExecutionStatus::Error(-1).is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }
}
