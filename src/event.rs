//! Events.
//!
//! Events are children of a context, resolvable process-wide so that status
//! notifications can find them. User events are created on the context
//! directly; events produced by enqueued commands also remember their queue.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::context::Context;
use crate::ffi::ClEvent;
use crate::object::Lifecycle;
use crate::owner::impl_child;
use crate::queue::CommandQueue;
use crate::types::{ExecutionStatus, ResourceKind};

/// Hook run once an event reaches the status it was registered for.
///
/// Receives the event, the status that fired it, and the user data word
/// delivered with the notification.
pub type EventHook = Box<dyn FnOnce(&Event, ExecutionStatus, usize) + Send>;

struct StatusState {
    status: ExecutionStatus,
    user_data: usize,
    hooks: Vec<(ExecutionStatus, EventHook)>,
}

/// An event object.
pub struct Event {
    handle: ClEvent,
    context: Weak<Context>,
    queue: Option<Weak<CommandQueue>>,
    lifecycle: Lifecycle,
    state: Mutex<StatusState>,
}

impl Event {
    pub(crate) fn new(handle: ClEvent, context: &Arc<Context>, queue: Option<&Arc<CommandQueue>>) -> Self {
        // User events start out submitted, command events queued.
        let status = if queue.is_some() {
            ExecutionStatus::Queued
        } else {
            ExecutionStatus::Submitted
        };
        Self {
            handle,
            context: Arc::downgrade(context),
            queue: queue.map(Arc::downgrade),
            lifecycle: Lifecycle::new(handle.is_valid()),
            state: Mutex::new(StatusState {
                status,
                user_data: 0,
                hooks: Vec::new(),
            }),
        }
    }

    /// The owning context, if it is still around.
    pub fn context(&self) -> Option<Arc<Context>> {
        self.context.upgrade()
    }

    /// The queue the producing command was enqueued on, if any and if it is
    /// still around.
    pub fn queue(&self) -> Option<Arc<CommandQueue>> {
        self.queue.as_ref().and_then(Weak::upgrade)
    }

    /// Check if this event was created on the context rather than by a
    /// command.
    pub fn is_user_event(&self) -> bool {
        self.queue.is_none()
    }

    /// Last known execution status.
    pub fn status(&self) -> ExecutionStatus {
        self.state.lock().status
    }

    /// Register a one-shot hook for when the event reaches `trigger`.
    ///
    /// A failed command counts as having reached every status. If the event
    /// is already there the hook runs right away, on the calling thread.
    pub fn on_status<F>(&self, trigger: ExecutionStatus, hook: F)
    where
        F: FnOnce(&Event, ExecutionStatus, usize) + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.status.has_reached(trigger) {
            let (status, user_data) = (state.status, state.user_data);
            drop(state);
            hook(self, status, user_data);
            return;
        }
        state.hooks.push((trigger, Box::new(hook)));
    }

    /// Number of hooks still waiting.
    pub fn pending_hooks(&self) -> usize {
        self.state.lock().hooks.len()
    }

    /// Record a delivered status and run the hooks it satisfies.
    ///
    /// Notifications are not ordered across runtime threads, so the status
    /// only moves forward and stays put once terminal; a stale one is
    /// ignored.
    pub(crate) fn update_status(&self, status: ExecutionStatus, user_data: usize) {
        let (current, user_data, ready) = {
            let mut state = self.state.lock();
            if state.status.is_terminal() || !status.has_reached(state.status) {
                tracing::trace!(
                    handle = self.handle.raw(),
                    ?status,
                    current = ?state.status,
                    "stale event status ignored"
                );
                return;
            }
            state.status = status;
            state.user_data = user_data;
            let current = state.status;
            let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.hooks)
                .into_iter()
                .partition(|(trigger, _)| current.has_reached(*trigger));
            state.hooks = waiting;
            (current, state.user_data, ready)
        };
        tracing::trace!(handle = self.handle.raw(), status = ?current, hooks = ready.len(), "event status");
        for (_, hook) in ready {
            hook(self, current, user_data);
        }
    }
}

impl_child!(
    Event,
    ClEvent,
    ResourceKind::Event,
    Context,
    context,
    dispatch = crate::dispatch::events
);

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Event")
            .field("handle", &self.handle)
            .field("state", &self.lifecycle.state())
            .field("status", &state.status)
            .field("pending_hooks", &state.hooks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ffi::{ClCommandQueue, ClContext, ClDevice, ClPlatform};
    use crate::platform::Platform;

    fn context(raw: u64) -> Arc<Context> {
        let platform = Platform::new(ClPlatform::from_raw(0x1));
        Context::new(ClContext::from_raw(raw), &platform)
    }

    #[test]
    fn test_hooks_fire_when_trigger_reached() {
        let ctx = context(0x300);
        let event = ctx.adopt_user_event(ClEvent::from_raw(0x8001)).unwrap();
        assert!(event.is_user_event());
        assert_eq!(event.status(), ExecutionStatus::Submitted);

        let fired = Arc::new(AtomicUsize::new(0));
        let on_running = Arc::clone(&fired);
        event.on_status(ExecutionStatus::Running, move |_, status, _| {
            assert_eq!(status, ExecutionStatus::Running);
            on_running.fetch_add(1, Ordering::SeqCst);
        });
        let on_complete = Arc::clone(&fired);
        event.on_status(ExecutionStatus::Complete, move |_, _, data| {
            on_complete.fetch_add(data, Ordering::SeqCst);
        });

        event.update_status(ExecutionStatus::Running, 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(event.pending_hooks(), 1);

        event.update_status(ExecutionStatus::Complete, 10);
        assert_eq!(fired.load(Ordering::SeqCst), 11);
        assert_eq!(event.pending_hooks(), 0);
        event.release().unwrap();
    }

    #[test]
    fn test_failure_satisfies_complete_hooks() {
        let ctx = context(0x301);
        let event = ctx.adopt_user_event(ClEvent::from_raw(0x8002)).unwrap();
        let code = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&code);
        event.on_status(ExecutionStatus::Complete, move |_, status, _| {
            if let ExecutionStatus::Error(c) = status {
                seen.store(c.unsigned_abs() as usize, Ordering::SeqCst);
            }
        });
        event.update_status(ExecutionStatus::Error(-5), 0);
        assert_eq!(code.load(Ordering::SeqCst), 5);
        event.release().unwrap();
    }

    #[test]
    fn test_status_never_moves_backwards() {
        let ctx = context(0x304);
        let event = ctx.adopt_user_event(ClEvent::from_raw(0x8005)).unwrap();
        event.update_status(ExecutionStatus::Complete, 7);
        event.update_status(ExecutionStatus::Running, 9);
        assert_eq!(event.status(), ExecutionStatus::Complete);

        let seen = Arc::new(AtomicUsize::new(0));
        let hook_seen = Arc::clone(&seen);
        event.on_status(ExecutionStatus::Complete, move |_, status, data| {
            assert_eq!(status, ExecutionStatus::Complete);
            hook_seen.store(data, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 7);
        assert_eq!(event.pending_hooks(), 0);

        // A failure after completion does not rewrite the outcome either.
        event.update_status(ExecutionStatus::Error(-5), 0);
        assert_eq!(event.status(), ExecutionStatus::Complete);
        event.release().unwrap();
    }

    #[test]
    fn test_late_hook_runs_immediately() {
        let ctx = context(0x302);
        let event = ctx.adopt_user_event(ClEvent::from_raw(0x8003)).unwrap();
        event.update_status(ExecutionStatus::Complete, 3);
        let seen = Arc::new(AtomicUsize::new(0));
        let hook_seen = Arc::clone(&seen);
        event.on_status(ExecutionStatus::Complete, move |_, _, data| {
            hook_seen.store(data, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        event.release().unwrap();
    }

    #[test]
    fn test_queue_events_register_with_context() {
        let ctx = context(0x303);
        let queue = ctx
            .adopt_command_queue(ClCommandQueue::from_raw(0x8100), ClDevice::from_raw(0x2))
            .unwrap();
        let event = queue.adopt_event(ClEvent::from_raw(0x8004)).unwrap();
        assert!(!event.is_user_event());
        assert_eq!(event.status(), ExecutionStatus::Queued);
        assert!(Arc::ptr_eq(&event.queue().unwrap(), &queue));
        assert!(Arc::ptr_eq(&ctx.event(ClEvent::from_raw(0x8004)).unwrap(), &event));
        event.release().unwrap();
    }
}
