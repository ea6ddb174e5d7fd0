//! Host task identity
//!
//! A `HostTask` pairs a backend task id with the OS thread name and the
//! task's notification slot. The scheduler stores the current task in a
//! thread-local so `current()` works from inside any spawned entry, and
//! ambient identities can be minted for threads the scheduler never spawned
//! (the process main thread, foreign test threads).

use std::cell::RefCell;
use std::sync::Arc;

use xpthread_core::NativeTask;

use crate::notify::NotifySlot;

/// A task backed by one OS thread
pub struct HostTask {
    /// Backend task id, drawn from a process-wide sequence
    id: u64,

    /// OS thread name (also used for diagnostics)
    name: String,

    /// Binary notification slot owned by this task
    slot: NotifySlot,
}

impl HostTask {
    pub(crate) fn new(id: u64, name: String) -> Self {
        Self {
            id,
            name,
            slot: NotifySlot::new(),
        }
    }
}

impl NativeTask for HostTask {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn wait(&self) {
        self.slot.wait();
    }

    fn notify(&self) {
        self.slot.notify();
    }
}

thread_local! {
    /// The task identity of the current OS thread, if any
    static CURRENT_TASK: RefCell<Option<Arc<HostTask>>> = const { RefCell::new(None) };
}

/// Bind a task identity to the current OS thread
pub(crate) fn set_current(task: Arc<HostTask>) {
    CURRENT_TASK.with(|c| *c.borrow_mut() = Some(task));
}

/// The current thread's task identity, if one has been bound
pub(crate) fn current() -> Option<Arc<HostTask>> {
    CURRENT_TASK.with(|c| c.borrow().clone())
}

/// The current thread's task identity, minting and binding one if absent
///
/// The mint closure runs at most once per OS thread; later calls on the
/// same thread return the stored identity.
pub(crate) fn current_or_register<F>(mint: F) -> Arc<HostTask>
where
    F: FnOnce() -> Arc<HostTask>,
{
    CURRENT_TASK.with(|c| {
        let mut slot = c.borrow_mut();
        if let Some(task) = slot.as_ref() {
            return Arc::clone(task);
        }
        let task = mint();
        *slot = Some(Arc::clone(&task));
        task
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_accessors() {
        let task = HostTask::new(7, "worker-7".to_string());
        assert_eq!(task.id(), 7);
        assert_eq!(task.name(), "worker-7");
    }

    #[test]
    fn test_notify_then_wait() {
        let task = HostTask::new(1, "t".to_string());
        task.notify();
        task.wait(); // Must not block
    }

    #[test]
    fn test_current_starts_unbound() {
        // Fresh OS thread, nothing bound yet
        let unbound = std::thread::spawn(|| current().is_none()).join().unwrap();
        assert!(unbound);
    }

    #[test]
    fn test_register_is_sticky() {
        std::thread::spawn(|| {
            let a = current_or_register(|| Arc::new(HostTask::new(100, "ambient".to_string())));
            let b = current_or_register(|| Arc::new(HostTask::new(200, "other".to_string())));
            assert_eq!(a.id(), 100);
            assert_eq!(b.id(), 100); // Second mint closure never ran
            assert_eq!(current().unwrap().id(), 100);
        })
        .join()
        .unwrap();
    }
}
