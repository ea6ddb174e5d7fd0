//! Task-scheduler capability traits
//!
//! These traits define the interface between the scheduler-agnostic
//! compatibility layer and whatever task scheduler actually runs the code.
//! The layer only ever needs four capabilities: spawn a task, identify the
//! current task, notify/wait on a task, and mint semaphores.

use crate::error::SpawnError;
use crate::state::MutexKind;
use std::sync::Arc;

/// Shareable reference to a scheduler-native task
pub type TaskRef = Arc<dyn NativeTask>;

/// Entry closure handed to a spawned task.
///
/// The backend invokes it with the task's own reference once the task is
/// running; the task terminates when the closure returns.
pub type TaskEntry = Box<dyn FnOnce(TaskRef) + Send + 'static>;

/// Parameters for spawning a task
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Base name for the task (backends may suffix it for uniqueness)
    pub name: String,

    /// Stack size in bytes
    pub stack_size: usize,

    /// Scheduling priority; advisory on backends without priorities
    pub priority: u8,
}

/// A scheduler-native task handle.
///
/// Each task carries one binary notification slot, used by the layer both
/// for the start rendezvous of a freshly spawned task and as the join wait
/// channel. A notify is never lost: if it arrives before the matching wait,
/// the wait returns immediately and consumes it.
pub trait NativeTask: Send + Sync {
    /// Backend-unique task id; two refs name the same task iff ids match
    fn id(&self) -> u64;

    /// Task name, for diagnostics
    fn name(&self) -> &str;

    /// Block the calling task until a notification is delivered to this
    /// task's slot, consuming it. Must only be called from the task itself.
    fn wait(&self);

    /// Deliver a notification to this task's slot, waking its waiter if
    /// one is blocked. Callable from any task.
    fn notify(&self);
}

/// A raw mutual-exclusion semaphore minted by the scheduler.
///
/// The normal variant is owner-agnostic: re-acquiring from the holding task
/// blocks forever. The recursive variant tracks its owner and a depth
/// counter. Releasing without holding is ignored.
pub trait RawTaskMutex: Send + Sync {
    /// Block until the semaphore is acquired
    fn acquire(&self);

    /// Acquire without blocking; returns false if unavailable
    fn try_acquire(&self) -> bool;

    /// Release one level of ownership
    fn release(&self);
}

/// The scheduler capability interface the layer is built on
pub trait TaskScheduler: Send + Sync {
    /// Spawn a task running `entry`. The returned reference is live before
    /// the entry closure runs, so the caller can notify the task's slot to
    /// release a start rendezvous.
    fn spawn(&self, spec: &TaskSpec, entry: TaskEntry) -> Result<TaskRef, SpawnError>;

    /// Reference to the calling task, or None if the scheduler is not
    /// running yet (no task context exists).
    fn current(&self) -> Option<TaskRef>;

    /// Give up the current timeslice
    fn yield_now(&self);

    /// Block the calling task for at least `micros` microseconds
    fn sleep_us(&self, micros: u64);

    /// Allocate a semaphore of the given kind
    fn new_mutex(&self, kind: MutexKind) -> Result<Box<dyn RawTaskMutex>, SpawnError>;
}
