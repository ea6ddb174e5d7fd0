//! Host scheduler
//!
//! Implements `TaskScheduler` on plain OS threads. Each spawned task is one
//! `std::thread` with the requested name and stack size. Join handles are
//! not kept; thread lifetimes are tracked by the layer above through its own
//! registry protocol.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use xpthread_core::{
    MutexKind, NativeTask, RawTaskMutex, SpawnError, TaskEntry, TaskRef, TaskScheduler, TaskSpec,
};
use xpthread_core::{xtrace, xwarn};

use crate::semaphore::{BinarySemaphore, RecursiveSemaphore};
use crate::task::{self, HostTask};

/// OS-thread backend for the compatibility layer
pub struct HostScheduler;

/// Process-wide task id sequence (1-based, 0 is never issued)
///
/// Shared by every scheduler instance: the ambient identity a thread got
/// from one instance must never collide with an id another instance hands
/// to a spawned task, since the identity cell is per OS thread.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl HostScheduler {
    pub fn new() -> Self {
        Self
    }

    fn next_id(&self) -> u64 {
        NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for HostScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler for HostScheduler {
    fn spawn(&self, spec: &TaskSpec, entry: TaskEntry) -> Result<TaskRef, SpawnError> {
        let id = self.next_id();
        let name = format!("{}-{}", spec.name, id);
        let task = Arc::new(HostTask::new(id, name.clone()));

        let bound = Arc::clone(&task);
        let entry_ref: TaskRef = task.clone();

        let result = thread::Builder::new()
            .name(name)
            .stack_size(spec.stack_size)
            .spawn(move || {
                task::set_current(bound);
                entry(entry_ref);
            });

        match result {
            Ok(_handle) => {
                xtrace!("spawned host task {} ({})", id, task.name());
                Ok(task)
            }
            Err(e) => {
                xwarn!("host thread spawn failed: {}", e);
                if e.kind() == std::io::ErrorKind::OutOfMemory {
                    Err(SpawnError::NoMemory)
                } else {
                    Err(SpawnError::Rejected)
                }
            }
        }
    }

    fn current(&self) -> Option<TaskRef> {
        // Threads this scheduler never spawned (process main, foreign
        // threads) get a sticky ambient identity on first use.
        let task = task::current_or_register(|| {
            let id = self.next_id();
            Arc::new(HostTask::new(id, format!("ambient-{}", id)))
        });
        Some(task)
    }

    fn yield_now(&self) {
        thread::yield_now();
    }

    fn sleep_us(&self, micros: u64) {
        thread::sleep(Duration::from_micros(micros));
    }

    fn new_mutex(&self, kind: MutexKind) -> Result<Box<dyn RawTaskMutex>, SpawnError> {
        match kind {
            MutexKind::Normal => Ok(Box::new(BinarySemaphore::new())),
            MutexKind::Recursive => Ok(Box::new(RecursiveSemaphore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn spec(name: &str) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            stack_size: 64 * 1024,
            priority: 5,
        }
    }

    #[test]
    fn test_spawn_runs_entry_with_identity() {
        let sched = Arc::new(HostScheduler::new());
        let (tx, rx) = mpsc::channel();

        let inner = Arc::clone(&sched);
        let task = sched
            .spawn(
                &spec("spawnee"),
                Box::new(move |me| {
                    let cur = inner.current().expect("spawned task has an identity");
                    tx.send((me.id(), cur.id(), me.name().to_string())).unwrap();
                }),
            )
            .unwrap();

        let (me_id, cur_id, name) = rx.recv().unwrap();
        assert_eq!(me_id, task.id());
        assert_eq!(cur_id, task.id());
        assert!(name.starts_with("spawnee-"));
    }

    #[test]
    fn test_spawn_start_rendezvous() {
        let sched = HostScheduler::new();
        let (tx, rx) = mpsc::channel();

        let task = sched
            .spawn(
                &spec("gated"),
                Box::new(move |me| {
                    me.wait();
                    tx.send(()).unwrap();
                }),
            )
            .unwrap();

        // Entry is parked on its slot until we notify
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        task.notify();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_ambient_identity_is_stable() {
        // On a fresh OS thread so no earlier identity is in the way
        let sched = Arc::new(HostScheduler::new());
        let inner = Arc::clone(&sched);
        std::thread::spawn(move || {
            let a = inner.current().unwrap();
            let b = inner.current().unwrap();
            assert_eq!(a.id(), b.id());
            assert!(a.name().starts_with("ambient-"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_spawned_ids_unique() {
        let sched = HostScheduler::new();
        let t1 = sched
            .spawn(&spec("a"), Box::new(|_me| {}))
            .unwrap();
        let t2 = sched
            .spawn(&spec("b"), Box::new(|_me| {}))
            .unwrap();
        assert_ne!(t1.id(), t2.id());
    }

    #[test]
    fn test_mutex_kinds() {
        let sched = HostScheduler::new();

        let normal = sched.new_mutex(MutexKind::Normal).unwrap();
        assert!(normal.try_acquire());
        assert!(!normal.try_acquire());
        normal.release();

        let recursive = sched.new_mutex(MutexKind::Recursive).unwrap();
        recursive.acquire();
        assert!(recursive.try_acquire());
        recursive.release();
        recursive.release();
    }
}
