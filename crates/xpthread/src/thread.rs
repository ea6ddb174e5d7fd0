//! Thread lifecycle
//!
//! The start-rendezvous and exit-notification protocol over the registry:
//!
//! - `create` reserves a registry record, spawns a task whose trampoline
//!   blocks on its private start notification, commits the task reference,
//!   and only then releases the start gate. The new thread can therefore
//!   always resolve its own record, and a full registry rejects before
//!   anything is spawned.
//! - The exit trampoline decides, under the registry lock, whether to wake
//!   a joiner (record left for the joiner to reclaim), self-reclaim
//!   (detached), or linger as `Exited` for a later join or detach.
//! - `join` is two-phase: register as the waiter under the lock, block on
//!   the caller's own notification outside the lock, re-acquire and
//!   reclaim. Holding the lock across the wait would deadlock the exit
//!   trampoline that needs the same lock to signal.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use xpthread_core::{
    MutexKind, RawTaskMutex, TaskEntry, TaskRef, TaskScheduler, TaskSpec, ThreadError, ThreadId,
    ThreadResult, ThreadState,
};
use xpthread_core::{xdebug, xerror, xtrace, xwarn};

use crate::config::ThreadConfig;
use crate::registry::Registry;

/// State shared by all clones of a layer handle
pub(crate) struct Shared {
    pub scheduler: Arc<dyn TaskScheduler>,
    pub registry: Registry,
    pub config: ThreadConfig,
    /// Serializes every once gate of this layer
    pub once_mux: Box<dyn RawTaskMutex>,
    /// Single TLS key slot: set once a key has been created
    pub key_created: AtomicBool,
}

/// POSIX thread layer over a task scheduler
///
/// Cheap to clone; clones share one registry. Independent layers (e.g. one
/// per test) are fully isolated from each other.
#[derive(Clone)]
pub struct PthreadLayer {
    pub(crate) inner: Arc<Shared>,
}

/// Placeholder for POSIX thread attributes
///
/// Only default creation is supported; `create_with_attr` rejects any
/// supplied attribute object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadAttr;

impl PthreadLayer {
    /// Build a layer with configuration taken from the environment
    pub fn new(scheduler: Arc<dyn TaskScheduler>) -> ThreadResult<Self> {
        Self::with_config(scheduler, ThreadConfig::from_env())
    }

    /// Build a layer with an explicit configuration
    pub fn with_config(
        scheduler: Arc<dyn TaskScheduler>,
        config: ThreadConfig,
    ) -> ThreadResult<Self> {
        config.validate()?;
        let once_mux = scheduler.new_mutex(MutexKind::Normal)?;
        Ok(Self {
            inner: Arc::new(Shared {
                registry: Registry::new(config.max_threads),
                scheduler,
                config,
                once_mux,
                key_created: AtomicBool::new(false),
            }),
        })
    }

    /// Create a thread running `f`
    pub fn create<F>(&self, f: F) -> ThreadResult<ThreadId>
    where
        F: FnOnce() + Send + 'static,
    {
        // Reserve the record first so a full registry rejects before any
        // task is spawned
        let id = {
            let mut reg = self.inner.registry.lock();
            match reg.reserve() {
                Some(id) => id,
                None => {
                    xwarn!(
                        "thread registry full ({} records)",
                        self.inner.config.max_threads
                    );
                    return Err(ThreadError::OutOfMemory);
                }
            }
        };

        let spec = TaskSpec {
            name: self.inner.config.task_name.clone(),
            stack_size: self.inner.config.stack_size,
            priority: self.inner.config.priority,
        };

        let shared = Arc::clone(&self.inner);
        let entry: TaskEntry = Box::new(move |me: TaskRef| {
            // Start gate: the record is committed before this opens
            me.wait();
            f();
            exit_current(&shared, &me);
        });

        match self.inner.scheduler.spawn(&spec, entry) {
            Ok(task) => {
                {
                    let mut reg = self.inner.registry.lock();
                    reg.commit(id, Arc::clone(&task));
                }
                // Release the start gate only after the commit
                task.notify();
                xdebug!("created thread {} on task {}", id, task.id());
                Ok(id)
            }
            Err(e) => {
                let _ = self.inner.registry.lock().remove(id);
                xwarn!("thread create failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Create a thread with explicit attributes
    ///
    /// Attribute support is out of scope: any supplied attribute object is
    /// rejected, only `None` (default creation) proceeds.
    pub fn create_with_attr<F>(&self, attr: Option<&ThreadAttr>, f: F) -> ThreadResult<ThreadId>
    where
        F: FnOnce() + Send + 'static,
    {
        if attr.is_some() {
            xerror!("thread attributes are not supported");
            return Err(ThreadError::NotSupported);
        }
        self.create(f)
    }

    /// Wait for a thread to exit and reclaim its record
    ///
    /// Fails fast on every deadlocking shape the protocol can detect:
    /// joining self, joining a thread that is joining the caller, and
    /// joining a thread that already has a waiter.
    pub fn join(&self, id: ThreadId) -> ThreadResult<()> {
        let me_opt = self.inner.scheduler.current();
        let my_task_id = me_opt.as_ref().map(|t| t.id()).unwrap_or(0);

        let me = {
            let mut reg = self.inner.registry.lock();

            let target_task_id = match reg.get(id) {
                Some(tcb) if tcb.task.is_some() => tcb.task_id(),
                _ => return Err(ThreadError::NoSuchThread),
            };

            if target_task_id == my_task_id {
                return Err(ThreadError::SelfDeadlock);
            }

            // Pairwise cycle: our own record already names the target as
            // the task waiting on us
            if let Some(my_id) = reg.find_by_task(my_task_id) {
                if let Some(mine) = reg.get(my_id) {
                    if let Some(waiter) = &mine.join_waiter {
                        if waiter.id() == target_task_id {
                            return Err(ThreadError::MutualDeadlock);
                        }
                    }
                }
            }

            let tcb = reg
                .get_mut(id)
                .expect("join target vanished under the registry lock");
            if tcb.join_waiter.is_some() {
                return Err(ThreadError::AlreadyJoining);
            }

            if tcb.state.is_exited() {
                // Exited with no waiter: reclaim without blocking
                reg.remove(id)
                    .expect("join target vanished under the registry lock");
                xdebug!("joined exited thread {}", id);
                return Ok(());
            }

            // Register as the waiter, then block outside the lock
            let me = me_opt.expect("join would block but the caller has no task identity");
            tcb.join_waiter = Some(Arc::clone(&me));
            me
        };

        xtrace!("join: waiting for thread {}", id);
        me.wait();

        // Woken by the exit trampoline; the record is now ours to reclaim
        let mut reg = self.inner.registry.lock();
        reg.remove(id).expect("joined thread record vanished");
        drop(reg);
        xdebug!("joined thread {}", id);
        Ok(())
    }

    /// Mark a thread detached so its record is reclaimed on exit
    ///
    /// A thread that already exited with no waiter is reclaimed here and
    /// now; nobody else would ever free it.
    pub fn detach(&self, id: ThreadId) -> ThreadResult<()> {
        let mut reg = self.inner.registry.lock();
        let tcb = match reg.get_mut(id) {
            Some(tcb) if tcb.task.is_some() => tcb,
            _ => return Err(ThreadError::NoSuchThread),
        };

        if tcb.state.is_exited() && tcb.join_waiter.is_none() {
            let _ = reg.remove(id);
            xdebug!("detached exited thread {}, record reclaimed", id);
        } else {
            tcb.detached = true;
            xtrace!("detached thread {}", id);
        }
        Ok(())
    }

    /// The calling thread's handle
    ///
    /// Halts the process if the caller has no record: every thread created
    /// through this layer has one for its entire running lifetime, so a
    /// miss means a foreign task or a corrupted registry.
    pub fn current(&self) -> ThreadId {
        let me = self
            .inner
            .scheduler
            .current()
            .expect("current thread has no task identity");
        let reg = self.inner.registry.lock();
        match reg.find_by_task(me.id()) {
            Some(id) => id,
            None => panic!("task {} has no thread record", me.id()),
        }
    }

    /// Cancellation is deliberately unimplemented
    pub fn cancel(&self, id: ThreadId) -> ThreadResult<()> {
        xerror!("cancellation of thread {} requested, not supported", id);
        Err(ThreadError::NotSupported)
    }

    /// Give up the current timeslice
    pub fn yield_now(&self) {
        self.inner.scheduler.yield_now();
    }

    /// Sleep for whole seconds
    pub fn sleep(&self, seconds: u64) {
        self.inner.scheduler.sleep_us(seconds * 1_000_000);
    }

    /// Sleep for microseconds
    pub fn usleep(&self, micros: u64) {
        self.inner.scheduler.sleep_us(micros);
    }

    /// Number of live thread records
    pub fn thread_count(&self) -> usize {
        self.inner.registry.lock().len()
    }
}

/// Whether two handles name the same thread
#[inline]
pub fn equal(a: ThreadId, b: ThreadId) -> bool {
    a == b
}

/// Exit protocol, run on the spawned task after the user closure returns
fn exit_current(shared: &Shared, me: &TaskRef) {
    let mut waiter = None;
    let mut reclaim = false;

    let mut reg = shared.registry.lock();
    let id = reg
        .find_by_task(me.id())
        .expect("exiting task has no thread record");
    {
        let tcb = reg
            .get_mut(id)
            .expect("exiting task has no thread record");
        if let Some(w) = &tcb.join_waiter {
            // Leave the record in place; the woken joiner reclaims it
            waiter = Some(Arc::clone(w));
        } else if tcb.detached {
            reclaim = true;
        } else {
            tcb.state = ThreadState::Exited;
        }
    }
    if reclaim {
        let _ = reg.remove(id);
    }
    drop(reg);

    if let Some(w) = waiter {
        xtrace!("thread {} exiting, waking joiner task {}", id, w.id());
        w.notify();
    } else if reclaim {
        xtrace!("detached thread {} exited, record reclaimed", id);
    } else {
        xtrace!("thread {} exited, record lingers for a joiner", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsup::StoppedScheduler;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Barrier};
    use std::time::{Duration, Instant};
    use xpthread_host::HostScheduler;

    fn layer() -> PthreadLayer {
        PthreadLayer::with_config(Arc::new(HostScheduler::new()), ThreadConfig::new()).unwrap()
    }

    #[test]
    fn test_create_and_join() {
        let pt = layer();
        let counter = Arc::new(AtomicUsize::new(0));

        let c2 = Arc::clone(&counter);
        let id = pt
            .create(move || {
                c2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        pt.join(id).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pt.thread_count(), 0);
    }

    #[test]
    fn test_join_missing_thread() {
        let pt = layer();
        assert_eq!(pt.join(ThreadId::new(5, 9)), Err(ThreadError::NoSuchThread));
        assert_eq!(pt.join(ThreadId::NONE), Err(ThreadError::NoSuchThread));
    }

    #[test]
    fn test_join_self_deadlock() {
        let pt = layer();
        let (tx, rx) = mpsc::channel();

        let pt2 = pt.clone();
        let id = pt
            .create(move || {
                let me = pt2.current();
                tx.send(pt2.join(me)).unwrap();
            })
            .unwrap();

        let seen = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(seen, Err(ThreadError::SelfDeadlock));
        pt.join(id).unwrap();
    }

    #[test]
    fn test_cancel_not_supported() {
        let pt = layer();
        let id = pt.create(|| {}).unwrap();
        assert_eq!(pt.cancel(id), Err(ThreadError::NotSupported));
        pt.join(id).unwrap();
    }

    #[test]
    fn test_attr_rejected() {
        let pt = layer();

        let attr = ThreadAttr;
        let err = pt.create_with_attr(Some(&attr), || {}).unwrap_err();
        assert_eq!(err, ThreadError::NotSupported);

        let id = pt.create_with_attr(None, || {}).unwrap();
        pt.join(id).unwrap();
    }

    #[test]
    fn test_spawn_rejected_releases_record() {
        let pt =
            PthreadLayer::with_config(Arc::new(StoppedScheduler), ThreadConfig::new()).unwrap();
        let err = pt.create(|| {}).unwrap_err();
        assert_eq!(err, ThreadError::SchedulerRejected);
        assert_eq!(pt.thread_count(), 0);
    }

    #[test]
    fn test_registry_full() {
        let config = ThreadConfig::new().max_threads(2);
        let pt = PthreadLayer::with_config(Arc::new(HostScheduler::new()), config).unwrap();

        let barrier = Arc::new(Barrier::new(3));
        let b1 = Arc::clone(&barrier);
        let b2 = Arc::clone(&barrier);
        let a = pt
            .create(move || {
                b1.wait();
            })
            .unwrap();
        let b = pt
            .create(move || {
                b2.wait();
            })
            .unwrap();

        assert_eq!(pt.create(|| {}), Err(ThreadError::OutOfMemory));

        barrier.wait();
        pt.join(a).unwrap();
        pt.join(b).unwrap();
        assert_eq!(pt.thread_count(), 0);
    }

    #[test]
    fn test_equal_is_identity() {
        let a = ThreadId::new(1, 1);
        let b = ThreadId::new(1, 2);
        assert!(equal(a, a));
        assert!(!equal(a, b));
    }

    #[test]
    fn test_yield_and_sleep() {
        let pt = layer();
        pt.yield_now();
        pt.usleep(500);
        pt.sleep(0);
    }

    #[test]
    fn test_join_after_exit() {
        let pt = layer();
        let (tx, rx) = mpsc::channel();

        let id = pt
            .create(move || {
                tx.send(()).unwrap();
            })
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        // The record lingers until someone reclaims it
        assert_eq!(pt.thread_count(), 1);
        pt.join(id).unwrap();
        assert_eq!(pt.thread_count(), 0);
        assert_eq!(pt.join(id), Err(ThreadError::NoSuchThread));
    }

    #[test]
    fn test_detach_running_thread_self_reclaims() {
        let pt = layer();
        let barrier = Arc::new(Barrier::new(2));

        let b = Arc::clone(&barrier);
        let id = pt
            .create(move || {
                b.wait();
            })
            .unwrap();

        // The thread is parked on the barrier, so the record must survive
        // the detach itself
        pt.detach(id).unwrap();
        assert_eq!(pt.thread_count(), 1);
        barrier.wait();

        let deadline = Instant::now() + Duration::from_secs(5);
        while pt.thread_count() != 0 {
            assert!(Instant::now() < deadline, "detached record never reclaimed");
            std::thread::yield_now();
        }
        assert_eq!(pt.join(id), Err(ThreadError::NoSuchThread));
    }

    #[test]
    fn test_detach_exited_thread() {
        let pt = layer();
        let (tx, rx) = mpsc::channel();

        let id = pt
            .create(move || {
                tx.send(()).unwrap();
            })
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        pt.detach(id).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while pt.thread_count() != 0 {
            assert!(Instant::now() < deadline, "detached record never reclaimed");
            std::thread::yield_now();
        }
        assert_eq!(pt.detach(id), Err(ThreadError::NoSuchThread));
        assert_eq!(pt.join(id), Err(ThreadError::NoSuchThread));
    }

    #[test]
    fn test_second_joiner_rejected() {
        let pt = layer();
        let gate = Arc::new(Barrier::new(2));

        let g = Arc::clone(&gate);
        let target = pt
            .create(move || {
                g.wait();
            })
            .unwrap();

        let pt2 = pt.clone();
        let first = pt
            .create(move || {
                pt2.join(target).unwrap();
            })
            .unwrap();

        // Wait for the first joiner to land on the target's record
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let registered = pt
                .inner
                .registry
                .lock()
                .get(target)
                .map(|tcb| tcb.join_waiter.is_some())
                .unwrap_or(false);
            if registered {
                break;
            }
            assert!(Instant::now() < deadline, "first joiner never registered");
            std::thread::yield_now();
        }

        assert_eq!(pt.join(target), Err(ThreadError::AlreadyJoining));

        gate.wait();
        pt.join(first).unwrap();
        assert_eq!(pt.thread_count(), 0);
    }

    #[test]
    fn test_mutual_join_deadlock() {
        let pt = layer();
        let (tx_to_a, rx_in_a) = mpsc::channel::<ThreadId>();
        let (tx_to_b, rx_in_b) = mpsc::channel::<ThreadId>();
        let (tx_res, rx_res) = mpsc::channel();

        let pt_a = pt.clone();
        let a = pt
            .create(move || {
                let id_b = rx_in_a.recv().unwrap();
                // First leg of the cycle: a legitimate blocking join
                pt_a.join(id_b).unwrap();
            })
            .unwrap();

        let pt_b = pt.clone();
        let b = pt
            .create(move || {
                let id_a = rx_in_b.recv().unwrap();
                let my_id = pt_b.current();

                // Close the cycle only once the peer is registered as our
                // waiter, otherwise both sides could block for real
                let deadline = Instant::now() + Duration::from_secs(5);
                loop {
                    let cycle_formed = pt_b
                        .inner
                        .registry
                        .lock()
                        .get(my_id)
                        .map(|tcb| tcb.join_waiter.is_some())
                        .unwrap_or(false);
                    if cycle_formed {
                        break;
                    }
                    assert!(Instant::now() < deadline, "peer never registered");
                    std::thread::yield_now();
                }

                tx_res.send(pt_b.join(id_a)).unwrap();
            })
            .unwrap();

        tx_to_a.send(b).unwrap();
        tx_to_b.send(a).unwrap();

        let seen = rx_res.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(seen, Err(ThreadError::MutualDeadlock));

        // B exits normally, A's join completes, the cycle unwinds
        pt.join(a).unwrap();
        assert_eq!(pt.thread_count(), 0);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let config = ThreadConfig::new().max_threads(1);
        let pt = PthreadLayer::with_config(Arc::new(HostScheduler::new()), config).unwrap();

        let first = pt.create(|| {}).unwrap();
        pt.join(first).unwrap();

        // Same slot comes back with a new generation
        let second = pt.create(|| {}).unwrap();
        assert_eq!(second.slot(), first.slot());
        assert_ne!(second, first);

        assert_eq!(pt.join(first), Err(ThreadError::NoSuchThread));
        assert_eq!(pt.detach(first), Err(ThreadError::NoSuchThread));
        pt.join(second).unwrap();
    }

    #[test]
    fn test_create_join_churn() {
        let pt = layer();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let ids: Vec<_> = (0..100)
                .map(|_| {
                    let c = Arc::clone(&counter);
                    pt.create(move || {
                        c.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap()
                })
                .collect();
            for id in ids {
                pt.join(id).unwrap();
            }
        }

        assert_eq!(counter.load(Ordering::SeqCst), 400);
        assert_eq!(pt.thread_count(), 0);
    }

    #[test]
    fn test_create_detach_churn() {
        let pt = layer();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..200 {
            let c = Arc::clone(&counter);
            let id = pt
                .create(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            pt.detach(id).unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while pt.thread_count() != 0 || counter.load(Ordering::SeqCst) != 200 {
            assert!(Instant::now() < deadline, "detached threads never drained");
            std::thread::yield_now();
        }
    }
}
