//! One-time initialization gate

use std::sync::atomic::{AtomicBool, Ordering};

use xpthread_core::{ThreadError, ThreadResult};

use crate::thread::PthreadLayer;

/// One-shot initialization gate, the `pthread_once` analogue.
///
/// A gate must be constructed with [`OnceGate::new`] before use; that is the
/// counterpart of the static initializer. A gate obtained through `Default`
/// models storage that was zeroed but never initialized, and every call
/// through it fails with `InvalidArgument`.
pub struct OnceGate {
    initialized: bool,
    executed: AtomicBool,
}

impl OnceGate {
    /// A gate ready for use, with the init routine not yet run.
    pub const fn new() -> Self {
        OnceGate {
            initialized: true,
            executed: AtomicBool::new(false),
        }
    }

    /// Whether the init routine has completed through this gate.
    #[inline]
    pub fn has_run(&self) -> bool {
        self.executed.load(Ordering::Acquire)
    }
}

impl Default for OnceGate {
    /// An uninitialized gate. Calls through it are rejected until it is
    /// replaced by one from [`OnceGate::new`].
    fn default() -> Self {
        OnceGate {
            initialized: false,
            executed: AtomicBool::new(false),
        }
    }
}

impl PthreadLayer {
    /// Run `init` exactly once across all callers sharing `gate`.
    ///
    /// Callers that lose the race block until the winner's `init` has
    /// returned, so when this function comes back `Ok` the routine's side
    /// effects are visible. Calls made before the scheduler can identify the
    /// calling task (early boot, before threading is up) take a lock-free
    /// path instead of blocking; at that point there is nothing to race
    /// against.
    pub fn once<F: FnOnce()>(&self, gate: &OnceGate, init: F) -> ThreadResult<()> {
        if !gate.initialized {
            return Err(ThreadError::InvalidArgument);
        }

        if self.inner.scheduler.current().is_none() {
            // Pre-scheduler bootstrap: single flow of control, no lock needed.
            if !gate.executed.load(Ordering::Acquire) {
                init();
                gate.executed.store(true, Ordering::Release);
            }
            return Ok(());
        }

        self.inner.once_mux.acquire();
        if !gate.executed.load(Ordering::Acquire) {
            init();
            gate.executed.store(true, Ordering::Release);
        }
        self.inner.once_mux.release();
        Ok(())
    }
}
