//! Linux futex-based notification slot
//!
//! Uses the futex syscall for efficient blocking with no per-slot mutex.
//!
//! Futex word semantics:
//! - 0 = no notification pending
//! - 1 = notification pending
//!
//! `wait()` swaps the word to 0; a swapped-out 1 means a notification was
//! pending and the call returns at once. Otherwise FUTEX_WAIT blocks while
//! the word is still 0. `notify()` stores 1 then wakes one waiter, so the
//! wake is never lost even when the notifier runs first.

use std::sync::atomic::{AtomicU32, Ordering};

/// Futex-backed binary notification slot
pub struct FutexNotify {
    /// Futex word: 0 = nothing pending, 1 = notification pending
    state: AtomicU32,
}

impl FutexNotify {
    /// Create a new slot with no pending notification
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
        }
    }

    /// Block until a notification is pending, then consume it
    pub fn wait(&self) {
        loop {
            // Consume a pending notification if there is one
            if self.state.swap(0, Ordering::Acquire) == 1 {
                return;
            }

            // FUTEX_WAIT: sleep while the word is still 0
            unsafe {
                libc::syscall(
                    libc::SYS_futex,
                    self.state.as_ptr(),
                    libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                    0u32,
                    std::ptr::null::<libc::timespec>(),
                    std::ptr::null::<u32>(),
                    0u32,
                );
            }
            // EAGAIN = word changed before sleeping, EINTR = signal.
            // Both are handled by re-checking the word at the top of
            // the loop.
        }
    }

    /// Leave a notification and wake the waiter if one is blocked
    pub fn notify(&self) {
        // Store first so a waiter racing past the swap still sees it
        self.state.store(1, Ordering::Release);

        // FUTEX_WAKE: wake at most one waiter
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.state.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                1i32,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }
}

impl Default for FutexNotify {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: FutexNotify only contains an atomic
unsafe impl Send for FutexNotify {}
unsafe impl Sync for FutexNotify {}
