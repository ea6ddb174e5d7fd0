//! Per-task binary notification slot
//!
//! Each task owns exactly one slot. Any thread may call `notify()`; only the
//! owning task calls `wait()`.
//!
//! Slot semantics:
//! - A notification is a stored flag, not an edge. `notify()` before `wait()`
//!   makes the next `wait()` return immediately.
//! - `wait()` consumes the flag, so back-to-back waits need back-to-back
//!   notifies.
//! - Repeated `notify()` without an intervening `wait()` collapses into one
//!   pending notification.
//!
//! The layer above relies on the stored-flag property for its start and join
//! rendezvous: the notifier may run before or after the waiter reaches the
//! slot, and the wake must not be lost either way.

// Platform-specific implementations
cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexNotify as NotifySlot;
    } else {
        mod fallback;
        pub use fallback::CondvarNotify as NotifySlot;
    }
}
