//! # xpthread-host
//!
//! Host OS-thread backend for the xpthread compatibility layer.
//!
//! This crate implements the `TaskScheduler` trait from `xpthread-core` on
//! top of plain operating-system threads:
//! - Task spawning via `std::thread::Builder` (named, sized stacks)
//! - Per-task binary notification slots (futex on Linux, condvar elsewhere)
//! - Binary and recursive blocking semaphores for the mutex surface
//! - Ambient task identities for threads the scheduler did not spawn
//!
//! Priorities carried in `TaskSpec` are accepted but not enforced; host
//! OS scheduling applies.

#![allow(dead_code)]

pub mod notify;
pub mod scheduler;
pub mod semaphore;
pub mod task;

// Re-exports
pub use scheduler::HostScheduler;
pub use task::HostTask;
