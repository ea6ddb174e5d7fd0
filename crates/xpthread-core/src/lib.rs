//! # xpthread-core
//!
//! Core types and traits for the xpthread POSIX-thread-compatibility layer.
//!
//! This crate is scheduler-agnostic: it defines the thread handle, the error
//! taxonomy with its errno mapping, and the capability traits a task
//! scheduler must provide. The production backend lives in `xpthread-host`;
//! the layer itself lives in `xpthread`.
//!
//! ## Modules
//!
//! - `id` - generation-checked thread handle
//! - `state` - thread lifecycle state and mutex kind enums
//! - `error` - error types and POSIX errno mapping
//! - `traits` - the task-scheduler capability interface
//! - `spinlock` - internal spinlock primitive
//! - `xlog` - leveled debug printing macros
//! - `env` - environment variable utilities

#![allow(dead_code)]

pub mod id;
pub mod state;
pub mod error;
pub mod traits;
pub mod spinlock;
pub mod xlog;
pub mod env;

// Re-exports for convenience
pub use id::ThreadId;
pub use state::{MutexKind, ThreadState};
pub use error::{errno, SpawnError, ThreadError, ThreadResult};
pub use traits::{NativeTask, RawTaskMutex, TaskEntry, TaskRef, TaskScheduler, TaskSpec};
pub use spinlock::SpinLock;
pub use env::{env_get, env_get_bool, env_get_str, env_is_set};
