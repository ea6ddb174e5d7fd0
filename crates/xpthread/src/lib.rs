//! # xpthread - POSIX Thread Compatibility Layer
//!
//! POSIX-style threading (create/join/detach, mutexes, once, TLS keys) on
//! top of a pluggable task scheduler.
//!
//! Ported code keeps calling the thread API it was written against; the
//! layer translates those calls onto whatever scheduler actually runs the
//! tasks. A reference backend over `std::thread` is included.
//!
//! ## Features
//!
//! - **Lifecycle**: create, join, detach with a slot+generation registry,
//!   so stale handles miss cleanly instead of aliasing reused slots
//! - **Deadlock detection**: self-join and mutual-join are detected and
//!   reported as `EDEADLK` instead of hanging
//! - **Start rendezvous**: a created thread never runs before its registry
//!   record is committed, so it can always resolve itself
//! - **Mutexes**: NORMAL and RECURSIVE kinds, minted by the scheduler
//! - **One-time init**: `pthread_once` analogue, usable even before the
//!   scheduler can identify the calling task
//! - **errno surface**: every error maps to its POSIX errno value
//!
//! ## Quick Start
//!
//! ```ignore
//! use xpthread::{MutexKind, PthreadLayer};
//!
//! fn main() {
//!     let pt = PthreadLayer::host().unwrap();
//!
//!     // Create and join a thread
//!     let id = pt.create(|| {
//!         println!("Hello from a pthread!");
//!     }).unwrap();
//!     pt.join(id).unwrap();
//!
//!     // Fire-and-forget
//!     let id = pt.create(|| do_background_work()).unwrap();
//!     pt.detach(id).unwrap();
//!
//!     // Mutual exclusion
//!     let mux = pt.mutex(MutexKind::Normal).unwrap();
//!     mux.lock();
//!     // ... critical section ...
//!     mux.unlock();
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      User Code                          │
//! │       create(), join(), detach(), once(), mutex()       │
//! └─────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     PthreadLayer                        │
//! │     Registry (slot + generation), join protocol,        │
//! │     deadlock detection, once gate, mutex objects        │
//! └─────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  TaskScheduler trait                    │
//! │      spawn, current, yield, sleep_us, new_mutex         │
//! └─────────────────────────────────────────────────────────┘
//!                             │
//!               ┌─────────────┴─────────────┐
//!               ▼                           ▼
//!       ┌───────────────┐          ┌─────────────────┐
//!       │ HostScheduler │          │ your scheduler  │
//!       │ std::thread + │          │ (RTOS, green    │
//!       │ futex wakeups │          │  threads, ...)  │
//!       └───────────────┘          └─────────────────┘
//! ```

pub mod config;
pub mod key;
pub mod mutex;
pub mod once;
mod registry;
pub mod thread;

// Re-export core types
pub use xpthread_core::{
    errno, MutexKind, NativeTask, RawTaskMutex, SpawnError, TaskEntry, TaskRef, TaskScheduler,
    TaskSpec, ThreadError, ThreadId, ThreadResult, ThreadState,
};

// Re-export xprint macros for debug logging
pub use xpthread_core::{xdebug, xerror, xinfo, xprint, xprintln, xtrace, xwarn};
pub use xpthread_core::xlog::{init as init_logging, set_flush_enabled, set_log_level, LogLevel};

// Re-export env utilities
pub use xpthread_core::{env_get, env_get_bool, env_get_str, env_is_set};

// Re-export the bundled host backend
pub use xpthread_host::HostScheduler;

pub use config::{ConfigError, ThreadConfig};
pub use key::TlsKey;
pub use mutex::{Mutex, MutexAttr, MutexBusy};
pub use once::OnceGate;
pub use thread::{equal, PthreadLayer, ThreadAttr};

use std::sync::Arc;

impl PthreadLayer {
    /// Layer over the bundled [`HostScheduler`], configured from the
    /// environment. The usual entry point on a regular OS.
    pub fn host() -> ThreadResult<Self> {
        Self::new(Arc::new(HostScheduler::new()))
    }
}
