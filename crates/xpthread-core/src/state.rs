//! Thread lifecycle state and mutex kind types

use core::fmt;

/// Lifecycle state of a thread's registry record.
///
/// A thread is `Running` from creation until its entry function returns.
/// If it finishes with no joiner registered and is not detached, its record
/// stays in the registry as `Exited` until a later join or detach reclaims
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Started (or about to start) and not yet finished
    Running = 0,

    /// Entry function returned; record awaits reclamation
    Exited = 1,
}

impl ThreadState {
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, ThreadState::Running)
    }

    #[inline]
    pub const fn is_exited(&self) -> bool {
        matches!(self, ThreadState::Exited)
    }
}

impl From<u8> for ThreadState {
    fn from(v: u8) -> Self {
        match v {
            1 => ThreadState::Exited,
            _ => ThreadState::Running,
        }
    }
}

impl From<ThreadState> for u8 {
    fn from(state: ThreadState) -> u8 {
        state as u8
    }
}

/// Mutex flavor, matching the two POSIX types the layer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MutexKind {
    /// POSIX "NORMAL": relocking by the owner deadlocks, no owner tracking
    Normal = 0,

    /// POSIX "RECURSIVE": the owner may re-lock, tracked by a depth counter
    Recursive = 1,
}

impl MutexKind {
    #[inline]
    pub const fn is_recursive(&self) -> bool {
        matches!(self, MutexKind::Recursive)
    }
}

impl Default for MutexKind {
    fn default() -> Self {
        MutexKind::Normal
    }
}

impl From<u8> for MutexKind {
    fn from(v: u8) -> Self {
        match v {
            1 => MutexKind::Recursive,
            _ => MutexKind::Normal,
        }
    }
}

impl From<MutexKind> for u8 {
    fn from(kind: MutexKind) -> u8 {
        kind as u8
    }
}

impl fmt::Display for MutexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutexKind::Normal => write!(f, "normal"),
            MutexKind::Recursive => write!(f, "recursive"),
        }
    }
}
