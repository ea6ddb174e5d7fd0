//! Error types for the compatibility layer
//!
//! Every caller-visible failure maps to the POSIX errno value that code
//! written against the C API expects. Internal invariant violations are not
//! represented here; those panic at the point of detection.

use core::fmt;

/// Result type for layer operations
pub type ThreadResult<T> = Result<T, ThreadError>;

/// POSIX errno values the layer's error taxonomy maps onto.
///
/// Linux numbering; kept as plain constants so callers bridging to C code
/// can compare directly.
pub mod errno {
    pub const ESRCH: i32 = 3;
    pub const EAGAIN: i32 = 11;
    pub const ENOMEM: i32 = 12;
    pub const EBUSY: i32 = 16;
    pub const EINVAL: i32 = 22;
    pub const EDEADLK: i32 = 35;
    pub const ENOSYS: i32 = 38;
}

/// Errors returned by thread, mutex, once and key operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    /// Bad or unsupported argument (uninitialized gate or attribute)
    InvalidArgument,

    /// Allocation failure: registry full, or the scheduler ran out of memory
    OutOfMemory,

    /// The scheduler refused a spawn or semaphore request for a
    /// non-memory reason
    SchedulerRejected,

    /// Handle does not name a live thread
    NoSuchThread,

    /// The target thread already has a join waiter registered
    AlreadyJoining,

    /// A thread attempted to join itself
    SelfDeadlock,

    /// Two threads attempted to join each other
    MutualDeadlock,

    /// Mutex is held (trylock or destroy)
    Busy,

    /// Operation is deliberately unimplemented (cancellation,
    /// attribute introspection)
    NotSupported,
}

impl ThreadError {
    /// The errno value a C caller would see for this error
    pub const fn errno(&self) -> i32 {
        match self {
            ThreadError::InvalidArgument => errno::EINVAL,
            ThreadError::OutOfMemory => errno::ENOMEM,
            ThreadError::SchedulerRejected => errno::EAGAIN,
            ThreadError::NoSuchThread => errno::ESRCH,
            ThreadError::AlreadyJoining => errno::EINVAL,
            ThreadError::SelfDeadlock => errno::EDEADLK,
            ThreadError::MutualDeadlock => errno::EDEADLK,
            ThreadError::Busy => errno::EBUSY,
            ThreadError::NotSupported => errno::ENOSYS,
        }
    }
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::InvalidArgument => write!(f, "invalid argument"),
            ThreadError::OutOfMemory => write!(f, "out of memory"),
            ThreadError::SchedulerRejected => write!(f, "scheduler rejected the request"),
            ThreadError::NoSuchThread => write!(f, "no such thread"),
            ThreadError::AlreadyJoining => write!(f, "thread already has a join waiter"),
            ThreadError::SelfDeadlock => write!(f, "thread attempted to join itself"),
            ThreadError::MutualDeadlock => write!(f, "two threads attempted to join each other"),
            ThreadError::Busy => write!(f, "resource busy"),
            ThreadError::NotSupported => write!(f, "operation not supported"),
        }
    }
}

impl std::error::Error for ThreadError {}

/// Errors a scheduler backend may report when asked to spawn a task or
/// allocate a semaphore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The backend could not allocate memory for the task
    NoMemory,

    /// The backend refused for some other reason (limits, shutdown)
    Rejected,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::NoMemory => write!(f, "task allocation failed"),
            SpawnError::Rejected => write!(f, "task spawn rejected"),
        }
    }
}

impl std::error::Error for SpawnError {}

impl From<SpawnError> for ThreadError {
    fn from(e: SpawnError) -> Self {
        match e {
            SpawnError::NoMemory => ThreadError::OutOfMemory,
            SpawnError::Rejected => ThreadError::SchedulerRejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ThreadError::NoSuchThread;
        assert_eq!(format!("{}", e), "no such thread");

        let e = ThreadError::SelfDeadlock;
        assert_eq!(format!("{}", e), "thread attempted to join itself");
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(ThreadError::InvalidArgument.errno(), errno::EINVAL);
        assert_eq!(ThreadError::AlreadyJoining.errno(), errno::EINVAL);
        assert_eq!(ThreadError::OutOfMemory.errno(), errno::ENOMEM);
        assert_eq!(ThreadError::SchedulerRejected.errno(), errno::EAGAIN);
        assert_eq!(ThreadError::NoSuchThread.errno(), errno::ESRCH);
        assert_eq!(ThreadError::SelfDeadlock.errno(), errno::EDEADLK);
        assert_eq!(ThreadError::MutualDeadlock.errno(), errno::EDEADLK);
        assert_eq!(ThreadError::Busy.errno(), errno::EBUSY);
        assert_eq!(ThreadError::NotSupported.errno(), errno::ENOSYS);
    }

    #[test]
    fn test_spawn_error_conversion() {
        let e: ThreadError = SpawnError::NoMemory.into();
        assert_eq!(e, ThreadError::OutOfMemory);

        let e: ThreadError = SpawnError::Rejected.into();
        assert_eq!(e, ThreadError::SchedulerRejected);
    }
}
