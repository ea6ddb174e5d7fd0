//! Mutexes
//!
//! Thin POSIX-shaped wrappers over the scheduler's semaphore primitive.
//! The normal kind is owner-agnostic, so relocking it from the holding
//! thread blocks forever (POSIX NORMAL semantics, no detection added); the
//! recursive kind tracks its owner and a depth counter. Mutexes have a
//! lifetime independent of any thread record and never touch the registry.

use core::fmt;

use xpthread_core::{MutexKind, RawTaskMutex, ThreadError, ThreadResult};

use crate::thread::PthreadLayer;

/// A POSIX-style mutex backed by a scheduler semaphore
pub struct Mutex {
    raw: Box<dyn RawTaskMutex>,
    kind: MutexKind,
}

impl PthreadLayer {
    /// Allocate a mutex of the given kind
    pub fn mutex(&self, kind: MutexKind) -> ThreadResult<Mutex> {
        let raw = self.inner.scheduler.new_mutex(kind)?;
        Ok(Mutex { raw, kind })
    }

    /// Allocate a mutex configured by an attribute object
    pub fn mutex_with_attr(&self, attr: &MutexAttr) -> ThreadResult<Mutex> {
        self.mutex(attr.kind()?)
    }
}

impl Mutex {
    /// Block until the mutex is acquired
    pub fn lock(&self) {
        self.raw.acquire();
    }

    /// Acquire without blocking
    pub fn try_lock(&self) -> ThreadResult<()> {
        if self.raw.try_acquire() {
            Ok(())
        } else {
            Err(ThreadError::Busy)
        }
    }

    /// Release one level of ownership
    ///
    /// The caller must hold the mutex; a non-owner release is ignored by
    /// the underlying semaphore.
    pub fn unlock(&self) {
        self.raw.release();
    }

    pub fn kind(&self) -> MutexKind {
        self.kind
    }

    /// Destroy the mutex
    ///
    /// Probes with a non-blocking acquire: a mutex held elsewhere refuses
    /// destruction and is handed back intact inside the error. The probe
    /// leaves the mutex momentarily locked in the success path, which no
    /// other party can observe before the object is gone.
    pub fn destroy(self) -> Result<(), MutexBusy> {
        if self.raw.try_acquire() {
            self.raw.release();
            Ok(())
        } else {
            Err(MutexBusy(self))
        }
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Destroy refusal carrying the still-live mutex back to the caller
pub struct MutexBusy(pub Mutex);

impl MutexBusy {
    /// Recover the mutex for continued use
    pub fn into_inner(self) -> Mutex {
        self.0
    }

    /// The errno value a C caller would see
    pub const fn errno(&self) -> i32 {
        xpthread_core::errno::EBUSY
    }
}

impl fmt::Debug for MutexBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutexBusy").field(&self.0).finish()
    }
}

impl fmt::Display for MutexBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mutex is busy")
    }
}

impl std::error::Error for MutexBusy {}

/// POSIX-style mutex attribute object
///
/// A default-constructed attribute models uninitialized storage and is
/// rejected by every operation; `new()` produces an initialized attribute.
#[derive(Debug, Clone, Default)]
pub struct MutexAttr {
    kind: MutexKind,
    initialized: bool,
}

impl MutexAttr {
    /// An initialized attribute selecting the normal kind
    pub fn new() -> Self {
        Self {
            kind: MutexKind::Normal,
            initialized: true,
        }
    }

    /// Return the attribute to the uninitialized state
    pub fn destroy(&mut self) -> ThreadResult<()> {
        if !self.initialized {
            return Err(ThreadError::InvalidArgument);
        }
        self.initialized = false;
        Ok(())
    }

    /// Select the kind of mutex this attribute produces
    pub fn set_kind(&mut self, kind: MutexKind) -> ThreadResult<()> {
        if !self.initialized {
            return Err(ThreadError::InvalidArgument);
        }
        self.kind = kind;
        Ok(())
    }

    /// Attribute introspection is out of scope
    pub fn get_kind(&self) -> ThreadResult<MutexKind> {
        Err(ThreadError::NotSupported)
    }

    pub(crate) fn kind(&self) -> ThreadResult<MutexKind> {
        if !self.initialized {
            return Err(ThreadError::InvalidArgument);
        }
        Ok(self.kind)
    }
}
