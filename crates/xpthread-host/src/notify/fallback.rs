//! Fallback notification slot using std::sync::Condvar
//!
//! Used on platforms without futex support. Less efficient but portable.

use std::sync::{Condvar, Mutex};

/// Condvar-based binary notification slot (fallback)
pub struct CondvarNotify {
    /// true = notification pending
    pending: Mutex<bool>,

    /// Condition variable
    condvar: Condvar,
}

impl CondvarNotify {
    /// Create a new slot with no pending notification
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Block until a notification is pending, then consume it
    pub fn wait(&self) {
        let mut guard = self.pending.lock().unwrap();
        while !*guard {
            guard = self.condvar.wait(guard).unwrap();
        }
        *guard = false;
    }

    /// Leave a notification and wake the waiter if one is blocked
    pub fn notify(&self) {
        {
            let mut guard = self.pending.lock().unwrap();
            *guard = true;
        }
        self.condvar.notify_one();
    }
}

impl Default for CondvarNotify {
    fn default() -> Self {
        Self::new()
    }
}
