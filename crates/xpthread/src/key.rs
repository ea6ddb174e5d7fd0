//! Thread-local storage keys
//!
//! A deliberately degenerate surface: exactly one key may be created per
//! layer, and the per-thread value operations are not implemented. Code
//! that only probes `pthread_key_create` for availability works; code that
//! actually stores values trips a fatal error instead of silently losing
//! data.

use std::sync::atomic::Ordering;

use xpthread_core::{xwarn, ThreadError, ThreadResult};

use crate::thread::PthreadLayer;

/// Handle for a created TLS key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsKey(u32);

impl PthreadLayer {
    /// Create a TLS key. The layer has a single key slot; a second call
    /// fails with `OutOfMemory` until the layer itself is dropped.
    ///
    /// The destructor is accepted for source compatibility but values are
    /// never stored, so it can never fire.
    pub fn key_create(&self, destructor: Option<fn(usize)>) -> ThreadResult<TlsKey> {
        if self.inner.key_created.swap(true, Ordering::SeqCst) {
            return Err(ThreadError::OutOfMemory);
        }
        if destructor.is_some() {
            xwarn!("TLS key destructor registered but will never run");
        }
        Ok(TlsKey(1))
    }

    /// Not implemented. Deleting the key would have to run destructors the
    /// layer never tracks.
    pub fn key_delete(&self, key: TlsKey) -> ! {
        panic!("TLS key deletion is not implemented (key {:?})", key);
    }

    /// Not implemented. There is no per-thread value storage behind a key.
    pub fn key_set(&self, key: TlsKey, _value: usize) -> ! {
        panic!("TLS value storage is not implemented (key {:?})", key);
    }

    /// Not implemented. There is no per-thread value storage behind a key.
    pub fn key_get(&self, key: TlsKey) -> ! {
        panic!("TLS value lookup is not implemented (key {:?})", key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use xpthread_host::HostScheduler;

    use super::*;

    fn layer() -> PthreadLayer {
        PthreadLayer::new(Arc::new(HostScheduler::new())).unwrap()
    }

    #[test]
    fn test_single_key_per_layer() {
        let pt = layer();
        let key = pt.key_create(None).unwrap();
        assert_eq!(key, TlsKey(1));
        assert_eq!(pt.key_create(None), Err(ThreadError::OutOfMemory));
    }

    #[test]
    fn test_destructor_accepted() {
        fn never_runs(_: usize) {}

        let pt = layer();
        assert!(pt.key_create(Some(never_runs)).is_ok());
    }

    #[test]
    fn test_layers_have_independent_key_slots() {
        let a = layer();
        let b = layer();
        assert!(a.key_create(None).is_ok());
        assert!(b.key_create(None).is_ok());
    }

    #[test]
    #[should_panic(expected = "not implemented")]
    fn test_key_get_panics() {
        let pt = layer();
        let key = pt.key_create(None).unwrap();
        pt.key_get(key);
    }

    #[test]
    #[should_panic(expected = "not implemented")]
    fn test_key_set_panics() {
        let pt = layer();
        let key = pt.key_create(None).unwrap();
        pt.key_set(key, 42);
    }

    #[test]
    #[should_panic(expected = "not implemented")]
    fn test_key_delete_panics() {
        let pt = layer();
        let key = pt.key_create(None).unwrap();
        pt.key_delete(key);
    }
}
