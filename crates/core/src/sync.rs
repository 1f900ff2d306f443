//! Lock helpers that recover from poisoning instead of panicking.
//!
//! A panic while a cache lock is held leaves the data usable: every cache
//! operation leaves the map in a consistent state between statements.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("{} mutex was poisoned, recovering", what);
        poisoned.into_inner()
    })
}

pub fn read<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        log::warn!("{} lock was poisoned, recovering", what);
        poisoned.into_inner()
    })
}

pub fn write<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        log::warn!("{} lock was poisoned, recovering", what);
        poisoned.into_inner()
    })
}
