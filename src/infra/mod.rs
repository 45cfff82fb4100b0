pub mod auth;
pub mod memory;
pub mod storage;
pub mod store;
pub mod subscription;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Recover from poisoning; shared state is never left half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
