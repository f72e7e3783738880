use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock `lock`, recovering the guard if a previous holder panicked.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!(
            op,
            target_module = target,
            lock_kind = "mutex.lock",
            result = "poisoned_recovered",
            hint = "state may be stale after a panic in another thread",
            "Recovered from poisoned lock"
        );
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    #[test]
    fn recovers_value_from_poisoned_mutex() {
        let lock = Mutex::new(41_u32);
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let mut guard = lock.lock().expect("fresh mutex should lock");
            *guard += 1;
            panic!("poison the mutex");
        }));

        assert!(lock.is_poisoned());
        assert_eq!(*mutex_lock(&lock, "cache::lock::tests", "recover"), 42);
    }
}
