//! A datum bundled with its lock.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Wraps a value so that every read and write happens inside a critical
/// section.
///
/// All access flows through [`apply`](Guarded::apply), which makes forgetting
/// the lock impossible. Condition-variable coordination goes through
/// [`wait`](Guarded::wait) and [`wait_and_apply`](Guarded::wait_and_apply),
/// which evaluate their predicate under the same lock so wake-ups cannot be
/// lost to stale state.
///
/// The lock is not re-entrant: a nested `apply` on the same value deadlocks.
/// Keep critical sections flat.
#[derive(Debug, Default)]
pub struct Guarded<T> {
    data: Mutex<T>,
}

impl<T> Guarded<T> {
    /// Wraps `data` behind a fresh lock.
    pub fn new(data: T) -> Self {
        Self { data: Mutex::new(data) }
    }

    /// Runs `function` on the value inside the critical section and returns
    /// its result.
    pub fn apply<R>(&self, function: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        function(&mut guard)
    }

    /// Blocks on `condition_variable` until `predicate` holds for the value.
    ///
    /// The predicate is re-evaluated under the lock after every wake-up, so
    /// spurious notifications are harmless.
    pub fn wait(&self, condition_variable: &Condvar, mut predicate: impl FnMut(&T) -> bool) {
        let guard = self.lock();
        let _guard = condition_variable
            .wait_while(guard, |data| !predicate(data))
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until `predicate` holds, then runs `function` under the same
    /// lock.
    pub fn wait_and_apply<R>(
        &self,
        condition_variable: &Condvar,
        mut predicate: impl FnMut(&T) -> bool,
        function: impl FnOnce(&mut T) -> R,
    ) -> R {
        let guard = self.lock();
        let mut guard = condition_variable
            .wait_while(guard, |data| !predicate(data))
            .unwrap_or_else(PoisonError::into_inner);
        function(&mut guard)
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // A panicking closure must not wedge the workers that share the value.
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
