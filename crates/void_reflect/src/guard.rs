//! Access guard - a value bundled with its reader/writer lock
//!
//! The type database keeps its tables behind an `AccessGuard`; callers that
//! need to share an [`Any`](crate::Any) across threads can do the same.

use core::fmt;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared (read) access to a guarded value
pub type Guarded<'a, T> = RwLockReadGuard<'a, T>;

/// Exclusive (write) access to a guarded value
pub type GuardedMut<'a, T> = RwLockWriteGuard<'a, T>;

/// A value that can only be reached through a lock guard
pub struct AccessGuard<T> {
    value: RwLock<T>,
}

impl<T> AccessGuard<T> {
    /// Wrap a value
    pub const fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Acquire exclusive access, blocking until available
    #[inline]
    pub fn access(&self) -> GuardedMut<'_, T> {
        self.value.write()
    }

    /// Acquire shared access, blocking until available
    #[inline]
    pub fn access_shared(&self) -> Guarded<'_, T> {
        self.value.read()
    }

    /// Try to acquire exclusive access without blocking
    #[inline]
    pub fn try_access(&self) -> Option<GuardedMut<'_, T>> {
        self.value.try_write()
    }

    /// Try to acquire shared access without blocking
    #[inline]
    pub fn try_access_shared(&self) -> Option<Guarded<'_, T>> {
        self.value.try_read()
    }

    /// Access the value through a unique borrow, no locking needed
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for AccessGuard<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for AccessGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGuard")
            .field("locked", &self.value.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_readers() {
        let guard = AccessGuard::new(5);
        let a = guard.access_shared();
        let b = guard.access_shared();
        assert_eq!(*a + *b, 10);
        assert!(guard.try_access().is_none());
    }

    #[test]
    fn test_exclusive_writer() {
        let guard = AccessGuard::new(Vec::new());
        guard.access().push(1);
        {
            let _writer = guard.access();
            assert!(guard.try_access_shared().is_none());
        }
        assert_eq!(*guard.access_shared(), vec![1]);
    }
}
