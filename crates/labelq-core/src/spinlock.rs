//! Spinlock guarding a queue and its scheduler context
//!
//! Queue operations are short and never block, so producers and the
//! dispatcher contend on a spinlock rather than an OS mutex. The guard is
//! the proof of lock: queue operations take `&mut` access that can only be
//! obtained through it.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Upper bound on pause hints between two polls of the lock word
const MAX_BACKOFF: u32 = 64;

pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// Safety: access to `data` is serialized by `locked`
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquire the lock, spinning with exponential backoff
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let mut backoff = 1u32;
        loop {
            if let Some(guard) = self.try_lock_weak() {
                return guard;
            }
            while self.locked.load(Ordering::Relaxed) {
                for _ in 0..backoff {
                    core::hint::spin_loop();
                }
                if backoff < MAX_BACKOFF {
                    backoff <<= 1;
                } else {
                    std::thread::yield_now();
                }
            }
        }
    }

    #[inline]
    fn try_lock_weak(&self) -> Option<SpinLockGuard<'_, T>> {
        self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SpinLockGuard { lock: self })
    }

    /// Try to acquire the lock without spinning
    #[inline]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SpinLockGuard { lock: self })
    }

    /// Exclusive access through `&mut self`, no locking needed
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl<T: Default> Default for SpinLock<T> {
    fn default() -> Self {
        SpinLock::new(T::default())
    }
}

/// Releases the spinlock when dropped
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<'a, T> Deref for SpinLockGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: we hold the lock
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for SpinLockGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: we hold the lock
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for SpinLockGuard<'a, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_try_lock_excludes() {
        let lock = SpinLock::new(VecDeque::<u32>::new());
        let guard = lock.try_lock();
        assert!(guard.is_some());
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn test_guard_and_into_inner() {
        let mut lock = SpinLock::new(vec![1u32]);
        lock.lock().push(2);
        lock.get_mut().push(3);
        assert_eq!(lock.into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn test_concurrent_producers() {
        let lock = Arc::new(SpinLock::new(VecDeque::new()));
        let mut handles = vec![];

        for t in 0..4u32 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for i in 0..500u32 {
                    lock.lock().push_back(t * 1000 + i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let queue = lock.lock();
        assert_eq!(queue.len(), 2000);
        // Each producer's items stay in its own push order
        for t in 0..4u32 {
            let mine: Vec<u32> = queue.iter().copied().filter(|v| v / 1000 == t).collect();
            assert!(mine.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
