use core::cell::{Cell, UnsafeCell};
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use critical_section::RestoreState;

/// State shared between the foreground task and the periodic interrupt.
///
/// Every access goes through [`Shared::lock`], which enters a critical section and keeps it until
/// the returned [`Guard`] is dropped. The interrupt can therefore never observe a half-applied
/// update.
pub struct Shared<T> {
    locked: Cell<bool>,
    value: UnsafeCell<T>,
}

// SAFETY: `value` and `locked` are only touched while a critical section is held, which excludes
// every other context.
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    pub const fn new(value: T) -> Self {
        Shared {
            locked: Cell::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Enters a critical section and grants exclusive access to the value.
    ///
    /// # Panics
    ///
    /// Panics if the same `Shared` is locked re-entrantly.
    pub fn lock(&self) -> Guard<'_, T> {
        // SAFETY: paired with the release in `Guard::drop` (or right below).
        let restore = unsafe { critical_section::acquire() };

        if self.locked.replace(true) {
            // SAFETY: we acquired it above and nothing else will release it.
            unsafe { critical_section::release(restore) };
            panic!("shared state locked re-entrantly");
        }

        Guard {
            shared: self,
            restore,
            _not_send: PhantomData,
        }
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

/// Exclusive access to a [`Shared`] value. The critical section ends when this is dropped.
pub struct Guard<'a, T> {
    shared: &'a Shared<T>,
    restore: RestoreState,
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for Guard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard holds the critical section and the `locked` flag.
        unsafe { &*self.shared.value.get() }
    }
}

impl<T> DerefMut for Guard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, and `&mut self` makes this the only live reference.
        unsafe { &mut *self.shared.value.get() }
    }
}

impl<T> Drop for Guard<'_, T> {
    fn drop(&mut self) {
        self.shared.locked.set(false);
        // SAFETY: `restore` came from the matching `acquire` in `Shared::lock`.
        unsafe { critical_section::release(self.restore) };
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn lock_gives_access() {
        let shared = Shared::new(1u32);

        *shared.lock() += 1;
        {
            let mut guard = shared.lock();
            *guard *= 10;
        }

        assert_eq!(*shared.lock(), 20);
        assert_eq!(shared.into_inner(), 20);
    }

    #[test]
    fn released_on_early_return() {
        fn bump_if_small(shared: &Shared<u32>) -> bool {
            let mut guard = shared.lock();
            if *guard > 5 {
                return false;
            }
            *guard += 1;
            true
        }

        let shared = Shared::new(5u32);
        assert!(bump_if_small(&shared));
        assert!(!bump_if_small(&shared));
        assert_eq!(*shared.lock(), 6);
    }

    #[test]
    #[should_panic(expected = "re-entrantly")]
    fn reentrant_lock_panics() {
        let shared = Shared::new(());
        let _outer = shared.lock();
        let _inner = shared.lock();
    }
}
