//! # Synchronization Primitives
//!
//! Critical-section based exclusion. On the Cortex-M4 target a critical
//! section masks interrupts (the `critical-section-single-core` impl from
//! `cortex-m`), which also masks the SysTick/PendSV pair and therefore
//! prevents preemption. On the host the `std` impl of `critical-section`
//! backs it with a process-wide lock, so the same code is exercised by
//! multi-threaded tests.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

/// Execute a closure within a critical section.
///
/// Keep critical sections as short as possible to minimize interrupt
/// latency.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

/// A value that may only be touched inside a critical section.
///
/// This is the single exclusion mechanism of the game core. It is scoped to
/// the value it wraps: holding one `Locked` does not protect any other
/// shared field.
pub struct Locked<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Locked<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access to the wrapped value.
    ///
    /// # Panics
    /// Panics if called re-entrantly from inside `f` on the same value.
    #[inline]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}
