//! Counting semaphore
//!
//! `parking_lot` mutex + condvar. Unlike a mutex, a permit taken by one
//! thread may be returned by another, which the reader-group handoff in both
//! disciplines depends on.

use parking_lot::{Condvar, Mutex};

/// A counting semaphore with observable value and waiter count
pub struct Semaphore {
    /// Name used in trace output
    name: &'static str,

    state: Mutex<SemaphoreState>,

    available: Condvar,
}

struct SemaphoreState {
    /// Permits currently available
    value: usize,

    /// Threads blocked in `wait`
    waiters: usize,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits
    pub fn new(name: &'static str, initial: usize) -> Self {
        Self {
            name,
            state: Mutex::new(SemaphoreState {
                value: initial,
                waiters: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking until one is available (P / down)
    pub fn wait(&self) {
        let mut state = self.state.lock();

        if state.value == 0 {
            state.waiters += 1;
            tracing::trace!(semaphore = self.name, waiters = state.waiters, "blocking");
            while state.value == 0 {
                self.available.wait(&mut state);
            }
            state.waiters -= 1;
        }

        state.value -= 1;
    }

    /// Take one permit if one is available right now
    pub fn try_wait(&self) -> bool {
        let mut state = self.state.lock();
        if state.value == 0 {
            return false;
        }
        state.value -= 1;
        true
    }

    /// Return one permit, waking a single waiter (V / up)
    pub fn signal(&self) {
        let mut state = self.state.lock();
        state.value += 1;
        let wake = state.waiters > 0;
        drop(state);

        if wake {
            self.available.notify_one();
        }
    }

    /// Permits currently available
    pub fn value(&self) -> usize {
        self.state.lock().value
    }

    /// Number of threads blocked waiting for a permit
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Semaphore")
            .field("name", &self.name)
            .field("value", &state.value)
            .field("waiters", &state.waiters)
            .finish()
    }
}
