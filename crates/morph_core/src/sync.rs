//! Small synchronization helpers
//!
//! Animation state is written from a single cooperative scheduler but read
//! from anywhere, so scalar state is kept in atomics and the few mutexes we
//! need recover from poisoning instead of propagating a panic.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a std mutex, recovering the guard if a previous holder panicked
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An `f32` stored as raw bits in an [`AtomicU32`]
#[derive(Debug, Default)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Store a new value and return the previous one
    pub fn swap(&self, value: f32) -> f32 {
        f32::from_bits(self.bits.swap(value.to_bits(), Ordering::AcqRel))
    }
}
