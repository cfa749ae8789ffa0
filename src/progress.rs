//! Lock-free state shared with the render pass.
//!
//! The render pass reads progress and the current scene every frame while the
//! controller writes them. The scene is an `Arc` swapped whole, so a reader
//! sees either the old scene or the new one, never a mix. Every publish bumps
//! the cell's epoch, and progress values carry the epoch of the scene they
//! were computed for, so a frame can tell when it has paired a scene with
//! progress from another cycle.
//!
//! Writers publish the scene before storing progress for it; readers load
//! progress before the scene. A reader therefore never sees progress newer
//! than its scene.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Atomic `f32` stamped with a scene epoch, packed into one `u64`.
#[derive(Debug)]
pub struct AtomicProgress(AtomicU64);

#[inline]
fn pack(epoch: u32, value: f32) -> u64 {
    (u64::from(epoch) << 32) | u64::from(value.to_bits())
}

impl AtomicProgress {
    pub fn new(epoch: u32, value: f32) -> Self {
        Self(AtomicU64::new(pack(epoch, value)))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        self.load_stamped().1
    }

    /// Epoch and value, read together.
    #[inline]
    pub fn load_stamped(&self) -> (u32, f32) {
        let bits = self.0.load(Ordering::Acquire);
        ((bits >> 32) as u32, f32::from_bits(bits as u32))
    }

    #[inline]
    pub fn store(&self, epoch: u32, value: f32) {
        self.0.store(pack(epoch, value), Ordering::Release);
    }
}

/// Holder for an immutable snapshot that is replaced, never edited.
///
/// Readers clone the `Arc` under a short read lock and then work on their own
/// handle, so a slow frame never blocks a publish for longer than the clone.
#[derive(Debug)]
pub struct SnapshotCell<T> {
    current: RwLock<(u32, Arc<T>)>,
}

impl<T> SnapshotCell<T> {
    /// Cell holding `value` at epoch 0.
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new((0, Arc::new(value))),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.read().1)
    }

    /// Current snapshot with its epoch.
    pub fn load_stamped(&self) -> (u32, Arc<T>) {
        let current = self.current.read();
        (current.0, Arc::clone(&current.1))
    }

    /// Replace the snapshot and return its epoch. Readers holding the old one
    /// keep it alive.
    pub fn publish(&self, value: T) -> u32 {
        let mut current = self.current.write();
        let epoch = current.0.wrapping_add(1);
        *current = (epoch, Arc::new(value));
        epoch
    }
}
