//! Atomic publication of immutable index state.
//!
//! Readers take a cheap `Arc` clone under a read lock that is held only for the
//! clone. Writers build the next value elsewhere and swap the pointer, so a
//! reader sees either the old value or the new one in full.
use std::sync::{Arc, PoisonError, RwLock};

pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(initial: T) -> Self {
        Self { current: RwLock::new(Arc::new(initial)) }
    }

    pub fn load(&self) -> Arc<T> {
        // A panic elsewhere cannot leave a half-written Arc behind, so a
        // poisoned lock still guards a valid value.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the published value, returning the one it superseded.
    pub fn publish(&self, next: T) -> Arc<T> {
        let next = Arc::new(next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}

impl<T: Default> Default for SnapshotCell<T> {
    fn default() -> Self { Self::new(T::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::IndexSnapshot;

    #[test]
    fn publish_returns_previous_and_old_readers_keep_it() {
        let cell = SnapshotCell::new(1u32);
        let before = cell.load();
        let previous = cell.publish(2);
        assert_eq!(*previous, 1);
        assert_eq!(*before, 1);
        assert_eq!(*cell.load(), 2);
    }

    #[test]
    fn readers_never_observe_a_torn_snapshot() {
        let cell = SnapshotCell::new(IndexSnapshot::empty());
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..2_000 {
                        let snap = cell.load();
                        let n = snap.len();
                        assert_eq!(snap.ids().len(), n);
                        for (i, id) in snap.ids().iter().enumerate() {
                            assert_eq!(snap.position(id), Some(i));
                            let row = snap.row(i).expect("row for every id");
                            // Row i of generation n is [n, i] before normalization.
                            let ratio = row[1] / row[0];
                            assert!((ratio - i as f32 / n as f32).abs() < 1e-4);
                        }
                    }
                });
            }
            scope.spawn(|| {
                for n in 1..200usize {
                    let ids = (0..n).map(|i| format!("g{n}-{i}")).collect();
                    let rows = (0..n).map(|i| vec![n as f32, i as f32]).collect();
                    cell.publish(IndexSnapshot::from_parts(ids, rows).expect("valid generation"));
                }
            });
        });
    }
}
