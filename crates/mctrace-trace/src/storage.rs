//! Sectioned value storage.
//!
//! One [`SectionStorage`] holds the values of every symbol of one section at
//! one point in time, addressed by the symbol's offset within its section.
//! Slots start unassigned and follow single-assignment: a slot may be written
//! again only with the value it already holds.

use mctrace_core::Value;

/// A rejected write: the slot already holds `existing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotConflict {
    /// Offset of the slot.
    pub offset: usize,
    /// Value held by the slot.
    pub existing: Value,
    /// Value that was rejected.
    pub attempted: Value,
}

/// Fixed-size array of optionally assigned values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionStorage {
    slots: Box<[Option<Value>]>,
}

impl SectionStorage {
    /// Storage for `n` symbols, all unassigned.
    #[must_use]
    pub fn allocate(n: usize) -> Self {
        Self {
            slots: vec![None; n].into_boxed_slice(),
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the storage has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value at `offset` (`None` when unassigned or out of range).
    #[inline]
    #[must_use]
    pub fn read(&self, offset: usize) -> Option<Value> {
        self.slots.get(offset).copied().flatten()
    }

    /// Whether the slot at `offset` holds a value.
    #[inline]
    #[must_use]
    pub fn is_assigned(&self, offset: usize) -> bool {
        self.read(offset).is_some()
    }

    /// Single-assignment write.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of range; offsets come from the lookup index
    /// and are always in range for storage sized from the same index.
    pub fn write(&mut self, offset: usize, value: Value) -> Result<(), SlotConflict> {
        let slot = &mut self.slots[offset];
        match *slot {
            Some(existing) if existing != value => Err(SlotConflict {
                offset,
                existing,
                attempted: value,
            }),
            _ => {
                *slot = Some(value);
                Ok(())
            }
        }
    }

    /// Overwrite with the contents of `src` (slot counts must agree).
    pub fn copy_from(&mut self, src: &Self) {
        debug_assert_eq!(self.len(), src.len());
        self.slots.copy_from_slice(&src.slots);
    }

    /// First slot where both sides hold different values.
    #[must_use]
    pub fn first_conflict(&self, other: &Self) -> Option<SlotConflict> {
        self.slots
            .iter()
            .zip(other.slots.iter())
            .enumerate()
            .find_map(|(offset, pair)| match pair {
                (Some(a), Some(b)) if a != b => Some(SlotConflict {
                    offset,
                    existing: *a,
                    attempted: *b,
                }),
                _ => None,
            })
    }

    /// Fill unassigned slots from `other`.
    ///
    /// Call [`first_conflict`](Self::first_conflict) first; slots assigned on
    /// both sides keep their current value.
    pub fn merge_from(&mut self, other: &Self) {
        for (dst, src) in self.slots.iter_mut().zip(other.slots.iter()) {
            if dst.is_none() {
                *dst = *src;
            }
        }
    }

    /// Assigned `(offset, value)` pairs in offset order.
    pub fn assigned(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    /// Whether no slot is assigned.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_storage_is_blank() {
        let s = SectionStorage::allocate(3);
        assert_eq!(s.len(), 3);
        assert!(s.is_blank());
        assert_eq!(s.read(0), None);
        assert_eq!(s.read(7), None);
    }

    #[test]
    fn single_assignment() {
        let mut s = SectionStorage::allocate(2);
        s.write(1, Value(4)).unwrap();
        s.write(1, Value(4)).unwrap();
        assert_eq!(
            s.write(1, Value(5)),
            Err(SlotConflict {
                offset: 1,
                existing: Value(4),
                attempted: Value(5)
            })
        );
        assert_eq!(s.read(1), Some(Value(4)));
        assert_eq!(s.assigned().collect::<Vec<_>>(), vec![(1, Value(4))]);
    }

    #[test]
    fn merge_fills_holes_and_detects_conflicts() {
        let mut a = SectionStorage::allocate(3);
        let mut b = SectionStorage::allocate(3);
        a.write(0, Value(1)).unwrap();
        b.write(0, Value(1)).unwrap();
        b.write(2, Value(9)).unwrap();
        assert_eq!(a.first_conflict(&b), None);
        a.merge_from(&b);
        assert_eq!(a.read(2), Some(Value(9)));

        let mut c = SectionStorage::allocate(3);
        c.write(2, Value(8)).unwrap();
        assert_eq!(a.first_conflict(&c).map(|c| c.offset), Some(2));
    }

    #[test]
    fn copy_and_compare() {
        let mut a = SectionStorage::allocate(2);
        a.write(0, Value(3)).unwrap();
        let mut b = SectionStorage::allocate(2);
        assert_ne!(a, b);
        b.copy_from(&a);
        assert_eq!(a, b);
    }
}
