//! Fixed-capacity circular storage.
//!
//! Both the raw sample ring and the average ring are a [`SampleRing`]. Storage
//! is allocated once at construction and never grows or shrinks; every index
//! passed in is reduced modulo the capacity first, so no access can go out of
//! bounds.

extern crate alloc;
use alloc::boxed::Box;
use alloc::vec;

/// Circular buffer of `capacity` slots addressed by modular index
#[derive(Debug, Clone)]
pub struct SampleRing<T> {
    slots: Box<[T]>,
}

impl<T: Copy> SampleRing<T> {
    /// Allocate a ring of `capacity` slots, each holding `sentinel`
    ///
    /// `capacity` must be non-zero; [`RingGeometry`](crate::RingGeometry)
    /// guarantees this for the rings the engine builds.
    pub fn new(capacity: usize, sentinel: T) -> Self {
        debug_assert!(capacity > 0, "ring capacity must be non-zero");
        Self {
            slots: vec![sentinel; capacity].into_boxed_slice(),
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Map `base + offset` onto `[0, capacity)`
    ///
    /// Negative offsets wrap backwards, so `ring_index(0, -1)` is the last slot.
    pub fn ring_index(&self, base: usize, offset: isize) -> usize {
        let capacity = self.slots.len() as i64;
        (base as i64 + offset as i64).rem_euclid(capacity) as usize
    }

    /// Store `item` at `index mod capacity`
    pub fn write(&mut self, index: usize, item: T) {
        let slot = index % self.slots.len();
        self.slots[slot] = item;
    }

    /// Read the slot at `index mod capacity`
    ///
    /// Unwritten slots hold the sentinel given to [`SampleRing::new`]; callers
    /// decide whether a slot has been written.
    pub fn read(&self, index: usize) -> T {
        self.slots[index % self.slots.len()]
    }

    /// Iterate over `count` consecutive slots starting at `start`, wrapping
    /// past the end of storage
    pub fn iter_from(&self, start: usize, count: usize) -> impl Iterator<Item = T> + '_ {
        (0..count).map(move |i| self.read(self.ring_index(start, i as isize)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_index_wraps_negative_offsets() {
        let ring = SampleRing::new(4320, 0u32);
        assert_eq!(ring.ring_index(0, -1), 4319);
        assert_eq!(ring.ring_index(0, 0), 0);
        assert_eq!(ring.ring_index(4319, 1), 0);
        assert_eq!(ring.ring_index(5, -60), 4265);
        assert_eq!(ring.ring_index(0, -4320), 0);
        assert_eq!(ring.ring_index(0, -4321), 4319);
    }

    #[test]
    fn test_ring_index_always_in_range() {
        let ring = SampleRing::new(7, 0u8);
        for base in 0..20usize {
            for offset in -30isize..30 {
                let index = ring.ring_index(base, offset);
                assert!(index < 7);
                assert_eq!(index as i64, (base as i64 + offset as i64).rem_euclid(7));
            }
        }
    }

    #[test]
    fn test_write_and_read_reduce_index() {
        let mut ring = SampleRing::new(3, 0i32);
        ring.write(4, 42);
        assert_eq!(ring.read(1), 42);
        assert_eq!(ring.read(7), 42);
        assert_eq!(ring.read(0), 0);
        assert_eq!(ring.capacity(), 3);
    }

    #[test]
    fn test_iter_from_crosses_boundary() {
        let mut ring = SampleRing::new(5, 0usize);
        for i in 0..5 {
            ring.write(i, i * 10);
        }
        let values: alloc::vec::Vec<usize> = ring.iter_from(3, 4).collect();
        assert_eq!(values, [30, 40, 0, 10]);
    }
}
