use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use super::triangulate::Triangle;
use crate::data::MeshVertex;

/// Fixed array of slots that concurrent writers fill at disjoint positions
struct SlotBuffer<T> {
    slots: Box<[UnsafeCell<T>]>,
}

// SAFETY: a slot is only written through `Reservation`, and the atomic counter hands every
// slot index to exactly one reservation between resets. The counter saturates instead of
// wrapping, so a slot below capacity is never handed out twice. Reads need `&mut MeshBuffers` or happen
// after every reservation borrowing the buffers has been dropped.
unsafe impl<T: Send> Sync for SlotBuffer<T> {}

impl<T: Copy + Default> SlotBuffer<T> {
    fn new(length: usize) -> Self {
        SlotBuffer {
            slots: (0..length).map(|_| UnsafeCell::new(T::default())).collect(),
        }
    }

    /// # Safety
    /// no other thread may access `slot` concurrently
    unsafe fn write(&self, slot: usize, value: T) {
        *self.slots[slot].get() = value;
    }

    fn prefix(&mut self, length: usize) -> Vec<T> {
        self.slots[..length]
            .iter_mut()
            .map(|slot| *slot.get_mut())
            .collect()
    }
}

/// Rounds a slot count down to whole triangles, keeping room for at least one
pub fn whole_triangles(capacity: u32) -> u32 {
    (capacity - capacity % 3).max(3)
}

/// Host side output vertex and index arrays plus the shared write counter
pub struct MeshBuffers {
    vertices: SlotBuffer<MeshVertex>,
    indices: SlotBuffer<u32>,
    counter: AtomicU32,
    capacity: u32,
}

impl MeshBuffers {
    /// `capacity` is rounded with `whole_triangles`
    pub fn new(capacity: u32) -> Self {
        let capacity = whole_triangles(capacity);
        MeshBuffers {
            vertices: SlotBuffer::new(capacity as usize),
            indices: SlotBuffer::new(capacity as usize),
            counter: AtomicU32::new(0),
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn reset(&mut self) {
        *self.counter.get_mut() = 0;
    }

    /// Slots requested so far this frame, may exceed capacity and stops at `u32::MAX`
    pub fn requested(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }

    /// Slots holding whole, written triangles
    pub fn published(&self) -> u32 {
        self.requested().min(self.capacity)
    }

    /// Reserves `3 * triangle_count` consecutive slots for one cell
    pub fn reserve(&self, triangle_count: usize) -> Reservation<'_> {
        let length = u32::try_from(triangle_count.saturating_mul(3)).unwrap_or(u32::MAX);
        let base = match self.counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
            Some(count.saturating_add(length))
        }) {
            Ok(base) | Err(base) => base,
        };
        // a saturated counter may leave less than `length` slots before `u32::MAX`
        let length = length.min(u32::MAX - base);
        Reservation {
            buffers: self,
            base,
            length,
        }
    }

    /// Copies out the published prefix of both arrays
    pub fn read(&mut self) -> (Vec<MeshVertex>, Vec<u32>) {
        let published = self.published() as usize;
        (
            self.vertices.prefix(published),
            self.indices.prefix(published),
        )
    }
}

/// Range of slots granted to one cell
pub struct Reservation<'a> {
    buffers: &'a MeshBuffers,
    base: u32,
    length: u32,
}

impl Reservation<'_> {
    /// Writes the triangles that fit under capacity and returns how many were written
    pub fn write(&self, triangles: &[Triangle]) -> usize {
        let mut written = 0;
        for (i, triangle) in triangles.iter().enumerate() {
            let offset = i as u64 * 3;
            let first = self.base as u64 + offset;
            if offset + 3 > self.length as u64 || first + 3 > self.buffers.capacity as u64 {
                break;
            }
            for (corner, vertex) in triangle.iter().enumerate() {
                let slot = first as usize + corner;
                // SAFETY: `slot` lies in this reservation's range, which no other reservation
                // overlaps, and is below capacity
                unsafe {
                    self.buffers.vertices.write(slot, *vertex);
                    self.buffers.indices.write(slot, slot as u32);
                }
            }
            written += 1;
        }
        written
    }
}
