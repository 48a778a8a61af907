//! Object storage: one byte vector with bump allocation and a compacting collector.
//!
//! Objects are addressed through [`Handle`]s, a slot index plus a generation.
//! Compaction moves object bytes and fixes slot offsets, so live handles stay
//! valid; slots of collected objects get a new generation, so a stale handle
//! is reported as [`RplError::InvalidHandle`] instead of reading another object.

use log::debug;

use crate::error::{RplError, RplResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: usize,
    len: usize,
    generation: u32,
    live: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes currently in use, live or not yet collected.
    pub used: usize,
    pub capacity: usize,
    pub live_objects: usize,
    pub collections: u64,
    pub reclaimed: u64,
}

#[derive(Debug)]
pub struct Heap {
    bytes: Vec<u8>,
    top: usize,
    slots: Vec<Slot>,
    free: Vec<u32>,
    limit: usize,
    collections: u64,
    reclaimed: u64,
}

impl Heap {
    pub fn new(capacity: usize, limit: usize) -> Self {
        let limit = limit.max(capacity);
        Self {
            bytes: vec![0; capacity],
            top: 0,
            slots: Vec::new(),
            free: Vec::new(),
            limit,
            collections: 0,
            reclaimed: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn available(&self) -> usize {
        self.bytes.len() - self.top
    }

    /// Copy `encoded` to the top of the heap, or `None` if it does not fit.
    pub fn allocate(&mut self, encoded: &[u8]) -> Option<Handle> {
        if encoded.len() > self.available() {
            return None;
        }
        let offset = self.top;
        self.bytes[offset..offset + encoded.len()].copy_from_slice(encoded);
        self.top += encoded.len();

        let slot = Slot {
            offset,
            len: encoded.len(),
            generation: 0,
            live: true,
        };
        let index = match self.free.pop() {
            Some(index) => {
                let generation = self.slots[index as usize].generation;
                self.slots[index as usize] = Slot { generation, ..slot };
                index
            }
            None => {
                self.slots.push(slot);
                (self.slots.len() - 1) as u32
            }
        };
        Some(Handle {
            slot: index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Encoded bytes of the object behind `handle`.
    pub fn get(&self, handle: Handle) -> RplResult<&[u8]> {
        match self.slots.get(handle.slot as usize) {
            Some(slot) if slot.live && slot.generation == handle.generation => {
                Ok(&self.bytes[slot.offset..slot.offset + slot.len])
            }
            _ => Err(RplError::InvalidHandle),
        }
    }

    pub fn is_valid(&self, handle: Handle) -> bool {
        self.get(handle).is_ok()
    }

    /// Free every object not reachable from `roots` and slide the survivors
    /// to the bottom of the heap. Returns the number of bytes reclaimed.
    pub fn collect(&mut self, roots: impl IntoIterator<Item = Handle>) -> usize {
        let mut marked = vec![false; self.slots.len()];
        for root in roots {
            if self.is_valid(root) {
                marked[root.slot as usize] = true;
            }
        }

        let mut order: Vec<usize> = (0..self.slots.len())
            .filter(|&index| self.slots[index].live)
            .collect();
        order.sort_by_key(|&index| self.slots[index].offset);

        let before = self.top;
        let mut top = 0;
        for index in order {
            if !marked[index] {
                let slot = &mut self.slots[index];
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                continue;
            }
            let slot = self.slots[index];
            if slot.offset != top {
                self.bytes.copy_within(slot.offset..slot.offset + slot.len, top);
                self.slots[index].offset = top;
            }
            top += slot.len;
        }
        self.top = top;

        let reclaimed = before - top;
        self.collections += 1;
        self.reclaimed += reclaimed as u64;
        debug!(
            "heap collection #{}: reclaimed {} bytes, {} of {} bytes in use",
            self.collections,
            reclaimed,
            self.top,
            self.bytes.len()
        );
        reclaimed
    }

    /// Grow the heap so that `needed` more bytes fit, within the configured limit.
    pub fn grow(&mut self, needed: usize) -> bool {
        let required = self.top + needed;
        if required > self.limit {
            return false;
        }
        let capacity = (self.bytes.len() * 2).max(required).min(self.limit);
        debug!("heap grows from {} to {} bytes", self.bytes.len(), capacity);
        self.bytes.resize(capacity, 0);
        true
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            used: self.top,
            capacity: self.bytes.len(),
            live_objects: self.slots.iter().filter(|slot| slot.live).count(),
            collections: self.collections,
            reclaimed: self.reclaimed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_until_full() {
        let mut heap = Heap::new(8, 8);
        let a = heap.allocate(&[1, 2, 3]).unwrap();
        let b = heap.allocate(&[4, 5, 6, 7, 8]).unwrap();
        assert!(heap.allocate(&[9]).is_none());
        assert_eq!(heap.get(a).unwrap(), &[1, 2, 3]);
        assert_eq!(heap.get(b).unwrap(), &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn collection_compacts_and_invalidates() {
        let mut heap = Heap::new(16, 16);
        let a = heap.allocate(&[1, 1, 1, 1]).unwrap();
        let b = heap.allocate(&[2, 2]).unwrap();
        let c = heap.allocate(&[3, 3, 3]).unwrap();

        assert_eq!(heap.collect([b, c]), 4);
        assert_eq!(heap.get(b).unwrap(), &[2, 2]);
        assert_eq!(heap.get(c).unwrap(), &[3, 3, 3]);
        assert!(matches!(heap.get(a), Err(RplError::InvalidHandle)));

        // The freed slot is reused with a new generation
        let d = heap.allocate(&[4]).unwrap();
        assert_ne!(d, a);
        assert!(heap.get(a).is_err());
        assert_eq!(heap.get(d).unwrap(), &[4]);

        let stats = heap.stats();
        assert_eq!(stats.used, 6);
        assert_eq!(stats.live_objects, 3);
        assert_eq!(stats.collections, 1);
        assert_eq!(stats.reclaimed, 4);
    }

    #[test]
    fn growth_respects_the_limit() {
        let mut heap = Heap::new(4, 10);
        assert!(heap.grow(6));
        assert_eq!(heap.capacity(), 8);
        assert!(heap.grow(10));
        assert_eq!(heap.capacity(), 10);
        assert!(!heap.grow(11));
    }
}
