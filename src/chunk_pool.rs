use nalgebra_glm as glm;

use crate::chunk::Chunk;
use crate::error::{EngineError, Result};

/// Index of a slot in the pool's arena. Only valid between the `acquire`
/// that returned it and the matching `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkHandle(u32);

impl ChunkHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct Slot {
    chunk: Chunk,
    in_pool: bool,
}

/// Fixed arena of pre-allocated chunks plus a free list. Nothing is
/// allocated or freed after construction.
pub struct ChunkPool {
    slots: Vec<Slot>,
    free: Vec<ChunkHandle>,
}

impl ChunkPool {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                chunk: Chunk::new(glm::vec2(0, 0)),
                in_pool: true,
            })
            .collect();
        // reversed so handles come out in ascending order
        let free = (0..capacity as u32).rev().map(ChunkHandle).collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.capacity() - self.free_len()
    }

    /// Pops a free chunk and reassigns it to `pos`. The chunk comes back
    /// with no tiles or flags and marked dirty.
    pub fn acquire(&mut self, pos: glm::IVec2, iso_pos: glm::IVec2) -> Result<ChunkHandle> {
        let handle = self.free.pop().ok_or(EngineError::PoolExhausted {
            capacity: self.capacity(),
        })?;
        let slot = &mut self.slots[handle.index()];
        slot.in_pool = false;
        slot.chunk.pos = pos;
        slot.chunk.iso_pos = iso_pos;
        slot.chunk.reset();
        Ok(handle)
    }

    /// Clears the chunk and returns it to the free list.
    pub fn release(&mut self, handle: ChunkHandle) {
        let slot = self
            .slots
            .get_mut(handle.index())
            .unwrap_or_else(|| panic!("chunk handle {:?} out of range", handle));
        if slot.in_pool {
            panic!(
                "chunk {:?} ({:?}) released twice",
                handle, slot.chunk.pos
            );
        }
        slot.chunk.reset();
        slot.in_pool = true;
        self.free.push(handle);
    }

    pub fn get(&self, handle: ChunkHandle) -> &Chunk {
        &self.live_slot(handle).chunk
    }

    pub fn get_mut(&mut self, handle: ChunkHandle) -> &mut Chunk {
        let slot = &mut self.slots[handle.index()];
        if slot.in_pool {
            panic!("chunk {:?} used after release", handle);
        }
        &mut slot.chunk
    }

    /// Every chunk currently handed out, in slot order.
    pub fn live_chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.slots
            .iter_mut()
            .filter(|slot| !slot.in_pool)
            .map(|slot| &mut slot.chunk)
    }

    /// Parallel counterpart of [`Self::live_chunks_mut`]. Each slot is a
    /// disjoint borrow so workers never share a chunk.
    #[cfg(feature = "parallel")]
    pub fn par_live_chunks_mut(
        &mut self,
    ) -> impl rayon::iter::ParallelIterator<Item = &mut Chunk> {
        use rayon::prelude::*;
        self.slots
            .par_iter_mut()
            .filter(|slot| !slot.in_pool)
            .map(|slot| &mut slot.chunk)
    }

    fn live_slot(&self, handle: ChunkHandle) -> &Slot {
        let slot = &self.slots[handle.index()];
        if slot.in_pool {
            panic!("chunk {:?} used after release", handle);
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Tile;

    #[test]
    fn acquire_and_release_conserve_chunks() {
        let mut pool = ChunkPool::with_capacity(3);
        let a = pool.acquire(glm::vec2(0, 0), glm::vec2(0, 0)).unwrap();
        let b = pool.acquire(glm::vec2(1, 0), glm::vec2(0, 0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.in_use() + pool.free_len(), pool.capacity());
        pool.release(a);
        assert_eq!(pool.free_len(), 2);
        assert_eq!(pool.get(b).pos, glm::vec2(1, 0));
    }

    #[test]
    fn exhausted_pool_errors() {
        let mut pool = ChunkPool::with_capacity(1);
        pool.acquire(glm::vec2(0, 0), glm::vec2(0, 0)).unwrap();
        let err = pool.acquire(glm::vec2(1, 0), glm::vec2(0, 0)).unwrap_err();
        assert!(matches!(err, EngineError::PoolExhausted { capacity: 1 }));
    }

    #[test]
    fn released_chunk_is_reused_empty() {
        let mut pool = ChunkPool::with_capacity(1);
        let handle = pool.acquire(glm::vec2(2, 3), glm::vec2(10, 20)).unwrap();
        pool.get_mut(handle)
            .tiles
            .insert(glm::vec2(0, 0), Tile::new(glm::vec2(0, 0), 1));
        pool.release(handle);

        let again = pool.acquire(glm::vec2(5, 5), glm::vec2(-4, 8)).unwrap();
        assert_eq!(again, handle);
        let chunk = pool.get(again);
        assert_eq!(chunk.pos, glm::vec2(5, 5));
        assert_eq!(chunk.iso_pos, glm::vec2(-4, 8));
        assert!(chunk.tiles.is_empty());
        assert!(chunk.dirty);
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn double_release_panics() {
        let mut pool = ChunkPool::with_capacity(2);
        let handle = pool.acquire(glm::vec2(0, 0), glm::vec2(0, 0)).unwrap();
        pool.release(handle);
        pool.release(handle);
    }
}
