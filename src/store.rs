//! The chunk store: single source of truth for voxel state, owned and
//! mutated only by the frame thread.

use std::error::Error;
use std::fmt;

use glim_blocks::types::Block;
use glim_chunk::{ChunkBuf, ChunkCoord, ChunkSnapshot, CHUNK_SIZE};
use glim_mesh_cpu::ChunkMeshCPU;
use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStoreError {
    AlreadyLoaded(ChunkCoord),
    NotLoaded(ChunkCoord),
}

impl fmt::Display for ChunkStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkStoreError::AlreadyLoaded(c) => {
                write!(f, "chunk ({},{},{}) is already loaded", c.cx, c.cy, c.cz)
            }
            ChunkStoreError::NotLoaded(c) => {
                write!(f, "chunk ({},{},{}) is not loaded", c.cx, c.cy, c.cz)
            }
        }
    }
}

impl Error for ChunkStoreError {}

/// Lifecycle of a loaded chunk. `MeshPending` is additionally tracked by the
/// scheduler's in-flight map; an edit may pull a pending chunk back to
/// `LightDirty` while its job keeps running.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    LightDirty,
    MeshDirty,
    MeshPending,
    MeshReady,
}

/// A mesh attached to a chunk, stamped with the generation it was built from.
pub struct BuiltMesh {
    pub cpu: ChunkMeshCPU,
    pub rev: u64,
}

pub struct ChunkEntry {
    pub buf: ChunkBuf,
    pub state: ChunkState,
    /// Edit generation; stamps come from a store-global counter so neighbor
    /// comparisons stay valid across unload/reload.
    pub rev: u64,
    /// Incarnation tag assigned at load; in-flight results from an earlier
    /// incarnation are discarded on arrival.
    pub epoch: u64,
    pub mesh: Option<BuiltMesh>,
}

/// What a `set_block` touched: the edited chunk's new generation plus any
/// face neighbors whose border light may have changed.
pub struct EditEffect {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub neighbors_marked: Vec<ChunkCoord>,
}

#[derive(Default)]
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, ChunkEntry>,
    stamp: u64,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    pub fn load(&mut self, coord: ChunkCoord, blocks: Vec<Block>) -> Result<(), ChunkStoreError> {
        if self.chunks.contains_key(&coord) {
            return Err(ChunkStoreError::AlreadyLoaded(coord));
        }
        let rev = self.next_stamp();
        let epoch = self.next_stamp();
        self.chunks.insert(
            coord,
            ChunkEntry {
                buf: ChunkBuf::from_blocks(coord, blocks),
                state: ChunkState::LightDirty,
                rev,
                epoch,
                mesh: None,
            },
        );
        Ok(())
    }

    /// Removes a chunk; idempotent. The entry (and its mesh) is returned so
    /// the caller can release render resources.
    pub fn unload(&mut self, coord: ChunkCoord) -> Option<ChunkEntry> {
        self.chunks.remove(&coord)
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkEntry> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut ChunkEntry> {
        self.chunks.get_mut(&coord)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &ChunkEntry)> {
        self.chunks.iter()
    }

    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Result<Block, ChunkStoreError> {
        let coord = ChunkCoord::containing(wx, wy, wz);
        let entry = self
            .chunks
            .get(&coord)
            .ok_or(ChunkStoreError::NotLoaded(coord))?;
        let s = CHUNK_SIZE as i32;
        Ok(entry.buf.get_local(
            wx.rem_euclid(s) as usize,
            wy.rem_euclid(s) as usize,
            wz.rem_euclid(s) as usize,
        ))
    }

    /// Writes one voxel: bumps the chunk's generation, marks it light-dirty,
    /// and marks loaded face neighbors light-dirty when the edit touches
    /// their shared border.
    pub fn set_block(
        &mut self,
        wx: i32,
        wy: i32,
        wz: i32,
        b: Block,
    ) -> Result<EditEffect, ChunkStoreError> {
        let coord = ChunkCoord::containing(wx, wy, wz);
        let rev = self.next_stamp();
        let s = CHUNK_SIZE as i32;
        let (lx, ly, lz) = (
            wx.rem_euclid(s) as usize,
            wy.rem_euclid(s) as usize,
            wz.rem_euclid(s) as usize,
        );
        let Some(entry) = self.chunks.get_mut(&coord) else {
            return Err(ChunkStoreError::NotLoaded(coord));
        };
        entry.buf.set_local(lx, ly, lz, b);
        entry.rev = rev;
        entry.state = ChunkState::LightDirty;

        let mut offsets: Vec<(i32, i32, i32)> = Vec::new();
        if lx == 0 {
            offsets.push((-1, 0, 0));
        }
        if lx == CHUNK_SIZE - 1 {
            offsets.push((1, 0, 0));
        }
        if ly == 0 {
            offsets.push((0, -1, 0));
        }
        if ly == CHUNK_SIZE - 1 {
            offsets.push((0, 1, 0));
        }
        if lz == 0 {
            offsets.push((0, 0, -1));
        }
        if lz == CHUNK_SIZE - 1 {
            offsets.push((0, 0, 1));
        }
        let mut neighbors_marked = Vec::new();
        for (dx, dy, dz) in offsets {
            let nb = coord.offset(dx, dy, dz);
            if let Some(e) = self.chunks.get_mut(&nb) {
                e.state = ChunkState::LightDirty;
                neighbors_marked.push(nb);
            }
        }
        Ok(EditEffect {
            coord,
            rev,
            neighbors_marked,
        })
    }

    pub fn mark_light_dirty(&mut self, coord: ChunkCoord) -> bool {
        match self.chunks.get_mut(&coord) {
            Some(e) => {
                e.state = ChunkState::LightDirty;
                true
            }
            None => false,
        }
    }

    /// Current generations of the 6 face neighbors (0 = unloaded). Loaded
    /// chunks always carry a nonzero stamp, so "unloaded" never aliases a
    /// fresh load.
    pub fn neighbor_revs(&self, coord: ChunkCoord) -> [u64; 6] {
        let mut out = [0u64; 6];
        for (i, nb) in coord.face_neighbors().into_iter().enumerate() {
            out[i] = self.chunks.get(&nb).map(|e| e.rev).unwrap_or(0);
        }
        out
    }

    /// Immutable copy of the chunk and its 6 face neighbors, with the
    /// generation stamps workers bake into their results.
    pub fn snapshot(&self, coord: ChunkCoord) -> Option<ChunkSnapshot> {
        let entry = self.chunks.get(&coord)?;
        let neighbors = coord
            .face_neighbors()
            .map(|nb| self.chunks.get(&nb).map(|e| e.buf.clone()));
        Some(ChunkSnapshot {
            center: entry.buf.clone(),
            neighbors,
            rev: entry.rev,
            neighbor_revs: self.neighbor_revs(coord),
            epoch: entry.epoch,
        })
    }

    /// The currently attached mesh, if any.
    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMeshCPU> {
        self.chunks.get(&coord).and_then(|e| e.mesh.as_ref()).map(|m| &m.cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_twice_fails_and_unload_is_idempotent() {
        let mut store = ChunkStore::new();
        let c = ChunkCoord::new(0, 0, 0);
        store.load(c, Vec::new()).unwrap();
        assert_eq!(
            store.load(c, Vec::new()),
            Err(ChunkStoreError::AlreadyLoaded(c))
        );
        assert!(store.unload(c).is_some());
        assert!(store.unload(c).is_none());
    }

    #[test]
    fn set_block_bumps_generation_and_dirties_border_neighbors() {
        let mut store = ChunkStore::new();
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        store.load(a, Vec::new()).unwrap();
        store.load(b, Vec::new()).unwrap();
        store.get_mut(b).unwrap().state = ChunkState::MeshReady;

        let rev0 = store.get(a).unwrap().rev;
        // Interior edit: only the edited chunk is marked.
        let eff = store.set_block(5, 5, 5, Block::new(1)).unwrap();
        assert!(eff.rev > rev0);
        assert!(eff.neighbors_marked.is_empty());
        assert_eq!(store.get(b).unwrap().state, ChunkState::MeshReady);

        // Border edit: the +X neighbor is pulled back to LightDirty.
        let eff = store.set_block(15, 5, 5, Block::new(1)).unwrap();
        assert_eq!(eff.neighbors_marked, vec![b]);
        assert_eq!(store.get(b).unwrap().state, ChunkState::LightDirty);
        assert_eq!(store.get_block(15, 5, 5).unwrap(), Block::new(1));
    }

    #[test]
    fn reload_gets_a_fresh_epoch() {
        let mut store = ChunkStore::new();
        let c = ChunkCoord::new(2, 0, -1);
        store.load(c, Vec::new()).unwrap();
        let first = store.get(c).unwrap().epoch;
        store.unload(c);
        store.load(c, Vec::new()).unwrap();
        assert!(store.get(c).unwrap().epoch > first);
    }

    #[test]
    fn snapshot_carries_neighbor_stamps_and_sentinels() {
        let mut store = ChunkStore::new();
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        store.load(a, Vec::new()).unwrap();
        store.load(b, Vec::new()).unwrap();
        let snap = store.snapshot(a).unwrap();
        // Only the +X neighbor (face index 2) is loaded.
        assert!(snap.neighbors[2].is_some());
        assert!(snap.neighbors[0].is_none());
        assert_eq!(snap.neighbor_revs[2], store.get(b).unwrap().rev);
        assert_eq!(snap.neighbor_revs[0], 0);
        assert!(snap.neighbor_revs[2] > 0);
    }

    #[test]
    fn get_block_outside_loaded_chunks_is_not_loaded() {
        let store = ChunkStore::new();
        match store.get_block(-1, 0, 0) {
            Err(ChunkStoreError::NotLoaded(c)) => assert_eq!(c, ChunkCoord::new(-1, 0, 0)),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
