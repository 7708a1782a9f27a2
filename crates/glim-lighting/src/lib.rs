//! In-chunk light propagation and neighbor border planes.
#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use glim_blocks::BlockRegistry;
use glim_chunk::{ChunkBuf, ChunkCoord, CHUNK_SIZE};

#[cfg(test)]
mod tests;

/// Maximum light level per channel (4-bit).
pub const MAX_LIGHT: u8 = 15;

const S: usize = CHUNK_SIZE;
const PLANE: usize = S * S;

// Border plane indexing:
// - X faces (x = 0 / x = S-1): index = y * S + z
// - Y faces (y = 0 / y = S-1): index = z * S + x
// - Z faces (z = 0 / z = S-1): index = y * S + x

/// Exact per-voxel light for one chunk: two independent 0..=15 channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightGrid {
    pub sky: Vec<u8>,
    pub blk: Vec<u8>,
}

impl LightGrid {
    pub fn new() -> Self {
        Self {
            sky: vec![0; S * S * S],
            blk: vec![0; S * S * S],
        }
    }

    #[inline]
    pub fn sky_at(&self, x: usize, y: usize, z: usize) -> u8 {
        self.sky[ChunkBuf::idx(x, y, z)]
    }

    #[inline]
    pub fn blk_at(&self, x: usize, y: usize, z: usize) -> u8 {
        self.blk[ChunkBuf::idx(x, y, z)]
    }

    /// Writes both channels into the chunk's packed light array.
    pub fn apply_to(&self, buf: &mut ChunkBuf) {
        for (i, slot) in buf.light.iter_mut().enumerate() {
            *slot = glim_chunk::pack_light(self.sky[i], self.blk[i]);
        }
    }
}

impl Default for LightGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary-layer light values a chunk publishes for its neighbors, one
/// 16x16 plane per face per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightBorders {
    pub sk_xn: Vec<u8>,
    pub sk_xp: Vec<u8>,
    pub sk_yn: Vec<u8>,
    pub sk_yp: Vec<u8>,
    pub sk_zn: Vec<u8>,
    pub sk_zp: Vec<u8>,
    pub bl_xn: Vec<u8>,
    pub bl_xp: Vec<u8>,
    pub bl_yn: Vec<u8>,
    pub bl_yp: Vec<u8>,
    pub bl_zn: Vec<u8>,
    pub bl_zp: Vec<u8>,
}

impl LightBorders {
    pub fn new() -> Self {
        Self {
            sk_xn: vec![0; PLANE],
            sk_xp: vec![0; PLANE],
            sk_yn: vec![0; PLANE],
            sk_yp: vec![0; PLANE],
            sk_zn: vec![0; PLANE],
            sk_zp: vec![0; PLANE],
            bl_xn: vec![0; PLANE],
            bl_xp: vec![0; PLANE],
            bl_yn: vec![0; PLANE],
            bl_yp: vec![0; PLANE],
            bl_zn: vec![0; PLANE],
            bl_zp: vec![0; PLANE],
        }
    }

    pub fn from_grid(grid: &LightGrid) -> Self {
        let mut b = Self::new();
        for y in 0..S {
            for z in 0..S {
                let ii = y * S + z;
                b.sk_xn[ii] = grid.sky_at(0, y, z);
                b.bl_xn[ii] = grid.blk_at(0, y, z);
                b.sk_xp[ii] = grid.sky_at(S - 1, y, z);
                b.bl_xp[ii] = grid.blk_at(S - 1, y, z);
            }
        }
        for z in 0..S {
            for x in 0..S {
                let ii = z * S + x;
                b.sk_yn[ii] = grid.sky_at(x, 0, z);
                b.bl_yn[ii] = grid.blk_at(x, 0, z);
                b.sk_yp[ii] = grid.sky_at(x, S - 1, z);
                b.bl_yp[ii] = grid.blk_at(x, S - 1, z);
            }
        }
        for y in 0..S {
            for x in 0..S {
                let ii = y * S + x;
                b.sk_zn[ii] = grid.sky_at(x, y, 0);
                b.bl_zn[ii] = grid.blk_at(x, y, 0);
                b.sk_zp[ii] = grid.sky_at(x, y, S - 1);
                b.bl_zp[ii] = grid.blk_at(x, y, S - 1);
            }
        }
        b
    }
}

impl Default for LightBorders {
    fn default() -> Self {
        Self::new()
    }
}

/// Which faces changed in a border update; drives neighbor re-queueing.
#[derive(Clone, Copy, Debug, Default)]
pub struct BorderChangeMask {
    pub xn: bool,
    pub xp: bool,
    pub yn: bool,
    pub yp: bool,
    pub zn: bool,
    pub zp: bool,
}

impl BorderChangeMask {
    pub const ALL: BorderChangeMask = BorderChangeMask {
        xn: true,
        xp: true,
        yn: true,
        yp: true,
        zn: true,
        zp: true,
    };

    #[inline]
    pub fn any(self) -> bool {
        self.xn || self.xp || self.yn || self.yp || self.zn || self.zp
    }

    /// Offsets of the neighbors across each changed face.
    pub fn changed_neighbors(self, coord: ChunkCoord) -> impl Iterator<Item = ChunkCoord> {
        let flags = [
            (self.xn, (-1, 0, 0)),
            (self.xp, (1, 0, 0)),
            (self.yn, (0, -1, 0)),
            (self.yp, (0, 1, 0)),
            (self.zn, (0, 0, -1)),
            (self.zp, (0, 0, 1)),
        ];
        flags
            .into_iter()
            .filter(|(changed, _)| *changed)
            .map(move |(_, (dx, dy, dz))| coord.offset(dx, dy, dz))
    }
}

/// Border planes of the 6 face neighbors, as seen from one chunk.
/// `xn` is the plane adjacent to our -X face (the -X neighbor's +X layer).
#[derive(Default)]
pub struct NeighborBorders {
    pub sk_xn: Option<Vec<u8>>,
    pub sk_xp: Option<Vec<u8>>,
    pub sk_yn: Option<Vec<u8>>,
    pub sk_yp: Option<Vec<u8>>,
    pub sk_zn: Option<Vec<u8>>,
    pub sk_zp: Option<Vec<u8>>,
    pub bl_xn: Option<Vec<u8>>,
    pub bl_xp: Option<Vec<u8>>,
    pub bl_yn: Option<Vec<u8>>,
    pub bl_yp: Option<Vec<u8>>,
    pub bl_zn: Option<Vec<u8>>,
    pub bl_zp: Option<Vec<u8>>,
}

/// Published border planes per chunk; the seam-exchange side of the
/// relaxation loop. Interior mutability so readers share it by reference.
pub struct LightingStore {
    borders: Mutex<HashMap<ChunkCoord, LightBorders>>,
}

impl LightingStore {
    pub fn new() -> Self {
        Self {
            borders: Mutex::new(HashMap::new()),
        }
    }

    pub fn clear_chunk(&self, coord: ChunkCoord) {
        self.borders.lock().unwrap().remove(&coord);
    }

    pub fn get_neighbor_borders(&self, coord: ChunkCoord) -> NeighborBorders {
        let map = self.borders.lock().unwrap();
        let mut nb = NeighborBorders::default();
        if let Some(b) = map.get(&coord.offset(-1, 0, 0)) {
            nb.sk_xn = Some(b.sk_xp.clone());
            nb.bl_xn = Some(b.bl_xp.clone());
        }
        if let Some(b) = map.get(&coord.offset(1, 0, 0)) {
            nb.sk_xp = Some(b.sk_xn.clone());
            nb.bl_xp = Some(b.bl_xn.clone());
        }
        if let Some(b) = map.get(&coord.offset(0, -1, 0)) {
            nb.sk_yn = Some(b.sk_yp.clone());
            nb.bl_yn = Some(b.bl_yp.clone());
        }
        if let Some(b) = map.get(&coord.offset(0, 1, 0)) {
            nb.sk_yp = Some(b.sk_yn.clone());
            nb.bl_yp = Some(b.bl_yn.clone());
        }
        if let Some(b) = map.get(&coord.offset(0, 0, -1)) {
            nb.sk_zn = Some(b.sk_zp.clone());
            nb.bl_zn = Some(b.bl_zp.clone());
        }
        if let Some(b) = map.get(&coord.offset(0, 0, 1)) {
            nb.sk_zp = Some(b.sk_zn.clone());
            nb.bl_zp = Some(b.bl_zn.clone());
        }
        nb
    }

    /// Replaces the chunk's published planes. Returns whether anything
    /// changed and which faces did.
    pub fn update_borders(&self, coord: ChunkCoord, lb: LightBorders) -> (bool, BorderChangeMask) {
        let mut map = self.borders.lock().unwrap();
        match map.get_mut(&coord) {
            Some(existing) => {
                let mask = BorderChangeMask {
                    xn: existing.sk_xn != lb.sk_xn || existing.bl_xn != lb.bl_xn,
                    xp: existing.sk_xp != lb.sk_xp || existing.bl_xp != lb.bl_xp,
                    yn: existing.sk_yn != lb.sk_yn || existing.bl_yn != lb.bl_yn,
                    yp: existing.sk_yp != lb.sk_yp || existing.bl_yp != lb.bl_yp,
                    zn: existing.sk_zn != lb.sk_zn || existing.bl_zn != lb.bl_zn,
                    zp: existing.sk_zp != lb.sk_zp || existing.bl_zp != lb.bl_zp,
                };
                if mask.any() {
                    *existing = lb;
                }
                (mask.any(), mask)
            }
            None => {
                map.insert(coord, lb);
                (true, BorderChangeMask::ALL)
            }
        }
    }

}

impl Default for LightingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes exact sky and block light for one chunk, seeded from open-sky
/// columns, emissive blocks, and the published planes of loaded neighbors.
///
/// Sky light descends unattenuated while at `MAX_LIGHT`; every other step
/// (horizontal, upward, or below-maximum vertical) decays by 1. Opaque
/// voxels are never entered. The result is a fixed point for this chunk
/// given its neighbor planes; cross-chunk convergence is driven by the
/// caller re-queueing neighbors whose seam planes changed.
pub fn compute_light_with_borders(
    buf: &ChunkBuf,
    store: &LightingStore,
    reg: &BlockRegistry,
) -> LightGrid {
    let mut lg = LightGrid::new();
    let nb = store.get_neighbor_borders(buf.coord);

    let mut q_sky: VecDeque<(usize, usize, usize, u8)> = VecDeque::new();
    let mut q_blk: VecDeque<(usize, usize, usize, u8)> = VecDeque::new();

    // Sky columns, top-down. A missing chunk above is open sky; otherwise the
    // neighbor's bottom plane feeds the column (full columns stay at max).
    for z in 0..S {
        for x in 0..S {
            let from_above = match &nb.sk_yp {
                None => MAX_LIGHT,
                Some(plane) => plane[z * S + x],
            };
            let mut incoming = from_above;
            for y in (0..S).rev() {
                if incoming == 0 {
                    break;
                }
                let b = buf.get_local(x, y, z);
                if !reg.light_passable(b) {
                    break;
                }
                let v = if incoming == MAX_LIGHT {
                    MAX_LIGHT
                } else {
                    incoming - 1
                };
                let idx = ChunkBuf::idx(x, y, z);
                if lg.sky[idx] < v {
                    lg.sky[idx] = v;
                    q_sky.push_back((x, y, z, v));
                }
                incoming = v;
            }
        }
    }

    // Emissive blocks seed their own voxel even when solid; the light only
    // leaves through passable neighbors during BFS.
    for y in 0..S {
        for z in 0..S {
            for x in 0..S {
                let em = reg.emission(buf.get_local(x, y, z));
                if em > 0 {
                    let idx = ChunkBuf::idx(x, y, z);
                    lg.blk[idx] = em.min(MAX_LIGHT);
                    q_blk.push_back((x, y, z, lg.blk[idx]));
                }
            }
        }
    }

    // Lateral and below seam seeds decay by 1 crossing into this chunk.
    let seed_plane = |lg: &mut LightGrid,
                      q: &mut VecDeque<(usize, usize, usize, u8)>,
                      sky: bool,
                      plane: &Option<Vec<u8>>,
                      cell: &dyn Fn(usize, usize) -> (usize, usize, usize)| {
        let Some(plane) = plane else { return };
        for a in 0..S {
            for b_ in 0..S {
                let v = plane[a * S + b_];
                if v <= 1 {
                    continue;
                }
                let (x, y, z) = cell(a, b_);
                if !reg.light_passable(buf.get_local(x, y, z)) {
                    continue;
                }
                let v = v - 1;
                let idx = ChunkBuf::idx(x, y, z);
                let field = if sky { &mut lg.sky } else { &mut lg.blk };
                if field[idx] < v {
                    field[idx] = v;
                    q.push_back((x, y, z, v));
                }
            }
        }
    };
    // X planes index by (y, z); Y planes by (z, x); Z planes by (y, x).
    seed_plane(&mut lg, &mut q_sky, true, &nb.sk_xn, &|y, z| (0, y, z));
    seed_plane(&mut lg, &mut q_sky, true, &nb.sk_xp, &|y, z| (S - 1, y, z));
    seed_plane(&mut lg, &mut q_sky, true, &nb.sk_yn, &|z, x| (x, 0, z));
    seed_plane(&mut lg, &mut q_sky, true, &nb.sk_zn, &|y, x| (x, y, 0));
    seed_plane(&mut lg, &mut q_sky, true, &nb.sk_zp, &|y, x| (x, y, S - 1));
    seed_plane(&mut lg, &mut q_blk, false, &nb.bl_xn, &|y, z| (0, y, z));
    seed_plane(&mut lg, &mut q_blk, false, &nb.bl_xp, &|y, z| (S - 1, y, z));
    seed_plane(&mut lg, &mut q_blk, false, &nb.bl_yn, &|z, x| (x, 0, z));
    seed_plane(&mut lg, &mut q_blk, false, &nb.bl_yp, &|z, x| (x, S - 1, z));
    seed_plane(&mut lg, &mut q_blk, false, &nb.bl_zn, &|y, x| (x, y, 0));
    seed_plane(&mut lg, &mut q_blk, false, &nb.bl_zp, &|y, x| (x, y, S - 1));
    // Sky light arriving through the bottom face decays like any non-vertical
    // step; handled above for yn. The top face was consumed by the column scan.

    // Relaxation: bounded monotone integer fields, so both loops terminate.
    while let Some((x, y, z, level)) = q_sky.pop_front() {
        for (fi, (dx, dy, dz)) in glim_chunk::FACE_OFFSETS.into_iter().enumerate() {
            let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
            if nx < 0 || ny < 0 || nz < 0 || nx >= S as i32 || ny >= S as i32 || nz >= S as i32 {
                continue;
            }
            let downward = fi == 1;
            let v = if downward && level == MAX_LIGHT {
                MAX_LIGHT
            } else if level > 1 {
                level - 1
            } else {
                continue;
            };
            let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
            if !reg.light_passable(buf.get_local(nx, ny, nz)) {
                continue;
            }
            let idx = ChunkBuf::idx(nx, ny, nz);
            if lg.sky[idx] < v {
                lg.sky[idx] = v;
                q_sky.push_back((nx, ny, nz, v));
            }
        }
    }
    while let Some((x, y, z, level)) = q_blk.pop_front() {
        if level <= 1 {
            continue;
        }
        for (dx, dy, dz) in glim_chunk::FACE_OFFSETS {
            let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
            if nx < 0 || ny < 0 || nz < 0 || nx >= S as i32 || ny >= S as i32 || nz >= S as i32 {
                continue;
            }
            let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
            if !reg.light_passable(buf.get_local(nx, ny, nz)) {
                continue;
            }
            let v = level - 1;
            let idx = ChunkBuf::idx(nx, ny, nz);
            if lg.blk[idx] < v {
                lg.blk[idx] = v;
                q_blk.push_back((nx, ny, nz, v));
            }
        }
    }

    lg
}
