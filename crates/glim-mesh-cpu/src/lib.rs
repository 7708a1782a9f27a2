//! CPU meshing: per-voxel visible-face extraction with baked vertex light.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use glim_blocks::types::{Block, MaterialId};
use glim_blocks::BlockRegistry;
use glim_chunk::{ChunkCoord, ChunkSnapshot, CHUNK_SIZE};
use glim_geom::{Aabb, Vec3};
use serde::Deserialize;

mod face;
pub use face::{Face, ALL_FACES};

// Visual-only lighting floor to avoid pitch-black faces in darkness.
// Does not affect logical light propagation.
const VISUAL_LIGHT_MIN: u8 = 18;

/// How vertex light is sampled from the snapshotted light field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    /// Each corner takes the maximum light of the 4 voxels sharing it on the
    /// face's outside plane.
    #[default]
    Smooth,
    /// All 4 corners take the face-adjacent voxel's light.
    Flat,
}

/// Vertex soup for one material bucket: positions, normals, uvs, per-vertex
/// grayscale light colors, and triangle indices.
#[derive(Default, Clone)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u16>,
    pub col: Vec<u8>,
}

impl MeshBuild {
    /// Emits one unit quad on `face` of the voxel whose min corner is
    /// `origin`, with one light byte per corner in tangent (u,v) order
    /// (0,0) (1,0) (1,1) (0,1).
    pub fn add_face(&mut self, face: Face, origin: Vec3, corner_light: [u8; 4]) {
        let n = face.normal();
        let (tu, tv) = face.tangents();
        let tu = Vec3::new(tu.0 as f32, tu.1 as f32, tu.2 as f32);
        let tv = Vec3::new(tv.0 as f32, tv.1 as f32, tv.2 as f32);
        // Min corner of the face plane: +1 along positive normals.
        let base = origin + Vec3::new(n.x.max(0.0), n.y.max(0.0), n.z.max(0.0));
        let corners = [base, base + tu, base + tu + tv, base + tv];
        let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

        let first = self.pos.len() as u32 / 3;
        for i in 0..4 {
            self.pos
                .extend_from_slice(&[corners[i].x, corners[i].y, corners[i].z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[uvs[i].0, uvs[i].1]);
            let l = corner_light[i];
            self.col.extend_from_slice(&[l, l, l, 255]);
        }
        self.idx.extend_from_slice(&[
            first as u16,
            (first + 1) as u16,
            (first + 2) as u16,
            first as u16,
            (first + 2) as u16,
            (first + 3) as u16,
        ]);
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.pos.len() / 12
    }

    pub fn positions(&self) -> &[f32] {
        &self.pos
    }

    pub fn normals(&self) -> &[f32] {
        &self.norm
    }
}

/// Render-ready chunk geometry, bucketed per material (the material id is the
/// texture-atlas reference of the output contract).
pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    pub bbox: Aabb,
    pub parts: HashMap<MaterialId, MeshBuild>,
}

impl ChunkMeshCPU {
    pub fn quad_count(&self) -> usize {
        self.parts.values().map(MeshBuild::quad_count).sum()
    }
}

#[inline]
fn light_to_byte(level: u8) -> u8 {
    (level.min(15) * 17).max(VISUAL_LIGHT_MIN)
}

/// Combined light (max of the two channels) of a snapshot voxel, 0 for
/// unloaded reaches.
#[inline]
fn sample_light(snap: &ChunkSnapshot, lx: i32, ly: i32, lz: i32) -> u8 {
    match snap.light_at(lx, ly, lz) {
        Some(packed) => glim_chunk::unpack_sky(packed).max(glim_chunk::unpack_block(packed)),
        None => 0,
    }
}

fn corner_lights(
    snap: &ChunkSnapshot,
    x: i32,
    y: i32,
    z: i32,
    face: Face,
    mode: LightMode,
) -> [u8; 4] {
    let (dx, dy, dz) = face.delta();
    let (ox, oy, oz) = (x + dx, y + dy, z + dz);
    match mode {
        LightMode::Flat => {
            let l = light_to_byte(sample_light(snap, ox, oy, oz));
            [l; 4]
        }
        LightMode::Smooth => {
            let (tu, tv) = face.tangents();
            let mut out = [0u8; 4];
            for (ci, (u, v)) in [(0i32, 0i32), (1, 0), (1, 1), (0, 1)].iter().enumerate() {
                // The 4 voxels sharing this corner on the outside plane.
                let su = if *u == 1 { 1 } else { -1 };
                let sv = if *v == 1 { 1 } else { -1 };
                let mut best = sample_light(snap, ox, oy, oz);
                for (mu, mv) in [(su, 0), (0, sv), (su, sv)] {
                    let sx = ox + tu.0 * mu + tv.0 * mv;
                    let sy = oy + tu.1 * mu + tv.1 * mv;
                    let sz = oz + tu.2 * mu + tv.2 * mv;
                    best = best.max(sample_light(snap, sx, sy, sz));
                }
                out[ci] = light_to_byte(best);
            }
            out
        }
    }
}

/// Builds chunk geometry from a snapshot. Pure: reads only the snapshot.
/// Returns `None` for an all-air chunk (no geometry to attach).
///
/// A face is emitted when the voxel across it is loaded and non-occluding;
/// the unloaded sentinel occludes, so seams against missing neighbors stay
/// closed until those chunks arrive.
pub fn build_chunk_mesh(
    snap: &ChunkSnapshot,
    reg: &BlockRegistry,
    mode: LightMode,
) -> Option<ChunkMeshCPU> {
    if snap.center.is_all_air() {
        return None;
    }
    let s = CHUNK_SIZE as i32;
    let base = Vec3::new(
        snap.center.base_x() as f32,
        snap.center.base_y() as f32,
        snap.center.base_z() as f32,
    );
    let mut parts: HashMap<MaterialId, MeshBuild> = HashMap::new();
    for z in 0..s {
        for y in 0..s {
            for x in 0..s {
                let b = snap.center.get_local(x as usize, y as usize, z as usize);
                if b.is_air() {
                    continue;
                }
                for face in ALL_FACES {
                    if !face_visible(snap, reg, b, x, y, z, face) {
                        continue;
                    }
                    let light = corner_lights(snap, x, y, z, face, mode);
                    let origin = base + Vec3::new(x as f32, y as f32, z as f32);
                    let mid = reg.material_for(b, face.role());
                    parts.entry(mid).or_default().add_face(face, origin, light);
                }
            }
        }
    }
    let bbox = Aabb::new(base, base + Vec3::new(s as f32, s as f32, s as f32));
    Some(ChunkMeshCPU {
        coord: snap.center.coord,
        bbox,
        parts,
    })
}

#[inline]
fn face_visible(
    snap: &ChunkSnapshot,
    reg: &BlockRegistry,
    here: Block,
    x: i32,
    y: i32,
    z: i32,
    face: Face,
) -> bool {
    let (dx, dy, dz) = face.delta();
    match snap.block_at(x + dx, y + dy, z + dz) {
        // Unloaded sentinel: opaque, no face.
        None => false,
        Some(nb) => {
            if reg.is_opaque(nb) {
                return false;
            }
            // Transparent blocks do not draw internal faces against themselves.
            nb.id != here.id
        }
    }
}
