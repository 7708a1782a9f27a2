use glim_blocks::types::FaceRole;
use glim_geom::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

pub const ALL_FACES: [Face; 6] = [
    Face::PosY,
    Face::NegY,
    Face::PosX,
    Face::NegX,
    Face::PosZ,
    Face::NegZ,
];

impl Face {
    /// Returns the `[0..6)` index of this face. Matches
    /// `glim_chunk::FACE_OFFSETS` and the snapshot neighbor order.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        glim_chunk::FACE_OFFSETS[self.index()]
    }

    /// The two in-plane tangent axes as grid deltas, ordered so that
    /// `tangent_u x tangent_v` points along the outward normal.
    #[inline]
    pub fn tangents(self) -> ((i32, i32, i32), (i32, i32, i32)) {
        match self {
            Face::PosY => ((0, 0, 1), (1, 0, 0)),
            Face::NegY => ((1, 0, 0), (0, 0, 1)),
            Face::PosX => ((0, 1, 0), (0, 0, 1)),
            Face::NegX => ((0, 0, 1), (0, 1, 0)),
            Face::PosZ => ((1, 0, 0), (0, 1, 0)),
            Face::NegZ => ((0, 1, 0), (1, 0, 0)),
        }
    }

    /// Classifies the face into top/bottom/side role for material lookup.
    #[inline]
    pub fn role(self) -> FaceRole {
        match self {
            Face::PosY => FaceRole::Top,
            Face::NegY => FaceRole::Bottom,
            _ => FaceRole::Side,
        }
    }
}
