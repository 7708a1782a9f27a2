pub type BlockId = u16;

/// One voxel worth of world state: the block type id.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block {
    pub id: BlockId,
}

impl Block {
    pub const AIR: Block = Block { id: 0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

/// Stable handle into the material catalog; doubles as the texture-atlas
/// reference in the mesh output contract.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u16);

/// Which face of a cube a material selector applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceRole {
    All,
    Top,
    Bottom,
    Side,
}
