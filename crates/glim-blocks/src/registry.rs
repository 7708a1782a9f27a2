use std::collections::HashMap;
use std::error::Error;

use super::config::BlocksConfig;
use super::material::MaterialCatalog;
use super::types::{Block, BlockId, FaceRole, MaterialId};

/// Per-face material resolution compiled from a block definition.
#[derive(Default, Clone, Debug)]
pub struct CompiledMaterials {
    pub all: Option<MaterialId>,
    pub top: Option<MaterialId>,
    pub bottom: Option<MaterialId>,
    pub side: Option<MaterialId>,
}

impl CompiledMaterials {
    pub fn material_for(&self, role: FaceRole) -> Option<MaterialId> {
        match role {
            FaceRole::Top => self.top.or(self.all),
            FaceRole::Bottom => self.bottom.or(self.all),
            FaceRole::Side => self.side.or(self.all),
            FaceRole::All => self.all,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub name: String,
    /// Solid full cube: occludes neighbor faces and stops light.
    pub solid: bool,
    /// Whether light may pass through this voxel.
    pub propagates_light: bool,
    /// Block-light emission level in 0..=15.
    pub emission: u8,
    pub materials: CompiledMaterials,
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub materials: MaterialCatalog,
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub unknown_block_id: Option<BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            materials: MaterialCatalog::new(),
            blocks: Vec::new(),
            by_name: HashMap::new(),
            unknown_block_id: None,
        }
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Solid voxels occlude neighbor faces and transmit no light.
    #[inline]
    pub fn is_opaque(&self, b: Block) -> bool {
        self.get(b.id).map(|ty| ty.solid).unwrap_or(true)
    }

    /// Whether light may enter this voxel during propagation.
    #[inline]
    pub fn light_passable(&self, b: Block) -> bool {
        if b.is_air() {
            return true;
        }
        self.get(b.id).map(|ty| ty.propagates_light).unwrap_or(false)
    }

    /// Block-light emission of this voxel, 0 when unknown.
    #[inline]
    pub fn emission(&self, b: Block) -> u8 {
        self.get(b.id).map(|ty| ty.emission).unwrap_or(0)
    }

    pub fn material_for(&self, b: Block, role: FaceRole) -> MaterialId {
        self.get(b.id)
            .and_then(|ty| ty.materials.material_for(role))
            .or_else(|| {
                self.unknown_block_id
                    .and_then(|id| self.blocks.get(id as usize))
                    .and_then(|ty| ty.materials.material_for(role))
            })
            .unwrap_or(MaterialId(0))
    }

    pub fn from_configs(
        materials: MaterialCatalog,
        cfg: BlocksConfig,
    ) -> Result<Self, Box<dyn Error>> {
        // Pass 1: fixed ids claim their slots.
        let mut max_id: usize = 0;
        for def in &cfg.blocks {
            if let Some(id) = def.id {
                max_id = max_id.max(id as usize);
            }
        }
        max_id = max_id.max(cfg.blocks.len().saturating_sub(1));
        let placeholder = BlockType {
            name: String::new(),
            solid: false,
            propagates_light: true,
            emission: 0,
            materials: CompiledMaterials::default(),
        };
        let mut blocks: Vec<Option<BlockType>> = vec![None; max_id + 1];
        let mut by_name: HashMap<String, BlockId> = HashMap::new();

        let compile = |def: &super::config::BlockDef| -> Result<BlockType, Box<dyn Error>> {
            let mut compiled = CompiledMaterials::default();
            if let Some(m) = &def.materials {
                let resolve = |key: &Option<String>| -> Result<Option<MaterialId>, Box<dyn Error>> {
                    match key {
                        None => Ok(None),
                        Some(k) => materials
                            .get_id(k)
                            .map(Some)
                            .ok_or_else(|| format!("unknown material key '{k}' for block '{}'", def.name).into()),
                    }
                };
                compiled.all = resolve(&m.all)?;
                compiled.top = resolve(&m.top)?;
                compiled.bottom = resolve(&m.bottom)?;
                compiled.side = resolve(&m.side)?;
            }
            let solid = def.solid.unwrap_or(true);
            Ok(BlockType {
                name: def.name.clone(),
                solid,
                propagates_light: def.propagates_light.unwrap_or(!solid),
                emission: def.emission.unwrap_or(0).min(15),
                materials: compiled,
            })
        };

        for def in cfg.blocks.iter().filter(|d| d.id.is_some()) {
            let id = def.id.unwrap() as usize;
            if blocks[id].is_some() {
                return Err(format!("duplicate block id {id} ('{}')", def.name).into());
            }
            if by_name.contains_key(&def.name) {
                return Err(format!("duplicate block name '{}'", def.name).into());
            }
            blocks[id] = Some(compile(def)?);
            by_name.insert(def.name.clone(), id as BlockId);
        }
        // Pass 2: the rest fill the gaps in declaration order.
        let mut cursor = 0usize;
        for def in cfg.blocks.iter().filter(|d| d.id.is_none()) {
            while blocks[cursor].is_some() {
                cursor += 1;
            }
            if by_name.contains_key(&def.name) {
                return Err(format!("duplicate block name '{}'", def.name).into());
            }
            blocks[cursor] = Some(compile(def)?);
            by_name.insert(def.name.clone(), cursor as BlockId);
        }

        let blocks: Vec<BlockType> = blocks
            .into_iter()
            .map(|b| b.unwrap_or_else(|| placeholder.clone()))
            .collect();
        if blocks.first().map(|b| b.name.as_str()) != Some("air") {
            return Err("block id 0 must be 'air'".into());
        }
        let unknown_block_id = cfg
            .unknown_block
            .as_deref()
            .and_then(|n| by_name.get(n).copied());
        Ok(Self {
            materials,
            blocks,
            by_name,
            unknown_block_id,
        })
    }

    pub fn from_toml_strs(materials_toml: &str, blocks_toml: &str) -> Result<Self, Box<dyn Error>> {
        let materials = MaterialCatalog::from_toml_str(materials_toml)?;
        let cfg: BlocksConfig = toml::from_str(blocks_toml)?;
        Self::from_configs(materials, cfg)
    }
}
