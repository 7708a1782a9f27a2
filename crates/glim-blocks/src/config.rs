//! Serde-facing config structs for block definitions.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub unknown_block: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    /// Fixed id; omitted ids are assigned sequentially after the fixed ones.
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub propagates_light: Option<bool>,
    /// Block-light emission level, 0..=15.
    #[serde(default)]
    pub emission: Option<u8>,
    #[serde(default)]
    pub materials: Option<MaterialsDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MaterialsDef {
    #[serde(default)]
    pub all: Option<String>,
    #[serde(default)]
    pub top: Option<String>,
    #[serde(default)]
    pub bottom: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
}
