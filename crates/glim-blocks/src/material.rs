use std::collections::HashMap;
use std::error::Error;

use serde::Deserialize;

use super::types::MaterialId;

#[derive(Clone, Debug)]
pub struct Material {
    pub id: MaterialId,
    pub key: String,
    pub texture: String,
}

#[derive(Default, Clone, Debug)]
pub struct MaterialCatalog {
    pub materials: Vec<Material>,
    pub by_key: HashMap<String, MaterialId>,
}

#[derive(Deserialize)]
struct MaterialsConfig {
    materials: HashMap<String, String>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self {
            materials: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn get_id(&self, key: &str) -> Option<MaterialId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    pub fn add(&mut self, key: &str, texture: &str) -> MaterialId {
        if let Some(id) = self.by_key.get(key) {
            return *id;
        }
        let id = MaterialId(self.materials.len() as u16);
        self.materials.push(Material {
            id,
            key: key.to_string(),
            texture: texture.to_string(),
        });
        self.by_key.insert(key.to_string(), id);
        id
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: MaterialsConfig = toml::from_str(toml_str)?;
        let mut catalog = MaterialCatalog::new();
        let mut entries: Vec<(String, String)> = cfg.materials.into_iter().collect();
        // HashMap iteration order is nondeterministic; sort keys so MaterialId assignment is stable.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, texture) in entries {
            catalog.add(&key, &texture);
        }
        Ok(catalog)
    }
}
