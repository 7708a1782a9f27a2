use glim_blocks::config::{BlockDef, BlocksConfig, MaterialsDef};
use glim_blocks::material::MaterialCatalog;
use glim_blocks::types::{Block, FaceRole};
use glim_blocks::BlockRegistry;
use proptest::prelude::*;

fn base_defs() -> Vec<BlockDef> {
    vec![
        BlockDef {
            name: "air".into(),
            id: Some(0),
            solid: Some(false),
            propagates_light: Some(true),
            emission: Some(0),
            materials: None,
        },
        BlockDef {
            name: "stone".into(),
            id: Some(1),
            solid: Some(true),
            propagates_light: Some(false),
            emission: Some(0),
            materials: Some(MaterialsDef {
                all: Some("stone".into()),
                ..Default::default()
            }),
        },
        BlockDef {
            name: "glowstone".into(),
            id: None,
            solid: Some(true),
            propagates_light: Some(false),
            emission: Some(15),
            materials: Some(MaterialsDef {
                all: Some("glowstone".into()),
                ..Default::default()
            }),
        },
    ]
}

fn catalog() -> MaterialCatalog {
    let mut m = MaterialCatalog::new();
    m.add("stone", "stone.png");
    m.add("glowstone", "glowstone.png");
    m
}

#[test]
fn registry_resolves_names_and_emission() {
    let reg = BlockRegistry::from_configs(
        catalog(),
        BlocksConfig {
            blocks: base_defs(),
            unknown_block: Some("stone".into()),
        },
    )
    .unwrap();
    let glow = Block::new(reg.id_by_name("glowstone").unwrap());
    assert_eq!(reg.emission(glow), 15);
    assert!(reg.is_opaque(glow));
    assert!(reg.light_passable(Block::AIR));
    assert!(!reg.light_passable(Block::new(1)));
    // Unknown ids fall back to opaque and the configured fallback material.
    let bogus = Block::new(999);
    assert!(reg.is_opaque(bogus));
    assert_eq!(
        reg.material_for(bogus, FaceRole::Top),
        reg.material_for(Block::new(1), FaceRole::Top)
    );
}

#[test]
fn registry_rejects_duplicate_ids_and_missing_air() {
    let mut defs = base_defs();
    defs[2].id = Some(1);
    assert!(
        BlockRegistry::from_configs(
            catalog(),
            BlocksConfig {
                blocks: defs,
                unknown_block: None
            }
        )
        .is_err()
    );
    let mut defs = base_defs();
    defs[0].name = "void".into();
    assert!(
        BlockRegistry::from_configs(
            catalog(),
            BlocksConfig {
                blocks: defs,
                unknown_block: None
            }
        )
        .is_err()
    );
}

#[test]
fn registry_parses_from_toml() {
    let materials = r#"
[materials]
stone = "stone.png"
lamp = "lamp.png"
"#;
    let blocks = r#"
unknown_block = "stone"

[[blocks]]
name = "air"
id = 0
solid = false

[[blocks]]
name = "stone"
solid = true
materials = { all = "stone" }

[[blocks]]
name = "lamp"
solid = true
emission = 15
materials = { all = "lamp", top = "lamp" }
"#;
    let reg = BlockRegistry::from_toml_strs(materials, blocks).unwrap();
    assert_eq!(reg.id_by_name("air"), Some(0));
    let lamp = Block::new(reg.id_by_name("lamp").unwrap());
    assert_eq!(reg.emission(lamp), 15);
    assert_eq!(
        reg.material_for(lamp, FaceRole::Top),
        reg.materials.get_id("lamp").unwrap()
    );
}

proptest! {
    // Sequential id assignment never collides with fixed ids and covers every block.
    #[test]
    fn assigned_ids_are_unique(extra in 1usize..=12) {
        let mut defs = base_defs();
        for i in 0..extra {
            defs.push(BlockDef {
                name: format!("block{i}"),
                id: None,
                solid: Some(i % 2 == 0),
                propagates_light: None,
                emission: Some((i % 16) as u8),
                materials: None,
            });
        }
        let reg = BlockRegistry::from_configs(
            catalog(),
            BlocksConfig { blocks: defs.clone(), unknown_block: None },
        ).unwrap();
        let mut seen = std::collections::HashSet::new();
        for def in &defs {
            let id = reg.id_by_name(&def.name).unwrap();
            prop_assert!(seen.insert(id));
            prop_assert_eq!(&reg.get(id).unwrap().name, &def.name);
        }
        // Emission is always clamped into the 4-bit range.
        for ty in &reg.blocks {
            prop_assert!(ty.emission <= 15);
        }
    }
}
