//! Block, material, and registry crate.
#![forbid(unsafe_code)]

pub mod config;
pub mod material;
pub mod registry;
pub mod types;

pub use material::MaterialCatalog;
pub use registry::BlockRegistry;
pub use types::{Block, BlockId, FaceRole, MaterialId};
