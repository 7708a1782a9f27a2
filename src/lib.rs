//! Chunk lighting + asynchronous mesh-build pipeline.
//!
//! The frame driver calls, once per frame and in order: apply pending edits
//! and loads, [`MeshPipeline::propagate_light`], [`MeshPipeline::schedule_pass`],
//! [`MeshPipeline::drain_completions`], then reads [`MeshPipeline::mesh`] per
//! chunk for rendering. The pipeline never blocks the caller on a build.
#![forbid(unsafe_code)]

mod config;
mod pipeline;
mod scheduler;
mod store;

pub use config::PipelineConfig;
pub use pipeline::{MeshPipeline, PipelineStats};
pub use scheduler::MeshScheduler;
pub use store::{BuiltMesh, ChunkEntry, ChunkState, ChunkStore, ChunkStoreError};

pub use glim_blocks::{Block, BlockRegistry, MaterialId};
pub use glim_chunk::{ChunkCoord, ChunkSnapshot, CHUNK_SIZE};
pub use glim_mesh_cpu::{ChunkMeshCPU, LightMode};
