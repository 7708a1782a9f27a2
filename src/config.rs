//! Pipeline configuration: an explicit struct handed to the constructor,
//! never process globals.

use std::error::Error;
use std::thread;

use glim_mesh_cpu::LightMode;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mesh worker threads; 0 derives from available parallelism.
    pub workers: usize,
    /// Max jobs submitted per scheduling pass (K).
    pub submit_budget: usize,
    /// Max completed meshes installed per drain pass (M).
    pub install_budget: usize,
    /// Bound of the job queue; saturation defers dirty chunks to later passes.
    pub job_queue_cap: usize,
    /// Bound of the completion channel; excess results wait, never dropped.
    pub completion_queue_cap: usize,
    /// Max chunks relit per light pass.
    pub light_budget: usize,
    pub light_mode: LightMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            submit_budget: 8,
            install_budget: 8,
            job_queue_cap: 64,
            completion_queue_cap: 64,
            light_budget: 64,
            light_mode: LightMode::Smooth,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Worker count with the auto default applied: one thread is left for
    /// the frame loop.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }
}
