//! Converts mesh-dirty chunks into build jobs under a per-pass budget.

use std::sync::Arc;

use glim_blocks::BlockRegistry;
use glim_chunk::ChunkCoord;
use glim_mesh_cpu::LightMode;
use glim_runtime::{BuildJob, Runtime};
use hashbrown::HashMap;

use crate::store::{ChunkState, ChunkStore};

/// Stamps recorded at submission; kept until the result arrives so a chunk
/// never has two jobs in the pool at once.
#[derive(Copy, Clone, Debug)]
pub struct InflightJob {
    pub epoch: u64,
    pub rev: u64,
}

#[derive(Default)]
pub struct MeshScheduler {
    inflight: HashMap<ChunkCoord, InflightJob>,
}

impl MeshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_inflight(&self, coord: ChunkCoord) -> bool {
        self.inflight.contains_key(&coord)
    }

    #[inline]
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    /// Called by the completion drain when a result for `coord` arrives,
    /// whatever its fate.
    pub fn complete(&mut self, coord: ChunkCoord) -> Option<InflightJob> {
        self.inflight.remove(&coord)
    }

    /// One submission pass: mesh-dirty chunks ordered by distance to the view
    /// center, at most `budget` submitted. Chunks refused by a saturated job
    /// queue stay dirty and are reconsidered next pass.
    pub fn schedule_pass(
        &mut self,
        store: &mut ChunkStore,
        runtime: &Runtime,
        reg: &Arc<BlockRegistry>,
        light_mode: LightMode,
        view_center: ChunkCoord,
        budget: usize,
    ) -> usize {
        let mut candidates: Vec<(i64, (i32, i32, i32))> = store
            .iter()
            .filter(|(coord, entry)| {
                entry.state == ChunkState::MeshDirty && !self.is_inflight(**coord)
            })
            .map(|(coord, _)| (view_center.distance_sq(*coord), (*coord).into()))
            .collect();
        // Nearest first; coordinate tie-break keeps passes deterministic.
        candidates.sort_unstable();

        let mut submitted = 0usize;
        for (_, coord) in candidates {
            if submitted >= budget {
                break;
            }
            let coord = ChunkCoord::from(coord);
            let Some(snapshot) = store.snapshot(coord) else {
                continue;
            };
            let job = BuildJob {
                coord,
                rev: snapshot.rev,
                epoch: snapshot.epoch,
                snapshot,
                reg: Arc::clone(reg),
                light_mode,
            };
            let (epoch, rev) = (job.epoch, job.rev);
            if !runtime.submit(job) {
                // Backpressure: the queue is full, defer the rest.
                log::debug!(
                    "job queue saturated after {submitted} submissions; deferring remaining dirty chunks"
                );
                break;
            }
            self.inflight.insert(coord, InflightJob { epoch, rev });
            if let Some(entry) = store.get_mut(coord) {
                entry.state = ChunkState::MeshPending;
            }
            submitted += 1;
        }
        submitted
    }
}
