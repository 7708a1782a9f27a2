//! The frame-facing pipeline: chunk store + light relaxation + scheduler +
//! completion drain, wired per the frame driver contract.

use std::collections::VecDeque;
use std::sync::Arc;

use glim_blocks::types::Block;
use glim_blocks::BlockRegistry;
use glim_chunk::ChunkCoord;
use glim_lighting::{compute_light_with_borders, LightBorders, LightingStore};
use glim_mesh_cpu::ChunkMeshCPU;
use glim_runtime::{JobOut, Runtime};
use hashbrown::HashSet;

use crate::config::PipelineConfig;
use crate::scheduler::MeshScheduler;
use crate::store::{BuiltMesh, ChunkState, ChunkStore, ChunkStoreError};

/// Frame-thread counters, cumulative over the pipeline's lifetime.
#[derive(Default, Clone, Copy, Debug)]
pub struct PipelineStats {
    pub chunks_lit: u64,
    pub jobs_submitted: u64,
    pub meshes_installed: u64,
    /// Installed, but already superseded by an edit; the chunk was re-queued.
    pub stale_installs: u64,
    /// Dropped on arrival: chunk unloaded or reloaded since submission.
    pub results_discarded: u64,
    pub mesh_ms_total: u64,
}

pub struct MeshPipeline {
    cfg: PipelineConfig,
    reg: Arc<BlockRegistry>,
    store: ChunkStore,
    lighting: LightingStore,
    runtime: Runtime,
    scheduler: MeshScheduler,
    light_queue: VecDeque<ChunkCoord>,
    light_queued: HashSet<ChunkCoord>,
    stats: PipelineStats,
}

impl MeshPipeline {
    pub fn new(cfg: PipelineConfig, reg: Arc<BlockRegistry>) -> Self {
        let runtime = Runtime::new(
            cfg.effective_workers(),
            cfg.job_queue_cap,
            cfg.completion_queue_cap,
        );
        Self {
            cfg,
            reg,
            store: ChunkStore::new(),
            lighting: LightingStore::new(),
            runtime,
            scheduler: MeshScheduler::new(),
            light_queue: VecDeque::new(),
            light_queued: HashSet::new(),
            stats: PipelineStats::default(),
        }
    }

    #[inline]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    #[inline]
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// (queued, in-flight) worker-side job counts.
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        self.runtime.queue_debug_counts()
    }

    fn queue_light(&mut self, coord: ChunkCoord) {
        if self.light_queued.insert(coord) {
            self.light_queue.push_back(coord);
        }
    }

    pub fn load_chunk(
        &mut self,
        coord: ChunkCoord,
        blocks: Vec<Block>,
    ) -> Result<(), ChunkStoreError> {
        self.store.load(coord, blocks)?;
        self.queue_light(coord);
        // Loaded neighbors relight so seams against the new chunk open or
        // close with real data instead of the unloaded sentinel.
        for nb in coord.face_neighbors() {
            if self.store.mark_light_dirty(nb) {
                self.queue_light(nb);
            }
        }
        Ok(())
    }

    /// Unloads a chunk; idempotent. An in-flight build for it keeps running
    /// and its result is discarded on arrival by epoch mismatch.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.store.unload(coord).is_none() {
            return false;
        }
        self.lighting.clear_chunk(coord);
        for nb in coord.face_neighbors() {
            if self.store.mark_light_dirty(nb) {
                self.queue_light(nb);
            }
        }
        true
    }

    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Result<Block, ChunkStoreError> {
        self.store.get_block(wx, wy, wz)
    }

    pub fn set_block(
        &mut self,
        wx: i32,
        wy: i32,
        wz: i32,
        b: Block,
    ) -> Result<(), ChunkStoreError> {
        let effect = self.store.set_block(wx, wy, wz, b)?;
        self.queue_light(effect.coord);
        for nb in effect.neighbors_marked {
            self.queue_light(nb);
        }
        Ok(())
    }

    /// Relights up to the configured budget of queued chunks. Chunks whose
    /// seam planes changed re-queue their loaded neighbors; the queue drains
    /// to a fixed point over one or more frames (light values are bounded
    /// monotone integers, so the relaxation terminates).
    pub fn propagate_light(&mut self) -> usize {
        let budget = self.cfg.light_budget.max(1);
        let mut processed = 0usize;
        while processed < budget {
            let Some(coord) = self.light_queue.pop_front() else {
                break;
            };
            self.light_queued.remove(&coord);
            let Some(entry) = self.store.get_mut(coord) else {
                // Unloaded while queued.
                continue;
            };
            let grid = compute_light_with_borders(&entry.buf, &self.lighting, &self.reg);
            grid.apply_to(&mut entry.buf);
            // Light settled (for now): the chunk needs fresh geometry. A
            // re-dirty while a job is in flight keeps the state machine here
            // too; the scheduler's in-flight map prevents double submission.
            if entry.state == ChunkState::LightDirty {
                entry.state = ChunkState::MeshDirty;
            }

            let (changed, mask) = self
                .lighting
                .update_borders(coord, LightBorders::from_grid(&grid));
            if changed {
                for nb in mask.changed_neighbors(coord) {
                    if self.store.mark_light_dirty(nb) {
                        self.queue_light(nb);
                    }
                }
            }
            processed += 1;
            self.stats.chunks_lit += 1;
        }
        processed
    }

    /// One submission pass under budget K, nearest chunks first.
    pub fn schedule_pass(&mut self, view_center: ChunkCoord) -> usize {
        let submitted = self.scheduler.schedule_pass(
            &mut self.store,
            &self.runtime,
            &self.reg,
            self.cfg.light_mode,
            view_center,
            self.cfg.submit_budget,
        );
        self.stats.jobs_submitted += submitted as u64;
        submitted
    }

    /// Polls the completion channel and installs at most M results. Never
    /// blocks; excess results wait in the channel for the next frame.
    pub fn drain_completions(&mut self) -> usize {
        let results = self.runtime.try_recv_results(self.cfg.install_budget.max(1));
        let mut installed = 0usize;
        for out in results {
            self.scheduler.complete(out.coord);
            installed += self.install_result(out) as usize;
        }
        installed
    }

    fn install_result(&mut self, out: JobOut) -> bool {
        let neighbor_revs_now = self.store.neighbor_revs(out.coord);
        let Some(entry) = self.store.get_mut(out.coord) else {
            log::debug!(
                "dropping mesh for unloaded chunk ({},{},{})",
                out.coord.cx,
                out.coord.cy,
                out.coord.cz
            );
            self.stats.results_discarded += 1;
            return false;
        };
        if entry.epoch != out.epoch {
            log::debug!(
                "dropping mesh from stale incarnation of ({},{},{})",
                out.coord.cx,
                out.coord.cy,
                out.coord.cz
            );
            self.stats.results_discarded += 1;
            return false;
        }

        // Strictly newer than whatever is attached: per-chunk jobs are FIFO
        // because at most one is ever in flight.
        debug_assert!(entry
            .mesh
            .as_ref()
            .map(|m| m.rev <= out.rev)
            .unwrap_or(true));
        entry.mesh = out.cpu.map(|cpu| BuiltMesh { cpu, rev: out.rev });
        self.stats.meshes_installed += 1;
        self.stats.mesh_ms_total += u64::from(out.t_mesh_ms);

        let fresh = entry.rev == out.rev && neighbor_revs_now == out.neighbor_revs;
        match entry.state {
            ChunkState::MeshPending => {
                entry.state = if fresh {
                    ChunkState::MeshReady
                } else {
                    // Superseded mid-flight: keep the newer-than-before mesh
                    // but schedule a fresher rebuild.
                    self.stats.stale_installs += 1;
                    ChunkState::MeshDirty
                };
            }
            // An edit already pulled the chunk back to LightDirty; the
            // relight pass will re-dirty the mesh.
            _ => {
                self.stats.stale_installs += 1;
            }
        }
        true
    }

    /// The chunk's current render geometry, if any.
    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMeshCPU> {
        self.store.mesh(coord)
    }

    /// True when no light work is queued, nothing is dirty or pending, and
    /// no results are outstanding. Test and shutdown aid.
    pub fn is_quiescent(&self) -> bool {
        let (queued, inflight) = self.runtime.queue_debug_counts();
        queued == 0
            && inflight == 0
            && self.scheduler.inflight_len() == 0
            && self.light_queue.is_empty()
            && self
                .store
                .iter()
                .all(|(_, e)| e.state == ChunkState::MeshReady)
    }
}
