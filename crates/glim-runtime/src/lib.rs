//! Runtime job queue and worker orchestration for mesh builds.
#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use glim_blocks::BlockRegistry;
use glim_chunk::{ChunkCoord, ChunkSnapshot};
use glim_mesh_cpu::{build_chunk_mesh, ChunkMeshCPU, LightMode};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// One mesh rebuild request: everything a worker needs, nothing shared.
#[derive(Clone)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    /// Edit generation of the chunk at snapshot time.
    pub rev: u64,
    /// Incarnation tag; results from a previous incarnation are dropped.
    pub epoch: u64,
    pub snapshot: ChunkSnapshot,
    pub reg: Arc<BlockRegistry>,
    pub light_mode: LightMode,
}

/// Completed build, handed back over the completion channel.
pub struct JobOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub epoch: u64,
    /// Neighbor generations the snapshot was taken against.
    pub neighbor_revs: [u64; 6],
    /// `None` for an all-air chunk.
    pub cpu: Option<ChunkMeshCPU>,
    pub t_mesh_ms: u32,
}

/// Fixed worker pool plus the two bounded queues that connect it to the
/// frame thread. Workers block on an empty job queue; the frame thread only
/// ever polls the completion side.
pub struct Runtime {
    job_tx: Sender<BuildJob>,
    res_rx: Receiver<JobOut>,
    _pool: Arc<ThreadPool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl Runtime {
    pub fn new(workers: usize, job_queue_cap: usize, completion_queue_cap: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = bounded::<BuildJob>(job_queue_cap.max(1));
        let (res_tx, res_rx) = bounded::<JobOut>(completion_queue_cap.max(1));
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("glim-mesh-{i}"))
                .build()
                .expect("mesh worker pool"),
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    queued.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    let out = process_build_job(job);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                    if tx.send(out).is_err() {
                        break;
                    }
                }
            });
        }
        log::debug!("mesh runtime started with {workers} workers");

        Self {
            job_tx,
            res_rx,
            _pool: pool,
            queued,
            inflight,
            workers,
        }
    }

    /// Non-blocking submit. `false` means the bounded queue is saturated and
    /// the caller should defer the chunk to a later pass.
    pub fn submit(&self, job: BuildJob) -> bool {
        self.queued.fetch_add(1, Ordering::Relaxed);
        match self.job_tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.queued.fetch_sub(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Polls up to `max` completed builds without blocking.
    pub fn try_recv_results(&self, max: usize) -> Vec<JobOut> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.res_rx.try_recv() {
                Ok(res) => out.push(res),
                Err(_) => break,
            }
        }
        out
    }

    /// (queued, in-flight) job counts, for diagnostics.
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }
}

fn process_build_job(job: BuildJob) -> JobOut {
    let BuildJob {
        coord,
        rev,
        epoch,
        snapshot,
        reg,
        light_mode,
    } = job;
    let neighbor_revs = snapshot.neighbor_revs;
    let t0 = Instant::now();
    let cpu = build_chunk_mesh(&snapshot, &reg, light_mode);
    let t_mesh_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    JobOut {
        coord,
        rev,
        epoch,
        neighbor_revs,
        cpu,
        t_mesh_ms,
    }
}
