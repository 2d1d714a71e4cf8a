// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::{StageJob, WorkerPool};

/// A [`WorkerPool`] backed by a dedicated `rayon` thread pool.
///
/// The original pipeline runner this system is modeled on isolated
/// worker processes with `multiprocessing.Pool`, since Python's GIL
/// leaves no other way to parallelize CPU-bound stage code. Rust has no
/// such constraint, so a thread pool gives the same "bounded worker
/// count, no nested parallel contexts" contract without the
/// serialization cost of shipping arguments across a process boundary.
pub struct RayonWorkerPool {
    pool: rayon::ThreadPool,
}

impl RayonWorkerPool {
    /// Builds a pool with `worker_count` threads, or the number of
    /// logical CPUs if `None`.
    pub fn new(worker_count: Option<usize>) -> Result<Self, PipelineError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(count) = worker_count {
            builder = builder.num_threads(count);
        }
        let pool = builder
            .build()
            .map_err(|e| PipelineError::InternalError(format!("failed to build worker pool: {e}")))?;
        Ok(RayonWorkerPool { pool })
    }
}

impl WorkerPool for RayonWorkerPool {
    fn run_all(&self, jobs: Vec<StageJob>) -> Vec<Result<pipeline_domain::artifact::Artifact, PipelineError>> {
        self.pool.install(|| {
            use rayon::prelude::*;
            jobs.into_par_iter().map(|job| job()).collect()
        })
    }

    fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Runs every job inline on the calling thread, in order. Used in tests
/// and by `--jobs 1` runs where deterministic, easy-to-debug sequencing
/// matters more than throughput.
pub struct MockWorkerPool;

impl WorkerPool for MockWorkerPool {
    fn run_all(&self, jobs: Vec<StageJob>) -> Vec<Result<pipeline_domain::artifact::Artifact, PipelineError>> {
        jobs.into_iter().map(|job| job()).collect()
    }

    fn worker_count(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_domain::artifact::Artifact;

    #[test]
    fn rayon_pool_runs_all_jobs() {
        let pool = RayonWorkerPool::new(Some(2)).unwrap();
        let jobs: Vec<StageJob> = (0..5)
            .map(|i| Box::new(move || Ok(Artifact::new("n", vec![i as u8]))) as StageJob)
            .collect();

        let results = pool.run_all(jobs);
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn mock_pool_runs_jobs_inline_and_in_order() {
        let pool = MockWorkerPool;
        let jobs: Vec<StageJob> = (0..3)
            .map(|i| Box::new(move || Ok(Artifact::new("n", vec![i as u8]))) as StageJob)
            .collect();

        let results = pool.run_all(jobs);
        let tags: Vec<u8> = results.into_iter().map(|r| r.unwrap().bytes()[0]).collect();
        assert_eq!(tags, vec![0, 1, 2]);
        assert_eq!(pool.worker_count(), 1);
    }
}
