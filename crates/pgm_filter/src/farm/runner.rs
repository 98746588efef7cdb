//! src/farm/runner.rs
//!
//! `FilterFarm`: one coordinator plus a fixed pool of workers filtering a
//! single image.
//!
//! A run goes through four phases:
//! 1. Build the star fabric and spawn the workers.
//! 2. Replicate the image: header, then rows, then a barrier.
//! 3. Run the coordinator's dispatch loop while workers run theirs.
//! 4. Drop the coordinator endpoint and join the workers.
//!
//! If the coordinator fails at any point, dropping its endpoint disconnects
//! every worker, so the whole group stops together and the coordinator's error
//! is returned.

use anyhow::{anyhow, Result};
use log::info;
use std::time::{Duration, Instant};

use super::channel::star;
use super::config::FarmConfig;
use super::coordinator::{run_coordinator, ProtocolStats};
use super::pool::WorkerPool;
use super::replicate::{receive_image, share_image};
use super::worker::{run_worker, WorkerStats};
use crate::error::FilterError;
use crate::image::GrayImage;

/// Result of a run.
#[derive(Debug, Clone)]
pub struct FarmOutput {
    pub image: GrayImage,
    pub stats: RunStats,
}

#[derive(Debug, Clone)]
pub struct RunStats {
    pub protocol: ProtocolStats,
    /// One entry per worker, in rank order
    pub workers: Vec<WorkerStats>,
    pub elapsed: Duration,
}

/// Validated configuration ready to filter images.
#[derive(Debug, Clone)]
pub struct FilterFarm {
    config: FarmConfig,
    filter_size: usize,
}

impl FilterFarm {
    /// Validates `config`.
    ///
    /// # Errors
    /// - `FilterError::Parameter` if `filter_size < 1`
    /// - Returns error if `num_workers` is 0
    /// - Returns error if `broadcast_capacity` is 0
    pub fn new(config: FarmConfig) -> Result<Self> {
        if config.filter_size < 1 {
            return Err(FilterError::Parameter {
                filter_size: config.filter_size,
            }
            .into());
        }
        let filter_size = usize::try_from(config.filter_size)
            .map_err(|_| anyhow!("Filter size {} does not fit in memory", config.filter_size))?;

        if config.num_workers == 0 {
            return Err(anyhow!(
                "Cannot filter with 0 workers. Set num_workers to at least 1."
            ));
        }

        if config.broadcast_capacity == 0 {
            return Err(anyhow!(
                "Broadcast capacity must be > 0 to replicate the image."
            ));
        }

        Ok(Self {
            config,
            filter_size,
        })
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    /// Filters `image` and blocks until every worker has terminated.
    pub fn run(&self, image: &GrayImage) -> Result<FarmOutput> {
        let started = Instant::now();
        let (mut coordinator, workers) = star(
            self.config.num_workers,
            self.config.effective_inbox_capacity(),
            self.config.broadcast_capacity,
        );

        let filter_size = self.filter_size;
        let pool = WorkerPool::spawn(workers, move |mut endpoint| {
            let local = receive_image(&endpoint)?;
            run_worker(&mut endpoint, &local, filter_size)
        })?;

        let outcome = share_image(&coordinator, image)
            .and_then(|()| run_coordinator(&mut coordinator, image));
        drop(coordinator);

        let joined = pool.join();
        let (filtered, protocol) = outcome?;
        let workers = joined?;

        let elapsed = started.elapsed();
        info!(
            "filtered {}x{} image (window {}) with {} workers in {:.2?}",
            image.width(),
            image.height(),
            filter_size,
            workers.len(),
            elapsed
        );
        for stats in &workers {
            info!("  worker {}: {} rows", stats.rank, stats.rows_processed);
        }

        Ok(FarmOutput {
            image: filtered,
            stats: RunStats {
                protocol,
                workers,
                elapsed,
            },
        })
    }
}

#[cfg(test)]
mod runner_test {
    use super::*;
    use crate::kernel::filter_image;

    #[test]
    fn test_rejects_non_positive_filter_size() {
        for size in [0, -3] {
            let err = FilterFarm::new(FarmConfig::builder().filter_size(size).build()).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<FilterError>(),
                Some(FilterError::Parameter { filter_size }) if *filter_size == size
            ));
        }
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = FarmConfig::builder().num_workers(0).build();
        assert!(FilterFarm::new(config).is_err());
    }

    #[test]
    fn test_single_worker_matches_sequential_filter() -> Result<()> {
        let image = GrayImage::from_fn(9, 6, |x, y| ((x * x + 3 * y) % 256) as u8);
        let farm = FilterFarm::new(FarmConfig::builder().filter_size(3).num_workers(1).build())?;

        let output = farm.run(&image)?;
        assert_eq!(output.image, filter_image(&image, 3));
        assert_eq!(output.stats.workers[0].rows_processed, 6);
        Ok(())
    }
}
