//! src/farm/config.rs
//!
//! Configuration for a filtering run.
//!
//! Example:
//! ```ignore
//! let config = FarmConfig::builder()
//!     .filter_size(5)
//!     .num_workers(8)
//!     .build();
//! ```
//!
//! # Channel capacities:
//! - `inbox_capacity`: slots in the coordinator inbox. A worker can have a
//!   result and its next request in flight at once, so the default is
//!   `2 * num_workers`. Smaller values are correct but make workers block on
//!   send more often.
//! - `broadcast_capacity`: rows buffered per worker during replication.

/// Configuration for `FilterFarm`.
#[derive(Clone, Debug)]
pub struct FarmConfig {
    /// Side length of the square averaging window (must be >= 1)
    pub filter_size: i64,
    /// Number of worker threads (must be >= 1)
    pub num_workers: usize,
    /// Coordinator inbox capacity (defaults to `2 * num_workers`)
    pub inbox_capacity: Option<usize>,
    /// Rows buffered per worker while the image is replicated
    pub broadcast_capacity: usize,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            filter_size: 3,
            num_workers: 1,
            inbox_capacity: None,
            broadcast_capacity: 16,
        }
    }
}

impl FarmConfig {
    pub fn builder() -> FarmConfigBuilder {
        FarmConfigBuilder::default()
    }

    /// Inbox capacity actually used for the coordinator.
    pub fn effective_inbox_capacity(&self) -> usize {
        self.inbox_capacity
            .unwrap_or(2 * self.num_workers)
            .max(1)
    }
}

/// Builder for FarmConfig with method chaining
#[derive(Default)]
pub struct FarmConfigBuilder {
    config: FarmConfig,
}

impl FarmConfigBuilder {
    /// Set the filter window size.
    ///
    /// Signed so that the value can be taken straight from user input and
    /// rejected at validation time.
    pub fn filter_size(mut self, size: i64) -> Self {
        self.config.filter_size = size;
        self
    }

    /// Set the number of workers
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    /// Set the coordinator inbox capacity
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.config.inbox_capacity = Some(capacity);
        self
    }

    /// Set how many rows may queue per worker during replication
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> FarmConfig {
        self.config
    }
}
