//! src/farm/mod.rs
//!
//! This module implements the `FilterFarm`.
//!
//! The farm filters one image with a coordinator and a fixed pool of workers
//! that share nothing but messages. The coordinator owns the image and hands
//! out single rows on request; workers filter a row and send it back.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  GrayImage   │ (decoded input)
//!                 └──────┬───────┘
//!                        │ broadcast: header, then every row
//!                        ↓
//!        ┌───────────────┼───────────────┐
//!        ↓               ↓               ↓
//!   [Worker 1]      [Worker 2]  ...  [Worker N]   (private copies)
//!        │  WorkRequest  ↑  WorkAssignment / Terminate
//!        │  Result       │
//!        ↓               │
//!                 ┌──────────────┐
//!                 │ Coordinator  │ ←── receive_any: one inbox for all workers
//!                 └──────┬───────┘
//!                        │ rows stored by index, any order
//!                        ↓
//!                 ┌──────────────┐
//!                 │  GrayImage   │ (filtered output)
//!                 └──────────────┘
//! ```
//!
//! # Module Structure
//!
//! ```text
//! src/farm/
//! ├── mod.rs           # Public API exports + architecture docs
//! ├── config.rs        # FarmConfig and builder
//! ├── runner.rs        # FilterFarm: validation and run orchestration
//! ├── message.rs       # Message, Envelope, Broadcast, ranks
//! ├── channel.rs       # Star fabric: send, receive, receive_any, broadcast, barrier
//! ├── replicate.rs     # Image replication at startup
//! ├── coordinator.rs   # SchedulerState and the dispatch loop
//! ├── worker.rs        # Request/compute/report loop
//! └── pool.rs          # Worker threads
//! ```
//!
//! # Example Usage
//! ```ignore
//! let image = decode_image("input.pgm")?;
//! let farm = FilterFarm::new(
//!     FarmConfig::builder().filter_size(5).num_workers(4).build(),
//! )?;
//! let output = farm.run(&image)?;
//! encode_image(&output.image, "filtered.pgm")?;
//! ```
//!
//! ## Notes:
//! - Rows are assigned in increasing order and never reassigned.
//! - A worker that stops responding while holding a row stalls the run.
//! - Output is identical for any worker count.

mod config;
mod pool;
mod runner;

pub mod channel;
pub mod coordinator;
pub mod message;
pub mod replicate;
pub mod worker;

pub use channel::{star, ChannelError, Endpoint};
pub use config::{FarmConfig, FarmConfigBuilder};
pub use coordinator::{run_coordinator, ProtocolError, ProtocolStats, SchedulerState};
pub use message::{Broadcast, Envelope, Message, MessageKind, Rank, COORDINATOR};
pub use runner::{FarmOutput, FilterFarm, RunStats};
pub use worker::{run_worker, WorkerStats};
