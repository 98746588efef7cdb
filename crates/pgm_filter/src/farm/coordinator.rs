//! src/farm/coordinator.rs
//!
//! Coordinator side of the row protocol.
//!
//! The coordinator hands out rows in increasing order to whichever worker asks
//! and stores results by their row index, so a fast worker may report row 50
//! before a slow one reports row 3. Once every row is handed out, each further
//! request is answered with `Terminate`; the loop ends when every worker has
//! been told to stop.
//!
//! Rows are never re-queued. A worker that stops answering while holding a row
//! stalls the run.

use anyhow::{Context, Result};
use log::{debug, trace};

use super::channel::Endpoint;
use super::message::{Message, MessageKind, Rank};
use crate::image::{GrayImage, RowAssembler};

/// Counters driving the dispatch loop. Owned by the loop, dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    pub next_line: usize,
    pub completed_lines: usize,
    pub active_assignments: usize,
    pub terminated_workers: usize,
    pub total_lines: usize,
    pub total_workers: usize,
}

impl SchedulerState {
    pub fn new(total_lines: usize, total_workers: usize) -> Self {
        Self {
            next_line: 0,
            completed_lines: 0,
            active_assignments: 0,
            terminated_workers: 0,
            total_lines,
            total_workers,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.terminated_workers >= self.total_workers
    }

    /// Picks the reply to a work request: the next row, or `Terminate` once
    /// all rows are out.
    pub fn answer_request(&mut self) -> Message {
        if self.next_line < self.total_lines {
            let line = self.next_line;
            self.next_line += 1;
            self.active_assignments += 1;
            Message::WorkAssignment { line }
        } else {
            self.terminated_workers += 1;
            Message::Terminate
        }
    }

    pub fn record_result(&mut self) {
        self.completed_lines += 1;
        self.active_assignments -= 1;
    }
}

/// Messages the coordinator saw and sent during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolStats {
    pub requests: usize,
    pub results: usize,
    pub assignments: usize,
    pub terminates: usize,
}

impl ProtocolStats {
    /// Total messages received by the coordinator.
    pub fn received(&self) -> usize {
        self.requests + self.results
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("rank {rank} reported row {line}, which is not assigned to it")]
    UnassignedRow { rank: Rank, line: usize },

    #[error("rank {rank} reported row {line} a second time")]
    DuplicateRow { rank: Rank, line: usize },

    #[error("rank {rank} reported row {line} with {got} pixels, expected {expected}")]
    RowLength {
        rank: Rank,
        line: usize,
        got: usize,
        expected: usize,
    },

    #[error("rank {rank} sent {kind}, which only the coordinator may send")]
    UnexpectedKind { rank: Rank, kind: MessageKind },
}

/// Runs the dispatch loop until every worker has been terminated and returns
/// the assembled output image.
///
/// `image` is only used for its header; workers filter their own copies.
pub fn run_coordinator(
    endpoint: &mut Endpoint,
    image: &GrayImage,
) -> Result<(GrayImage, ProtocolStats)> {
    let mut state = SchedulerState::new(image.height(), endpoint.num_workers());
    let mut stats = ProtocolStats::default();
    let mut output = RowAssembler::new(image.header().clone());
    let mut assigned_to: Vec<Option<Rank>> = vec![None; image.height()];

    while !state.is_finished() {
        let envelope = endpoint
            .receive_any()
            .context("Coordinator lost its workers")?;
        let rank = envelope.source;

        match envelope.message {
            Message::WorkRequest => {
                stats.requests += 1;
                let reply = state.answer_request();
                match reply {
                    Message::WorkAssignment { line } => {
                        assigned_to[line] = Some(rank);
                        stats.assignments += 1;
                        trace!("assigned row {line} to worker {rank}");
                    }
                    _ => {
                        stats.terminates += 1;
                        debug!(
                            "terminating worker {rank} ({}/{})",
                            state.terminated_workers, state.total_workers
                        );
                    }
                }
                endpoint
                    .send(rank, reply)
                    .with_context(|| format!("Coordinator could not reply to worker {rank}"))?;
            }
            Message::Result { line, pixels } => {
                stats.results += 1;
                if output.is_filled(line) {
                    return Err(ProtocolError::DuplicateRow { rank, line }.into());
                }
                if assigned_to.get(line).copied().flatten() != Some(rank) {
                    return Err(ProtocolError::UnassignedRow { rank, line }.into());
                }
                if pixels.len() != image.width() {
                    return Err(ProtocolError::RowLength {
                        rank,
                        line,
                        got: pixels.len(),
                        expected: image.width(),
                    }
                    .into());
                }
                output.store(line, &pixels)?;
                state.record_result();
                trace!(
                    "row {line} from worker {rank} ({}/{} done)",
                    state.completed_lines,
                    state.total_lines
                );
            }
            other => {
                return Err(ProtocolError::UnexpectedKind {
                    rank,
                    kind: other.kind(),
                }
                .into());
            }
        }
    }

    debug!(
        "coordinator finished: {} rows, {} messages received",
        state.completed_lines,
        stats.received()
    );
    let image = output
        .finish()
        .context("Coordinator terminated every worker before all rows arrived")?;
    Ok((image, stats))
}
