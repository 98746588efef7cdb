//! src/farm/message.rs
//!
//! Message kinds exchanged between the coordinator and its workers.
//!
//! All four protocol kinds share one enum and therefore one inbox per party,
//! so the coordinator can service whichever worker is ready through a single
//! receive. Replication traffic uses the separate `Broadcast` payload.

use std::fmt;

use crate::image::ImageHeader;

/// Index of a party in the fabric. The coordinator is always rank 0.
pub type Rank = usize;

/// Rank of the coordinator.
pub const COORDINATOR: Rank = 0;

/// Protocol messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Worker -> coordinator: "give me a row".
    WorkRequest,
    /// Coordinator -> worker: filter this row.
    WorkAssignment { line: usize },
    /// Worker -> coordinator: the filtered row.
    Result { line: usize, pixels: Vec<u8> },
    /// Coordinator -> worker: no rows left. Always the last message a worker gets.
    Terminate,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::WorkRequest => MessageKind::WorkRequest,
            Message::WorkAssignment { .. } => MessageKind::WorkAssignment,
            Message::Result { .. } => MessageKind::Result,
            Message::Terminate => MessageKind::Terminate,
        }
    }
}

/// Payload-free tag of a `Message`, used for logging and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    WorkRequest,
    WorkAssignment,
    Result,
    Terminate,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::WorkRequest => "WorkRequest",
            MessageKind::WorkAssignment => "WorkAssignment",
            MessageKind::Result => "Result",
            MessageKind::Terminate => "Terminate",
        };
        f.write_str(name)
    }
}

/// A message together with the rank that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub source: Rank,
    pub message: Message,
}

/// Data replicated from the coordinator to every worker before the loops start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Broadcast {
    Header(ImageHeader),
    Row(Vec<u8>),
}
