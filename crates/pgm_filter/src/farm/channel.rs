//! src/farm/channel.rs
//!
//! Message fabric connecting the coordinator and its workers.
//!
//! The fabric is a star: the coordinator holds a route to every worker, each
//! worker holds a route to the coordinator only. Every party owns one inbox
//! that all its peers send into, so a single `receive_any` observes whichever
//! peer spoke first. Messages from one sender to one receiver arrive in send
//! order.
//!
//! Replication uses a second set of channels rooted at the coordinator plus a
//! group barrier. The barrier is built from channels too, so a party that
//! drops out releases everyone waiting on it with an error instead of a hang.
//!
//! Because workers never hold routes to each other, dropping the coordinator's
//! endpoint disconnects every worker inbox and unblocks the whole group.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::trace;
use std::collections::VecDeque;

use super::message::{Broadcast, Envelope, Message, Rank, COORDINATOR};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Every peer that could send to this rank is gone.
    #[error("rank {rank} lost all peers while waiting for a message")]
    Disconnected { rank: Rank },

    /// The destination dropped its endpoint.
    #[error("rank {to} hung up before rank {from} could send to it")]
    PeerGone { from: Rank, to: Rank },

    #[error("rank {from} has no route to rank {to}")]
    NoRoute { from: Rank, to: Rank },

    #[error("broadcasts are rooted at the coordinator, not rank {rank}")]
    NotRoot { rank: Rank },

    #[error("rank {rank} is the broadcast root but supplied no payload")]
    MissingPayload { rank: Rank },
}

/// One party's view of the fabric.
pub struct Endpoint {
    rank: Rank,
    size: usize,
    inbox: Receiver<Envelope>,
    routes: Vec<Option<Sender<Envelope>>>,
    broadcast_rx: Option<Receiver<Broadcast>>,
    broadcast_txs: Vec<Sender<Broadcast>>,
    gate: Gate,
    stash: VecDeque<Envelope>,
}

/// Barrier plumbing. Workers check in with the coordinator, the coordinator
/// releases them once all have arrived.
enum Gate {
    Root {
        arrivals: Receiver<Rank>,
        releases: Vec<Sender<()>>,
    },
    Member {
        arrive: Sender<Rank>,
        release: Receiver<()>,
    },
}

/// Builds a star fabric with one coordinator and `num_workers` workers.
///
/// Returns the coordinator endpoint and the worker endpoints ordered by rank
/// (`1..=num_workers`).
pub fn star(
    num_workers: usize,
    inbox_capacity: usize,
    broadcast_capacity: usize,
) -> (Endpoint, Vec<Endpoint>) {
    let size = num_workers + 1;

    let (coordinator_tx, coordinator_rx) = bounded(inbox_capacity.max(1));
    let (arrive_tx, arrive_rx) = bounded(num_workers.max(1));

    let mut coordinator_routes: Vec<Option<Sender<Envelope>>> = vec![None];
    let mut broadcast_txs = Vec::with_capacity(num_workers);
    let mut releases = Vec::with_capacity(num_workers);
    let mut workers = Vec::with_capacity(num_workers);

    for rank in 1..size {
        // A worker never has more than one reply outstanding.
        let (tx, rx) = bounded(1);
        let (bcast_tx, bcast_rx) = bounded(broadcast_capacity.max(1));
        let (release_tx, release_rx) = bounded(1);
        coordinator_routes.push(Some(tx));
        broadcast_txs.push(bcast_tx);
        releases.push(release_tx);

        let mut routes = vec![None; size];
        routes[COORDINATOR] = Some(coordinator_tx.clone());

        workers.push(Endpoint {
            rank,
            size,
            inbox: rx,
            routes,
            broadcast_rx: Some(bcast_rx),
            broadcast_txs: Vec::new(),
            gate: Gate::Member {
                arrive: arrive_tx.clone(),
                release: release_rx,
            },
            stash: VecDeque::new(),
        });
    }

    let coordinator = Endpoint {
        rank: COORDINATOR,
        size,
        inbox: coordinator_rx,
        routes: coordinator_routes,
        broadcast_rx: None,
        broadcast_txs,
        gate: Gate::Root {
            arrivals: arrive_rx,
            releases,
        },
        stash: VecDeque::new(),
    };

    (coordinator, workers)
}

impl Endpoint {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Number of parties in the fabric, coordinator included.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_workers(&self) -> usize {
        self.size - 1
    }

    /// Sends `message` to `to`. Blocks only while the destination inbox is full.
    pub fn send(&self, to: Rank, message: Message) -> Result<(), ChannelError> {
        let route = self
            .routes
            .get(to)
            .and_then(Option::as_ref)
            .ok_or(ChannelError::NoRoute {
                from: self.rank,
                to,
            })?;

        trace!("rank {} -> rank {}: {}", self.rank, to, message.kind());
        route
            .send(Envelope {
                source: self.rank,
                message,
            })
            .map_err(|_| ChannelError::PeerGone {
                from: self.rank,
                to,
            })
    }

    /// Blocks until any peer has sent a message.
    pub fn receive_any(&mut self) -> Result<Envelope, ChannelError> {
        if let Some(envelope) = self.stash.pop_front() {
            return Ok(envelope);
        }
        let envelope = self
            .inbox
            .recv()
            .map_err(|_| ChannelError::Disconnected { rank: self.rank })?;
        trace!(
            "rank {} <- rank {}: {}",
            self.rank,
            envelope.source,
            envelope.message.kind()
        );
        Ok(envelope)
    }

    /// Blocks until `from` has sent a message. Messages from other peers that
    /// arrive in the meantime are kept for later receives.
    pub fn receive(&mut self, from: Rank) -> Result<Message, ChannelError> {
        if let Some(pos) = self.stash.iter().position(|e| e.source == from) {
            if let Some(envelope) = self.stash.remove(pos) {
                return Ok(envelope.message);
            }
        }
        loop {
            let envelope = self
                .inbox
                .recv()
                .map_err(|_| ChannelError::Disconnected { rank: self.rank })?;
            trace!(
                "rank {} <- rank {}: {}",
                self.rank,
                envelope.source,
                envelope.message.kind()
            );
            if envelope.source == from {
                return Ok(envelope.message);
            }
            self.stash.push_back(envelope);
        }
    }

    /// Replicates `payload` from `root` to every party.
    ///
    /// The root passes `Some(payload)` and gets it back; everyone else passes
    /// `None` and gets the root's payload.
    pub fn broadcast(
        &self,
        root: Rank,
        payload: Option<Broadcast>,
    ) -> Result<Broadcast, ChannelError> {
        if root != COORDINATOR {
            return Err(ChannelError::NotRoot { rank: root });
        }

        if self.rank == root {
            let payload = payload.ok_or(ChannelError::MissingPayload { rank: self.rank })?;
            for (i, tx) in self.broadcast_txs.iter().enumerate() {
                tx.send(payload.clone())
                    .map_err(|_| ChannelError::PeerGone {
                        from: self.rank,
                        to: i + 1,
                    })?;
            }
            return Ok(payload);
        }

        self.broadcast_rx
            .as_ref()
            .ok_or(ChannelError::NoRoute {
                from: root,
                to: self.rank,
            })?
            .recv()
            .map_err(|_| ChannelError::Disconnected { rank: self.rank })
    }

    /// Waits until every party in the fabric reaches the barrier.
    pub fn barrier(&self) -> Result<(), ChannelError> {
        match &self.gate {
            Gate::Root { arrivals, releases } => {
                for _ in 0..releases.len() {
                    let rank = arrivals
                        .recv()
                        .map_err(|_| ChannelError::Disconnected { rank: self.rank })?;
                    trace!("rank {rank} reached the barrier");
                }
                for (i, release) in releases.iter().enumerate() {
                    release.send(()).map_err(|_| ChannelError::PeerGone {
                        from: self.rank,
                        to: i + 1,
                    })?;
                }
                Ok(())
            }
            Gate::Member { arrive, release } => {
                arrive.send(self.rank).map_err(|_| ChannelError::PeerGone {
                    from: self.rank,
                    to: COORDINATOR,
                })?;
                release
                    .recv()
                    .map_err(|_| ChannelError::Disconnected { rank: self.rank })
            }
        }
    }
}
