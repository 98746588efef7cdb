//! src/farm/worker.rs
//!
//! Worker side of the row protocol.
//!
//! A worker holds at most one assignment: it asks for a row, waits for the
//! reply, filters the row and reports it, then asks again. `Terminate` ends the
//! loop. Workers never talk to each other.

use anyhow::{bail, Context, Result};
use log::{debug, trace};

use super::channel::Endpoint;
use super::message::{Message, Rank, COORDINATOR};
use crate::image::GrayImage;
use crate::kernel::filter_row_into;

/// What a worker did during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub rank: Rank,
    pub rows_processed: usize,
}

/// Runs the request/compute/report loop until the coordinator says stop.
pub fn run_worker(
    endpoint: &mut Endpoint,
    image: &GrayImage,
    filter_size: usize,
) -> Result<WorkerStats> {
    let rank = endpoint.rank();
    let mut row = vec![0u8; image.width()];
    let mut rows_processed = 0;

    loop {
        endpoint
            .send(COORDINATOR, Message::WorkRequest)
            .with_context(|| format!("Worker {rank} could not request work"))?;

        let reply = endpoint
            .receive(COORDINATOR)
            .with_context(|| format!("Worker {rank} lost the coordinator awaiting a reply"))?;

        let line = match reply {
            Message::Terminate => break,
            Message::WorkAssignment { line } => line,
            other => bail!(
                "Worker {rank} received {} from the coordinator",
                other.kind()
            ),
        };
        if line >= image.height() {
            bail!(
                "Worker {rank} was assigned row {line} of an image with {} rows",
                image.height()
            );
        }

        filter_row_into(image, line, filter_size, &mut row);
        trace!("worker {rank} filtered row {line}");

        endpoint
            .send(
                COORDINATOR,
                Message::Result {
                    line,
                    pixels: row.clone(),
                },
            )
            .with_context(|| format!("Worker {rank} could not report row {line}"))?;
        rows_processed += 1;
    }

    debug!("worker {rank} terminated after {rows_processed} rows");
    Ok(WorkerStats {
        rank,
        rows_processed,
    })
}

#[cfg(test)]
mod worker_test {
    use super::*;
    use crate::farm::channel::star;
    use crate::kernel::filter_row;
    use std::thread;

    #[test]
    fn test_worker_answers_assignments_until_terminate() -> Result<()> {
        let image = GrayImage::from_fn(4, 3, |x, y| (x * 20 + y * 7) as u8);
        let (mut coordinator, mut workers) = star(1, 4, 4);
        let mut worker = workers.remove(0);

        let worker_image = image.clone();
        let handle = thread::spawn(move || run_worker(&mut worker, &worker_image, 3));

        for line in [2usize, 0] {
            assert_eq!(coordinator.receive(1)?, Message::WorkRequest);
            coordinator.send(1, Message::WorkAssignment { line })?;
            match coordinator.receive(1)? {
                Message::Result { line: got, pixels } => {
                    assert_eq!(got, line);
                    assert_eq!(pixels, filter_row(&image, line, 3));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(coordinator.receive(1)?, Message::WorkRequest);
        coordinator.send(1, Message::Terminate)?;

        let stats = handle.join().expect("worker panicked")?;
        assert_eq!(
            stats,
            WorkerStats {
                rank: 1,
                rows_processed: 2
            }
        );
        Ok(())
    }

    #[test]
    fn test_worker_rejects_unexpected_reply() -> Result<()> {
        let image = GrayImage::from_fn(2, 2, |_, _| 0);
        let (mut coordinator, mut workers) = star(1, 4, 4);
        let mut worker = workers.remove(0);

        let handle = thread::spawn(move || run_worker(&mut worker, &image, 1));
        assert_eq!(coordinator.receive(1)?, Message::WorkRequest);
        coordinator.send(1, Message::WorkRequest)?;

        assert!(handle.join().expect("worker panicked").is_err());
        Ok(())
    }

    #[test]
    fn test_worker_exits_when_coordinator_disappears() {
        let image = GrayImage::from_fn(2, 2, |_, _| 0);
        let (coordinator, mut workers) = star(1, 4, 4);
        drop(coordinator);

        assert!(run_worker(&mut workers[0], &image, 1).is_err());
    }
}
