//! src/farm/replicate.rs
//!
//! Startup replication of the input image.
//!
//! The coordinator broadcasts the header, then every row in order. Each worker
//! rebuilds a private copy from what it receives. All parties then meet at the
//! fabric barrier so no loop starts before replication has finished everywhere.

use anyhow::{bail, Context, Result};
use log::debug;

use super::channel::Endpoint;
use super::message::{Broadcast, COORDINATOR};
use crate::image::GrayImage;

/// Sends `image` to every worker. Called on the coordinator.
pub fn share_image(endpoint: &Endpoint, image: &GrayImage) -> Result<()> {
    endpoint
        .broadcast(COORDINATOR, Some(Broadcast::Header(image.header().clone())))
        .context("Failed to broadcast image header")?;

    for (y, row) in image.rows().enumerate() {
        endpoint
            .broadcast(COORDINATOR, Some(Broadcast::Row(row.to_vec())))
            .with_context(|| format!("Failed to broadcast row {y}"))?;
    }

    endpoint
        .barrier()
        .context("Workers left before replication finished")?;
    debug!(
        "replicated {}x{} image to {} workers",
        image.width(),
        image.height(),
        endpoint.num_workers()
    );
    Ok(())
}

/// Receives the coordinator's image. Called on each worker.
pub fn receive_image(endpoint: &Endpoint) -> Result<GrayImage> {
    let rank = endpoint.rank();
    let header = match endpoint.broadcast(COORDINATOR, None)? {
        Broadcast::Header(header) => header,
        Broadcast::Row(_) => bail!("Worker {rank} expected the image header, got a row"),
    };

    let mut data = Vec::with_capacity(header.pixel_count());
    // Zero-width images broadcast no rows.
    let rows = if header.width == 0 { 0 } else { header.height };
    for y in 0..rows {
        match endpoint
            .broadcast(COORDINATOR, None)
            .with_context(|| format!("Worker {rank} lost the coordinator during row {y}"))?
        {
            Broadcast::Row(row) => data.extend_from_slice(&row),
            Broadcast::Header(_) => bail!("Worker {rank} expected row {y}, got a header"),
        }
    }

    let image = GrayImage::new(header, data)
        .with_context(|| format!("Worker {rank} received an inconsistent image"))?;

    endpoint
        .barrier()
        .with_context(|| format!("Worker {rank} was released from replication early"))?;
    Ok(image)
}
