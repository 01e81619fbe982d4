//! Write-only transactions.
//!
//! A [`Transaction`] buffers points in a [`Batch`] until it is committed as a
//! single write. It is consumed by both commit and rollback, so a committed
//! batch can never be touched again.

use log::debug;

use crate::client::Client;
use crate::error::Result;
use crate::line_protocol::{Batch, Point, Precision, WriteOptions};

/// Points buffered for one write.
#[derive(Debug, Default)]
pub struct Transaction {
    batch: Batch,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Point) {
        self.batch.add_point(point);
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.batch.add_points(points);
    }

    /// Points buffered so far, in insertion order.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Writes the buffered points to `database` at nanosecond precision.
    ///
    /// Every commit is exactly one write, even with nothing buffered.
    pub(crate) fn commit(self, client: &dyn Client, database: &str) -> Result<()> {
        let payload = self.batch.to_bytes(Precision::Nanosecond);
        debug!(
            "committing {} points ({} bytes) to {:?}",
            self.batch.len(),
            payload.len(),
            database
        );
        client.write(
            &payload,
            &WriteOptions::new(database).with_precision(Precision::Nanosecond),
        )
    }

    /// Discards the buffered points.
    pub(crate) fn rollback(self) {
        debug!("rolled back {} points", self.batch.len());
    }
}
