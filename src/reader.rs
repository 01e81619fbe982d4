//! In-memory `RecordBatchReader` for metadata results.
//!
//! Query results are not streamed; only the small metadata answers
//! (`get_info`, `get_objects`, ...) are handed out as Arrow batches.

use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::{Schema, SchemaRef};

/// Iterator-based RecordBatchReader for pre-loaded record batches.
pub struct VecRecordBatchReader {
    batches: std::vec::IntoIter<RecordBatch>,
    schema: SchemaRef,
}

impl VecRecordBatchReader {
    pub fn new(batches: Vec<RecordBatch>, schema: Schema) -> Self {
        Self {
            batches: batches.into_iter(),
            schema: Arc::new(schema),
        }
    }

    /// Builds a reader holding a single batch.
    pub fn single(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch].into_iter(),
        }
    }

    pub fn empty(schema: Schema) -> Self {
        Self::new(Vec::new(), schema)
    }
}

impl arrow_array::RecordBatchReader for VecRecordBatchReader {
    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

impl Iterator for VecRecordBatchReader {
    type Item = std::result::Result<RecordBatch, arrow_schema::ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.batches.next().map(Ok)
    }
}
