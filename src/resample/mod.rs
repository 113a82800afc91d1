//! Re-grid one record collection onto a regular time axis
//!
//! Two modes:
//!
//! - **Tolerance snapping**: a grid spanning the data at `interval`; each grid
//!   time takes the nearest sample if it is within `tolerance`, otherwise the
//!   grid time is dropped.
//! - **Nearest fill**: a grid anchored at the first sample; every grid time
//!   takes the nearest sample. With `limit`, a grid time is only filled from
//!   a sample at most `limit` grid steps away on either side.
//!
//! Equally close samples resolve to the earliest input row in tolerance mode
//! and to the earlier time in nearest-fill mode.
//!
//! The metadata is copied unchanged; it does not describe the new cadence.

pub mod grid;
pub mod interval;

pub use interval::{Interval, IntervalError};

use crate::convert::{from_table, to_table, ConversionError};
use crate::data::RecordCollection;
use crate::metadata::Metadata;
use crate::schema::{schema_from_metadata, SchemaError};
use chrono::{DateTime, Utc};
use std::num::NonZeroUsize;

/// Resample configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampleOptions {
    /// Grid spacing
    pub interval: Interval,
    /// Round times to the nearest second first
    pub round_to_sec: bool,
    /// Snap to the grid within this distance instead of nearest-filling
    pub tolerance: Option<Interval>,
    /// Inclusive lower bound on sample times
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on sample times
    pub end_time: Option<DateTime<Utc>>,
    /// Most grid steps a sample may be carried forward or back (nearest-fill mode only)
    pub limit: Option<NonZeroUsize>,
}

impl ResampleOptions {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            round_to_sec: false,
            tolerance: None,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    pub fn with_round_to_sec(mut self, round: bool) -> Self {
        self.round_to_sec = round;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Interval) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn with_limit(mut self, limit: NonZeroUsize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Resampled collection and its (copied) metadata
#[derive(Debug, Clone)]
pub struct ResampleOutput {
    pub data: RecordCollection,
    pub meta: Metadata,
}

impl ResampleOutput {
    pub fn into_parts(self) -> (RecordCollection, Metadata) {
        (self.data, self.meta)
    }
}

/// Resample `collection` onto a regular grid
pub fn resample(
    collection: &RecordCollection,
    metadata: &Metadata,
    options: &ResampleOptions,
) -> Result<ResampleOutput, ResampleError> {
    let _span = tracing::info_span!(
        "resample",
        interval = %options.interval,
        tolerance = ?options.tolerance.map(|t| t.to_string()),
    )
    .entered();

    let meta = metadata.clone();
    let schema = schema_from_metadata(&meta)?;

    let mut table = to_table(collection, options.round_to_sec)?;
    if options.start_time.is_some() || options.end_time.is_some() {
        table = table.clip(options.start_time, options.end_time);
    }

    let sorted = table.sorted_rows();
    let times: Vec<DateTime<Utc>> = sorted.iter().map(|&i| table.time()[i]).collect();
    let (Some(&first), Some(&last)) = (times.first(), times.last()) else {
        tracing::info!("no samples in window");
        return Ok(ResampleOutput {
            data: RecordCollection::empty(schema),
            meta,
        });
    };

    let targets = grid::regular_grid(first, last, options.interval.duration());
    let (out_time, rows): (Vec<DateTime<Utc>>, Vec<Option<usize>>) = match options.tolerance {
        Some(tolerance) => grid::snap_within_tolerance(&times, &sorted, &targets, tolerance.duration())
            .into_iter()
            .map(|(t, pos)| (t, Some(sorted[pos])))
            .unzip(),
        None => {
            let limit = options.limit.map(NonZeroUsize::get);
            let fills = grid::nearest_fill(&times, &targets, limit);
            let rows = fills.into_iter().map(|p| p.map(|pos| sorted[pos])).collect();
            (targets, rows)
        }
    };

    let resampled = table.gather(out_time, &rows);
    let data = from_table(&resampled, &schema)?;

    tracing::info!(
        rows_in = collection.len(),
        rows_out = data.len(),
        "resampled collection"
    );

    Ok(ResampleOutput { data, meta })
}

#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}
