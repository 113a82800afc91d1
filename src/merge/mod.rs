//! Merge two HAPI record collections onto one time axis

pub mod fill;
pub mod join;

pub use fill::{fill_missing, FillParseError, FillRejection, FillReport, FilledParameter};
pub use join::{join_tables, JoinMode};

use crate::convert::{from_table, to_table, ConversionError};
use crate::data::{RecordCollection, TableError};
use crate::metadata::{reconcile, Metadata, ReconcileError};
use crate::schema::{schema_from_metadata, SchemaError};

/// Merge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Which timestamps survive (default: outer)
    pub how: JoinMode,
    /// Round times to the nearest second before joining
    pub round_to_sec: bool,
    /// Replace missing cells with each parameter's declared fill value
    pub fill_nan: bool,
    /// Rename every colliding parameter. When false, parameters with identical
    /// descriptors on both sides are merged into one column.
    pub join_all: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            how: JoinMode::Outer,
            round_to_sec: false,
            fill_nan: false,
            join_all: true,
        }
    }
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_how(mut self, how: JoinMode) -> Self {
        self.how = how;
        self
    }

    pub fn with_round_to_sec(mut self, round: bool) -> Self {
        self.round_to_sec = round;
        self
    }

    pub fn with_fill_nan(mut self, fill: bool) -> Self {
        self.fill_nan = fill;
        self
    }

    pub fn with_join_all(mut self, join_all: bool) -> Self {
        self.join_all = join_all;
        self
    }
}

/// Merged collection, its metadata, and fill diagnostics
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub data: RecordCollection,
    pub meta: Metadata,
    /// Empty unless `fill_nan` was set
    pub fill_report: FillReport,
}

impl MergeOutput {
    pub fn into_parts(self) -> (RecordCollection, Metadata) {
        (self.data, self.meta)
    }
}

/// Merge `data_b` into `data_a` on time.
///
/// Colliding parameter names of B are renamed `<name>_<B's x_dataset>` in both
/// the metadata and B's fields before the join. The output layout follows the
/// combined metadata. Neither input is modified.
pub fn merge(
    data_a: &RecordCollection,
    meta_a: &Metadata,
    data_b: &RecordCollection,
    meta_b: &Metadata,
    options: &MergeOptions,
) -> Result<MergeOutput, MergeError> {
    let _span = tracing::info_span!("merge", how = %options.how).entered();

    let (meta, renames) = reconcile(meta_a, meta_b, options.join_all)?;
    let data_b = data_b.clone().rename_fields(&renames);

    let table_a = to_table(data_a, options.round_to_sec)?;
    let table_b = to_table(&data_b, options.round_to_sec)?;
    let mut joined = join_tables(&table_a, &table_b, options.how)?;

    let fill_report = if options.fill_nan {
        fill_missing(&mut joined, &meta)
    } else {
        FillReport::default()
    };

    let schema = schema_from_metadata(&meta)?;
    let data = from_table(&joined, &schema)?;

    tracing::info!(
        rows_a = data_a.len(),
        rows_b = data_b.len(),
        rows = data.len(),
        renamed = renames.len(),
        unfilled = fill_report.unfilled.len(),
        "merged collections"
    );

    Ok(MergeOutput {
        data,
        meta,
        fill_report,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl From<TableError> for MergeError {
    fn from(e: TableError) -> Self {
        MergeError::Conversion(ConversionError::Table(e))
    }
}
