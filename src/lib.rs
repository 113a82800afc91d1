//! hapimerge: merge and resample HAPI time-series data
//!
//! Works on a record collection (fixed-layout, time-tagged records) paired
//! with the HAPI metadata that describes it. Both operations convert to an
//! in-memory columnar table keyed on time, do their work there, and convert
//! back to a record collection typed by the output metadata.
//!
//! # Features
//!
//! - **Merge**: left/right/outer/inner time join of two datasets, with
//!   colliding parameter names disambiguated by dataset id
//! - **Fill**: optional replacement of missing cells by each parameter's
//!   declared fill value
//! - **Resample**: regular grid with tolerance snapping or nearest fill
//! - **Canonical time**: every output timestamp is `YYYY-MM-DDTHH:MM:SS.ffffffZ`
//!
//! # Example
//!
//! ```
//! use hapimerge::data::{RecordCollection, Value};
//! use hapimerge::metadata::{Metadata, ParameterDescriptor};
//! use hapimerge::merge::{merge, JoinMode, MergeOptions};
//! use hapimerge::schema::schema_from_metadata;
//!
//! let meta_a = Metadata::new(vec![
//!     ParameterDescriptor::new("Time", "isotime").with_length(24),
//!     ParameterDescriptor::new("lat", "double"),
//! ])
//! .with_dataset("A");
//! let meta_b = meta_a.clone().with_dataset("B");
//!
//! let rows = |t: &str, v: f64| -> Vec<Vec<Value>> { vec![vec![t.into(), v.into()]] };
//! let a = RecordCollection::new(schema_from_metadata(&meta_a).unwrap(), rows("2020-01-01T00:00:00Z", 1.0)).unwrap();
//! let b = RecordCollection::new(schema_from_metadata(&meta_b).unwrap(), rows("2020-01-01T00:00:01Z", 2.0)).unwrap();
//!
//! let out = merge(&a, &meta_a, &b, &meta_b, &MergeOptions::new().with_how(JoinMode::Outer)).unwrap();
//! assert_eq!(out.data.len(), 2);
//! assert!(out.meta.contains("lat_B"));
//! ```

pub mod convert;
pub mod data;
pub mod format;
pub mod merge;
pub mod metadata;
pub mod resample;
pub mod schema;

// Re-export commonly used types
pub use data::{RecordCollection, Table, Value};
pub use merge::{merge, JoinMode, MergeError, MergeOptions, MergeOutput};
pub use metadata::{Metadata, ParameterDescriptor};
pub use resample::{resample, Interval, ResampleError, ResampleOptions, ResampleOutput};
pub use schema::{schema_from_collection, schema_from_metadata, TypeSchema};
