//! On-disk representations of a record collection and its metadata

pub mod json;

pub use json::{read_document, read_document_from_path, write_document, write_document_to_path};

use crate::convert::ConversionError;
use crate::schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}
