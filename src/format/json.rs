//! HAPI JSON documents: the `info` keys, a `parameters` list and `data` rows
//! in one object.
//!
//! ```json
//! {"HAPI": "3.0", "x_dataset": "D", "parameters": [...], "data": [["2020-01-01T00:00:00Z", 1.5, [1, 2, 3]]]}
//! ```

use super::FormatError;
use crate::data::{RecordCollection, Value};
use crate::metadata::Metadata;
use crate::schema::schema_from_metadata;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Deserialize)]
struct Document {
    #[serde(flatten)]
    meta: Metadata,
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(flatten)]
    meta: &'a Metadata,
    data: Vec<Vec<serde_json::Value>>,
}

/// Parse a document into a collection typed by its own metadata
pub fn read_document<R: Read>(reader: R) -> Result<(RecordCollection, Metadata), FormatError> {
    let doc: Document = serde_json::from_reader(reader)?;
    let schema = schema_from_metadata(&doc.meta)?;

    let rows = doc
        .data
        .iter()
        .map(|row| row.iter().map(Value::from_json).collect())
        .collect();
    let collection = RecordCollection::new(schema, rows)?;

    tracing::debug!(
        rows = collection.len(),
        dataset = doc.meta.dataset_id().unwrap_or("-"),
        "read document"
    );
    Ok((collection, doc.meta))
}

pub fn read_document_from_path<P: AsRef<Path>>(path: P) -> Result<(RecordCollection, Metadata), FormatError> {
    let file = File::open(path)?;
    read_document(BufReader::new(file))
}

/// Write `collection` with `meta` as a pretty-printed document.
/// Missing doubles are written as `null`.
pub fn write_document<W: Write>(writer: W, collection: &RecordCollection, meta: &Metadata) -> Result<(), FormatError> {
    let data = collection
        .records()
        .iter()
        .map(|record| record.values().iter().map(Value::to_json).collect())
        .collect();

    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, &DocumentRef { meta, data })?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_document_to_path<P: AsRef<Path>>(
    path: P,
    collection: &RecordCollection,
    meta: &Metadata,
) -> Result<(), FormatError> {
    let file = File::create(path)?;
    write_document(BufWriter::new(file), collection, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionError;
    use crate::schema::SchemaError;

    const DOC: &str = r#"{
        "HAPI": "3.0",
        "startDate": "2020-01-01T00:00:00Z",
        "x_dataset": "D",
        "parameters": [
            {"name": "Time", "type": "isotime", "length": 24, "units": "UTC"},
            {"name": "flux", "type": "double", "fill": "-1e31", "units": "nT"},
            {"name": "count", "type": "integer", "fill": -1},
            {"name": "B", "type": "double", "size": [3]}
        ],
        "data": [
            ["2020-01-01T00:00:00.000Z", 1.5, 3, [1, 2, 3]],
            ["2020-01-01T00:00:01.000Z", null, 4, [4.5, 5, 6]]
        ]
    }"#;

    #[test]
    fn test_read_document() {
        let (collection, meta) = read_document(DOC.as_bytes()).unwrap();

        assert_eq!(meta.dataset_id(), Some("D"));
        assert_eq!(meta.extra.get("HAPI"), Some(&serde_json::json!("3.0")));
        assert_eq!(meta.parameter("count").unwrap().fill.as_deref(), Some("-1"));
        assert_eq!(collection.len(), 2);

        let flux = collection.field_values("flux").unwrap();
        assert_eq!(flux[0], &Value::Float64(1.5));
        assert!(flux[1].is_missing());
        let b = collection.field_values("B").unwrap();
        assert_eq!(b[0], &Value::from(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let (collection, meta) = read_document(DOC.as_bytes()).unwrap();
        write_document_to_path(&path, &collection, &meta).unwrap();
        let (reread, remeta) = read_document_from_path(&path).unwrap();

        assert_eq!(remeta, meta);
        assert_eq!(reread, collection);
    }

    #[test]
    fn test_missing_double_written_as_null() {
        let (collection, meta) = read_document(DOC.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_document(&mut out, &collection, &meta).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["data"][1][1], serde_json::Value::Null);
        assert_eq!(json["data"][0][3], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(json["startDate"], serde_json::json!("2020-01-01T00:00:00Z"));
    }

    #[test]
    fn test_bad_documents() {
        assert!(matches!(read_document("not json".as_bytes()), Err(FormatError::Json(_))));

        let no_time = r#"{"parameters": [{"name": "x", "type": "double"}], "data": []}"#;
        assert!(matches!(
            read_document(no_time.as_bytes()),
            Err(FormatError::Schema(SchemaError::MissingTime))
        ));

        let short_row = r#"{"parameters": [{"name": "Time", "type": "isotime", "length": 24},
            {"name": "x", "type": "double"}], "data": [["2020-01-01T00:00:00Z"]]}"#;
        assert!(matches!(
            read_document(short_row.as_bytes()),
            Err(FormatError::Conversion(ConversionError::Arity { row: 0, .. }))
        ));
    }
}
