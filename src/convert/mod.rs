//! Record collection <-> table conversion
//!
//! `to_table` moves a fixed-layout record collection into columnar form with a
//! real date-time index; `from_table` coerces a (possibly joined, filled or
//! re-gridded) table back into records matching a declared `TypeSchema`.

use crate::data::time::{normalize_time, TIME_WIDTH};
use crate::data::{Column, RecordCollection, Table, TableError, Value};
use crate::schema::{FieldType, ScalarKind, TypeSchema, TIME_FIELD};

/// Convert a collection to a table, canonicalizing its time field.
///
/// Scalar fields become flat columns; vector fields become list columns whose
/// cells are each record's components, verbatim.
pub fn to_table(collection: &RecordCollection, round_to_sec: bool) -> Result<Table, ConversionError> {
    let schema = collection.schema();
    let time_idx = schema.position(TIME_FIELD).ok_or(ConversionError::MissingTime)?;

    let time = collection
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let text = record.values()[time_idx].as_str().unwrap_or_default();
            normalize_time(text, round_to_sec).map_err(|_| ConversionError::InvalidTime {
                row,
                value: text.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = Table::new(time);
    for (idx, field) in schema.fields().iter().enumerate() {
        if idx == time_idx {
            continue;
        }
        let mut column = Column::with_capacity(field.field_type.column_type(), collection.len());
        for record in collection.records() {
            column.push(&record.values()[idx]);
        }
        table.add_column(field.name.clone(), column)?;
    }

    Ok(table)
}

/// Convert a table back to a collection with `schema`'s layout.
///
/// The time index is rendered in canonical text, in a time field at least
/// `TIME_WIDTH` bytes wide. Every other schema field must exist as a column;
/// extra table columns are dropped.
pub fn from_table(table: &Table, schema: &TypeSchema) -> Result<RecordCollection, ConversionError> {
    let schema = schema.with_min_time_width(TIME_WIDTH);
    let rows = table.row_count();
    let mut columns: Vec<Vec<Value>> = Vec::with_capacity(schema.len());

    for field in schema.fields() {
        if field.name == TIME_FIELD {
            columns.push(table.time_text().into_iter().map(Value::String).collect());
            continue;
        }
        let column = table
            .column(&field.name)
            .ok_or_else(|| ConversionError::MissingColumn(field.name.clone()))?;
        columns.push(column.iter().collect());
    }

    let mut records: Vec<Vec<Value>> = (0..rows).map(|_| Vec::with_capacity(schema.len())).collect();
    for column in columns {
        for (record, value) in records.iter_mut().zip(column) {
            record.push(value);
        }
    }

    RecordCollection::new(schema, records)
}

/// Coerce a cell to a field's declared type and shape
pub fn coerce_value(value: Value, field_type: &FieldType, field: &str) -> Result<Value, ConversionError> {
    if !field_type.is_vector() {
        return coerce_scalar(value, field_type.kind, field);
    }

    let items = unpack_vector(value, field_type.components(), field)?;
    let items = items
        .into_iter()
        .map(|item| coerce_scalar(item, field_type.kind, field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(items))
}

/// Turn a vector cell into exactly `len` flat components.
///
/// Nested lists (multi-dimensional cells, or wrappers left by table
/// operations) are flattened row-major. A missing cell becomes `len` missing
/// components and a scalar is broadcast to every component.
pub fn unpack_vector(value: Value, len: usize, field: &str) -> Result<Vec<Value>, ConversionError> {
    match value {
        Value::List(items) => {
            let mut flat = Vec::with_capacity(len);
            flatten_into(items, &mut flat);
            if flat.len() != len {
                return Err(ConversionError::VectorLength {
                    field: field.to_string(),
                    expected: len,
                    actual: flat.len(),
                });
            }
            Ok(flat)
        }
        Value::Null => Ok(vec![Value::Null; len]),
        scalar => Ok(vec![scalar; len]),
    }
}

fn flatten_into(items: Vec<Value>, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten_into(inner, out),
            other => out.push(other),
        }
    }
}

fn coerce_scalar(value: Value, kind: ScalarKind, field: &str) -> Result<Value, ConversionError> {
    let mismatch = |value: &Value| ConversionError::TypeMismatch {
        field: field.to_string(),
        expected: kind,
        actual: value.to_string(),
    };

    match kind {
        ScalarKind::Double => match value {
            Value::Float64(_) => Ok(value),
            Value::Int64(i) => Ok(Value::Float64(i as f64)),
            Value::Null => Ok(Value::Float64(f64::NAN)),
            Value::String(ref s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| mismatch(&value)),
            Value::List(_) => Err(mismatch(&value)),
        },
        ScalarKind::Integer => {
            let int = match &value {
                Value::Null => return Ok(Value::Null),
                Value::Float64(f) if f.is_nan() => return Ok(Value::Null),
                Value::Int64(i) => Some(*i),
                Value::Float64(_) => value.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                Value::List(_) => None,
            };
            match int {
                Some(i) if i32::try_from(i).is_ok() => Ok(Value::Int64(i)),
                _ => Err(mismatch(&value)),
            }
        }
        ScalarKind::Text { width } => match value {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.len() <= width => Ok(Value::String(s)),
            Value::String(s) => Err(ConversionError::TextOverflow {
                field: field.to_string(),
                width,
                value: s,
            }),
            other => Err(mismatch(&other)),
        },
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("Collection has no '{}' field", TIME_FIELD)]
    MissingTime,

    #[error("Row {row}: unparseable time {value:?}")]
    InvalidTime { row: usize, value: String },

    #[error("Row {row} has {actual} values, schema has {expected} fields")]
    Arity { row: usize, expected: usize, actual: usize },

    #[error("Field '{0}' is declared but missing from the table")]
    MissingColumn(String),

    #[error("Field '{field}': vector has {actual} components, expected {expected}")]
    VectorLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field '{field}': cannot store {actual} as {expected}")]
    TypeMismatch {
        field: String,
        expected: ScalarKind,
        actual: String,
    },

    #[error("Field '{field}': {value:?} exceeds width {width}")]
    TextOverflow {
        field: String,
        width: usize,
        value: String,
    },

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{schema_from_collection, Field};

    fn schema() -> TypeSchema {
        TypeSchema::new(vec![
            Field::new("Time", FieldType::scalar(ScalarKind::Text { width: 30 })),
            Field::new("lat", FieldType::scalar(ScalarKind::Double)),
            Field::new("counts", FieldType::scalar(ScalarKind::Integer)),
            Field::new("flag", FieldType::scalar(ScalarKind::Text { width: 4 })),
            Field::new("B", FieldType::vector(ScalarKind::Double, vec![3])),
            Field::new("M", FieldType::vector(ScalarKind::Integer, vec![2, 2])),
        ])
    }

    fn collection() -> RecordCollection {
        RecordCollection::new(
            schema(),
            vec![
                vec![
                    "2013-01-01T00:00:54.000000Z".into(),
                    Value::Float64(45.5),
                    Value::Int64(7),
                    "ok".into(),
                    vec![1.0, 2.0, 3.0].into(),
                    Value::List(vec![Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Int64(4)]),
                ],
                vec![
                    "2013-01-01T00:00:56.000000Z".into(),
                    Value::Float64(f64::NAN),
                    Value::Null,
                    Value::Null,
                    vec![4.0, f64::NAN, 6.0].into(),
                    Value::List(vec![Value::Int64(5), Value::Int64(6), Value::Int64(7), Value::Int64(8)]),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_collection() {
        let original = collection();
        let table = to_table(&original, false).unwrap();
        let back = from_table(&table, &schema_from_collection(&original)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_round_trip_widens_narrow_time_field() {
        let narrow = TypeSchema::new(vec![
            Field::new("Time", FieldType::scalar(ScalarKind::Text { width: 24 })),
            Field::new("lat", FieldType::scalar(ScalarKind::Double)),
        ]);
        let original = RecordCollection::new(
            narrow,
            vec![
                vec!["2013-01-01T00:00:54.000Z".into(), Value::Float64(1.0)],
                vec!["2013-01-01T00:00:56.000Z".into(), Value::Float64(2.0)],
            ],
        )
        .unwrap();

        let table = to_table(&original, false).unwrap();
        let back = from_table(&table, &schema_from_collection(&original)).unwrap();

        assert_eq!(
            back.schema().field("Time").unwrap().field_type,
            FieldType::scalar(ScalarKind::Text { width: TIME_WIDTH })
        );
        assert_eq!(
            back.times(),
            vec!["2013-01-01T00:00:54.000000Z", "2013-01-01T00:00:56.000000Z"]
        );
        assert_eq!(back.field_values("lat"), original.field_values("lat"));
    }

    #[test]
    fn test_to_table_layout() {
        let table = to_table(&collection(), false).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), &["lat", "counts", "flag", "B", "M"]);
        assert_eq!(table.column("B").unwrap().data_type(), crate::data::DataType::List);
        assert_eq!(table.get_value(0, "B"), Some(Value::from(vec![1.0, 2.0, 3.0])));
        assert!(table.column("lat").unwrap().is_missing(1));
    }

    #[test]
    fn test_to_table_rounds_and_canonicalizes_time() {
        let schema = TypeSchema::new(vec![Field::new(
            "Time",
            FieldType::scalar(ScalarKind::Text { width: 30 }),
        )]);
        let collection = RecordCollection::new(schema.clone(), vec![vec!["2013-001T00:00:54.7Z".into()]]).unwrap();

        let table = to_table(&collection, true).unwrap();
        let back = from_table(&table, &schema).unwrap();
        assert_eq!(back.times(), vec!["2013-01-01T00:00:55.000000Z"]);
    }

    #[test]
    fn test_to_table_rejects_bad_time() {
        let schema = TypeSchema::new(vec![Field::new(
            "Time",
            FieldType::scalar(ScalarKind::Text { width: 30 }),
        )]);
        let collection = RecordCollection::new(schema, vec![vec!["soon".into()]]).unwrap();
        assert!(matches!(
            to_table(&collection, false),
            Err(ConversionError::InvalidTime { row: 0, .. })
        ));
    }

    #[test]
    fn test_from_table_missing_column() {
        let mut table = to_table(&collection(), false).unwrap();
        let wider = schema().merged_with(&TypeSchema::new(vec![Field::new(
            "extra",
            FieldType::scalar(ScalarKind::Double),
        )]));
        assert_eq!(
            from_table(&table, &wider),
            Err(ConversionError::MissingColumn("extra".into()))
        );

        // Columns unknown to the schema are dropped
        table
            .add_column("unused", Column::Float64(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        assert_eq!(from_table(&table, &schema()).unwrap(), collection());
    }

    #[test]
    fn test_from_table_ragged_vector() {
        let schema = TypeSchema::new(vec![
            Field::new("Time", FieldType::scalar(ScalarKind::Text { width: 30 })),
            Field::new("B", FieldType::vector(ScalarKind::Double, vec![3])),
        ]);
        let mut table = Table::new(vec![crate::data::parse_time("2020-01-01T00:00:00Z").unwrap()]);
        table
            .add_column("B", Column::List(vec![Value::from(vec![1.0, 2.0])]))
            .unwrap();
        assert!(matches!(
            from_table(&table, &schema),
            Err(ConversionError::VectorLength { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_unpack_vector_handles_wrappers() {
        let wrapped = Value::List(vec![Value::from(vec![1.0, 2.0, 3.0])]);
        assert_eq!(
            unpack_vector(wrapped, 3, "B").unwrap(),
            vec![Value::Float64(1.0), Value::Float64(2.0), Value::Float64(3.0)]
        );
        assert_eq!(
            unpack_vector(Value::Float64(-1.0), 2, "B").unwrap(),
            vec![Value::Float64(-1.0), Value::Float64(-1.0)]
        );
        assert_eq!(unpack_vector(Value::Null, 2, "B").unwrap(), vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_coerce_scalar_rules() {
        let int = FieldType::scalar(ScalarKind::Integer);
        assert_eq!(coerce_value(Value::Float64(-999.0), &int, "n"), Ok(Value::Int64(-999)));
        assert_eq!(coerce_value(Value::Float64(f64::NAN), &int, "n"), Ok(Value::Null));
        assert!(coerce_value(Value::Float64(1.5), &int, "n").is_err());
        assert!(coerce_value(Value::Int64(i64::MAX), &int, "n").is_err());

        let text = FieldType::scalar(ScalarKind::Text { width: 3 });
        assert!(matches!(
            coerce_value("toolong".into(), &text, "s"),
            Err(ConversionError::TextOverflow { width: 3, .. })
        ));

        let double = FieldType::scalar(ScalarKind::Double);
        assert_eq!(coerce_value(" 2.5".into(), &double, "d"), Ok(Value::Float64(2.5)));
        assert!(coerce_value(Value::from(vec![1.0]), &double, "d").is_err());
    }
}
