use super::value::Value;
use crate::convert::{coerce_value, ConversionError};
use crate::metadata::RenameMap;
use crate::schema::{TypeSchema, TIME_FIELD};

/// One fixed-layout record; values are aligned with the owning schema
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Ordered, fixed-schema sequence of time-tagged records.
///
/// Every record is checked against the schema on construction, so all records
/// share the same layout. Missing values are `Float64(NaN)` in double fields
/// and `Null` in integer and text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCollection {
    schema: TypeSchema,
    records: Vec<Record>,
}

impl RecordCollection {
    /// Build a collection, coercing each row to the schema
    pub fn new(schema: TypeSchema, rows: Vec<Vec<Value>>) -> Result<Self, ConversionError> {
        if schema.position(TIME_FIELD).is_none() {
            return Err(ConversionError::MissingTime);
        }

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row, values)| {
                if values.len() != schema.len() {
                    return Err(ConversionError::Arity {
                        row,
                        expected: schema.len(),
                        actual: values.len(),
                    });
                }
                let values = values
                    .into_iter()
                    .zip(schema.fields())
                    .map(|(value, field)| coerce_value(value, &field.field_type, &field.name))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Record { values })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, records })
    }

    /// An empty collection with the given layout
    pub fn empty(schema: TypeSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All values of one field, in record order
    pub fn field_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.schema.position(name)?;
        Some(self.records.iter().map(|r| &r.values[idx]).collect())
    }

    /// Raw text of the time field, in record order
    pub fn times(&self) -> Vec<&str> {
        self.field_values(TIME_FIELD)
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.as_str().unwrap_or_default())
            .collect()
    }

    /// Structural rename of fields; values are untouched
    pub fn rename_fields(mut self, renames: &RenameMap) -> Self {
        self.schema.rename_with(|name| renames.get(name).map(str::to_string));
        self
    }
}
