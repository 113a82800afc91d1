//! Type schema resolution
//!
//! A `TypeSchema` is the ordered per-field storage layout of a record
//! collection. It is resolved once, up front, either from an existing
//! collection or from a metadata description, and every later conversion
//! step works from the declared layout instead of inspecting values.

use crate::data::time::TIME_WIDTH;
use crate::data::{DataType, RecordCollection};
use crate::metadata::{Metadata, ParameterDescriptor};
use serde::Serialize;

/// Name of the mandatory time field
pub const TIME_FIELD: &str = "Time";

/// Scalar storage kind of a field or of each vector component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalarKind {
    /// 64-bit float
    Double,
    /// 32-bit signed integer
    Integer,
    /// Fixed-width text, width in bytes
    Text { width: usize },
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::Double => write!(f, "f64"),
            ScalarKind::Integer => write!(f, "i32"),
            ScalarKind::Text { width } => write!(f, "S{}", width),
        }
    }
}

/// Storage type of one field: a scalar kind plus an optional fixed shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldType {
    pub kind: ScalarKind,
    /// Empty for scalars
    pub dims: Vec<usize>,
}

impl FieldType {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self { kind, dims: Vec::new() }
    }

    pub fn vector(kind: ScalarKind, dims: Vec<usize>) -> Self {
        Self { kind, dims }
    }

    pub fn is_vector(&self) -> bool {
        !self.dims.is_empty()
    }

    /// Number of flattened components per record (1 for scalars)
    pub fn components(&self) -> usize {
        self.dims.iter().product()
    }

    /// Column storage used for this field inside a `Table`
    pub fn column_type(&self) -> DataType {
        if self.is_vector() {
            return DataType::List;
        }
        match self.kind {
            ScalarKind::Double => DataType::Float64,
            ScalarKind::Integer => DataType::Int64,
            ScalarKind::Text { .. } => DataType::String,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.dims.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}{:?}", self.kind, self.dims)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered `(name, type)` layout of a record collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSchema {
    fields: Vec<Field>,
}

impl TypeSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Rename every field for which `rename` returns a new name. All names are
    /// looked up before any is changed, so swaps and chains are safe.
    pub fn rename_with<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for field in &mut self.fields {
            if let Some(to) = rename(&field.name) {
                field.name = to;
            }
        }
    }

    /// Copy with the time field widened to at least `min_width` bytes
    pub fn with_min_time_width(&self, min_width: usize) -> TypeSchema {
        let mut widened = self.clone();
        for field in widened.fields.iter_mut().filter(|f| f.name == TIME_FIELD) {
            if let ScalarKind::Text { width } = &mut field.field_type.kind {
                *width = (*width).max(min_width);
            }
        }
        widened
    }

    /// This layout followed by `other`'s fields, skipping its time field
    pub fn merged_with(&self, other: &TypeSchema) -> TypeSchema {
        let mut fields = self.fields.clone();
        fields.extend(
            other
                .fields
                .iter()
                .filter(|f| f.name != TIME_FIELD)
                .cloned(),
        );
        TypeSchema { fields }
    }
}

/// Layout of an existing collection
pub fn schema_from_collection(collection: &RecordCollection) -> TypeSchema {
    collection.schema().clone()
}

/// Derive the layout purely from a metadata description.
///
/// `Time` always becomes fixed-width text of at least `TIME_WIDTH` bytes.
pub fn schema_from_metadata(metadata: &Metadata) -> Result<TypeSchema, SchemaError> {
    if !metadata.parameters.iter().any(|p| p.name == TIME_FIELD) {
        return Err(SchemaError::MissingTime);
    }

    let fields = metadata
        .parameters
        .iter()
        .map(|p| Ok(Field::new(p.name.clone(), resolve_parameter(p)?)))
        .collect::<Result<Vec<_>, SchemaError>>()?;

    Ok(TypeSchema { fields })
}

/// Resolve one descriptor's storage type
pub fn resolve_parameter(param: &ParameterDescriptor) -> Result<FieldType, SchemaError> {
    if param.name == TIME_FIELD {
        let width = param.length.unwrap_or(0).max(TIME_WIDTH);
        return Ok(FieldType::scalar(ScalarKind::Text { width }));
    }

    let kind = match param.kind.as_str() {
        "double" => ScalarKind::Double,
        "integer" => ScalarKind::Integer,
        "string" | "isotime" => match param.length {
            Some(width) if width > 0 => ScalarKind::Text { width },
            _ => {
                return Err(SchemaError::MissingLength {
                    parameter: param.name.clone(),
                    kind: param.kind.clone(),
                })
            }
        },
        other => {
            return Err(SchemaError::UnknownType {
                parameter: param.name.clone(),
                kind: other.to_string(),
            })
        }
    };

    match &param.size {
        None => Ok(FieldType::scalar(kind)),
        Some(dims) if dims.is_empty() || dims.contains(&0) => Err(SchemaError::InvalidSize {
            parameter: param.name.clone(),
            size: dims.clone(),
        }),
        Some(dims) => Ok(FieldType::vector(kind, dims.clone())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Metadata has no '{}' parameter", TIME_FIELD)]
    MissingTime,

    #[error("Parameter '{parameter}' has unsupported type '{kind}'")]
    UnknownType { parameter: String, kind: String },

    #[error("Parameter '{parameter}' of type '{kind}' needs a positive length")]
    MissingLength { parameter: String, kind: String },

    #[error("Parameter '{parameter}' has invalid size {size:?}")]
    InvalidSize { parameter: String, size: Vec<usize> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ParameterDescriptor;

    fn meta(params: Vec<ParameterDescriptor>) -> Metadata {
        Metadata::new(params)
    }

    #[test]
    fn test_schema_from_metadata() {
        let metadata = meta(vec![
            ParameterDescriptor::new("Time", "isotime").with_length(24),
            ParameterDescriptor::new("lat", "double").with_fill("-1e31"),
            ParameterDescriptor::new("counts", "integer"),
            ParameterDescriptor::new("Field_Vector", "double").with_size(vec![3]),
            ParameterDescriptor::new("flag", "string").with_length(4),
        ]);

        let schema = schema_from_metadata(&metadata).unwrap();
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["Time", "lat", "counts", "Field_Vector", "flag"]);

        assert_eq!(
            schema.field("Time").unwrap().field_type,
            FieldType::scalar(ScalarKind::Text { width: 30 })
        );
        assert_eq!(schema.field("counts").unwrap().field_type.column_type(), DataType::Int64);

        let vector = &schema.field("Field_Vector").unwrap().field_type;
        assert!(vector.is_vector());
        assert_eq!(vector.components(), 3);
        assert_eq!(vector.column_type(), DataType::List);

        assert_eq!(
            schema.field("flag").unwrap().field_type,
            FieldType::scalar(ScalarKind::Text { width: 4 })
        );
    }

    #[test]
    fn test_wide_time_length_is_kept() {
        let metadata = meta(vec![ParameterDescriptor::new("Time", "isotime").with_length(40)]);
        let schema = schema_from_metadata(&metadata).unwrap();
        assert_eq!(
            schema.fields()[0].field_type.kind,
            ScalarKind::Text { width: 40 }
        );
    }

    #[test]
    fn test_schema_errors() {
        let no_time = meta(vec![ParameterDescriptor::new("lat", "double")]);
        assert_eq!(schema_from_metadata(&no_time), Err(SchemaError::MissingTime));

        let unknown = meta(vec![
            ParameterDescriptor::new("Time", "isotime"),
            ParameterDescriptor::new("lat", "complex"),
        ]);
        assert!(matches!(
            schema_from_metadata(&unknown),
            Err(SchemaError::UnknownType { .. })
        ));

        let no_length = meta(vec![
            ParameterDescriptor::new("Time", "isotime"),
            ParameterDescriptor::new("label", "string"),
        ]);
        assert!(matches!(
            schema_from_metadata(&no_length),
            Err(SchemaError::MissingLength { .. })
        ));

        let zero_size = meta(vec![
            ParameterDescriptor::new("Time", "isotime"),
            ParameterDescriptor::new("v", "double").with_size(vec![3, 0]),
        ]);
        assert!(matches!(
            schema_from_metadata(&zero_size),
            Err(SchemaError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_merged_with_skips_second_time() {
        let a = TypeSchema::new(vec![
            Field::new("Time", FieldType::scalar(ScalarKind::Text { width: 30 })),
            Field::new("lat", FieldType::scalar(ScalarKind::Double)),
        ]);
        let b = TypeSchema::new(vec![
            Field::new("Time", FieldType::scalar(ScalarKind::Text { width: 30 })),
            Field::new("B", FieldType::vector(ScalarKind::Double, vec![3])),
        ]);
        let names: Vec<String> = a.merged_with(&b).names().map(String::from).collect();
        assert_eq!(names, vec!["Time", "lat", "B"]);
    }
}
