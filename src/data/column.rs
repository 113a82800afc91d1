use super::value::Value;

/// Storage tag of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int64,
    Float64,
    String,
    /// Fixed-length sequences, one per row
    List,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::String => write!(f, "STRING"),
            DataType::List => write!(f, "LIST"),
        }
    }
}

/// Columnar storage for one table field
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// 64-bit integer column
    Int64(Vec<Option<i64>>),
    /// 64-bit floating point column; NaN is kept as a value and reads back as missing
    Float64(Vec<Option<f64>>),
    /// Text column
    String(Vec<Option<String>>),
    /// Vector column. Cells are normally `Value::List`, but table operations
    /// may leave scalars or nested lists behind; see `convert::unpack_vector`.
    List(Vec<Value>),
}

impl Column {
    pub fn new(data_type: DataType) -> Self {
        Self::with_capacity(data_type, 0)
    }

    pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Int64 => Column::Int64(Vec::with_capacity(capacity)),
            DataType::Float64 => Column::Float64(Vec::with_capacity(capacity)),
            DataType::String => Column::String(Vec::with_capacity(capacity)),
            DataType::List => Column::List(Vec::with_capacity(capacity)),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Int64(_) => DataType::Int64,
            Column::Float64(_) => DataType::Float64,
            Column::String(_) => DataType::String,
            Column::List(_) => DataType::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::String(v) => v.len(),
            Column::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push a value to the column
    pub fn push(&mut self, value: &Value) {
        match (self, value) {
            (Column::Int64(v), Value::Int64(i)) => v.push(Some(*i)),
            (Column::Int64(v), other) => v.push(other.as_i64()),
            (Column::Float64(v), other) => v.push(other.as_f64()),
            (Column::String(v), Value::String(s)) => v.push(Some(s.clone())),
            (Column::String(v), _) => v.push(None),
            (Column::List(v), other) => v.push(other.clone()),
        }
    }

    pub fn push_null(&mut self) {
        match self {
            Column::Int64(v) => v.push(None),
            Column::Float64(v) => v.push(None),
            Column::String(v) => v.push(None),
            Column::List(v) => v.push(Value::Null),
        }
    }

    /// Get value at index
    pub fn get(&self, index: usize) -> Value {
        match self {
            Column::Int64(v) => v
                .get(index)
                .and_then(|v| *v)
                .map(Value::Int64)
                .unwrap_or(Value::Null),
            Column::Float64(v) => v
                .get(index)
                .and_then(|v| *v)
                .map(Value::Float64)
                .unwrap_or(Value::Null),
            Column::String(v) => v
                .get(index)
                .and_then(|v| v.clone())
                .map(Value::String)
                .unwrap_or(Value::Null),
            Column::List(v) => v.get(index).cloned().unwrap_or(Value::Null),
        }
    }

    pub fn is_missing(&self, index: usize) -> bool {
        match self {
            Column::Int64(v) => v.get(index).map_or(true, |c| c.is_none()),
            Column::Float64(v) => v.get(index).map_or(true, |c| c.map_or(true, f64::is_nan)),
            Column::String(v) => v.get(index).map_or(true, |c| c.is_none()),
            Column::List(v) => v.get(index).map_or(true, Value::is_missing),
        }
    }

    /// Build a new column by picking rows; `None` produces a missing cell
    pub fn gather(&self, indices: &[Option<usize>]) -> Column {
        fn pick<T: Clone>(src: &[Option<T>], indices: &[Option<usize>]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|idx| idx.and_then(|i| src.get(i).cloned().flatten()))
                .collect()
        }

        match self {
            Column::Int64(v) => Column::Int64(pick(v, indices)),
            Column::Float64(v) => Column::Float64(pick(v, indices)),
            Column::String(v) => Column::String(pick(v, indices)),
            Column::List(v) => Column::List(
                indices
                    .iter()
                    .map(|idx| idx.and_then(|i| v.get(i).cloned()).unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }

    /// Replace every missing cell with `value`, returning the number of cells written
    pub fn fill_missing(&mut self, value: &Value) -> usize {
        let missing: Vec<usize> = (0..self.len()).filter(|&i| self.is_missing(i)).collect();
        for &i in &missing {
            self.set(i, value);
        }
        missing.len()
    }

    /// Fill this column's missing cells from the same rows of `other`
    pub fn coalesce(&mut self, other: &Column) {
        let rows = self.len().min(other.len());
        for i in 0..rows {
            if self.is_missing(i) && !other.is_missing(i) {
                self.set(i, &other.get(i));
            }
        }
    }

    fn set(&mut self, index: usize, value: &Value) {
        match self {
            Column::Int64(v) => v[index] = value.as_i64(),
            Column::Float64(v) => v[index] = value.as_f64(),
            Column::String(v) => {
                v[index] = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                }
            }
            Column::List(v) => v[index] = value.clone(),
        }
    }

    /// Create an iterator over column values
    pub fn iter(&self) -> ColumnIter<'_> {
        ColumnIter {
            column: self,
            index: 0,
        }
    }
}

pub struct ColumnIter<'a> {
    column: &'a Column,
    index: usize,
}

impl<'a> Iterator for ColumnIter<'a> {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.column.len() {
            return None;
        }
        let value = self.column.get(self.index);
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.column.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for ColumnIter<'a> {}
