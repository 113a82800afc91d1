use super::column::Column;
use super::time::{format_time, round_to_second};
use super::value::Value;
use chrono::{DateTime, Utc};
use fxhash::FxHashMap;

/// Ephemeral columnar table keyed by field name, indexed by time.
///
/// The time index holds real date-time values; every other field is a named
/// column of the same length. Column order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    time: Vec<DateTime<Utc>>,
    names: Vec<String>,
    columns: Vec<Column>,
    index: FxHashMap<String, usize>,
}

impl Table {
    pub fn new(time: Vec<DateTime<Utc>>) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    /// Add a column after the existing ones
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), TableError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if column.len() != self.time.len() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.time.len(),
                actual: column.len(),
            });
        }

        self.index.insert(name.clone(), self.columns.len());
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn time(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    /// Time index rendered in canonical text form
    pub fn time_text(&self) -> Vec<String> {
        self.time.iter().map(format_time).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.index.get(name).map(|&i| &mut self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(name, column)` pairs in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn row_count(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Get value at specific row and column
    pub fn get_value(&self, row_idx: usize, column: &str) -> Option<Value> {
        self.column(column).map(|col| col.get(row_idx))
    }

    /// Build a new table from `time` and, for each output row, the source row
    /// to copy (`None` leaves every cell of that row missing).
    pub fn gather(&self, time: Vec<DateTime<Utc>>, rows: &[Option<usize>]) -> Table {
        debug_assert_eq!(time.len(), rows.len());
        Table {
            time,
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.gather(rows)).collect(),
            index: self.index.clone(),
        }
    }

    /// Row indices ordered by time. Equal times keep their original order.
    pub fn sorted_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..self.time.len()).collect();
        rows.sort_by_key(|&i| self.time[i]);
        rows
    }

    /// Keep only rows whose time lies in `[start, end]`; open ends are unbounded
    pub fn clip(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Table {
        let rows: Vec<usize> = (0..self.time.len())
            .filter(|&i| start.map_or(true, |s| self.time[i] >= s))
            .filter(|&i| end.map_or(true, |e| self.time[i] <= e))
            .collect();
        let time = rows.iter().map(|&i| self.time[i]).collect();
        let rows: Vec<Option<usize>> = rows.into_iter().map(Some).collect();
        self.gather(time, &rows)
    }

    /// Round every timestamp to the nearest whole second
    pub fn round_to_second(&mut self) {
        for t in &mut self.time {
            *t = round_to_second(*t);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::time::parse_time;

    fn make_table(times: &[&str], values: &[f64]) -> Table {
        let time = times.iter().map(|t| parse_time(t).unwrap()).collect();
        let mut table = Table::new(time);
        table
            .add_column("flux", Column::Float64(values.iter().copied().map(Some).collect()))
            .unwrap();
        table
    }

    #[test]
    fn test_add_column_checks_length_and_names() {
        let mut table = make_table(&["2020-01-01T00:00:00Z"], &[1.0]);
        assert_eq!(
            table.add_column("flux", Column::Float64(vec![Some(2.0)])),
            Err(TableError::DuplicateColumn("flux".into()))
        );
        assert!(matches!(
            table.add_column("lat", Column::Float64(vec![])),
            Err(TableError::LengthMismatch { expected: 1, actual: 0, .. })
        ));
        assert_eq!(table.column_names(), &["flux".to_string()]);
    }

    #[test]
    fn test_sorted_rows_is_stable() {
        let table = make_table(
            &["2020-01-01T00:00:02Z", "2020-01-01T00:00:01Z", "2020-01-01T00:00:02Z"],
            &[1.0, 2.0, 3.0],
        );
        assert_eq!(table.sorted_rows(), vec![1, 0, 2]);
    }

    #[test]
    fn test_clip_is_inclusive() {
        let table = make_table(
            &["2020-01-01T00:00:00Z", "2020-01-01T00:00:01Z", "2020-01-01T00:00:02Z"],
            &[1.0, 2.0, 3.0],
        );
        let clipped = table.clip(
            Some(parse_time("2020-01-01T00:00:01Z").unwrap()),
            Some(parse_time("2020-01-01T00:00:02Z").unwrap()),
        );
        assert_eq!(clipped.row_count(), 2);
        assert_eq!(clipped.get_value(0, "flux"), Some(Value::Float64(2.0)));
        assert_eq!(clipped.get_value(1, "flux"), Some(Value::Float64(3.0)));
    }

    #[test]
    fn test_round_to_second() {
        let mut table = make_table(&["2020-01-01T00:00:00.7Z"], &[1.0]);
        table.round_to_second();
        assert_eq!(table.time_text(), vec!["2020-01-01T00:00:01.000000Z".to_string()]);
    }
}
