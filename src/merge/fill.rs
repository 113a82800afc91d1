//! Replace missing table cells with each parameter's declared fill value

use crate::data::{Table, Value};
use crate::metadata::Metadata;
use crate::schema::{resolve_parameter, ScalarKind, TIME_FIELD};
use std::num::ParseFloatError;

/// A declared fill value that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Fill value {value:?} of parameter '{parameter}' not applied: {reason}")]
pub struct FillParseError {
    pub parameter: String,
    pub value: String,
    #[source]
    pub reason: FillRejection,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillRejection {
    #[error("not numeric: {0}")]
    NotNumeric(#[from] ParseFloatError),

    #[error("does not fit the parameter's {0} storage")]
    Unrepresentable(ScalarKind),
}

/// A parameter whose missing cells were replaced
#[derive(Debug, Clone, PartialEq)]
pub struct FilledParameter {
    pub name: String,
    pub sentinel: f64,
    pub cells: usize,
}

/// Outcome of one fill pass. Unfilled parameters are diagnostics, not failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    pub filled: Vec<FilledParameter>,
    pub unfilled: Vec<FillParseError>,
}

impl FillReport {
    pub fn cells_filled(&self) -> usize {
        self.filled.iter().map(|f| f.cells).sum()
    }
}

/// Fill missing cells from each parameter's declared fill value.
///
/// Parameters without a fill, or without a column in `table`, are skipped.
/// A fill that is not a number, or that the parameter's storage cannot hold
/// (fractional or outside i32 for integers, wider than the field for text),
/// leaves its column untouched and is recorded in the returned report; the
/// pass never fails.
pub fn fill_missing(table: &mut Table, metadata: &Metadata) -> FillReport {
    let mut report = FillReport::default();

    for param in metadata.parameters.iter().filter(|p| p.name != TIME_FIELD) {
        let Some(fill) = param.fill.as_deref() else {
            continue;
        };
        let Some(column) = table.column_mut(&param.name) else {
            tracing::debug!(parameter = %param.name, "no column to fill");
            continue;
        };
        let kind = match resolve_parameter(param) {
            Ok(field_type) => field_type.kind,
            Err(err) => {
                tracing::debug!(parameter = %param.name, error = %err, "unresolvable parameter not filled");
                continue;
            }
        };

        let (sentinel, value) = match fill_value(fill, kind) {
            Ok(parsed) => parsed,
            Err(reason) => {
                let err = FillParseError {
                    parameter: param.name.clone(),
                    value: fill.to_string(),
                    reason,
                };
                tracing::warn!("{}", err);
                report.unfilled.push(err);
                continue;
            }
        };

        let cells = column.fill_missing(&value);
        tracing::debug!(parameter = %param.name, sentinel, cells, "filled missing cells");

        report.filled.push(FilledParameter {
            name: param.name.clone(),
            sentinel,
            cells,
        });
    }

    report
}

/// Parse `fill` and build the cell written for `kind`
fn fill_value(fill: &str, kind: ScalarKind) -> Result<(f64, Value), FillRejection> {
    let sentinel = fill.trim().parse::<f64>()?;
    let value = match kind {
        ScalarKind::Double => Value::Float64(sentinel),
        ScalarKind::Integer => {
            let in_range = (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&sentinel);
            if !in_range || sentinel.fract() != 0.0 {
                return Err(FillRejection::Unrepresentable(kind));
            }
            Value::Int64(sentinel as i64)
        }
        // Text keeps the declared spelling of the sentinel
        ScalarKind::Text { width } => {
            if fill.len() > width {
                return Err(FillRejection::Unrepresentable(kind));
            }
            Value::String(fill.to_string())
        }
    };
    Ok((sentinel, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_time;
    use crate::data::Column;
    use crate::metadata::ParameterDescriptor;

    fn table() -> Table {
        let time = ["2020-01-01T00:00:00Z", "2020-01-01T00:00:01Z"]
            .iter()
            .map(|t| parse_time(t).unwrap())
            .collect();
        let mut table = Table::new(time);
        table.add_column("lat", Column::Float64(vec![Some(1.0), None])).unwrap();
        table.add_column("n", Column::Int64(vec![None, Some(2)])).unwrap();
        table.add_column("s", Column::String(vec![None, Some("x".into())])).unwrap();
        table
            .add_column("B", Column::List(vec![Value::Null, Value::from(vec![1.0, 2.0])]))
            .unwrap();
        table.add_column("bad", Column::Float64(vec![None, None])).unwrap();
        table
    }

    fn metadata() -> Metadata {
        Metadata::new(vec![
            ParameterDescriptor::new("Time", "isotime").with_fill("1970-01-01T00:00:00Z"),
            ParameterDescriptor::new("lat", "double").with_fill("-999.0"),
            ParameterDescriptor::new("n", "integer").with_fill("-1"),
            ParameterDescriptor::new("s", "string").with_length(4).with_fill("-9"),
            ParameterDescriptor::new("B", "double").with_size(vec![2]).with_fill("-1e31"),
            ParameterDescriptor::new("bad", "double").with_fill("n/a"),
            ParameterDescriptor::new("ghost", "double").with_fill("0"),
        ])
    }

    #[test]
    fn test_fill_replaces_missing_cells() {
        let mut table = table();
        let report = fill_missing(&mut table, &metadata());

        assert_eq!(table.get_value(1, "lat"), Some(Value::Float64(-999.0)));
        assert_eq!(table.get_value(0, "n"), Some(Value::Int64(-1)));
        assert_eq!(table.get_value(0, "s"), Some(Value::String("-9".into())));
        assert_eq!(table.get_value(0, "B"), Some(Value::Float64(-1e31)));
        assert_eq!(table.get_value(1, "B"), Some(Value::from(vec![1.0, 2.0])));

        let names: Vec<&str> = report.filled.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["lat", "n", "s", "B"]);
        assert_eq!(report.cells_filled(), 4);
    }

    #[test]
    fn test_non_numeric_fill_is_reported_not_raised() {
        let mut table = table();
        let report = fill_missing(&mut table, &metadata());

        assert_eq!(report.unfilled.len(), 1);
        assert_eq!(report.unfilled[0].parameter, "bad");
        assert_eq!(report.unfilled[0].value, "n/a");
        assert!(matches!(report.unfilled[0].reason, FillRejection::NotNumeric(_)));
        assert!(table.column("bad").unwrap().is_missing(0));
    }

    #[test]
    fn test_fill_the_column_cannot_hold_is_reported() {
        let mut table = table();
        let mut meta = metadata();
        meta.parameters[2].fill = Some("-1e31".into());
        meta.parameters[3].fill = Some("-1e+31".into());
        let report = fill_missing(&mut table, &meta);

        let rejected: Vec<(&str, &FillRejection)> = report
            .unfilled
            .iter()
            .map(|e| (e.parameter.as_str(), &e.reason))
            .collect();
        assert_eq!(
            rejected[..2],
            [
                ("n", &FillRejection::Unrepresentable(ScalarKind::Integer)),
                ("s", &FillRejection::Unrepresentable(ScalarKind::Text { width: 4 })),
            ]
        );
        assert!(table.column("n").unwrap().is_missing(0));
        assert!(table.column("s").unwrap().is_missing(0));

        let names: Vec<&str> = report.filled.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["lat", "B"]);
        assert_eq!(report.cells_filled(), 2);
    }

    #[test]
    fn test_fractional_integer_fill_is_reported() {
        let mut table = table();
        let mut meta = metadata();
        meta.parameters[2].fill = Some("0.5".into());
        let report = fill_missing(&mut table, &meta);

        assert_eq!(report.unfilled[0].parameter, "n");
        assert_eq!(table.get_value(1, "n"), Some(Value::Int64(2)));
        assert!(table.column("n").unwrap().is_missing(0));
    }

    #[test]
    fn test_integer_fill_at_i32_bounds_applies() {
        let mut table = table();
        let mut meta = metadata();
        meta.parameters[2].fill = Some("-2147483648".into());
        let report = fill_missing(&mut table, &meta);

        assert_eq!(table.get_value(0, "n"), Some(Value::Int64(i64::from(i32::MIN))));
        assert!(report.filled.iter().any(|f| f.name == "n"));
    }

    #[test]
    fn test_parameters_without_fill_untouched() {
        let mut table = table();
        let mut meta = metadata();
        for p in &mut meta.parameters {
            p.fill = None;
        }
        let report = fill_missing(&mut table, &meta);
        assert_eq!(report, FillReport::default());
        assert!(table.column("lat").unwrap().is_missing(1));
    }
}
