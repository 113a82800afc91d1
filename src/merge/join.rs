//! Ordered time join of two tables

use crate::data::{Table, TableError};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::str::FromStr;

/// Which timestamps survive a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Timestamps of the left table only
    Left,
    /// Timestamps of the right table only
    Right,
    /// Every timestamp from either side
    #[default]
    Outer,
    /// Timestamps present on both sides
    Inner,
}

impl JoinMode {
    fn keeps_left_only(self) -> bool {
        matches!(self, JoinMode::Left | JoinMode::Outer)
    }

    fn keeps_right_only(self) -> bool {
        matches!(self, JoinMode::Right | JoinMode::Outer)
    }
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            "outer" => Ok(JoinMode::Outer),
            "inner" => Ok(JoinMode::Inner),
            other => Err(format!("unknown join mode '{}' (expected left, right, outer or inner)", other)),
        }
    }
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinMode::Left => write!(f, "left"),
            JoinMode::Right => write!(f, "right"),
            JoinMode::Outer => write!(f, "outer"),
            JoinMode::Inner => write!(f, "inner"),
        }
    }
}

/// Row pairing produced by the join
#[derive(Debug, Default)]
struct JoinPlan {
    time: Vec<DateTime<Utc>>,
    left: Vec<Option<usize>>,
    right: Vec<Option<usize>>,
}

impl JoinPlan {
    fn push(&mut self, time: DateTime<Utc>, left: Option<usize>, right: Option<usize>) {
        self.time.push(time);
        self.left.push(left);
        self.right.push(right);
    }
}

/// Join two tables on their time index.
///
/// Output rows are ordered by time. Columns present only on one side are
/// missing for rows contributed only by the other side. A column name present
/// on both sides becomes one column: left values, gaps filled from the right.
/// A time with m left rows and n right rows produces m×n rows.
pub fn join_tables(left: &Table, right: &Table, how: JoinMode) -> Result<Table, TableError> {
    let plan = plan_join(left, right, how);
    let mut joined = left.gather(plan.time, &plan.left);

    for (name, column) in right.columns() {
        let gathered = column.gather(&plan.right);
        match joined.column_mut(name) {
            Some(existing) => existing.coalesce(&gathered),
            None => joined.add_column(name, gathered)?,
        }
    }

    Ok(joined)
}

fn plan_join(left: &Table, right: &Table, how: JoinMode) -> JoinPlan {
    let lrows = left.sorted_rows();
    let rrows = right.sorted_rows();
    let ltime = left.time();
    let rtime = right.time();

    let mut plan = JoinPlan::default();
    let (mut i, mut j) = (0, 0);

    while i < lrows.len() || j < rrows.len() {
        let order = match (lrows.get(i), rrows.get(j)) {
            (Some(&l), Some(&r)) => ltime[l].cmp(&rtime[r]),
            (Some(_), None) => Ordering::Less,
            _ => Ordering::Greater,
        };

        match order {
            Ordering::Less => {
                let t = ltime[lrows[i]];
                let end = group_end(&lrows, ltime, i);
                if how.keeps_left_only() {
                    for &l in &lrows[i..end] {
                        plan.push(t, Some(l), None);
                    }
                }
                i = end;
            }
            Ordering::Greater => {
                let t = rtime[rrows[j]];
                let end = group_end(&rrows, rtime, j);
                if how.keeps_right_only() {
                    for &r in &rrows[j..end] {
                        plan.push(t, None, Some(r));
                    }
                }
                j = end;
            }
            Ordering::Equal => {
                let t = ltime[lrows[i]];
                let lend = group_end(&lrows, ltime, i);
                let rend = group_end(&rrows, rtime, j);
                for &l in &lrows[i..lend] {
                    for &r in &rrows[j..rend] {
                        plan.push(t, Some(l), Some(r));
                    }
                }
                i = lend;
                j = rend;
            }
        }
    }

    plan
}

/// End (exclusive) of the run of equal times starting at `start`
fn group_end(rows: &[usize], time: &[DateTime<Utc>], start: usize) -> usize {
    let t = time[rows[start]];
    start + rows[start..].iter().take_while(|&&r| time[r] == t).count()
}
