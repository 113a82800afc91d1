//! Regular time grids and nearest-row lookup against a sorted time axis.
//!
//! All functions take `times` sorted ascending (stable, so equal times keep
//! their original row order) and return positions into it.

use chrono::{DateTime, Duration, Utc};

/// `start, start + step, …` up to and including `end`
pub fn regular_grid(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Vec<DateTime<Utc>> {
    let mut grid = Vec::new();
    if step <= Duration::zero() {
        return grid;
    }

    let mut t = start;
    while t <= end {
        grid.push(t);
        match t.checked_add_signed(step) {
            Some(next) => t = next,
            None => break,
        }
    }
    grid
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    let d = a - b;
    if d < Duration::zero() {
        -d
    } else {
        d
    }
}

/// First position holding the same time as `times[i]`
fn first_at(times: &[DateTime<Utc>], i: usize) -> usize {
    let t = times[i];
    times.partition_point(|&x| x < t)
}

/// Position of the sample closest to `target`.
///
/// `rows[i]` is the original row index of `times[i]`. Equally close samples
/// resolve to the lowest original row, whatever their time order.
pub fn nearest(times: &[DateTime<Utc>], rows: &[usize], target: DateTime<Utc>) -> Option<(usize, Duration)> {
    let after = times.partition_point(|&t| t < target);
    let before = after.checked_sub(1).map(|i| first_at(times, i));
    let after = (after < times.len()).then_some(after);

    before
        .into_iter()
        .chain(after)
        .map(|pos| (pos, distance(times[pos], target)))
        .min_by_key(|&(pos, d)| (d, rows[pos]))
}

/// For each grid time, the nearest sample if it lies within `tolerance`.
/// Grid times without such a sample are dropped.
pub fn snap_within_tolerance(
    times: &[DateTime<Utc>],
    rows: &[usize],
    grid: &[DateTime<Utc>],
    tolerance: Duration,
) -> Vec<(DateTime<Utc>, usize)> {
    grid.iter()
        .filter_map(|&target| {
            nearest(times, rows, target)
                .filter(|&(_, d)| d <= tolerance)
                .map(|(pos, _)| (target, pos))
        })
        .collect()
}

/// Caps how many consecutive non-exact grid times one sample may fill
struct RunCap {
    limit: Option<usize>,
    source: Option<usize>,
    count: usize,
}

impl RunCap {
    fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            source: None,
            count: 0,
        }
    }

    fn admit(&mut self, pos: usize, exact: bool) -> Option<usize> {
        if self.source != Some(pos) {
            self.source = Some(pos);
            self.count = 0;
        }
        if exact {
            return Some(pos);
        }
        self.count += 1;
        match self.limit {
            Some(max) if self.count > max => None,
            _ => Some(pos),
        }
    }
}

/// Each grid time's preceding or coinciding sample
fn pad(times: &[DateTime<Utc>], grid: &[DateTime<Utc>], limit: Option<usize>) -> Vec<Option<usize>> {
    let mut cap = RunCap::new(limit);
    grid.iter()
        .map(|&target| {
            let last = times.partition_point(|&t| t <= target).checked_sub(1)?;
            let pos = first_at(times, last);
            cap.admit(pos, times[pos] == target)
        })
        .collect()
}

/// Each grid time's following or coinciding sample
fn backfill(times: &[DateTime<Utc>], grid: &[DateTime<Utc>], limit: Option<usize>) -> Vec<Option<usize>> {
    let mut cap = RunCap::new(limit);
    let mut filled: Vec<Option<usize>> = grid
        .iter()
        .rev()
        .map(|&target| {
            let pos = times.partition_point(|&t| t < target);
            let &t = times.get(pos)?;
            cap.admit(pos, t == target)
        })
        .collect();
    filled.reverse();
    filled
}

/// For each grid time, the nearest sample.
///
/// With a `limit`, a grid time is only filled from a sample at most `limit`
/// grid steps before it (forward fill) or after it (backward fill); grid times
/// coinciding with a sample always take it. Among eligible samples the nearer
/// wins, ties going to the earlier one.
pub fn nearest_fill(times: &[DateTime<Utc>], grid: &[DateTime<Utc>], limit: Option<usize>) -> Vec<Option<usize>> {
    let forward = pad(times, grid, limit);
    let backward = backfill(times, grid, limit);

    grid.iter()
        .zip(forward.into_iter().zip(backward))
        .map(|(&target, candidates)| match candidates {
            (Some(p), Some(b)) if distance(times[b], target) < distance(times[p], target) => Some(b),
            (Some(p), _) => Some(p),
            (None, b) => b,
        })
        .collect()
}
