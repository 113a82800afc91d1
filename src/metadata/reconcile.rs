//! Combine two metadata descriptions, renaming colliding parameter names

use super::{Metadata, ParameterDescriptor};
use crate::schema::TIME_FIELD;
use fxhash::FxHashSet;

/// Ordered `(original, renamed)` substitutions applied to the second input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    renames: Vec<(String, String)>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.renames.push((from.into(), to.into()));
    }

    /// New name for `name`, if it was renamed
    pub fn get(&self, name: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Combine `meta_a` and `meta_b` into a fresh description.
///
/// Every non-`Time` parameter of `meta_b` is appended after `meta_a`'s. A name
/// already taken becomes `<name>_<meta_b.x_dataset>` (with a numeric suffix if
/// that is taken too). With `join_all` false, a parameter of `meta_b` whose
/// descriptor is identical to one in `meta_a` is treated as the same parameter
/// and not appended at all.
///
/// Inputs are never modified and the result shares nothing with them.
pub fn reconcile(
    meta_a: &Metadata,
    meta_b: &Metadata,
    join_all: bool,
) -> Result<(Metadata, RenameMap), ReconcileError> {
    let mut combined = meta_a.clone();
    let mut renames = RenameMap::new();
    let mut taken: FxHashSet<String> = combined.parameters.iter().map(|p| p.name.clone()).collect();

    for param in meta_b.parameters.iter().filter(|p| p.name != TIME_FIELD) {
        if !join_all && meta_a.parameters.contains(param) {
            tracing::debug!(parameter = %param.name, "sharing identical parameter");
            continue;
        }

        let mut appended: ParameterDescriptor = param.clone();
        if taken.contains(&param.name) {
            let dataset = meta_b
                .dataset_id()
                .ok_or_else(|| ReconcileError::MissingProvenance(param.name.clone()))?;
            let new_name = unique_name(&format!("{}_{}", param.name, dataset), &taken);
            tracing::debug!(from = %param.name, to = %new_name, "renaming colliding parameter");
            renames.insert(param.name.clone(), new_name.clone());
            appended.name = new_name;
        }

        taken.insert(appended.name.clone());
        combined.parameters.push(appended);
    }

    Ok((combined, renames))
}

fn unique_name(candidate: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", candidate, n))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Parameter '{0}' collides but the second metadata has no x_dataset to rename it with")]
    MissingProvenance(String),
}
