//! The aggregated usage report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;
use super::usage::UsageSnapshot;
use crate::error::CoreError;

/// One snapshot per provider, ordered by provider.
///
/// Serializes as a plain JSON object keyed by provider CLI name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageReport {
    snapshots: BTreeMap<ProviderKind, UsageSnapshot>,
}

impl UsageReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a snapshot, replacing any previous one for the same provider.
    pub fn insert(&mut self, snapshot: UsageSnapshot) {
        self.snapshots.insert(snapshot.provider, snapshot);
    }

    /// Returns the snapshot for a provider.
    pub fn get(&self, provider: ProviderKind) -> Option<&UsageSnapshot> {
        self.snapshots.get(&provider)
    }

    /// Iterates snapshots in provider order.
    pub fn iter(&self) -> impl Iterator<Item = &UsageSnapshot> {
        self.snapshots.values()
    }

    /// Returns the providers in this report.
    pub fn providers(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.snapshots.keys().copied()
    }

    /// Number of providers in the report.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if the report holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<UsageSnapshot> for UsageReport {
    fn from_iter<I: IntoIterator<Item = UsageSnapshot>>(iter: I) -> Self {
        let mut report = Self::new();
        for snapshot in iter {
            report.insert(snapshot);
        }
        report
    }
}

impl<'a> IntoIterator for &'a UsageReport {
    type Item = &'a UsageSnapshot;
    type IntoIter = std::collections::btree_map::Values<'a, ProviderKind, UsageSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.values()
    }
}
