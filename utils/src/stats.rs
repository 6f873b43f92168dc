//! Per-operation outcome counters.

use std::collections::BTreeMap;

/// Counts applied and rejected operations per kind, plus rejections per
/// error kind. Used by the replay tool to summarise a run.
#[derive(Debug, Default)]
pub struct OperationStats {
    applied: BTreeMap<&'static str, u64>,
    rejected: BTreeMap<&'static str, u64>,
    errors: BTreeMap<String, u64>,
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&mut self, op: &'static str) {
        *self.applied.entry(op).or_insert(0) += 1;
    }

    pub fn record_rejected(&mut self, op: &'static str, error_kind: impl Into<String>) {
        *self.rejected.entry(op).or_insert(0) += 1;
        *self.errors.entry(error_kind.into()).or_insert(0) += 1;
    }

    pub fn applied(&self, op: &str) -> u64 {
        self.applied.get(op).copied().unwrap_or(0)
    }

    pub fn rejected(&self, op: &str) -> u64 {
        self.rejected.get(op).copied().unwrap_or(0)
    }

    pub fn total_applied(&self) -> u64 {
        self.applied.values().sum()
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Rejection counts keyed by error kind, in name order.
    pub fn errors(&self) -> impl Iterator<Item = (&str, u64)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
