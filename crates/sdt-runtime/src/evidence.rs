#![forbid(unsafe_code)]

//! Bounded FIFO evidence ledger recording what each analysis stage did.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::mode::RuntimeMode;

/// Analysis stage that produced an evidence entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Ingest,
    RateEstimate,
    SensitivityBias,
    Roc,
    Significance,
}

/// Outcome of a stage, as far as missing values are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Computed,
    Corrected,
    Unavailable,
}

/// Complete record of a single analysis stage for audit/forensic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEvidenceEntry {
    pub stage: AnalysisStage,
    pub mode: RuntimeMode,
    pub outcome: StageOutcome,
    pub detail: String,
}

impl AnalysisEvidenceEntry {
    #[must_use]
    pub fn new(
        stage: AnalysisStage,
        mode: RuntimeMode,
        outcome: StageOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            mode,
            outcome,
            detail: detail.into(),
        }
    }
}

/// Bounded FIFO evidence buffer.
///
/// Capacity is enforced via `capacity.max(1)`. When full, the oldest entry
/// is evicted before a new entry is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLedger {
    capacity: usize,
    entries: VecDeque<AnalysisEvidenceEntry>,
}

impl AnalysisLedger {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn record(&mut self, entry: AnalysisEvidenceEntry) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently recorded entry.
    #[must_use]
    pub fn latest(&self) -> Option<&AnalysisEvidenceEntry> {
        self.entries.back()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisEvidenceEntry> {
        self.entries.iter()
    }

    /// Entries for one stage, oldest first.
    pub fn for_stage(&self, stage: AnalysisStage) -> impl Iterator<Item = &AnalysisEvidenceEntry> {
        self.entries.iter().filter(move |entry| entry.stage == stage)
    }

    /// Serialize every entry as one JSON object per line.
    #[must_use]
    pub fn serialize_jsonl(&self) -> String {
        self.entries
            .iter()
            .filter_map(|entry| serde_json::to_string(entry).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(stage: AnalysisStage, detail: &str) -> AnalysisEvidenceEntry {
        AnalysisEvidenceEntry::new(stage, RuntimeMode::Strict, StageOutcome::Computed, detail)
    }

    #[test]
    fn ledger_evicts_oldest_at_capacity() {
        let mut ledger = AnalysisLedger::new(2);
        ledger.record(entry(AnalysisStage::Ingest, "a"));
        ledger.record(entry(AnalysisStage::Roc, "b"));
        ledger.record(entry(AnalysisStage::Significance, "c"));
        assert_eq!(ledger.len(), 2);
        let details: Vec<_> = ledger.iter().map(|e| e.detail.as_str()).collect();
        assert_eq!(details, vec!["b", "c"]);
        assert_eq!(ledger.latest().map(|e| e.stage), Some(AnalysisStage::Significance));
    }

    #[test]
    fn ledger_capacity_is_at_least_one() {
        let mut ledger = AnalysisLedger::new(0);
        assert_eq!(ledger.capacity(), 1);
        ledger.record(entry(AnalysisStage::Ingest, "only"));
        ledger.record(entry(AnalysisStage::Roc, "newer"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.latest().map(|e| e.detail.as_str()), Some("newer"));
    }

    #[test]
    fn ledger_jsonl_has_one_line_per_entry() {
        let mut ledger = AnalysisLedger::new(8);
        ledger.record(entry(AnalysisStage::RateEstimate, "hit rate"));
        ledger.record(AnalysisEvidenceEntry::new(
            AnalysisStage::SensitivityBias,
            RuntimeMode::Hardened,
            StageOutcome::Unavailable,
            "no noise trials",
        ));
        let jsonl = ledger.serialize_jsonl();
        let lines: Vec<_> = jsonl.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[1]).expect("valid JSON");
        assert_eq!(parsed["stage"], "sensitivity_bias");
        assert_eq!(parsed["outcome"], "unavailable");
        assert_eq!(parsed["mode"], "Hardened");
    }

    #[test]
    fn for_stage_filters_entries() {
        let mut ledger = AnalysisLedger::new(8);
        ledger.record(entry(AnalysisStage::RateEstimate, "hit"));
        ledger.record(entry(AnalysisStage::Roc, "roc"));
        ledger.record(entry(AnalysisStage::RateEstimate, "fa"));
        assert_eq!(ledger.for_stage(AnalysisStage::RateEstimate).count(), 2);
        assert_eq!(ledger.for_stage(AnalysisStage::Ingest).count(), 0);
    }
}
