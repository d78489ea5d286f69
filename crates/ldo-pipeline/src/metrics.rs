//! Run summary and completion policy

use crate::PipelineConfig;
use ldo_domain::{DocumentState, DocumentUnit, ValidationReport};
use ldo_validation::GateResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Final state of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOutcome {
    /// Position in load order
    pub index: usize,
    /// Document source
    pub source: String,
    /// Terminal (or last reached) state
    pub state: DocumentState,
    /// Failure reason, for failed documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Rows committed
    pub rows_inserted: usize,
    /// Validation report, for scored documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ValidationReport>,
    /// Gate decision, for scored documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateResult>,
}

impl DocumentOutcome {
    /// Snapshot a document as it currently stands
    pub fn from_document(document: &DocumentUnit) -> Self {
        Self {
            index: document.index,
            source: document.source.clone(),
            state: document.state(),
            failure: document.failure.clone(),
            rows_inserted: 0,
            report: None,
            gate: None,
        }
    }

    /// Whether the quality gate rejected the document
    pub fn gate_rejected(&self) -> bool {
        self.gate.as_ref().is_some_and(|gate| !gate.is_accepted())
    }
}

/// Limits a run must stay within to count as successful
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunPolicy {
    /// Failed inserts and gate rejections count as violations
    pub strict: bool,
    /// Rejected documents tolerated
    pub max_rejected_documents: Option<usize>,
}

impl RunPolicy {
    /// Policy taken from the pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            strict: config.strict,
            max_rejected_documents: config.max_rejected_documents,
        }
    }
}

/// Why a finished run does not count as successful
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// More documents rejected than allowed
    TooManyRejected {
        /// Documents rejected
        rejected: usize,
        /// Maximum allowed
        allowed: usize,
    },
    /// Strict mode: some inserts failed
    InsertFailures {
        /// Failed documents
        count: usize,
    },
    /// Strict mode: some documents failed the quality gate
    GateRejections {
        /// Rejected documents
        count: usize,
    },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyRejected { rejected, allowed } => {
                write!(f, "{} documents rejected, at most {} allowed", rejected, allowed)
            }
            Self::InsertFailures { count } => write!(f, "{} documents failed to insert", count),
            Self::GateRejections { count } => write!(f, "{} documents failed the quality gate", count),
        }
    }
}

/// Counters and per-document outcomes of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Documents that entered the run
    pub documents: usize,

    /// Documents per final state
    pub counts: BTreeMap<DocumentState, usize>,

    /// Inserted documents that produced no rows
    pub empty_documents: usize,

    /// Rows committed across all documents
    pub rows_inserted: usize,

    /// Outcomes sorted by document index
    pub outcomes: Vec<DocumentOutcome>,

    /// Wall-clock duration of the run (milliseconds)
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one document
    pub fn record(&mut self, outcome: DocumentOutcome) {
        self.documents += 1;
        *self.counts.entry(outcome.state).or_insert(0) += 1;
        self.rows_inserted += outcome.rows_inserted;
        if outcome.state == DocumentState::Inserted && outcome.rows_inserted == 0 {
            self.empty_documents += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Sort outcomes and stamp the elapsed time
    pub fn finish(&mut self, elapsed: Duration) {
        self.outcomes.sort_by_key(|outcome| outcome.index);
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    /// Documents that ended in `state`
    pub fn count(&self, state: DocumentState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    /// Documents rejected by summarization
    pub fn rejected(&self) -> usize {
        self.count(DocumentState::Rejected)
    }

    /// Documents whose extraction failed
    pub fn parse_failed(&self) -> usize {
        self.count(DocumentState::ParseFailed)
    }

    /// Documents committed
    pub fn inserted(&self) -> usize {
        self.count(DocumentState::Inserted)
    }

    /// Documents whose insert rolled back
    pub fn insert_failed(&self) -> usize {
        self.count(DocumentState::InsertFailed)
    }

    /// Documents the quality gate rejected
    pub fn gate_rejections(&self) -> usize {
        self.outcomes.iter().filter(|o| o.gate_rejected()).count()
    }

    /// Run duration
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Every limit of `policy` the run exceeded
    pub fn policy_violations(&self, policy: &RunPolicy) -> Vec<PolicyViolation> {
        let mut violations = Vec::new();

        if let Some(allowed) = policy.max_rejected_documents {
            if self.rejected() > allowed {
                violations.push(PolicyViolation::TooManyRejected {
                    rejected: self.rejected(),
                    allowed,
                });
            }
        }

        if policy.strict {
            if self.insert_failed() > 0 {
                violations.push(PolicyViolation::InsertFailures {
                    count: self.insert_failed(),
                });
            }
            if self.gate_rejections() > 0 {
                violations.push(PolicyViolation::GateRejections {
                    count: self.gate_rejections(),
                });
            }
        }

        violations
    }

    /// Whether the run stayed within `policy`
    pub fn is_success(&self, policy: &RunPolicy) -> bool {
        self.policy_violations(policy).is_empty()
    }

    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Run Summary".to_string(),
            "====================".to_string(),
            format!("Documents: {}", self.documents),
            format!("Rows inserted: {}", self.rows_inserted),
            format!("Elapsed: {:.1}s", self.elapsed().as_secs_f64()),
            String::new(),
        ];

        if !self.counts.is_empty() {
            lines.push("Documents by state:".to_string());
            for (state, count) in &self.counts {
                lines.push(format!("  {}: {}", state, count));
            }
            if self.empty_documents > 0 {
                lines.push(format!("  (empty: {})", self.empty_documents));
            }
            lines.push(String::new());
        }

        let failures: Vec<&DocumentOutcome> = self
            .outcomes
            .iter()
            .filter(|o| o.failure.is_some() || o.gate_rejected())
            .collect();
        if !failures.is_empty() {
            lines.push("Issues:".to_string());
            for outcome in failures {
                if let Some(failure) = &outcome.failure {
                    lines.push(format!("  [{}] {}: {}", outcome.index, outcome.source, failure));
                }
                if let Some(gate) = outcome.gate.as_ref().filter(|g| !g.is_accepted()) {
                    let reasons: Vec<String> = gate.reasons.iter().map(ToString::to_string).collect();
                    lines.push(format!(
                        "  [{}] {}: gate rejected ({})",
                        outcome.index,
                        outcome.source,
                        reasons.join(", ")
                    ));
                }
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldo_validation::{GateStatus, RejectionReason};

    fn outcome(index: usize, state: DocumentState, rows: usize) -> DocumentOutcome {
        DocumentOutcome {
            index,
            source: format!("doc{}.txt", index),
            state,
            failure: None,
            rows_inserted: rows,
            report: None,
            gate: None,
        }
    }

    fn gate_rejected(mut outcome: DocumentOutcome) -> DocumentOutcome {
        outcome.gate = Some(GateResult {
            status: GateStatus::Rejected,
            reasons: vec![RejectionReason::MissingMandatoryFields { count: 2 }],
        });
        outcome
    }

    #[test]
    fn test_summary_creation() {
        let summary = RunSummary::new();
        assert_eq!(summary.documents, 0);
        assert_eq!(summary.rows_inserted, 0);
        assert!(summary.is_success(&RunPolicy::default()));
    }

    #[test]
    fn test_record_counts() {
        let mut summary = RunSummary::new();
        summary.record(outcome(0, DocumentState::Inserted, 3));
        summary.record(outcome(1, DocumentState::Inserted, 0));
        summary.record(outcome(2, DocumentState::Rejected, 0));
        summary.record(outcome(3, DocumentState::ParseFailed, 0));

        assert_eq!(summary.documents, 4);
        assert_eq!(summary.inserted(), 2);
        assert_eq!(summary.empty_documents, 1);
        assert_eq!(summary.rejected(), 1);
        assert_eq!(summary.parse_failed(), 1);
        assert_eq!(summary.insert_failed(), 0);
        assert_eq!(summary.rows_inserted, 3);
    }

    #[test]
    fn test_finish_sorts_outcomes() {
        let mut summary = RunSummary::new();
        summary.record(outcome(2, DocumentState::Inserted, 1));
        summary.record(outcome(0, DocumentState::Rejected, 0));
        summary.record(outcome(1, DocumentState::Inserted, 1));
        summary.finish(Duration::from_millis(1500));

        let order: Vec<usize> = summary.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(summary.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn test_rejection_limit() {
        let mut summary = RunSummary::new();
        summary.record(outcome(0, DocumentState::Rejected, 0));
        summary.record(outcome(1, DocumentState::Rejected, 0));

        let policy = RunPolicy {
            strict: false,
            max_rejected_documents: Some(1),
        };
        assert_eq!(
            summary.policy_violations(&policy),
            vec![PolicyViolation::TooManyRejected {
                rejected: 2,
                allowed: 1
            }]
        );

        let policy = RunPolicy {
            strict: false,
            max_rejected_documents: Some(2),
        };
        assert!(summary.is_success(&policy));
        assert!(summary.is_success(&RunPolicy::default()));
    }

    #[test]
    fn test_strict_mode_counts_failures() {
        let mut summary = RunSummary::new();
        summary.record(outcome(0, DocumentState::InsertFailed, 0));
        summary.record(gate_rejected(outcome(1, DocumentState::Inserted, 4)));

        assert!(summary.is_success(&RunPolicy::default()));

        let strict = RunPolicy {
            strict: true,
            max_rejected_documents: None,
        };
        assert_eq!(
            summary.policy_violations(&strict),
            vec![
                PolicyViolation::InsertFailures { count: 1 },
                PolicyViolation::GateRejections { count: 1 },
            ]
        );
    }

    #[test]
    fn test_policy_from_config() {
        let config = PipelineConfig {
            strict: true,
            max_rejected_documents: Some(3),
            ..Default::default()
        };
        let policy = RunPolicy::from_config(&config);
        assert!(policy.strict);
        assert_eq!(policy.max_rejected_documents, Some(3));
    }

    #[test]
    fn test_summary_text() {
        let mut summary = RunSummary::new();
        let mut failed = outcome(1, DocumentState::ParseFailed, 0);
        failed.failure = Some("Extraction failed for segment 2: boom".to_string());
        summary.record(outcome(0, DocumentState::Inserted, 5));
        summary.record(failed);
        summary.record(gate_rejected(outcome(2, DocumentState::Inserted, 1)));
        summary.finish(Duration::from_secs(2));

        let text = summary.summary();
        assert!(text.contains("Documents: 3"));
        assert!(text.contains("Rows inserted: 6"));
        assert!(text.contains("INSERTED: 2"));
        assert!(text.contains("PARSE_FAILED: 1"));
        assert!(text.contains("[1] doc1.txt: Extraction failed for segment 2: boom"));
        assert!(text.contains("gate rejected (2 missing mandatory fields)"));
    }

    #[test]
    fn test_summary_serializes_state_names() {
        let mut summary = RunSummary::new();
        summary.record(outcome(0, DocumentState::InsertFailed, 0));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["counts"]["INSERT_FAILED"], 1);
        assert_eq!(json["outcomes"][0]["state"], "INSERT_FAILED");
    }
}
