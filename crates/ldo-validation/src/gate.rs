//! Accept or reject a scored document

use crate::ValidationConfig;
use ldo_domain::ValidationReport;
use serde::Serialize;
use std::fmt;

/// Gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    /// Report within limits
    Accepted,
    /// At least one rule failed
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Mandatory fields absent in some rows
    MissingMandatoryFields {
        /// How many (row, column) pairs are missing
        count: usize,
    },

    /// Values whose kind does not fit the declared column type
    DataTypeErrors {
        /// How many fields mismatch
        count: usize,
    },

    /// Conformity rate under the configured minimum
    LowConformity {
        /// Minimum allowed
        required: f64,
        /// Measured
        actual: f64,
    },

    /// Unknown rate over the configured maximum
    HighUnknownRate {
        /// Maximum allowed
        allowed: f64,
        /// Measured
        actual: f64,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMandatoryFields { count } => write!(f, "{} missing mandatory fields", count),
            Self::DataTypeErrors { count } => write!(f, "{} data type errors", count),
            Self::LowConformity { required, actual } => write!(
                f,
                "conformity {:.1}% below {:.1}%",
                actual * 100.0,
                required * 100.0
            ),
            Self::HighUnknownRate { allowed, actual } => write!(
                f,
                "unknown rate {:.1}% above {:.1}%",
                actual * 100.0,
                allowed * 100.0
            ),
        }
    }
}

/// Result of gating one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    /// Decision
    pub status: GateStatus,
    /// Failed rules, empty when accepted
    pub reasons: Vec<RejectionReason>,
}

impl GateResult {
    /// Whether the report passed
    pub fn is_accepted(&self) -> bool {
        self.status == GateStatus::Accepted
    }
}

/// Applies the configured thresholds to validation reports
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    config: ValidationConfig,
}

impl QualityGate {
    /// Create a gate with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Evaluate a report against the configured rules
    pub fn evaluate(&self, report: &ValidationReport) -> GateResult {
        let mut reasons = Vec::new();

        if self.config.reject_missing_fields && report.has_missing_fields() {
            reasons.push(RejectionReason::MissingMandatoryFields {
                count: report.missing_mandatory_fields.len(),
            });
        }

        if self.config.reject_type_errors && report.has_type_errors() {
            reasons.push(RejectionReason::DataTypeErrors {
                count: report.data_type_errors.len(),
            });
        }

        // An empty payload has nothing to rate
        let rated = report.total_fields_checked > 0;

        if self.config.check_conformity_rate
            && rated
            && report.conformity_rate < self.config.min_conformity_rate
        {
            reasons.push(RejectionReason::LowConformity {
                required: self.config.min_conformity_rate,
                actual: report.conformity_rate,
            });
        }

        if self.config.check_unknown_rate && rated && report.unknown_rate > self.config.max_unknown_rate {
            reasons.push(RejectionReason::HighUnknownRate {
                allowed: self.config.max_unknown_rate,
                actual: report.unknown_rate,
            });
        }

        let status = if reasons.is_empty() {
            GateStatus::Accepted
        } else {
            GateStatus::Rejected
        };

        GateResult { status, reasons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldo_domain::MissingField;
    use std::collections::BTreeMap;

    fn report(conformant: usize, unknown: usize) -> ValidationReport {
        let total = conformant + unknown;
        let rate = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };
        ValidationReport {
            missing_mandatory_fields: Vec::new(),
            data_type_errors: BTreeMap::new(),
            conformant_fields: conformant,
            unknown_fields: unknown,
            total_fields_checked: total,
            conformity_rate: rate(conformant),
            unknown_rate: rate(unknown),
            gold: None,
        }
    }

    #[test]
    fn test_clean_report_accepted() {
        let result = QualityGate::default().evaluate(&report(10, 0));
        assert!(result.is_accepted());
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut r = report(10, 0);
        r.missing_mandatory_fields.push(MissingField {
            row: 1,
            column: "amount".to_string(),
        });
        let result = QualityGate::default().evaluate(&r);
        assert_eq!(result.status, GateStatus::Rejected);
        assert_eq!(result.reasons, vec![RejectionReason::MissingMandatoryFields { count: 1 }]);
    }

    #[test]
    fn test_rates_rejected() {
        let result = QualityGate::default().evaluate(&report(8, 2));
        assert_eq!(result.reasons.len(), 2);
        assert!(matches!(result.reasons[0], RejectionReason::LowConformity { .. }));
        assert!(matches!(result.reasons[1], RejectionReason::HighUnknownRate { .. }));
        assert_eq!(result.reasons[0].to_string(), "conformity 80.0% below 90.0%");
    }

    #[test]
    fn test_boundary_rates_accepted() {
        // exactly 90% conformity and 10% unknown
        let result = QualityGate::default().evaluate(&report(9, 1));
        assert!(result.is_accepted());
    }

    #[test]
    fn test_permissive_ignores_rates() {
        let result = QualityGate::new(ValidationConfig::permissive()).evaluate(&report(1, 9));
        assert!(result.is_accepted());
    }

    #[test]
    fn test_empty_report_accepted() {
        assert!(QualityGate::default().evaluate(&report(0, 0)).is_accepted());
    }
}
