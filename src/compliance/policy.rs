//! Compliance policies and rule-evaluation outputs

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Severity attached to a violation. Advisory metadata for the audit
/// trail; arbitration does not gate on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A broken rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub suggested_action: String,
}

/// An advisory finding that does not make the decision non-compliant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceWarning {
    pub rule: String,
    pub message: String,
    pub recommendation: String,
}

/// Outcome of evaluating one decision against the active policy.
/// Produced fresh per evaluation and handed to the audit collaborators;
/// the evaluator itself keeps nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub is_compliant: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<ComplianceWarning>,
}

impl ComplianceResult {
    pub fn compliant() -> Self {
        Self {
            is_compliant: true,
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Highest severity among the violations, if any
    pub fn worst_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Threshold set the evaluator applies to every proposed decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompliancePolicy {
    pub id: String,
    /// Warn when model confidence falls below this floor
    pub min_confidence: f64,
    /// Flag decisions whose risk score exceeds this ceiling
    pub max_risk_score: f64,
    /// Flag single-trade notional value above this ceiling (USD)
    pub max_notional: Decimal,
    /// Warn when the decision carries no reasoning text
    pub require_reasoning: bool,
}

impl CompliancePolicy {
    pub fn standard() -> Self {
        Self {
            id: "standard".to_string(),
            min_confidence: 0.3,
            max_risk_score: 0.8,
            max_notional: dec!(10_000),
            require_reasoning: true,
        }
    }

    pub fn conservative() -> Self {
        Self {
            id: "conservative".to_string(),
            min_confidence: 0.5,
            max_risk_score: 0.6,
            max_notional: dec!(2_500),
            require_reasoning: true,
        }
    }

    pub fn permissive() -> Self {
        Self {
            id: "permissive".to_string(),
            min_confidence: 0.1,
            max_risk_score: 0.95,
            max_notional: dec!(100_000),
            require_reasoning: false,
        }
    }

    /// Look up a policy from the built-in registry.
    pub fn by_id(policy_id: &str) -> Option<Self> {
        match policy_id.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::standard()),
            "conservative" => Some(Self::conservative()),
            "permissive" => Some(Self::permissive()),
            _ => None,
        }
    }
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self::standard()
    }
}
