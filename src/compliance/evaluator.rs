//! Rule-based policy evaluation over proposed decisions
//!
//! Evaluation is stateless with respect to the ledger: it reads the active
//! policy, inspects a single decision, and returns a fresh result. The
//! orchestrator runs it for every evaluated action, approved or rejected,
//! and forwards the outcome to the audit collaborators; findings do not
//! feed back into the arbitration verdict.

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{QuorumError, Result};
use crate::platform::TradingDecision;

use super::policy::{CompliancePolicy, ComplianceResult, ComplianceWarning, Severity, Violation};

/// Evaluates proposed decisions against the active policy
pub struct ComplianceEvaluator {
    policy: RwLock<CompliancePolicy>,
}

impl ComplianceEvaluator {
    pub fn new(policy: CompliancePolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }

    /// Create with the standard policy active
    pub fn with_defaults() -> Self {
        Self::new(CompliancePolicy::default())
    }

    /// Swap in a named policy from the built-in registry.
    pub async fn load_policy(&self, policy_id: &str) -> Result<()> {
        let policy =
            CompliancePolicy::by_id(policy_id).ok_or_else(|| QuorumError::UnknownPolicy {
                policy_id: policy_id.to_string(),
            })?;
        info!(policy = %policy.id, "compliance policy loaded");
        *self.policy.write().await = policy;
        Ok(())
    }

    /// Currently active policy
    pub async fn active_policy(&self) -> CompliancePolicy {
        self.policy.read().await.clone()
    }

    /// Evaluate one decision against the fixed rule set.
    ///
    /// Multiple violations and warnings may come back from a single
    /// evaluation. Severity is advisory metadata, not a gate.
    pub async fn check_compliance(&self, decision: &TradingDecision) -> ComplianceResult {
        let policy = self.policy.read().await.clone();

        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        if decision.quantity <= Decimal::ZERO {
            violations.push(Violation {
                rule: "positive_quantity".to_string(),
                severity: Severity::Critical,
                message: format!("Quantity must be positive, got {}", decision.quantity),
                suggested_action: "Reject the order and review the sizing logic".to_string(),
            });
        }

        if decision.price <= Decimal::ZERO {
            violations.push(Violation {
                rule: "positive_price".to_string(),
                severity: Severity::Critical,
                message: format!("Price must be positive, got {}", decision.price),
                suggested_action: "Reject the order and refresh market data".to_string(),
            });
        }

        let notional = decision.notional_value();
        if notional > policy.max_notional {
            violations.push(Violation {
                rule: "notional_ceiling".to_string(),
                severity: Severity::High,
                message: format!(
                    "Notional value ${} exceeds policy ceiling ${}",
                    notional, policy.max_notional
                ),
                suggested_action: "Reduce quantity to fit the policy ceiling".to_string(),
            });
        }

        if decision.risk_score > policy.max_risk_score {
            violations.push(Violation {
                rule: "risk_score_ceiling".to_string(),
                severity: Severity::Medium,
                message: format!(
                    "Risk score {:.2} exceeds ceiling {:.2}",
                    decision.risk_score, policy.max_risk_score
                ),
                suggested_action: "Hold until the risk model cools off".to_string(),
            });
        }

        if decision.confidence < policy.min_confidence {
            warnings.push(ComplianceWarning {
                rule: "confidence_floor".to_string(),
                message: format!(
                    "Confidence {:.2} below policy floor {:.2}",
                    decision.confidence, policy.min_confidence
                ),
                recommendation: "Treat as low-conviction and consider reducing size".to_string(),
            });
        }

        if policy.require_reasoning && decision.reasoning.trim().is_empty() {
            warnings.push(ComplianceWarning {
                rule: "reasoning_required".to_string(),
                message: "Decision carries no reasoning text".to_string(),
                recommendation: "Attach the signal summary that produced this decision"
                    .to_string(),
            });
        }

        let result = ComplianceResult {
            is_compliant: violations.is_empty(),
            violations,
            warnings,
        };

        if !result.is_compliant {
            debug!(
                agent_id = %decision.agent_id,
                symbol = %decision.symbol,
                violations = result.violations.len(),
                warnings = result.warnings.len(),
                "decision failed compliance check"
            );
        }

        result
    }
}

impl Default for ComplianceEvaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::TradeAction;
    use rust_decimal_macros::dec;

    fn make_decision(quantity: Decimal, price: Decimal) -> TradingDecision {
        TradingDecision::new("agent1", TradeAction::Buy, "ETH", quantity, price)
            .with_confidence(0.8)
            .with_reasoning("momentum breakout")
    }

    #[tokio::test]
    async fn test_clean_decision_is_compliant() {
        let evaluator = ComplianceEvaluator::with_defaults();
        let result = evaluator
            .check_compliance(&make_decision(dec!(10), dec!(50)))
            .await;
        assert!(result.is_compliant);
        assert!(result.violations.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_quantity_is_critical() {
        let evaluator = ComplianceEvaluator::with_defaults();
        let result = evaluator
            .check_compliance(&make_decision(dec!(0), dec!(50)))
            .await;
        assert!(!result.is_compliant);
        assert_eq!(result.worst_severity(), Some(Severity::Critical));
        assert!(result.violations.iter().any(|v| v.rule == "positive_quantity"));
    }

    #[tokio::test]
    async fn test_low_confidence_is_warning_not_violation() {
        let evaluator = ComplianceEvaluator::with_defaults();
        let decision = make_decision(dec!(10), dec!(50)).with_confidence(0.1);
        let result = evaluator.check_compliance(&decision).await;
        assert!(result.is_compliant);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].rule, "confidence_floor");
    }

    #[tokio::test]
    async fn test_notional_ceiling() {
        let evaluator = ComplianceEvaluator::with_defaults();
        // 1000 * 50 = 50_000, above the standard 10_000 ceiling
        let result = evaluator
            .check_compliance(&make_decision(dec!(1000), dec!(50)))
            .await;
        assert!(!result.is_compliant);
        assert!(result.violations.iter().any(|v| v.rule == "notional_ceiling"));
    }

    #[tokio::test]
    async fn test_multiple_findings_from_one_evaluation() {
        let evaluator = ComplianceEvaluator::with_defaults();
        let decision = TradingDecision::new("agent1", TradeAction::Sell, "ETH", dec!(-5), dec!(0))
            .with_confidence(0.05)
            .with_risk_score(0.9);
        let result = evaluator.check_compliance(&decision).await;
        assert!(!result.is_compliant);
        // quantity, price, risk score
        assert!(result.violations.len() >= 3);
        // confidence floor + missing reasoning
        assert_eq!(result.warnings.len(), 2);
    }

    #[tokio::test]
    async fn test_load_policy_switches_thresholds() {
        let evaluator = ComplianceEvaluator::with_defaults();
        // 100 * 50 = 5_000 passes standard but not conservative (2_500)
        let decision = make_decision(dec!(100), dec!(50));
        assert!(evaluator.check_compliance(&decision).await.is_compliant);

        evaluator.load_policy("conservative").await.unwrap();
        assert!(!evaluator.check_compliance(&decision).await.is_compliant);
    }

    #[tokio::test]
    async fn test_load_unknown_policy_fails() {
        let evaluator = ComplianceEvaluator::with_defaults();
        let err = evaluator.load_policy("reckless").await.unwrap_err();
        assert!(matches!(err, QuorumError::UnknownPolicy { .. }));
        // Active policy is unchanged
        assert_eq!(evaluator.active_policy().await.id, "standard");
    }
}
