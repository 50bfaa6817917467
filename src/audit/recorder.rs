//! Append-only audit trail for evaluated actions
//!
//! Every decision the orchestrator evaluates lands here; rejected trades
//! are first-class audit events, not just approvals. Durable persistence is
//! the downstream collaborator's job; this core guarantees a record exists
//! for every evaluated action and exposes it for replay.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::compliance::ComplianceResult;
use crate::platform::TradingDecision;

/// Audit collaborator: receives every evaluated action.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_action(
        &self,
        decision: &TradingDecision,
        policy_checks: &ComplianceResult,
        approved: bool,
    );
}

/// Metrics collaborator: receives the same stream plus a latency
/// measurement for each evaluation.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record_action(
        &self,
        decision: &TradingDecision,
        policy_checks: &ComplianceResult,
        latency_ms: u64,
    );
}

/// One evaluated action: the proposed decision, its policy-check outcome,
/// and whether arbitration ultimately allowed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: Uuid,
    pub sequence: u64,
    pub agent_id: String,
    pub decision: TradingDecision,
    pub policy_checks: ComplianceResult,
    pub approved: bool,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory append-only trail of evaluated actions
pub struct AuditTrail {
    records: RwLock<Vec<ActionRecord>>,
    sequence: AtomicU64,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Snapshot of the full trail, in append order
    pub async fn records(&self) -> Vec<ActionRecord> {
        self.records.read().await.clone()
    }

    /// Snapshot of one agent's records, in append order
    pub async fn records_for_agent(&self, agent_id: &str) -> Vec<ActionRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.agent_id == agent_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for AuditTrail {
    async fn log_action(
        &self,
        decision: &TradingDecision,
        policy_checks: &ComplianceResult,
        approved: bool,
    ) {
        let record = ActionRecord {
            id: Uuid::new_v4(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            agent_id: decision.agent_id.clone(),
            decision: decision.clone(),
            policy_checks: policy_checks.clone(),
            approved,
            recorded_at: Utc::now(),
        };

        info!(
            target: "audit",
            record_id = %record.id,
            agent_id = %record.agent_id,
            approved,
            compliant = policy_checks.is_compliant,
            decision = %serde_json::to_string(decision).unwrap_or_default(),
            "action evaluated"
        );

        self.records.write().await.push(record);
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::ComplianceResult;
    use crate::platform::TradeAction;
    use rust_decimal_macros::dec;

    fn make_decision(agent: &str) -> TradingDecision {
        TradingDecision::new(agent, TradeAction::Buy, "ETH", dec!(10), dec!(50))
    }

    #[tokio::test]
    async fn test_rejections_are_recorded_too() {
        let trail = AuditTrail::new();
        let checks = ComplianceResult::compliant();

        trail.log_action(&make_decision("a"), &checks, true).await;
        trail.log_action(&make_decision("b"), &checks, false).await;

        let records = trail.records().await;
        assert_eq!(records.len(), 2);
        assert!(records[0].approved);
        assert!(!records[1].approved);
    }

    #[tokio::test]
    async fn test_sequence_is_monotonic() {
        let trail = AuditTrail::new();
        let checks = ComplianceResult::compliant();
        for _ in 0..3 {
            trail.log_action(&make_decision("a"), &checks, true).await;
        }
        let sequences: Vec<u64> = trail.records().await.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_records_for_agent_filters() {
        let trail = AuditTrail::new();
        let checks = ComplianceResult::compliant();
        trail.log_action(&make_decision("a"), &checks, true).await;
        trail.log_action(&make_decision("b"), &checks, true).await;
        trail.log_action(&make_decision("a"), &checks, false).await;

        assert_eq!(trail.records_for_agent("a").await.len(), 2);
        assert_eq!(trail.records_for_agent("b").await.len(), 1);
        assert_eq!(trail.len().await, 3);
    }
}
