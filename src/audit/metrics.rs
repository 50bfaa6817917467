//! Counters over the evaluated-action stream

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::compliance::ComplianceResult;
use crate::platform::TradingDecision;

use super::recorder::MetricsSink;

/// Metrics collector fed by the orchestrator for every evaluated action
pub struct ActionMetrics {
    /// Total actions evaluated (approved and rejected)
    pub actions_evaluated: AtomicU64,
    /// Actions whose policy check found at least one violation
    pub noncompliant_actions: AtomicU64,
    /// Total violations flagged
    pub violations_flagged: AtomicU64,
    /// Total warnings flagged
    pub warnings_flagged: AtomicU64,
    latency_total_ms: AtomicU64,
    latency_max_ms: AtomicU64,
}

impl ActionMetrics {
    pub fn new() -> Self {
        Self {
            actions_evaluated: AtomicU64::new(0),
            noncompliant_actions: AtomicU64::new(0),
            violations_flagged: AtomicU64::new(0),
            warnings_flagged: AtomicU64::new(0),
            latency_total_ms: AtomicU64::new(0),
            latency_max_ms: AtomicU64::new(0),
        }
    }

    /// Mean evaluation latency in milliseconds
    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.actions_evaluated.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.latency_total_ms.load(Ordering::Relaxed) as f64 / count as f64
    }

    pub fn max_latency_ms(&self) -> u64 {
        self.latency_max_ms.load(Ordering::Relaxed)
    }

    /// Get current metrics as a formatted string
    pub fn summary(&self) -> String {
        format!(
            r#"
=== QUORUM ORCHESTRATION METRICS ===
Actions: {} evaluated | {} non-compliant
Findings: {} violations | {} warnings
Latency: avg {:.1}ms | max {}ms
====================================
"#,
            self.actions_evaluated.load(Ordering::Relaxed),
            self.noncompliant_actions.load(Ordering::Relaxed),
            self.violations_flagged.load(Ordering::Relaxed),
            self.warnings_flagged.load(Ordering::Relaxed),
            self.avg_latency_ms(),
            self.max_latency_ms(),
        )
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> String {
        format!(
            r#"# HELP quorum_actions_evaluated_total Total actions evaluated
# TYPE quorum_actions_evaluated_total counter
quorum_actions_evaluated_total {}

# HELP quorum_noncompliant_actions_total Actions with at least one policy violation
# TYPE quorum_noncompliant_actions_total counter
quorum_noncompliant_actions_total {}

# HELP quorum_violations_flagged_total Policy violations flagged
# TYPE quorum_violations_flagged_total counter
quorum_violations_flagged_total {}

# HELP quorum_warnings_flagged_total Policy warnings flagged
# TYPE quorum_warnings_flagged_total counter
quorum_warnings_flagged_total {}

# HELP quorum_action_latency_ms_avg Mean evaluation latency in milliseconds
# TYPE quorum_action_latency_ms_avg gauge
quorum_action_latency_ms_avg {}

# HELP quorum_action_latency_ms_max Maximum evaluation latency in milliseconds
# TYPE quorum_action_latency_ms_max gauge
quorum_action_latency_ms_max {}
"#,
            self.actions_evaluated.load(Ordering::Relaxed),
            self.noncompliant_actions.load(Ordering::Relaxed),
            self.violations_flagged.load(Ordering::Relaxed),
            self.warnings_flagged.load(Ordering::Relaxed),
            self.avg_latency_ms(),
            self.max_latency_ms(),
        )
    }
}

#[async_trait]
impl MetricsSink for ActionMetrics {
    async fn record_action(
        &self,
        _decision: &TradingDecision,
        policy_checks: &ComplianceResult,
        latency_ms: u64,
    ) {
        self.actions_evaluated.fetch_add(1, Ordering::Relaxed);
        if !policy_checks.is_compliant {
            self.noncompliant_actions.fetch_add(1, Ordering::Relaxed);
        }
        self.violations_flagged
            .fetch_add(policy_checks.violations.len() as u64, Ordering::Relaxed);
        self.warnings_flagged
            .fetch_add(policy_checks.warnings.len() as u64, Ordering::Relaxed);
        self.latency_total_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.latency_max_ms.fetch_max(latency_ms, Ordering::Relaxed);
    }
}

impl Default for ActionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
