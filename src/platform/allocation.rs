//! Capital allocation ledger records

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-agent capital allocation.
///
/// `allocation_percent` is caller-supplied and deliberately not normalized;
/// keeping the ledger sum at or below 100% is a convention between callers,
/// not an enforced invariant. `max_risk` caps the notional value of any
/// single trade from the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAllocation {
    pub agent_id: String,
    pub allocation_percent: Decimal,
    pub max_risk: Decimal,
    /// Arbitration weight used by the risk-weighted conflict strategy
    pub priority: u8,
}

impl AgentAllocation {
    pub fn new(
        agent_id: impl Into<String>,
        allocation_percent: Decimal,
        max_risk: Decimal,
        priority: u8,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            allocation_percent,
            max_risk,
            priority,
        }
    }

    /// True when a single trade of this notional value fits the risk ceiling.
    pub fn permits(&self, notional: Decimal) -> bool {
        notional <= self.max_risk
    }
}
