//! Conflict detection and resolution strategies
//!
//! A proposed trade conflicts with another agent's in-flight trade when
//! both touch the same symbol and either the directions oppose or the
//! in-flight quantity exceeds half of the proposed quantity. The configured
//! strategy then decides who proceeds. Strategies are pure functions over
//! `(proposal, conflicts, allocation)` dispatched through a lookup table,
//! so adding one never touches the arbitration call site.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::platform::{AgentAllocation, TradeAction, TradingDecision};

/// A match from the conflict scan: another agent's active trade on the
/// proposed symbol.
#[derive(Debug, Clone)]
pub struct TradeConflict {
    pub agent_id: String,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: Decimal,
    pub confidence: f64,
    pub reason: String,
}

/// Arbitration outcome. Rejection is an expected result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeVerdict {
    Approved,
    Rejected { reason: String },
}

impl TradeVerdict {
    pub fn rejected(reason: impl Into<String>) -> Self {
        TradeVerdict::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, TradeVerdict::Approved)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TradeVerdict::Approved => None,
            TradeVerdict::Rejected { reason } => Some(reason),
        }
    }
}

impl std::fmt::Display for TradeVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeVerdict::Approved => write!(f, "approved"),
            TradeVerdict::Rejected { reason } => write!(f, "rejected: {}", reason),
        }
    }
}

/// Process-wide conflict-resolution policy; configured once, never mutated
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// The agent already holding the symbol keeps it
    FirstWins,
    /// The more confident decision keeps the symbol
    HighestConfidence,
    /// High-priority allocations may override the conflict
    RiskWeighted,
}

impl FromStr for ConflictStrategy {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "first_wins" => Ok(ConflictStrategy::FirstWins),
            "highest_confidence" => Ok(ConflictStrategy::HighestConfidence),
            "risk_weighted" => Ok(ConflictStrategy::RiskWeighted),
            _ => Err("expected first_wins|highest_confidence|risk_weighted"),
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictStrategy::FirstWins => write!(f, "first_wins"),
            ConflictStrategy::HighestConfidence => write!(f, "highest_confidence"),
            ConflictStrategy::RiskWeighted => write!(f, "risk_weighted"),
        }
    }
}

/// Pure resolver signature shared by every strategy
pub type ResolverFn = fn(&TradingDecision, &[TradeConflict], &AgentAllocation) -> TradeVerdict;

impl ConflictStrategy {
    /// Lookup-table dispatch to the strategy's resolver.
    pub fn resolver(self) -> ResolverFn {
        match self {
            ConflictStrategy::FirstWins => resolve_first_wins,
            ConflictStrategy::HighestConfidence => resolve_highest_confidence,
            ConflictStrategy::RiskWeighted => resolve_risk_weighted,
        }
    }

    pub fn resolve(
        self,
        proposal: &TradingDecision,
        conflicts: &[TradeConflict],
        allocation: &AgentAllocation,
    ) -> TradeVerdict {
        (self.resolver())(proposal, conflicts, allocation)
    }
}

fn resolve_first_wins(
    _proposal: &TradingDecision,
    _conflicts: &[TradeConflict],
    _allocation: &AgentAllocation,
) -> TradeVerdict {
    TradeVerdict::rejected("Another agent has priority")
}

fn resolve_highest_confidence(
    proposal: &TradingDecision,
    conflicts: &[TradeConflict],
    _allocation: &AgentAllocation,
) -> TradeVerdict {
    match conflicts.iter().find(|c| c.confidence > proposal.confidence) {
        Some(c) => TradeVerdict::rejected(format!(
            "Conflicting trade from {} holds higher confidence ({:.2} > {:.2})",
            c.agent_id, c.confidence, proposal.confidence
        )),
        None => TradeVerdict::Approved,
    }
}

fn resolve_risk_weighted(
    _proposal: &TradingDecision,
    _conflicts: &[TradeConflict],
    allocation: &AgentAllocation,
) -> TradeVerdict {
    if allocation.priority > 5 {
        TradeVerdict::Approved
    } else {
        TradeVerdict::rejected(format!(
            "Allocation priority {} is too low to override the conflict",
            allocation.priority
        ))
    }
}

/// Check one of another agent's active trades against the proposal.
pub fn detect_conflict(
    proposal: &TradingDecision,
    owner_id: &str,
    active: &TradingDecision,
) -> Option<TradeConflict> {
    if active.symbol != proposal.symbol {
        return None;
    }

    let reason = if active.action.opposes(proposal.action) {
        format!(
            "{} holds an opposing {} on {}",
            owner_id, active.action, active.symbol
        )
    } else if active.quantity * Decimal::TWO > proposal.quantity {
        format!(
            "{} holds {} {} of {}, more than half the proposed {}",
            owner_id, active.action, active.quantity, active.symbol, proposal.quantity
        )
    } else {
        return None;
    };

    Some(TradeConflict {
        agent_id: owner_id.to_string(),
        symbol: active.symbol.clone(),
        action: active.action,
        quantity: active.quantity,
        confidence: active.confidence,
        reason,
    })
}
