//! Core types for the orchestration platform

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Agent variant, fixed at registration time.
///
/// Variant-specific behavior is reached through the `TradeCycle` capability
/// rather than by inspecting the kind inside the scheduler callback; the
/// kind is kept for reporting and audit context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Trades directly against markets
    Trading,
    /// Produces forecasts consumed by other agents
    Forecasting,
    /// Operator-defined variant
    Custom(u32),
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Trading => write!(f, "trading"),
            AgentKind::Forecasting => write!(f, "forecasting"),
            AgentKind::Custom(id) => write!(f, "custom({})", id),
        }
    }
}

/// Agent lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Registered but not started
    Inactive,
    /// Running its trade cycles
    Active,
    /// Suspended; keeps its registration and active trades
    Paused,
    /// Unrecoverable failure; reported, not auto-recovered
    Error,
}

impl AgentStatus {
    pub fn can_trade(&self) -> bool {
        matches!(self, AgentStatus::Active)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Inactive => write!(f, "inactive"),
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Paused => write!(f, "paused"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Buy and sell oppose each other; hold opposes nothing.
    pub fn opposes(&self, other: TradeAction) -> bool {
        matches!(
            (self, other),
            (TradeAction::Buy, TradeAction::Sell) | (TradeAction::Sell, TradeAction::Buy)
        )
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

/// A proposed trade submitted to the orchestrator for arbitration.
///
/// Immutable once created. Completion matching uses `trade_id()`, derived
/// from the symbol and the millisecond timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingDecision {
    pub agent_id: String,
    pub action: TradeAction,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub risk_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl TradingDecision {
    pub fn new(
        agent_id: impl Into<String>,
        action: TradeAction,
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            action,
            symbol: symbol.into(),
            quantity,
            price,
            confidence: 0.5,
            reasoning: String::new(),
            risk_score: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_risk_score(mut self, risk_score: f64) -> Self {
        self.risk_score = risk_score;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Trade notional value (USD)
    pub fn notional_value(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Completion-matching key: `{symbol}_{timestamp_millis}`
    pub fn trade_id(&self) -> String {
        format!("{}_{}", self.symbol, self.timestamp.timestamp_millis())
    }
}

/// Execution status an agent reports back for an approved decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Filled,
    PartiallyFilled,
    Failed,
}

/// Execution report for one approved decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub trade_id: String,
    pub agent_id: String,
    pub status: TradeStatus,
    pub filled_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl TradeResult {
    pub fn filled(decision: &TradingDecision, avg_fill_price: Decimal) -> Self {
        Self {
            trade_id: decision.trade_id(),
            agent_id: decision.agent_id.clone(),
            status: TradeStatus::Filled,
            filled_quantity: decision.quantity,
            avg_fill_price: Some(avg_fill_price),
            error_message: None,
            executed_at: Utc::now(),
        }
    }

    pub fn failed(decision: &TradingDecision, error: impl Into<String>) -> Self {
        Self {
            trade_id: decision.trade_id(),
            agent_id: decision.agent_id.clone(),
            status: TradeStatus::Failed,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            error_message: Some(error.into()),
            executed_at: Utc::now(),
        }
    }
}

/// One open position inside a portfolio snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
}

/// Read-only portfolio view served through agent status reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    pub positions: Vec<PositionSnapshot>,
    pub total_value: Decimal,
}

/// Read-only performance view served through agent status reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub trades_executed: u64,
    pub win_rate: f64,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
}
