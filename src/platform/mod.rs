//! Domain vocabulary and agent capability traits
//!
//! Everything the orchestrator, scheduler, and compliance layers agree on:
//! trade decisions and their identity, allocation ledger records, agent
//! status, and the capability traits agent variants implement.

mod allocation;
mod traits;
mod types;

pub use allocation::AgentAllocation;
pub use traits::{TradeCycle, TradingAgent};
pub use types::{
    AgentKind, AgentStatus, PerformanceSnapshot, PortfolioSnapshot, PositionSnapshot, TradeAction,
    TradeResult, TradeStatus, TradingDecision,
};
