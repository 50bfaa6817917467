//! Capability traits agents implement to join the platform

use async_trait::async_trait;

use crate::error::Result;

use super::types::{
    AgentKind, AgentStatus, PerformanceSnapshot, PortfolioSnapshot, TradeResult, TradingDecision,
};

/// One scheduled pass of an agent's own trading logic.
///
/// The scheduler drives every registered agent through this capability
/// alone; variant-specific behavior (trading vs forecasting) lives in the
/// implementation, selected when the agent is registered.
#[async_trait]
pub trait TradeCycle: Send + Sync {
    async fn run_cycle(&self) -> Result<()>;
}

/// Full agent surface the orchestrator manages.
///
/// Lifecycle methods take `&self`; implementations keep their status behind
/// interior mutability so one `Arc` can be shared between the registry and
/// the scheduler.
///
/// Expected lifecycle: `inactive -> active` (start), `active -> paused`
/// (pause), `paused -> active` (resume), `active | paused -> inactive`
/// (stop), any state `-> error` on unrecoverable failure. Implementations
/// surface `InvalidTransition` for anything else.
#[async_trait]
pub trait TradingAgent: TradeCycle {
    /// Unique identifier for this agent instance
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Agent variant
    fn kind(&self) -> AgentKind;

    /// Current lifecycle status
    fn status(&self) -> AgentStatus;

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    /// Execute an approved decision against the venue.
    async fn execute_trade(&self, decision: &TradingDecision) -> Result<TradeResult>;

    /// Current portfolio view
    async fn portfolio(&self) -> PortfolioSnapshot;

    /// Current performance view
    async fn performance(&self) -> PerformanceSnapshot;
}
