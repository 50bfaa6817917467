//! Multi-Agent Orchestrator
//!
//! Central coordinator that manages trading agents and their capital
//! allocations. Provides a single trade-arbitration chokepoint with
//! cross-agent conflict awareness, risk and concurrency gates, and the
//! compliance/audit hand-off.

pub mod conflict;
pub mod orchestrator;
pub mod state;

pub use conflict::{detect_conflict, ConflictStrategy, ResolverFn, TradeConflict, TradeVerdict};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use state::{AgentStatusReport, OrchestrationMetrics};
