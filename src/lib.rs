pub mod audit;
pub mod compliance;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod scheduler;

pub use audit::{ActionMetrics, ActionRecord, AuditSink, AuditTrail, MetricsSink};
pub use compliance::{
    CompliancePolicy, ComplianceEvaluator, ComplianceResult, ComplianceWarning, Severity,
    Violation,
};
pub use config::AppConfig;
pub use error::{QuorumError, Result};
pub use orchestrator::{
    AgentStatusReport, ConflictStrategy, OrchestrationMetrics, Orchestrator, OrchestratorConfig,
    TradeConflict, TradeVerdict,
};
pub use platform::{
    AgentAllocation, AgentKind, AgentStatus, PerformanceSnapshot, PortfolioSnapshot, TradeAction,
    TradeCycle, TradeResult, TradeStatus, TradingAgent, TradingDecision,
};
pub use scheduler::{CycleScheduler, SchedulerConfig, SchedulerStatus};
