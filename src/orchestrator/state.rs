//! Snapshots the orchestrator serves to control surfaces

use serde::{Deserialize, Serialize};

use crate::platform::{
    AgentAllocation, AgentKind, AgentStatus, PerformanceSnapshot, PortfolioSnapshot,
};

use super::orchestrator::OrchestratorConfig;

/// Live composite view of one registered agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusReport {
    pub agent_id: String,
    pub name: String,
    pub kind: AgentKind,
    pub status: AgentStatus,
    pub allocation: AgentAllocation,
    pub active_trades: usize,
    pub performance: PerformanceSnapshot,
    pub portfolio: PortfolioSnapshot,
}

/// Aggregate orchestration view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationMetrics {
    pub total_agents: usize,
    /// Agents currently in active status
    pub active_agents: usize,
    /// In-flight trades summed across all agents
    pub total_active_trades: usize,
    pub config: OrchestratorConfig,
    pub allocations: Vec<AgentAllocation>,
}
