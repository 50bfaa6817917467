//! Agent registry, allocation ledger, and trade arbitration
//!
//! The orchestrator owns the only persistently shared mutable state in the
//! system: the registered agents, their allocations, and their active-trade
//! sets. Everything sits behind a single write lock, and
//! `coordinate_trade` holds it across the whole check-then-append sequence
//! so concurrent proposals serialize: an agent's own task calling in from
//! outside the scheduler loop observes the same arbitration order as
//! everyone else.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::audit::{AuditSink, MetricsSink};
use crate::compliance::ComplianceEvaluator;
use crate::error::{QuorumError, Result};
use crate::platform::{
    AgentAllocation, AgentStatus, TradeCycle, TradingAgent, TradingDecision,
};
use crate::scheduler::{CycleScheduler, SchedulerStatus};

use super::conflict::{detect_conflict, ConflictStrategy, TradeConflict, TradeVerdict};
use super::state::{AgentStatusReport, OrchestrationMetrics};

/// Orchestrator configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Ceiling on in-flight trades per agent
    pub max_concurrent_trades: usize,
    /// Conflict-resolution strategy name. Parsed at arbitration time, so an
    /// unknown value rejects proposals with a diagnostic instead of
    /// crashing startup.
    pub conflict_strategy: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_trades: 3,
            conflict_strategy: ConflictStrategy::FirstWins.to_string(),
        }
    }
}

struct RegisteredAgent {
    agent: Arc<dyn TradingAgent>,
    allocation: AgentAllocation,
    active_trades: Vec<TradingDecision>,
}

#[derive(Default)]
struct RegistryState {
    /// Registration order, for deterministic listings
    order: Vec<String>,
    agents: HashMap<String, RegisteredAgent>,
}

/// Wraps a registered agent's cycle for the scheduler; failures are caught
/// and logged there, never propagated back into the registry.
struct AgentCycle(Arc<dyn TradingAgent>);

#[async_trait]
impl TradeCycle for AgentCycle {
    async fn run_cycle(&self) -> Result<()> {
        let result = self.0.run_cycle().await;
        if result.is_ok() {
            debug!(agent_id = %self.0.id(), "agent trade cycle completed");
        }
        result
    }
}

/// Coordinates every registered agent: owns the allocation ledger and the
/// active-trade sets, arbitrates proposed trades, and hands every evaluated
/// action (approved or not) to the compliance evaluator and the
/// audit/metrics collaborators.
pub struct Orchestrator {
    config: OrchestratorConfig,
    state: RwLock<RegistryState>,
    scheduler: Arc<CycleScheduler>,
    compliance: Arc<ComplianceEvaluator>,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<dyn MetricsSink>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        scheduler: Arc<CycleScheduler>,
        compliance: Arc<ComplianceEvaluator>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            state: RwLock::new(RegistryState::default()),
            scheduler,
            compliance,
            audit,
            metrics,
        }
    }

    /// Register an agent and its capital allocation, and hand its trade
    /// cycle to the scheduler.
    pub async fn register_agent(
        &self,
        agent: Arc<dyn TradingAgent>,
        allocation: AgentAllocation,
    ) -> Result<()> {
        let agent_id = agent.id().to_string();
        {
            let mut state = self.state.write().await;
            if state.agents.contains_key(&agent_id) {
                return Err(QuorumError::AlreadyRegistered { agent_id });
            }
            state.order.push(agent_id.clone());
            state.agents.insert(
                agent_id.clone(),
                RegisteredAgent {
                    agent: agent.clone(),
                    allocation: allocation.clone(),
                    active_trades: Vec::new(),
                },
            );
        }

        self.scheduler
            .register_agent(&agent_id, agent.name(), Arc::new(AgentCycle(agent.clone())))
            .await;

        info!(
            agent_id = %agent_id,
            name = %agent.name(),
            kind = %agent.kind(),
            allocation_percent = %allocation.allocation_percent,
            max_risk = %allocation.max_risk,
            priority = allocation.priority,
            "agent registered"
        );
        Ok(())
    }

    /// Drop an agent from the registry and the scheduler.
    pub async fn unregister_agent(&self, agent_id: &str) -> Result<()> {
        let removed = {
            let mut state = self.state.write().await;
            state.order.retain(|id| id != agent_id);
            state.agents.remove(agent_id)
        };

        match removed {
            Some(entry) => {
                self.scheduler.unregister_agent(agent_id).await;
                info!(
                    agent_id,
                    abandoned_trades = entry.active_trades.len(),
                    "agent unregistered"
                );
                Ok(())
            }
            None => Err(QuorumError::AgentNotFound {
                agent_id: agent_id.to_string(),
            }),
        }
    }

    pub async fn start_agent(&self, agent_id: &str) -> Result<()> {
        self.agent_handle(agent_id).await?.start().await
    }

    pub async fn stop_agent(&self, agent_id: &str) -> Result<()> {
        self.agent_handle(agent_id).await?.stop().await
    }

    pub async fn pause_agent(&self, agent_id: &str) -> Result<()> {
        self.agent_handle(agent_id).await?.pause().await
    }

    pub async fn resume_agent(&self, agent_id: &str) -> Result<()> {
        self.agent_handle(agent_id).await?.resume().await
    }

    /// Arbitrate a proposed trade: conflict scan over every other agent's
    /// active set, strategy resolution, risk-allocation gate, concurrency
    /// gate, then admission on approval. The first failing check supplies
    /// the rejection reason. The compliance evaluator and the audit and
    /// metrics collaborators see every evaluated proposal regardless of the
    /// verdict.
    pub async fn coordinate_trade(
        &self,
        agent_id: &str,
        decision: TradingDecision,
    ) -> Result<TradeVerdict> {
        let started = Instant::now();

        let verdict = {
            let mut state = self.state.write().await;

            let conflicts: Vec<TradeConflict> = state
                .agents
                .iter()
                .filter(|(id, _)| id.as_str() != agent_id)
                .flat_map(|(id, other)| {
                    other
                        .active_trades
                        .iter()
                        .filter_map(|active| detect_conflict(&decision, id, active))
                })
                .collect();

            let Some(entry) = state.agents.get_mut(agent_id) else {
                return Err(QuorumError::AgentNotFound {
                    agent_id: agent_id.to_string(),
                });
            };

            for conflict in &conflicts {
                debug!(agent_id, conflict = %conflict.reason, "conflict detected");
            }

            let mut verdict = if conflicts.is_empty() {
                TradeVerdict::Approved
            } else {
                match ConflictStrategy::from_str(&self.config.conflict_strategy) {
                    Ok(strategy) => strategy.resolve(&decision, &conflicts, &entry.allocation),
                    Err(_) => TradeVerdict::rejected(format!(
                        "Unknown conflict resolution strategy '{}'",
                        self.config.conflict_strategy
                    )),
                }
            };

            if verdict.is_approved() {
                let notional = decision.notional_value();
                if !entry.allocation.permits(notional) {
                    verdict = TradeVerdict::rejected(format!(
                        "Trade value ${} exceeds allocation risk ceiling ${}",
                        notional, entry.allocation.max_risk
                    ));
                } else if entry.active_trades.len() >= self.config.max_concurrent_trades {
                    verdict = TradeVerdict::rejected(format!(
                        "Concurrent trade limit reached ({}/{})",
                        entry.active_trades.len(),
                        self.config.max_concurrent_trades
                    ));
                } else {
                    entry.active_trades.push(decision.clone());
                }
            }

            verdict
        };

        // Compliance and audit run for every evaluated action; their
        // findings never feed back into the verdict.
        let checks = self.compliance.check_compliance(&decision).await;
        self.audit
            .log_action(&decision, &checks, verdict.is_approved())
            .await;
        self.metrics
            .record_action(&decision, &checks, started.elapsed().as_millis() as u64)
            .await;

        match &verdict {
            TradeVerdict::Approved => {
                info!(
                    agent_id,
                    symbol = %decision.symbol,
                    action = %decision.action,
                    quantity = %decision.quantity,
                    price = %decision.price,
                    "trade approved"
                );
            }
            TradeVerdict::Rejected { reason } => {
                warn!(
                    agent_id,
                    symbol = %decision.symbol,
                    action = %decision.action,
                    quantity = %decision.quantity,
                    price = %decision.price,
                    %reason,
                    "trade rejected"
                );
            }
        }

        Ok(verdict)
    }

    /// Free the active-trade slot matching `trade_id` (the
    /// `{symbol}_{timestamp_millis}` key). Reporting a trade that is not in
    /// flight is a no-op; an unknown agent is an error.
    pub async fn report_trade_completion(&self, agent_id: &str, trade_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(entry) = state.agents.get_mut(agent_id) else {
            return Err(QuorumError::AgentNotFound {
                agent_id: agent_id.to_string(),
            });
        };

        match entry
            .active_trades
            .iter()
            .position(|t| t.trade_id() == trade_id)
        {
            Some(idx) => {
                let done = entry.active_trades.remove(idx);
                info!(
                    agent_id,
                    trade_id,
                    symbol = %done.symbol,
                    remaining = entry.active_trades.len(),
                    "trade completed"
                );
            }
            None => {
                debug!(agent_id, trade_id, "completion reported for unknown trade; ignoring");
            }
        }
        Ok(())
    }

    /// Live composite status for one agent.
    pub async fn agent_status(&self, agent_id: &str) -> Result<AgentStatusReport> {
        let (agent, allocation, active_trades) = {
            let state = self.state.read().await;
            let Some(entry) = state.agents.get(agent_id) else {
                return Err(QuorumError::AgentNotFound {
                    agent_id: agent_id.to_string(),
                });
            };
            (
                entry.agent.clone(),
                entry.allocation.clone(),
                entry.active_trades.len(),
            )
        };
        Ok(Self::build_report(agent, allocation, active_trades).await)
    }

    /// Live composite status for every agent, in registration order.
    pub async fn all_agent_statuses(&self) -> Vec<AgentStatusReport> {
        let entries: Vec<_> = {
            let state = self.state.read().await;
            state
                .order
                .iter()
                .filter_map(|id| state.agents.get(id))
                .map(|e| (e.agent.clone(), e.allocation.clone(), e.active_trades.len()))
                .collect()
        };

        let mut reports = Vec::with_capacity(entries.len());
        for (agent, allocation, active_trades) in entries {
            reports.push(Self::build_report(agent, allocation, active_trades).await);
        }
        reports
    }

    async fn build_report(
        agent: Arc<dyn TradingAgent>,
        allocation: AgentAllocation,
        active_trades: usize,
    ) -> AgentStatusReport {
        AgentStatusReport {
            agent_id: agent.id().to_string(),
            name: agent.name().to_string(),
            kind: agent.kind(),
            status: agent.status(),
            allocation,
            active_trades,
            performance: agent.performance().await,
            portfolio: agent.portfolio().await,
        }
    }

    /// Aggregate orchestration view.
    pub async fn orchestration_metrics(&self) -> OrchestrationMetrics {
        let state = self.state.read().await;
        OrchestrationMetrics {
            total_agents: state.agents.len(),
            active_agents: state
                .agents
                .values()
                .filter(|e| e.agent.status() == AgentStatus::Active)
                .count(),
            total_active_trades: state.agents.values().map(|e| e.active_trades.len()).sum(),
            config: self.config.clone(),
            allocations: state
                .order
                .iter()
                .filter_map(|id| state.agents.get(id))
                .map(|e| e.allocation.clone())
                .collect(),
        }
    }

    /// Snapshot of one agent's in-flight trades.
    pub async fn active_trades(&self, agent_id: &str) -> Result<Vec<TradingDecision>> {
        let state = self.state.read().await;
        state
            .agents
            .get(agent_id)
            .map(|e| e.active_trades.clone())
            .ok_or_else(|| QuorumError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    pub async fn start_automated_trading(&self) {
        self.scheduler.start().await;
    }

    pub fn stop_automated_trading(&self) {
        self.scheduler.stop();
    }

    pub async fn trading_status(&self) -> SchedulerStatus {
        self.scheduler.status().await
    }

    async fn agent_handle(&self, agent_id: &str) -> Result<Arc<dyn TradingAgent>> {
        let state = self.state.read().await;
        state
            .agents
            .get(agent_id)
            .map(|e| e.agent.clone())
            .ok_or_else(|| QuorumError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }
}
