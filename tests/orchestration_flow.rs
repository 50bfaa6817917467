//! End-to-end orchestration flows: registration, scheduled cycles,
//! arbitration, completion reporting, and the audit hand-off.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use tokio_test::assert_ok;

use quorum::audit::{ActionMetrics, AuditSink, AuditTrail, MetricsSink};
use quorum::compliance::ComplianceEvaluator;
use quorum::error::{QuorumError, Result};
use quorum::orchestrator::{Orchestrator, OrchestratorConfig};
use quorum::platform::{
    AgentAllocation, AgentKind, AgentStatus, PerformanceSnapshot, PortfolioSnapshot, TradeAction,
    TradeCycle, TradeResult, TradingAgent, TradingDecision,
};
use quorum::scheduler::{CycleScheduler, SchedulerConfig};

/// Agent that proposes one scripted decision per cycle through the
/// orchestrator, the same way production agents call back in from their
/// own tasks.
struct ScriptedAgent {
    id: String,
    status: Mutex<AgentStatus>,
    proposal: Option<TradingDecision>,
    orchestrator: OnceLock<Arc<Orchestrator>>,
    cycles: AtomicU64,
    fail_cycles: bool,
}

impl ScriptedAgent {
    fn new(id: &str, proposal: Option<TradingDecision>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            status: Mutex::new(AgentStatus::Inactive),
            proposal,
            orchestrator: OnceLock::new(),
            cycles: AtomicU64::new(0),
            fail_cycles: false,
        })
    }

    fn failing(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            status: Mutex::new(AgentStatus::Inactive),
            proposal: None,
            orchestrator: OnceLock::new(),
            cycles: AtomicU64::new(0),
            fail_cycles: true,
        })
    }

    fn attach(&self, orchestrator: Arc<Orchestrator>) {
        let _ = self.orchestrator.set(orchestrator);
    }

    fn cycles_run(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeCycle for ScriptedAgent {
    async fn run_cycle(&self) -> Result<()> {
        self.cycles.fetch_add(1, Ordering::SeqCst);
        if self.fail_cycles {
            return Err(QuorumError::Internal("price feed unavailable".to_string()));
        }
        if let (Some(orchestrator), Some(proposal)) =
            (self.orchestrator.get(), self.proposal.as_ref())
        {
            // A rejected proposal is a normal outcome, not a cycle failure.
            orchestrator
                .coordinate_trade(&self.id, proposal.clone())
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TradingAgent for ScriptedAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Trading
    }

    fn status(&self) -> AgentStatus {
        *self.status.lock().unwrap()
    }

    async fn start(&self) -> Result<()> {
        *self.status.lock().unwrap() = AgentStatus::Active;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        *self.status.lock().unwrap() = AgentStatus::Inactive;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        *self.status.lock().unwrap() = AgentStatus::Paused;
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        *self.status.lock().unwrap() = AgentStatus::Active;
        Ok(())
    }

    async fn execute_trade(&self, decision: &TradingDecision) -> Result<TradeResult> {
        Ok(TradeResult::filled(decision, decision.price))
    }

    async fn portfolio(&self) -> PortfolioSnapshot {
        PortfolioSnapshot::default()
    }

    async fn performance(&self) -> PerformanceSnapshot {
        PerformanceSnapshot::default()
    }
}

struct World {
    orchestrator: Arc<Orchestrator>,
    audit: Arc<AuditTrail>,
    metrics: Arc<ActionMetrics>,
}

fn world(strategy: &str, max_concurrent: usize, interval_minutes: u64) -> World {
    let audit = Arc::new(AuditTrail::new());
    let metrics = Arc::new(ActionMetrics::new());
    let orchestrator = Arc::new(Orchestrator::new(
        OrchestratorConfig {
            max_concurrent_trades: max_concurrent,
            conflict_strategy: strategy.to_string(),
        },
        Arc::new(CycleScheduler::new(SchedulerConfig {
            enabled: true,
            interval_minutes,
        })),
        Arc::new(ComplianceEvaluator::with_defaults()),
        audit.clone() as Arc<dyn AuditSink>,
        metrics.clone() as Arc<dyn MetricsSink>,
    ));
    World {
        orchestrator,
        audit,
        metrics,
    }
}

fn decision(
    agent: &str,
    action: TradeAction,
    symbol: &str,
    quantity: rust_decimal::Decimal,
    price: rust_decimal::Decimal,
) -> TradingDecision {
    TradingDecision::new(agent, action, symbol, quantity, price)
        .with_confidence(0.7)
        .with_reasoning("integration test")
}

#[tokio::test]
async fn scheduled_cycle_arbitrates_conflicting_agents() {
    let w = world("first_wins", 3, 60);

    let buyer = ScriptedAgent::new(
        "alpha",
        Some(decision("alpha", TradeAction::Buy, "ETH", dec!(10), dec!(50))),
    );
    let seller = ScriptedAgent::new(
        "bravo",
        Some(decision("bravo", TradeAction::Sell, "ETH", dec!(5), dec!(50))),
    );

    assert_ok!(
        w.orchestrator
            .register_agent(buyer.clone(), AgentAllocation::new("alpha", dec!(60), dec!(1000), 3))
            .await
    );
    assert_ok!(
        w.orchestrator
            .register_agent(seller.clone(), AgentAllocation::new("bravo", dec!(40), dec!(500), 8))
            .await
    );
    buyer.attach(w.orchestrator.clone());
    seller.attach(w.orchestrator.clone());

    // The first cycle runs inside start(), visiting agents in registration
    // order: alpha's buy lands first, bravo's sell hits the conflict.
    w.orchestrator.start_automated_trading().await;

    assert_eq!(buyer.cycles_run(), 1);
    assert_eq!(seller.cycles_run(), 1);

    let alpha_trades = w.orchestrator.active_trades("alpha").await.unwrap();
    assert_eq!(alpha_trades.len(), 1);
    assert!(w.orchestrator.active_trades("bravo").await.unwrap().is_empty());

    let records = w.audit.records().await;
    assert_eq!(records.len(), 2);
    assert!(records[0].approved);
    assert_eq!(records[0].agent_id, "alpha");
    assert!(!records[1].approved);
    assert_eq!(records[1].agent_id, "bravo");

    w.orchestrator.stop_automated_trading();
}

#[tokio::test(start_paused = true)]
async fn scheduler_runs_immediately_then_on_cadence() {
    let w = world("first_wins", 3, 10);

    let agent = ScriptedAgent::new("solo", None);
    assert_ok!(
        w.orchestrator
            .register_agent(agent.clone(), AgentAllocation::new("solo", dec!(100), dec!(1000), 5))
            .await
    );

    w.orchestrator.start_automated_trading().await;

    // Callback invoked once before any timer fires
    assert_eq!(agent.cycles_run(), 1);
    let status = w.orchestrator.trading_status().await;
    assert!(status.enabled);
    assert!(status.running);
    assert_eq!(status.interval_minutes, 10);
    assert_eq!(status.registered_agents, vec!["solo"]);

    tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(agent.cycles_run(), 2);

    w.orchestrator.stop_automated_trading();
    assert!(!w.orchestrator.trading_status().await.running);
}

#[tokio::test]
async fn one_failing_agent_never_blocks_the_cycle() {
    let w = world("first_wins", 3, 60);

    let broken = ScriptedAgent::failing("broken");
    let healthy = ScriptedAgent::new(
        "healthy",
        Some(decision("healthy", TradeAction::Buy, "BTC", dec!(1), dec!(100))),
    );

    assert_ok!(
        w.orchestrator
            .register_agent(broken.clone(), AgentAllocation::new("broken", dec!(50), dec!(1000), 5))
            .await
    );
    assert_ok!(
        w.orchestrator
            .register_agent(
                healthy.clone(),
                AgentAllocation::new("healthy", dec!(50), dec!(1000), 5)
            )
            .await
    );
    healthy.attach(w.orchestrator.clone());

    w.orchestrator.start_automated_trading().await;

    // The broken agent failed first and the healthy one still traded
    assert_eq!(broken.cycles_run(), 1);
    assert_eq!(healthy.cycles_run(), 1);
    assert_eq!(w.orchestrator.active_trades("healthy").await.unwrap().len(), 1);
    assert_eq!(w.orchestrator.trading_status().await.completed_cycles, 1);

    w.orchestrator.stop_automated_trading();
}

#[tokio::test]
async fn trade_above_risk_ceiling_is_rejected() {
    let w = world("first_wins", 3, 60);

    let agent = ScriptedAgent::new("charlie", None);
    assert_ok!(
        w.orchestrator
            .register_agent(agent, AgentAllocation::new("charlie", dec!(50), dec!(1000), 5))
            .await
    );

    // 24 * 50 = 1200 > 1000
    let verdict = w
        .orchestrator
        .coordinate_trade(
            "charlie",
            decision("charlie", TradeAction::Buy, "ETH", dec!(24), dec!(50)),
        )
        .await
        .unwrap();
    assert!(!verdict.is_approved());
    assert!(w.orchestrator.active_trades("charlie").await.unwrap().is_empty());

    // The rejection is still a first-class audit event
    let records = w.audit.records().await;
    assert_eq!(records.len(), 1);
    assert!(!records[0].approved);
}

#[tokio::test]
async fn concurrency_limit_applies_without_conflicts() {
    let w = world("first_wins", 2, 60);

    let agent = ScriptedAgent::new("delta", None);
    assert_ok!(
        w.orchestrator
            .register_agent(agent, AgentAllocation::new("delta", dec!(50), dec!(10000), 5))
            .await
    );

    for _ in 0..2 {
        let verdict = w
            .orchestrator
            .coordinate_trade(
                "delta",
                decision("delta", TradeAction::Buy, "ETH", dec!(1), dec!(50)),
            )
            .await
            .unwrap();
        assert!(verdict.is_approved());
    }

    let verdict = w
        .orchestrator
        .coordinate_trade(
            "delta",
            decision("delta", TradeAction::Buy, "ETH", dec!(1), dec!(50)),
        )
        .await
        .unwrap();
    assert!(!verdict.is_approved());
    assert_eq!(w.orchestrator.active_trades("delta").await.unwrap().len(), 2);
}

#[tokio::test]
async fn completion_frees_the_slot_exactly_once() {
    let w = world("first_wins", 3, 60);

    let agent = ScriptedAgent::new("delta", None);
    assert_ok!(
        w.orchestrator
            .register_agent(agent, AgentAllocation::new("delta", dec!(50), dec!(10000), 5))
            .await
    );

    let ts = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let proposal = decision("delta", TradeAction::Buy, "ETH", dec!(2), dec!(50))
        .with_timestamp(ts);
    assert_eq!(proposal.trade_id(), "ETH_1700000000000");

    assert!(w
        .orchestrator
        .coordinate_trade("delta", proposal)
        .await
        .unwrap()
        .is_approved());

    assert_ok!(
        w.orchestrator
            .report_trade_completion("delta", "ETH_1700000000000")
            .await
    );
    assert!(w.orchestrator.active_trades("delta").await.unwrap().is_empty());

    // Repeat completion is a no-op and the count is unchanged
    assert_ok!(
        w.orchestrator
            .report_trade_completion("delta", "ETH_1700000000000")
            .await
    );
    assert!(w.orchestrator.active_trades("delta").await.unwrap().is_empty());
}

#[tokio::test]
async fn audit_and_metrics_see_every_evaluated_action() {
    let w = world("first_wins", 1, 60);

    let agent = ScriptedAgent::new("echo", None);
    assert_ok!(
        w.orchestrator
            .register_agent(agent, AgentAllocation::new("echo", dec!(50), dec!(1000), 5))
            .await
    );

    // Approved, then rejected on concurrency, then rejected on risk.
    // All three must be audited and measured.
    for quantity in [dec!(1), dec!(1), dec!(100)] {
        let _ = w
            .orchestrator
            .coordinate_trade(
                "echo",
                decision("echo", TradeAction::Buy, "ETH", quantity, dec!(50)),
            )
            .await
            .unwrap();
    }

    assert_eq!(w.audit.len().await, 3);
    let approvals: Vec<bool> = w
        .audit
        .records()
        .await
        .iter()
        .map(|r| r.approved)
        .collect();
    assert_eq!(approvals, vec![true, false, false]);
    assert_eq!(
        w.metrics.actions_evaluated.load(Ordering::Relaxed),
        3
    );
}

#[tokio::test]
async fn orchestration_metrics_aggregate_across_agents() {
    let w = world("risk_weighted", 3, 60);

    let a = ScriptedAgent::new("alpha", None);
    let b = ScriptedAgent::new("bravo", None);
    assert_ok!(
        w.orchestrator
            .register_agent(a, AgentAllocation::new("alpha", dec!(60), dec!(1000), 7))
            .await
    );
    assert_ok!(
        w.orchestrator
            .register_agent(b, AgentAllocation::new("bravo", dec!(40), dec!(1000), 7))
            .await
    );
    assert_ok!(w.orchestrator.start_agent("alpha").await);

    assert!(w
        .orchestrator
        .coordinate_trade(
            "alpha",
            decision("alpha", TradeAction::Buy, "ETH", dec!(2), dec!(50)),
        )
        .await
        .unwrap()
        .is_approved());
    // bravo's priority 7 overrides the conflict under risk_weighted
    assert!(w
        .orchestrator
        .coordinate_trade(
            "bravo",
            decision("bravo", TradeAction::Sell, "ETH", dec!(2), dec!(50)),
        )
        .await
        .unwrap()
        .is_approved());

    let metrics = w.orchestrator.orchestration_metrics().await;
    assert_eq!(metrics.total_agents, 2);
    assert_eq!(metrics.active_agents, 1);
    assert_eq!(metrics.total_active_trades, 2);
    assert_eq!(metrics.allocations.len(), 2);

    let reports = w.orchestrator.all_agent_statuses().await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].agent_id, "alpha");
    assert_eq!(reports[0].active_trades, 1);
}
