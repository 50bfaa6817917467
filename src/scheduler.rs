//! Recurring trade-cycle scheduler
//!
//! Drives every registered agent's trade cycle on a fixed cadence. Agents
//! are visited sequentially in registration order; a failure from one
//! agent's cycle is logged with that agent's identity and never interrupts
//! the rest of the cycle or future cycles. `stop()` halts future firings
//! only; an in-flight cycle runs to completion. Cancellation applies to the
//! timer, not to work already dispatched.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::platform::TradeCycle;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Master switch; `start()` is a no-op when disabled
    pub enabled: bool,
    /// Cadence between trade cycles
    pub interval_minutes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 10,
        }
    }
}

/// Read-only scheduler snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub running: bool,
    pub interval_minutes: u64,
    pub registered_agents: Vec<String>,
    pub completed_cycles: u64,
}

struct RegisteredCycle {
    id: String,
    name: String,
    cycle: Arc<dyn TradeCycle>,
}

/// Recurring scheduler over registered agent cycles
pub struct CycleScheduler {
    config: SchedulerConfig,
    agents: Arc<RwLock<Vec<RegisteredCycle>>>,
    running: Arc<AtomicBool>,
    completed_cycles: Arc<AtomicU64>,
}

impl CycleScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            agents: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            completed_cycles: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SchedulerConfig::default())
    }

    /// Append an agent to the cycle list.
    ///
    /// The list is ordered and not deduplicated: registering the same id
    /// twice means two callbacks per cycle. The orchestrator enforces id
    /// uniqueness before handing agents down here.
    pub async fn register_agent(&self, id: &str, name: &str, cycle: Arc<dyn TradeCycle>) {
        let mut agents = self.agents.write().await;
        agents.push(RegisteredCycle {
            id: id.to_string(),
            name: name.to_string(),
            cycle,
        });
        debug!("Registered agent {} ({}) with scheduler", id, name);
    }

    /// Remove every entry registered under `id`; returns how many were
    /// dropped.
    pub async fn unregister_agent(&self, id: &str) -> usize {
        let mut agents = self.agents.write().await;
        let before = agents.len();
        agents.retain(|a| a.id != id);
        let removed = before - agents.len();
        if removed > 0 {
            debug!("Unregistered agent {} from scheduler ({} entries)", id, removed);
        }
        removed
    }

    /// Start cycling: one cycle runs immediately, then one per
    /// `interval_minutes`. No-op when disabled or already running; two
    /// calls never arm two timers.
    pub async fn start(&self) {
        if !self.config.enabled {
            info!("Trading scheduler is disabled; not starting");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Trading scheduler already running");
            return;
        }

        info!(
            interval_minutes = self.config.interval_minutes,
            "Trading scheduler started"
        );

        // First cycle fires before the timer is armed.
        Self::run_cycle(&self.agents, &self.completed_cycles).await;

        let period = Duration::from_secs(self.config.interval_minutes * 60);
        let agents = self.agents.clone();
        let running = self.running.clone();
        let completed = self.completed_cycles.clone();

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                Self::run_cycle(&agents, &completed).await;
            }
            info!("Trading scheduler stopped");
        });
    }

    /// Stop future cycles. The in-flight cycle, if any, completes. Safe to
    /// call when not running.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let agents = self.agents.read().await;
        SchedulerStatus {
            enabled: self.config.enabled,
            running: self.is_running(),
            interval_minutes: self.config.interval_minutes,
            registered_agents: agents.iter().map(|a| a.id.clone()).collect(),
            completed_cycles: self.completed_cycles.load(Ordering::SeqCst),
        }
    }

    async fn run_cycle(agents: &RwLock<Vec<RegisteredCycle>>, completed: &AtomicU64) {
        // Snapshot under the read lock so the cycle never holds the list
        // lock across agent callbacks.
        let snapshot: Vec<(String, String, Arc<dyn TradeCycle>)> = {
            let agents = agents.read().await;
            agents
                .iter()
                .map(|a| (a.id.clone(), a.name.clone(), a.cycle.clone()))
                .collect()
        };

        debug!(agents = snapshot.len(), "trade cycle starting");
        for (id, name, cycle) in snapshot {
            if let Err(e) = cycle.run_cycle().await {
                warn!(agent_id = %id, agent = %name, error = %e, "agent trade cycle failed");
            }
        }
        completed.fetch_add(1, Ordering::SeqCst);
    }
}
