use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

use crate::error::DispatchError;
use solocron_scheduler::ActionError;

const EVENT_CAPACITY: usize = 256;

/// Breaker tuning, shared by every cell in a registry.
#[derive(Debug, Clone, Copy)]
pub struct BreakerSettings {
    /// Consecutive failures before a closed breaker opens.
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before allowing one trial.
    pub cooldown: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// One state transition, published on the dashboard feed.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerEvent {
    pub breaker: String,
    pub from: BreakerState,
    pub to: BreakerState,
    pub consecutive_failures: u32,
    pub at: DateTime<Utc>,
}

/// Point-in-time view of one breaker, for the feed's initial frame.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub consecutive_failures: u32,
}

struct Cell {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_inflight: bool,
}

impl Cell {
    fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_inflight: false,
        }
    }
}

/// Per-target-name circuit breakers.
///
/// Cells are created lazily on first call and are fully independent — an
/// open breaker for one name never affects calls through another. Cell
/// mutexes are held only for state transitions, never across the call.
pub struct BreakerRegistry {
    settings: BreakerSettings,
    cells: DashMap<String, Mutex<Cell>>,
    events: broadcast::Sender<BreakerEvent>,
}

impl BreakerRegistry {
    pub fn new(settings: BreakerSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            settings,
            cells: DashMap::new(),
            events,
        }
    }

    /// Subscribe to the transition feed. Lagging subscribers miss events
    /// rather than blocking state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<BreakerEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        self.cells
            .iter()
            .map(|entry| {
                let cell = entry.value().lock().unwrap_or_else(|e| e.into_inner());
                BreakerSnapshot {
                    name: entry.key().clone(),
                    state: cell.state,
                    consecutive_failures: cell.consecutive_failures,
                }
            })
            .collect()
    }

    /// Current state of one breaker, if it has ever been exercised.
    pub fn state_of(&self, name: &str) -> Option<BreakerState> {
        self.cells.get(name).map(|entry| {
            entry.value().lock().unwrap_or_else(|e| e.into_inner()).state
        })
    }

    /// Run `call` through the named breaker.
    ///
    /// Open + cooldown pending rejects immediately with `CircuitOpen` and
    /// never invokes the call. Open + cooldown elapsed admits exactly one
    /// half-open trial; concurrent callers during the trial are rejected.
    pub async fn execute<F, Fut>(&self, name: &str, call: F) -> Result<(), DispatchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ActionError>>,
    {
        let trial = {
            let entry = self
                .cells
                .entry(name.to_string())
                .or_insert_with(|| Mutex::new(Cell::new()));
            let mut cell = entry.value().lock().unwrap_or_else(|e| e.into_inner());
            match cell.state {
                BreakerState::Closed => false,
                BreakerState::HalfOpen => {
                    if cell.trial_inflight {
                        return Err(DispatchError::CircuitOpen {
                            breaker: name.to_string(),
                        });
                    }
                    cell.trial_inflight = true;
                    true
                }
                BreakerState::Open => {
                    let cooled = cell
                        .opened_at
                        .map(|at| at.elapsed() >= self.settings.cooldown)
                        .unwrap_or(true);
                    if !cooled {
                        return Err(DispatchError::CircuitOpen {
                            breaker: name.to_string(),
                        });
                    }
                    self.transition(name, &mut cell, BreakerState::HalfOpen);
                    cell.trial_inflight = true;
                    true
                }
            }
        };

        let result = call().await;

        if let Some(entry) = self.cells.get(name) {
            let mut cell = entry.value().lock().unwrap_or_else(|e| e.into_inner());
            if trial {
                cell.trial_inflight = false;
            }
            match &result {
                Ok(()) => {
                    cell.consecutive_failures = 0;
                    cell.opened_at = None;
                    if cell.state != BreakerState::Closed {
                        self.transition(name, &mut cell, BreakerState::Closed);
                    }
                }
                Err(_) => {
                    cell.consecutive_failures += 1;
                    let open = cell.state == BreakerState::HalfOpen
                        || cell.consecutive_failures >= self.settings.failure_threshold;
                    if open {
                        cell.opened_at = Some(Instant::now());
                        if cell.state != BreakerState::Open {
                            self.transition(name, &mut cell, BreakerState::Open);
                        }
                    }
                }
            }
        }

        result.map_err(DispatchError::from)
    }

    fn transition(&self, name: &str, cell: &mut Cell, to: BreakerState) {
        let from = cell.state;
        cell.state = to;
        debug!(breaker = %name, %from, %to, "breaker transition");
        let _ = self.events.send(BreakerEvent {
            breaker: name.to_string(),
            from,
            to,
            consecutive_failures: cell.consecutive_failures,
            at: Utc::now(),
        });
    }
}
