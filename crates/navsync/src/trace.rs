//! Trace format and the replay driver.
//!
//! A trace is a JSON document:
//!
//! ```json
//! {
//!   "initial": "/portal?tab=time-off",
//!   "resources": ["time-off", "messages"],
//!   "failing": ["messages"],
//!   "steps": [
//!     { "at": 0, "op": "navigate", "location": "/portal?tab=messages" },
//!     { "at": 250, "op": "select", "view": "announcements" },
//!     { "at": 900, "op": "refresh", "key": "time-off", "trigger": "manual" },
//!     { "at": 12000, "op": "tick" }
//!   ]
//! }
//! ```
//!
//! Steps run in order at their `at` time. Due timers fire before each step,
//! and locations written by the coordinator are echoed back after it, the way
//! a router reports its own navigations.

use std::collections::BTreeSet;
use std::path::Path;

use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use navsync_core::sim::{RecordingDisplay, SimulatedBrowser};
use navsync_core::{
    Coordinator, CoordinatorEvent, CoordinatorHandle, CoordinatorStatus, Location,
    ManualClock, MemorySessionStore, Millis, NavsyncConfig, RefreshError, RefreshOperation,
    RefreshTrigger, ResourceKey, ToastKind,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    #[serde(default = "default_initial")]
    pub initial: String,
    #[serde(default)]
    pub resources: Vec<String>,
    /// Resources whose refresh always fails.
    #[serde(default)]
    pub failing: Vec<String>,
    pub steps: Vec<TraceStep>,
}

fn default_initial() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceStep {
    pub at: Millis,
    #[serde(flatten)]
    pub op: TraceOp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceOp {
    Navigate {
        location: String,
    },
    Select {
        view: String,
    },
    Refresh {
        key: String,
        #[serde(default = "default_trigger")]
        trigger: RefreshTrigger,
    },
    Notify {
        message: String,
        kind: ToastKind,
    },
    Tick,
    Reset,
    FailWrites {
        enabled: bool,
    },
    Detach,
}

fn default_trigger() -> RefreshTrigger {
    RefreshTrigger::Manual
}

impl std::fmt::Display for TraceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceOp::Navigate { location } => write!(f, "navigate {location}"),
            TraceOp::Select { view } => write!(f, "select {view}"),
            TraceOp::Refresh { key, trigger } => write!(f, "refresh {key} ({trigger})"),
            TraceOp::Notify { message, kind } => write!(f, "notify {kind} \"{message}\""),
            TraceOp::Tick => write!(f, "tick"),
            TraceOp::Reset => write!(f, "reset"),
            TraceOp::FailWrites { enabled } => write!(f, "fail-writes {enabled}"),
            TraceOp::Detach => write!(f, "detach"),
        }
    }
}

pub fn load_trace(path: &Path) -> Result<Trace, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read trace '{}': {}", path.display(), e))?;
    let trace: Trace = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid trace '{}': {}", path.display(), e))?;

    if let Some(window) = trace.steps.windows(2).find(|w| w[1].at < w[0].at) {
        return Err(format!(
            "Trace steps must be in time order: step at {}ms follows step at {}ms",
            window[1].at, window[0].at
        )
        .into());
    }
    Ok(trace)
}

/// One replayed step and everything the coordinator logged while running it.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub at: Millis,
    pub op: String,
    pub events: Vec<CoordinatorEvent>,
    /// Set when the operation itself returned an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CoordinatorStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Events logged while attaching.
    pub attach_events: Vec<CoordinatorEvent>,
    pub steps: Vec<StepReport>,
    pub status: CoordinatorStatus,
}

impl ReplayReport {
    pub fn event_count(&self) -> usize {
        self.attach_events.len() + self.steps.iter().map(|s| s.events.len()).sum::<usize>()
    }
}

/// Refresh that resolves immediately, failing for configured keys.
struct SimulatedRefresh {
    failing: bool,
}

impl RefreshOperation for SimulatedRefresh {
    fn run(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<(), RefreshError>> {
        let result = if self.failing {
            Err(RefreshError::failed(format!("simulated failure for {key}")))
        } else {
            Ok(())
        };
        Box::pin(futures::future::ready(result))
    }
}

pub struct Replay {
    clock: ManualClock,
    browser: SimulatedBrowser,
    handle: CoordinatorHandle,
    with_status: bool,
}

impl Replay {
    pub fn attach(config: NavsyncConfig, trace: &Trace, with_status: bool) -> Self {
        let start = trace.steps.first().map(|s| s.at).unwrap_or(0);
        let clock = ManualClock::new(start);
        let browser = SimulatedBrowser::new(Location::parse(&trace.initial));
        let failing: BTreeSet<&str> = trace.failing.iter().map(String::as_str).collect();

        let mut builder = Coordinator::builder(config)
            .clock(clock.clone())
            .session_store(MemorySessionStore::new());
        for resource in &trace.resources {
            builder = builder.refresh(
                resource.as_str(),
                SimulatedRefresh {
                    failing: failing.contains(resource.as_str()),
                },
            );
        }
        let coordinator = builder.attach(&browser, browser.clone(), RecordingDisplay::default());

        Self {
            clock,
            browser,
            handle: CoordinatorHandle::new(coordinator),
            with_status,
        }
    }

    pub fn run(self, trace: &Trace) -> ReplayReport {
        info!(
            event = "cli.replay.started",
            steps = trace.steps.len(),
            resources = trace.resources.len()
        );
        let attach_events = self.handle.take_events();
        let mut steps = Vec::with_capacity(trace.steps.len());

        for step in &trace.steps {
            self.clock.set(step.at);
            block_on(self.handle.run_due());
            let error = self.apply(&step.op);
            self.deliver_echoes();

            debug!(event = "cli.replay.step_completed", at = step.at, op = %step.op);
            steps.push(StepReport {
                at: step.at,
                op: step.op.to_string(),
                events: self.handle.take_events(),
                error,
                status: self
                    .with_status
                    .then(|| self.handle.with(|c| c.status())),
            });
        }

        let status = self.handle.with(|c| c.status());
        info!(
            event = "cli.replay.completed",
            steps = steps.len(),
            phase = %status.phase
        );
        ReplayReport {
            attach_events,
            steps,
            status,
        }
    }

    fn apply(&self, op: &TraceOp) -> Option<String> {
        match op {
            TraceOp::Navigate { location } => {
                let location = self.browser.visit(Location::parse(location));
                self.handle.on_location_change(location);
                None
            }
            TraceOp::Select { view } => self
                .handle
                .with(|c| c.select_view(view.as_str()))
                .err()
                .map(|e| e.to_string()),
            TraceOp::Refresh { key, trigger } => {
                block_on(self.handle.refresh(&ResourceKey::from(key.as_str()), *trigger))
                    .err()
                    .map(|e| e.to_string())
            }
            TraceOp::Notify { message, kind } => {
                self.handle.with(|c| c.notify(message, *kind));
                None
            }
            TraceOp::Tick => None,
            TraceOp::Reset => {
                self.handle.with(|c| c.reset());
                None
            }
            TraceOp::FailWrites { enabled } => {
                self.browser.set_fail_writes(*enabled);
                None
            }
            TraceOp::Detach => {
                self.handle.detach();
                None
            }
        }
    }

    fn deliver_echoes(&self) {
        for location in self.browser.take_echoes() {
            self.handle.on_location_change(location);
        }
    }
}
