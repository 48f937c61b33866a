//! Lifecycle events emitted by the automation engine
//!
//! The engine writes one JSON object per line, tagged by `event`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single playbook lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    RunStarted {
        /// Playbook path as the engine saw it
        playbook: String,
    },
    TaskStarted {
        task: String,
        #[serde(default)]
        is_conditional: bool,
    },
    HandlerTaskStarted {
        task: String,
    },
    CleanupTaskStarted {
        task: String,
    },
    TaskFailed {
        host: String,
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        ignore_errors: bool,
    },
    TaskOk {
        host: String,
        #[serde(default)]
        changed: bool,
    },
    TaskUnreachable {
        host: String,
        #[serde(default)]
        msg: Option<String>,
    },
    RunStats {
        /// Per-host outcome counts, keyed by host name
        hosts: BTreeMap<String, HostStats>,
    },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::RunStarted { .. } => "run_started",
            LifecycleEvent::TaskStarted { .. } => "task_started",
            LifecycleEvent::HandlerTaskStarted { .. } => "handler_task_started",
            LifecycleEvent::CleanupTaskStarted { .. } => "cleanup_task_started",
            LifecycleEvent::TaskFailed { .. } => "task_failed",
            LifecycleEvent::TaskOk { .. } => "task_ok",
            LifecycleEvent::TaskUnreachable { .. } => "task_unreachable",
            LifecycleEvent::RunStats { .. } => "run_stats",
        }
    }
}

/// Outcome counts for one host, as summarized by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostStats {
    pub ok: u32,
    pub changed: u32,
    pub unreachable: u32,
    pub failures: u32,
}

impl HostStats {
    pub fn is_bad(&self) -> bool {
        self.failures > 0 || self.unreachable > 0
    }
}
