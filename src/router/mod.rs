//! Event routing policy
//!
//! Turns lifecycle events into messages for the primary channel and pages
//! the secondary channel at most once per run.

pub mod summary;

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use crate::delivery::{Color, Delivery, Message, Transport};
use crate::event::{HostStats, LifecycleEvent};
use summary::{TableRenderer, summary_rows};

/// Placeholder for a task name or detail the engine did not supply
const MISSING: &str = "n/a";

/// Whether the run applies changes or only reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Normal,
    DryRun,
}

impl RunMode {
    pub fn from_check(check: bool) -> Self {
        if check { RunMode::DryRun } else { RunMode::Normal }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunMode::DryRun)
    }

    /// What kind of run this is, as shown in messages
    pub fn run_kind(&self) -> &'static str {
        match self {
            RunMode::Normal => "playbook",
            RunMode::DryRun => "testing",
        }
    }

    /// Label for a task that reported a change
    pub fn change_label(&self) -> &'static str {
        match self {
            RunMode::Normal => "changed",
            RunMode::DryRun => "dryrun",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            RunMode::Normal => Color::Warning,
            RunMode::DryRun => Color::Good,
        }
    }
}

/// Options supplied by whoever launched the run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Host subset the run was limited to
    pub limit: Option<String>,
}

/// Mutable state for a single run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Short token embedded in every message to tell concurrent runs apart
    pub id: String,
    pub run_name: Option<String>,
    pub mode: RunMode,
    pub limit: Option<String>,
    pub last_task: Option<String>,
    escalated: bool,
}

impl RunContext {
    pub fn new(options: RunOptions) -> Self {
        Self::with_id(options, correlation_id())
    }

    pub fn with_id(options: RunOptions, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            run_name: None,
            mode: options.mode,
            limit: options.limit.filter(|l| !l.is_empty()),
            last_task: None,
            escalated: false,
        }
    }

    pub fn escalated(&self) -> bool {
        self.escalated
    }

    /// Flip the latch. Returns true only on the first call.
    fn latch(&mut self) -> bool {
        !std::mem::replace(&mut self.escalated, true)
    }

    fn run_name(&self) -> &str {
        self.run_name.as_deref().unwrap_or(MISSING)
    }

    fn last_task(&self) -> &str {
        self.last_task.as_deref().unwrap_or(MISSING)
    }

    fn limit_suffix(&self) -> String {
        match &self.limit {
            Some(limit) => format!(", limit: {}", limit),
            None => String::new(),
        }
    }
}

/// Six hex characters from a random v4 UUID
pub fn correlation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(6);
    id
}

/// Why the router refused to start
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisabledReason {
    #[error(
        "Webhook URL was not provided. The webhook URL can be provided using the \
         `ACTIONABLE_SLACK_WEBHOOK_URL` environment variable."
    )]
    MissingWebhookUrl,
    #[error("Summary table rendering is not available (built without the `summary-table` feature).")]
    TableRendererUnavailable,
}

/// Primary and secondary destinations
#[derive(Debug, Clone)]
pub struct Channels {
    pub primary: String,
    pub secondary: String,
}

/// Applies the routing policy for one run
pub struct Router {
    ctx: RunContext,
    channels: Channels,
    delivery: Delivery,
    table: TableRenderer,
}

impl Router {
    pub fn new(ctx: RunContext, channels: Channels, delivery: Delivery, table: TableRenderer) -> Self {
        Self {
            ctx,
            channels,
            delivery,
            table,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Handle one event to completion
    pub fn handle(&mut self, event: &LifecycleEvent) {
        log::debug!("[{}] handling {}", self.ctx.id, event.name());

        match event {
            LifecycleEvent::RunStarted { playbook } => self.on_run_started(playbook),
            LifecycleEvent::TaskStarted { task, .. }
            | LifecycleEvent::HandlerTaskStarted { task }
            | LifecycleEvent::CleanupTaskStarted { task } => {
                self.ctx.last_task = Some(task.clone());
            }
            LifecycleEvent::TaskFailed {
                host,
                msg,
                ignore_errors,
            } => self.on_failed(host, msg.as_deref(), *ignore_errors),
            LifecycleEvent::TaskOk { host, changed } => self.on_ok(host, *changed),
            LifecycleEvent::TaskUnreachable { host, msg } => self.on_unreachable(host, msg.as_deref()),
            LifecycleEvent::RunStats { hosts } => self.on_stats(hosts),
        }
    }

    fn send(&self, text: String, channel: &str, color: Color) {
        self.delivery.deliver(&Message::new(text, channel, color));
    }

    fn notify_elsewhere(&mut self) {
        if !self.ctx.latch() {
            return;
        }

        let text = format!(
            "[{}] ansible run has taken action, {}: {} (see {} for more details!){}",
            self.ctx.id,
            self.ctx.mode.run_kind(),
            self.ctx.run_name(),
            self.channels.primary,
            self.ctx.limit_suffix(),
        );
        log::info!("[{}] escalating to {}", self.ctx.id, self.channels.secondary);
        self.send(text, &self.channels.secondary, self.ctx.mode.color());
    }

    fn on_run_started(&mut self, playbook: &str) {
        let name = Path::new(playbook)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| playbook.to_string());
        self.ctx.run_name = Some(name);

        let text = format!(
            "*{} initiated* (_{}_): {}{}",
            self.ctx.mode.run_kind(),
            self.ctx.id,
            self.ctx.run_name(),
            self.ctx.limit_suffix(),
        );
        self.send(text, &self.channels.primary, self.ctx.mode.color());
    }

    fn on_failed(&mut self, host: &str, msg: Option<&str>, ignore_errors: bool) {
        if ignore_errors {
            return;
        }

        let text = format!(
            "*fatal* (_{}_): [{}]: FAILED! => {} -=- {}",
            self.ctx.id,
            host,
            self.ctx.last_task(),
            msg.unwrap_or(MISSING),
        );
        if !self.ctx.mode.is_dry_run() {
            self.notify_elsewhere();
        }
        self.send(text, &self.channels.primary, Color::Danger);
    }

    fn on_ok(&mut self, host: &str, changed: bool) {
        if !changed {
            return;
        }

        let label = self.ctx.mode.change_label();
        let text = format!(
            "*{}* (_{}_): [{}]: {}! => {}",
            label,
            self.ctx.id,
            host,
            label.to_uppercase(),
            self.ctx.last_task(),
        );
        if !self.ctx.mode.is_dry_run() {
            self.notify_elsewhere();
        }
        self.send(text, &self.channels.primary, self.ctx.mode.color());
    }

    fn on_unreachable(&mut self, host: &str, msg: Option<&str>) {
        let text = format!(
            "*host unreachable (_{}_):* [{}] => {}",
            self.ctx.id,
            host,
            msg.unwrap_or(MISSING)
        );
        self.send(text, &self.channels.primary, Color::Danger);
    }

    fn on_stats(&mut self, hosts: &BTreeMap<String, HostStats>) {
        let rows = summary_rows(hosts);
        let color = if rows.iter().any(|r| r.stats.is_bad()) {
            Color::Danger
        } else {
            Color::Good
        };

        let text = format!(
            "*{} complete* (_{}_)\n```\n{}\n```",
            self.ctx.mode.run_kind(),
            self.ctx.id,
            self.table.render(&rows),
        );
        self.send(text, &self.channels.primary, color);

        if !self.ctx.mode.is_dry_run() && self.ctx.escalated() {
            let text = format!(
                "[{}] ansible {} complete: {} (see {} for more details!)",
                self.ctx.id,
                self.ctx.mode.run_kind(),
                self.ctx.run_name(),
                self.channels.primary,
            );
            self.send(text, &self.channels.secondary, color);
        }
    }
}

/// The router, or the reason it is switched off for this run
pub enum Dispatcher {
    Active(Box<Router>),
    Disabled(DisabledReason),
}

impl Dispatcher {
    /// Check capabilities once and build the router if they are all present
    pub fn new(config: &Config, options: RunOptions, transport: Box<dyn Transport>) -> Self {
        let Some(table) = TableRenderer::detect() else {
            return Self::disabled(DisabledReason::TableRendererUnavailable);
        };

        let Some(webhook_url) = config.webhook_url() else {
            return Self::disabled(DisabledReason::MissingWebhookUrl);
        };

        let ctx = RunContext::new(options);
        let channels = Channels {
            primary: config.channel.clone(),
            secondary: config.terse_channel.clone(),
        };
        let delivery = Delivery::new(webhook_url, &config.username, &config.icon_url, transport);

        log::info!(
            "[{}] notifier active: primary {}, secondary {}",
            ctx.id,
            channels.primary,
            channels.secondary
        );
        Self::Active(Box::new(Router::new(ctx, channels, delivery, table)))
    }

    fn disabled(reason: DisabledReason) -> Self {
        log::warn!("{} Disabling the webhook notifier.", reason);
        Self::Disabled(reason)
    }

    pub fn handle(&mut self, event: &LifecycleEvent) {
        if let Self::Active(router) = self {
            router.handle(event);
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}
