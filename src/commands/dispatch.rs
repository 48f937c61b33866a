//! Route a lifecycle event stream through the notifier

use eyre::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use crate::config::Config;
use crate::delivery::{PrintTransport, Transport, WebhookTransport};
use crate::event::LifecycleEvent;
use crate::router::{Dispatcher, RunMode, RunOptions};

pub fn run(input: Option<PathBuf>, check: bool, limit: Option<String>, print: bool, config: &Config) -> Result<()> {
    let options = RunOptions {
        mode: RunMode::from_check(check),
        limit,
    };
    let transport: Box<dyn Transport> = if print {
        Box::new(PrintTransport)
    } else {
        Box::new(WebhookTransport)
    };

    let mut dispatcher = Dispatcher::new(config, options, transport);
    if !dispatcher.is_active() {
        log::debug!("Draining event stream without sending");
    }

    let handled = match input {
        Some(path) => {
            let file = File::open(&path).context(format!("Failed to open event stream {}", path.display()))?;
            route_lines(BufReader::new(file), &mut dispatcher)?
        }
        None => route_lines(io::stdin().lock(), &mut dispatcher)?,
    };

    match &dispatcher {
        Dispatcher::Active(router) => {
            let ctx = router.context();
            log::info!(
                "[{}] handled {} lifecycle events, escalated: {}",
                ctx.id,
                handled,
                ctx.escalated()
            );
        }
        Dispatcher::Disabled(reason) => {
            log::info!("Notifier disabled ({}), drained {} lifecycle events", reason, handled);
        }
    }
    Ok(())
}

/// Feed each event line to the dispatcher, returning how many were handled.
///
/// Bad lines are skipped with a warning so the run keeps going.
pub fn route_lines<R: BufRead>(reader: R, dispatcher: &mut Dispatcher) -> Result<usize> {
    let mut handled = 0;

    // Raw bytes, so a line that is not UTF-8 is skipped rather than ending the stream
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.context("Failed to read event stream")?;
        if line.trim_ascii().is_empty() {
            continue;
        }

        match serde_json::from_slice::<LifecycleEvent>(&line) {
            Ok(event) => {
                dispatcher.handle(&event);
                handled += 1;
            }
            Err(e) => {
                log::warn!("Skipping malformed event on line {}: {}", index + 1, e);
            }
        }
    }

    Ok(handled)
}
