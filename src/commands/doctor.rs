//! Diagnose notifier setup issues

use colored::*;
use eyre::Result;

use crate::config::Config;
use crate::router::summary::TableRenderer;

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "actionable-notify doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    match config.webhook_url() {
        Some(_) => println!("{} Webhook URL configured", "✓".green()),
        None => {
            println!("{} Webhook URL missing", "✗".red());
            println!(
                "  Set {} or {} in the config file",
                "ACTIONABLE_SLACK_WEBHOOK_URL".cyan(),
                "webhook_url".cyan()
            );
            issues += 1;
        }
    }

    if TableRenderer::detect().is_some() {
        println!("{} Summary table rendering available", "✓".green());
    } else {
        println!("{} Summary table rendering unavailable", "✗".red());
        println!("  Rebuild with the {} feature", "summary-table".cyan());
        issues += 1;
    }

    if config.channel == config.terse_channel {
        println!(
            "{} Primary and terse channels are both {}",
            "⚠".yellow(),
            config.channel.cyan()
        );
    }

    println!();
    println!("{}", "Channels:".bold());
    println!("  primary: {}", config.channel.cyan());
    println!("  terse:   {}", config.terse_channel.cyan());
    println!("  posting as: {}", config.username);
    println!();

    if issues == 0 {
        println!("{} Notifier will be active", "✓".green());
    } else {
        println!(
            "{} {} issue(s) found; the notifier will stay disabled",
            "✗".red(),
            issues
        );
    }

    Ok(())
}
