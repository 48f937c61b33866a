use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::{Config, redact_url};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    let mut shown = config.clone();
    shown.webhook_url = config.webhook_url().map(redact_url);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&shown)?);
        }
        OutputFormat::Text => {
            println!("{}", "actionable-notify configuration".bold());
            println!();

            match &shown.webhook_url {
                Some(url) => println!("  webhook_url: {}", url),
                None => println!("  webhook_url: {}", "(not set)".yellow()),
            }
            println!("  channel: {}", shown.channel.cyan());
            println!("  terse_channel: {}", shown.terse_channel.cyan());
            println!("  username: {}", shown.username);
            println!("  icon_url: {}", shown.icon_url);
            println!("  log_level: {}", shown.log_level.as_filter());
            if let Some(ref path) = shown.log_file {
                println!("  log_file: {}", Config::expand_path(path).display());
            }
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "webhook_url" | "webhook-url" => Some(config.webhook_url().map(redact_url).unwrap_or_default()),
        "channel" => Some(config.channel.clone()),
        "terse_channel" | "terse-channel" => Some(config.terse_channel.clone()),
        "username" => Some(config.username.clone()),
        "icon_url" | "icon-url" => Some(config.icon_url.clone()),
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        "log_file" | "log-file" => Some(
            config
                .log_file
                .as_ref()
                .map(|p| Config::expand_path(p).display().to_string())
                .unwrap_or_default(),
        ),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => {
            eprintln!("{} Unknown config key: {}", "✗".red(), key);
            std::process::exit(1);
        }
    }

    Ok(())
}
