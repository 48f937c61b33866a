use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "actionable-notify",
    about = "Send actionable playbook notifications to a chat webhook",
    version = env!("GIT_DESCRIBE"),
    after_help = "Webhook URL: set `webhook_url` in the config file or ACTIONABLE_SLACK_WEBHOOK_URL"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config.yaml")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a stream of lifecycle events (one JSON object per line)
    Dispatch {
        /// Read events from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// The run is a dry run (check mode)
        #[arg(long)]
        check: bool,

        /// Host subset the run is limited to
        #[arg(long)]
        limit: Option<String>,

        /// Print payloads to stdout instead of posting them
        #[arg(long)]
        print: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose setup issues
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dispatch_flags() {
        let cli = Cli::parse_from(["actionable-notify", "dispatch", "--check", "--limit", "web*", "--print"]);
        match cli.command {
            Commands::Dispatch {
                input,
                check,
                limit,
                print,
            } => {
                assert!(input.is_none());
                assert!(check);
                assert_eq!(limit.as_deref(), Some("web*"));
                assert!(print);
            }
            _ => panic!("expected dispatch"),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["actionable-notify", "doctor", "--config", "/tmp/notify.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/notify.yaml")));
    }
}
