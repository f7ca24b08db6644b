use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repopulse_analyze::Analyzer;
use repopulse_core::{OutputFormat, PulseConfig};

const CONFIG_FILE: &str = ".repopulse.toml";
const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Parser)]
#[command(
    name = "repopulse",
    version,
    about = "Team and change-shape signals from GitHub commit history",
    long_about = "Repopulse inspects a bounded window of a GitHub repository's recent history\n\
                   and reports contribution inequality, top-contributor share, commit\n\
                   compartmentalization, and per-author language attribution.\n\n\
                   Examples:\n  \
                     repopulse analyze https://github.com/tokio-rs/tokio\n  \
                     repopulse analyze https://github.com/o/r --window-days 30 --format json\n  \
                     repopulse init                      Write a default .repopulse.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .repopulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summary (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a GitHub repository's recent commit history
    #[command(long_about = "Analyze a GitHub repository's recent commit history.\n\n\
        Lists commits inside the window (newest first, up to --max-commits), fetches\n\
        per-commit diff statistics, and computes team and commit metrics. Failures are\n\
        reported inside the result and make the command exit with status 1.\n\n\
        A token raises the API quota from 60 to 5000 requests per hour. It is taken\n\
        from --token, then GITHUB_TOKEN, then [github].token in the config file.\n\n\
        Examples:\n  repopulse analyze https://github.com/octocat/hello-world\n  \
        repopulse analyze https://github.com/o/r --max-commits 100 --format json")]
    Analyze {
        /// Repository URL (https://github.com/owner/repo)
        repo_url: String,

        /// Days of history to inspect (default: [analysis].window_days, 90)
        #[arg(long)]
        window_days: Option<u32>,

        /// Maximum commits to inspect (default: [analysis].max_commits, 500)
        #[arg(long)]
        max_commits: Option<usize>,

        /// GitHub token (overrides GITHUB_TOKEN and the config file)
        #[arg(long)]
        token: Option<String>,
    },
    /// Create a default .repopulse.toml configuration file
    #[command(long_about = "Create a default .repopulse.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .repopulse.toml already exists.")]
    Init,
}

const DEFAULT_CONFIG: &str = r#"# Repopulse Configuration

[github]
# api_base = "https://api.github.com"
# token = "ghp_..."            # prefer the GITHUB_TOKEN environment variable
# connect_timeout_secs = 30
# read_timeout_secs = 30
# request_timeout_secs = 30
# max_attempts = 3
# retry_delay_ms = 2000
# handshake_retry_delay_ms = 3000

[fetch]
# page_delay_ms = 100
# concurrency = 5
# batch_size = 10
# batch_delay_ms = 500
# request_delay_ms = 100

[analysis]
# window_days = 90
# max_commits = 500
"#;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PulseConfig> {
    let config = match path {
        Some(path) => PulseConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PulseConfig::from_file(default_path).into_diagnostic()?
            } else {
                PulseConfig::default()
            }
        }
    };
    config.validate().into_diagnostic()?;
    Ok(config)
}

/// First non-blank token from the flag, the environment, then the config file.
fn resolve_token(
    flag: Option<String>,
    env: Option<String>,
    config: &PulseConfig,
) -> Option<String> {
    let present = |token: &String| !token.trim().is_empty();
    flag.filter(present)
        .or_else(|| env.filter(present))
        .or_else(|| config.github.token.clone().filter(present))
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            ref repo_url,
            window_days,
            max_commits,
            ref token,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            config.github.token =
                resolve_token(token.clone(), std::env::var(TOKEN_ENV).ok(), &config);

            let credentials = repopulse_github::credentials::from_config(&config.github);
            let analyzer = Analyzer::from_config(&config, credentials).into_diagnostic()?;

            let window_days = window_days.unwrap_or(config.analysis.window_days);
            let max_commits = max_commits.unwrap_or(config.analysis.max_commits);
            let result = analyzer.analyze(repo_url, window_days, max_commits).await;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
                }
                OutputFormat::Text => print!("{result}"),
            }

            if let Some(quota) = analyzer.client().rate_limit() {
                tracing::info!(
                    remaining = quota.remaining,
                    limit = quota.limit,
                    reset_epoch = quota.reset_epoch,
                    "GitHub quota"
                );
            }

            if result.is_error() {
                std::process::exit(1);
            }
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{} already exists", CONFIG_FILE);
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {} with default configuration", CONFIG_FILE);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(token: Option<&str>) -> PulseConfig {
        let mut config = PulseConfig::default();
        config.github.token = token.map(Into::into);
        config
    }

    #[test]
    fn flag_wins_over_env_and_config() {
        let token = resolve_token(
            Some("ghp_flag".into()),
            Some("ghp_env".into()),
            &config_with(Some("ghp_cfg")),
        );
        assert_eq!(token.as_deref(), Some("ghp_flag"));
    }

    #[test]
    fn env_wins_over_config() {
        let token = resolve_token(None, Some("ghp_env".into()), &config_with(Some("ghp_cfg")));
        assert_eq!(token.as_deref(), Some("ghp_env"));
    }

    #[test]
    fn config_used_when_nothing_else_is_set() {
        let token = resolve_token(None, None, &config_with(Some("ghp_cfg")));
        assert_eq!(token.as_deref(), Some("ghp_cfg"));
    }

    #[test]
    fn blank_flag_falls_through_to_env() {
        for flag in ["", "   "] {
            let token = resolve_token(
                Some(flag.into()),
                Some("ghp_env".into()),
                &config_with(Some("ghp_cfg")),
            );
            assert_eq!(token.as_deref(), Some("ghp_env"), "flag {flag:?}");
        }
    }

    #[test]
    fn blank_everywhere_means_anonymous() {
        let token = resolve_token(Some(" ".into()), Some(String::new()), &config_with(Some("")));
        assert!(token.is_none());
        assert!(resolve_token(None, None, &config_with(None)).is_none());
    }
}
