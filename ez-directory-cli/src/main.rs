//! `ezdir`: command-line front-end for EzDirectory
//!
//! Loads a TOML configuration, connects through the LDAP backend and runs one command.
//! Logs go to stderr; results go to stdout, as text or as JSON with `--json`.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ez_directory_core::ServiceContext;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::Command;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "ezdir", version)]
#[command(about = "Search, inspect and unlock directory accounts")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ezdir.toml", env = "EZDIR_CONFIG")]
    config: PathBuf,

    /// Bind as this user instead of the configured default credential
    #[arg(short, long, env = "EZDIR_USERNAME")]
    username: Option<String>,

    /// Password for `--username`
    #[arg(long, env = "EZDIR_USER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries results, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = CliConfig::load(&cli.config)?;
    tracing::debug!(
        "Using domain {} ({}) via {}",
        config.directory.domain,
        config.directory.ldap_path,
        config.backend.default_host.as_deref().unwrap_or_default()
    );

    let backend = ez_directory_backend::create_backend(&config.backend)?;
    let ctx = Arc::new(ServiceContext::new(config.directory, backend)?);
    let credential = CliConfig::credential_override(cli.username, cli.password);

    commands::run(ctx, cli.command, credential.as_ref(), cli.json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_fall_back_to_environment() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id().as_str() == id)
                .and_then(|arg| arg.get_env())
                .map(|name| name.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("config").as_deref(), Some("EZDIR_CONFIG"));
        assert_eq!(env_of("username").as_deref(), Some("EZDIR_USERNAME"));
        assert_eq!(env_of("password").as_deref(), Some("EZDIR_USER_PASSWORD"));
    }

    #[test]
    fn config_defaults_and_global_json() {
        let cli = Cli::try_parse_from(["ezdir", "controllers", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Controllers));
        assert!(cli.config.ends_with("ezdir.toml") || std::env::var_os("EZDIR_CONFIG").is_some());
    }
}
