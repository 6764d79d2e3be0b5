#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
#![warn(clippy::expect_used)]

use std::sync::Arc;

use crate::app_config::AppConfig;
use args::{CliArgs, Command};
use clap::{CommandFactory, Parser};
use commands::{
    config::config_cmd, export::export_cmd, link::link_cmd, locations::locations_cmd,
    profile::profile_cmd, report::report_cmd, schools::schools_cmd, select::select_cmd,
    sync::sync_cmd,
};
use profile::{get_profile_config_path, get_profile_name, Profile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use udise_core::SchoolsApi;
use web_client::HttpClient;

mod app_config;
mod args;
mod commands;
mod formatters;
mod notifier;
mod profile;
mod web_client;

#[cfg(test)]
mod test;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let args = CliArgs::parse();

    let Some(command) = args.command else {
        CliArgs::command().print_help()?;
        return Ok(());
    };

    let profile_name = get_profile_name(&args.config.profile);
    let profile_path = get_profile_config_path(&profile_name);
    let profile = Profile::from_path(&profile_path)?;
    let config = AppConfig::from_args(&args.config, &profile_name, &profile_path, profile.as_ref());

    match command {
        Command::Config => config_cmd(&config)?,
        Command::Profile { command } => profile_cmd(command)?,
        Command::Select(args) => select_cmd(&profile_path, args)?,
        Command::Link(args) => link_cmd(args)?,
        Command::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut CliArgs::command(),
                "udise",
                &mut std::io::stdout(),
            );
        }
        Command::Schools(args) => schools_cmd(client(&config)?, &config, args).await?,
        Command::Report(args) => report_cmd(client(&config)?, &config, args).await?,
        Command::Sync(args) => sync_cmd(client(&config)?, &config, args).await?,
        Command::Export(args) => export_cmd(client(&config)?, &config, args).await?,
        Command::Locations(command) => locations_cmd(client(&config)?, command).await?,
    }

    Ok(())
}

fn client(config: &AppConfig) -> anyhow::Result<Arc<dyn SchoolsApi>> {
    Ok(Arc::new(HttpClient::new(config)?))
}

/// Logs go to stderr so command output stays parseable
fn setup_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("UDISE_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
