//! Driftgate CLI entrypoint.
//!
//! This is the main entrypoint for the driftgate command-line tool.

use std::path::PathBuf;
use std::process::ExitCode;

use driftgate::cli::{Cli, Commands, OutputFormatter};
use driftgate::config::{find_settings_file, Settings, SettingsLoader};
use driftgate::diff::{EnvironmentId, HostId};
use driftgate::error::{DriftgateError, Result, SettingsError};
use driftgate::render::RenderClient;
use driftgate::secrets::VaultClient;
use driftgate::validator::ChangeValidator;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code used when `--fail-on-changes` is set and changes were found.
const EXIT_CHANGES_DETECTED: u8 = 2;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::ConfigDiff {
            hosts,
            target,
            incoming,
            refresh,
            concurrency,
            fail_on_changes,
        } => {
            cmd_config_diff(
                cli.config.as_ref(),
                &hosts,
                &target,
                &incoming,
                refresh,
                concurrency,
                fail_on_changes,
                &formatter,
            )
            .await
        }
        Commands::PlanDiff {
            hosts,
            target,
            incoming,
            refresh,
            concurrency,
            fail_on_changes,
        } => {
            cmd_plan_diff(
                cli.config.as_ref(),
                &hosts,
                &target,
                &incoming,
                refresh,
                concurrency,
                fail_on_changes,
                &formatter,
            )
            .await
        }
        Commands::Secret { path, key } => {
            cmd_secret(cli.config.as_ref(), &path, key.as_deref(), &formatter).await
        }
    }
}

/// Validate a configuration change across hosts.
#[allow(clippy::too_many_arguments)]
async fn cmd_config_diff(
    config_path: Option<&PathBuf>,
    hosts: &[String],
    target: &str,
    incoming: &str,
    refresh: bool,
    concurrency: Option<usize>,
    fail_on_changes: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let settings = load_settings(config_path)?;
    let validator = create_validator(&settings, refresh, concurrency)?;

    let host_ids: Vec<HostId> = hosts.iter().map(|h| HostId::from(h.as_str())).collect();
    let report = validator
        .validate_config_change(
            &host_ids,
            &EnvironmentId::from(target),
            &EnvironmentId::from(incoming),
        )
        .await?;

    println!("{}", formatter.format_config_report(&report));

    Ok(exit_code_for(fail_on_changes, report.has_changes()))
}

/// Validate an execution-plan change across hosts.
#[allow(clippy::too_many_arguments)]
async fn cmd_plan_diff(
    config_path: Option<&PathBuf>,
    hosts: &[String],
    target: &str,
    incoming: &str,
    refresh: bool,
    concurrency: Option<usize>,
    fail_on_changes: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let settings = load_settings(config_path)?;
    let validator = create_validator(&settings, refresh, concurrency)?;

    let host_ids: Vec<HostId> = hosts.iter().map(|h| HostId::from(h.as_str())).collect();
    let report = validator
        .validate_execution_plan_change(
            &host_ids,
            &EnvironmentId::from(target),
            &EnvironmentId::from(incoming),
        )
        .await?;

    println!("{}", formatter.format_plan_report(&report));

    Ok(exit_code_for(fail_on_changes, report.has_changes()))
}

/// Read a secret from Vault.
async fn cmd_secret(
    config_path: Option<&PathBuf>,
    path: &str,
    key: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let settings = load_settings(config_path)?;

    let vault_settings = settings.vault.as_ref().ok_or_else(|| {
        DriftgateError::Settings(SettingsError::validation_general(
            "vault is not configured in the settings file",
        ))
    })?;
    let token = vault_settings.token.as_deref().ok_or_else(|| {
        DriftgateError::Settings(SettingsError::MissingEnvVar {
            name: String::from("DRIFTGATE_VAULT_TOKEN"),
        })
    })?;

    let client =
        VaultClient::new(&vault_settings.address, token)?.with_mount(&vault_settings.mount);
    let value = client.read_secret(path, key).await?;

    println!("{}", formatter.format_secret(&value));

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads settings from the given path or by searching upward from the
/// current directory.
fn load_settings(config_path: Option<&PathBuf>) -> Result<Settings> {
    let settings_file = config_path
        .map_or_else(|| find_settings_file("."), |path| Ok(path.clone()))?;
    debug!("Loading settings from: {}", settings_file.display());

    let loader = SettingsLoader::new().with_base_path(
        settings_file
            .parent()
            .unwrap_or_else(|| std::path::Path::new(".")),
    );
    loader.load_dotenv()?;
    loader.load(&settings_file)
}

/// Creates the change validator over the configured render client.
fn create_validator(
    settings: &Settings,
    refresh: bool,
    concurrency: Option<usize>,
) -> Result<ChangeValidator<RenderClient>> {
    let client = RenderClient::with_timeout(
        &settings.render.endpoint,
        settings.render.auth_token.as_deref(),
        settings.render.timeout_secs,
    )
    .map_err(|e| DriftgateError::internal(format!("failed to create render client: {e}")))?;

    Ok(ChangeValidator::new(client)
        .with_concurrency(concurrency.unwrap_or(settings.fetch.concurrency))
        .with_refresh(refresh || settings.fetch.refresh_sources))
}

/// Maps the "changes detected" predicate to an exit code.
///
/// Failing the pipeline on changes is caller policy, so it is opt-in.
fn exit_code_for(fail_on_changes: bool, has_changes: bool) -> ExitCode {
    if fail_on_changes && has_changes {
        ExitCode::from(EXIT_CHANGES_DETECTED)
    } else {
        ExitCode::SUCCESS
    }
}
