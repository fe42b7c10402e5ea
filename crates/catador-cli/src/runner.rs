//! Command dispatch.

use catador::cli::{AdminTool, SigningKeys};
use catador::config::SuiteConfig;
use catador::manifest::ManifestStore;

use crate::error::{CliError, CliResult};
use crate::output;
use crate::{Cli, Commands, DeployArgs, KeysAction, ProviderAction};

/// Load, overlay, and validate the suite config named by the CLI
fn load_config(cli: &Cli) -> CliResult<SuiteConfig> {
    let config = SuiteConfig::load(&cli.config)
        .map_err(|e| CliError::config(format!("{}: {e}", cli.config.display())))?
        .apply_env();
    config.validate()?;
    Ok(config)
}

/// Run the parsed command to completion
pub fn run_command(cli: &Cli) -> CliResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: &Cli) -> CliResult<()> {
    let config = load_config(cli)?;
    match &cli.command {
        Commands::Check => check(&config),
        Commands::Keys { action } => keys(&config, action).await,
        Commands::Provider { action } => provider(&config, action).await,
        Commands::Deploy(args) => deploy(&config, args).await,
    }
}

fn check(config: &SuiteConfig) -> CliResult<()> {
    output::success(&format!("configuration valid, instance {}", config.base_url));
    let store = ManifestStore::new(&config.manifest_dir);
    match store.available() {
        Ok(manifests) if manifests.is_empty() => {
            output::warning("manifest directory holds no manifests");
        }
        Ok(manifests) => {
            output::success(&format!("manifests available: {}", manifests.join(", ")));
        }
        Err(_) => {
            output::warning(&format!(
                "manifest directory {} is not readable",
                config.manifest_dir.display()
            ));
        }
    }
    Ok(())
}

async fn keys(config: &SuiteConfig, action: &KeysAction) -> CliResult<()> {
    let tool = AdminTool::new(config.admin_tool.binary.clone());
    let keys = SigningKeys::new(tool, config.admin_tool.organization_id.clone());
    match action {
        KeysAction::List => {
            let records = keys.list(None).await?;
            print!("{}", output::render_records(&records));
        }
        KeysAction::Exists { field, value } => match keys.exists(field, value).await? {
            Some(record) => print!("{}", output::render_records(&[record])),
            None => output::warning(&format!("no signing key with {field} = {value:?}")),
        },
        KeysAction::Create { name, key_file } => {
            let _ = keys.create(name, key_file).await?;
            output::success(&format!("signing key {name:?} created"));
        }
        KeysAction::Delete { name } => {
            let _ = keys.delete(name).await?;
            output::success(&format!("signing key {name:?} deleted"));
        }
    }
    Ok(())
}

#[cfg(feature = "browser")]
async fn provider(config: &SuiteConfig, action: &ProviderAction) -> CliResult<()> {
    use catador::pages::ContentPage;
    use catador::UiDriver;

    let page = ContentPage::new(config)?;
    let mut session = catador::ChromiumSession::launch(&config.driver).await?;
    let result = match action {
        ProviderAction::Add { name } => page.add_custom_provider(&mut session, name).await,
        ProviderAction::Remove { name } => page.delete_custom_provider(&mut session, name).await,
    };
    session.close().await?;
    result?;
    match action {
        ProviderAction::Add { name } => output::success(&format!("provider {name:?} created")),
        ProviderAction::Remove { name } => output::success(&format!("provider {name:?} removed")),
    }
    Ok(())
}

#[cfg(not(feature = "browser"))]
async fn provider(_config: &SuiteConfig, _action: &ProviderAction) -> CliResult<()> {
    Err(CliError::BrowserSupportMissing {
        command: "provider".to_string(),
    })
}

#[cfg(feature = "browser")]
async fn deploy(config: &SuiteConfig, args: &DeployArgs) -> CliResult<()> {
    use catador::pages::{DeploymentPlan, DeploymentWizard};
    use catador::UiDriver;
    use indicatif::{ProgressBar, ProgressStyle};
    use tokio_util::sync::CancellationToken;
    use tracing::info;

    let plan = DeploymentPlan::load(&args.plan)?;
    let wizard = DeploymentWizard::new(config)?;
    let mut session = catador::ChromiumSession::launch(&config.driver).await?;

    // Ctrl-C cancels the completion wait cooperatively.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let result = async {
        wizard.run(&mut session, &plan).await?;
        let policy = config.completion;
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!(
            "deployment running, ceiling {} min",
            policy.wall_clock_ceiling().as_secs() / 60
        ));
        bar.enable_steady_tick(std::time::Duration::from_millis(250));
        let stats = wizard.submit_and_await(&mut session, &policy, &cancel).await;
        bar.finish_and_clear();
        stats
    }
    .await;

    session.close().await?;
    let stats = result?;
    info!(attempts = stats.attempts, refresh_retries = stats.refresh_retries, "deployment completed");
    output::success(&format!(
        "deployment completed after {} polling attempts ({} refresh retries)",
        stats.attempts, stats.refresh_retries
    ));
    Ok(())
}

#[cfg(not(feature = "browser"))]
async fn deploy(_config: &SuiteConfig, args: &DeployArgs) -> CliResult<()> {
    // Still validate the plan so a misconfigured fixture fails fast
    // everywhere.
    let _ = catador::pages::DeploymentPlan::load(&args.plan)?;
    Err(CliError::BrowserSupportMissing {
        command: "deploy".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("catador.yaml");
        std::fs::write(
            &path,
            "base_url: https://server.example\nadmin_tool:\n  organization_id: '7'\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn load_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir);
        let cli = Cli::parse_from(["catador", "--config", path.to_str().unwrap(), "check"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.admin_tool.organization_id, "7");
    }

    #[test]
    fn missing_config_is_a_config_error() {
        let cli = Cli::parse_from(["catador", "--config", "/nonexistent/catador.yaml", "check"]);
        let err = load_config(&cli).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn check_runs_against_a_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir);
        let cli = Cli::parse_from(["catador", "--config", path.to_str().unwrap(), "check"]);
        run_command(&cli).unwrap();
    }
}
