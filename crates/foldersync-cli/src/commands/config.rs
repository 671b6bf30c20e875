//! Config command - View and manage foldersync configuration
//!
//! Provides the `foldersync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Writes a starter configuration file

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use foldersync_core::config::{Config, ConfigBuilder};
use tracing::info;

use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Write a new configuration file
    Init {
        /// URL of the JMAP session resource
        #[arg(long)]
        session_url: String,
        /// User name for basic authentication
        #[arg(long)]
        username: Option<String>,
        /// Environment variable holding a bearer token instead of a password
        #[arg(long)]
        token_env: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
            ConfigCommand::Init {
                session_url,
                username,
                token_env,
                force,
            } => {
                let mut builder = ConfigBuilder::new().server_session_url(session_url.as_str());
                if let Some(username) = username {
                    builder = builder.auth_username(username.as_str());
                }
                if let Some(token_env) = token_env {
                    builder = builder.auth_token_env(token_env.as_str());
                }
                execute_init(config_path, builder.build(), *force, format)
            }
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.success(&format!("Configuration ({})", config_path.display()));
    if !config_path.exists() {
        formatter.warn("File not found, showing defaults");
    }
    formatter.info("");
    for line in config.to_yaml()?.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());

    if !config_path.exists() {
        bail!(
            "Configuration file not found at {}. Run 'foldersync config init' to create one.",
            config_path.display()
        );
    }

    // Parse errors are reported as such instead of falling back to defaults
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();

    if format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.field("File", &config_path.display().to_string());
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            plural(errors.len())
        ));
        formatter.field("File", &config_path.display().to_string());
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Configuration is invalid")
    }
}

fn execute_init(config_path: &Path, config: Config, force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());

    write_config(config_path, &config, force)?;
    info!(config_path = %config_path.display(), "Wrote configuration");

    let warnings: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();

    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "config_path": config_path.display().to_string(),
            "warnings": warnings,
        }));
    } else {
        formatter.success(&format!("Wrote {}", config_path.display()));
        for warning in &warnings {
            formatter.warn(warning);
        }
        if config.auth.token_env.is_none() {
            formatter.info(&format!(
                "Export the password in {} before running 'foldersync refresh'",
                config.auth.password_env
            ));
        }
    }
    Ok(())
}

/// Serializes `config` to `path`, creating parent directories
fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }

    let yaml = config.to_yaml().context("Failed to serialize configuration")?;
    std::fs::write(path, yaml).context("Failed to write configuration file")?;
    Ok(())
}
