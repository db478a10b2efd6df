//! Configuration file management for concord.
//!
//! Provides a TOML-based config file at `~/.config/concord/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use concord_core::AlignmentPolicy;
use concord_core::policy::{ClinicPlacement, CoverageAveraging};

/// Env var overriding the coverage averaging policy.
pub const ENV_COVERAGE_AVERAGING: &str = "CONCORD_COVERAGE_AVERAGING";
/// Env var overriding the clinic treatment placement policy.
pub const ENV_CLINIC_PLACEMENT: &str = "CONCORD_CLINIC_PLACEMENT";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub policy: AlignmentPolicy,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the concord config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/concord` or `~/.config/concord`,
/// also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("concord");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("concord")
}

/// Return the path to the concord config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Load the config file if one exists. A file that exists but does not parse
/// is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Policy values given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyOverrides {
    pub coverage_averaging: Option<CoverageAveraging>,
    pub clinic_placement: Option<ClinicPlacement>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub policy: AlignmentPolicy,
}

impl ResolvedConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Coverage averaging: `--coverage-averaging` > `CONCORD_COVERAGE_AVERAGING` > `policy.coverage_averaging`
    /// - Clinic placement: `--clinic-placement` > `CONCORD_CLINIC_PLACEMENT` > `policy.clinic_placement`
    /// - Late phase index: `policy.late_phase_index` > default
    pub fn resolve(cli: &PolicyOverrides) -> Result<Self> {
        let file_policy = load_config()?.map(|cfg| cfg.policy).unwrap_or_default();

        let coverage_averaging = match cli.coverage_averaging {
            Some(value) => value,
            None => env_value(ENV_COVERAGE_AVERAGING)?.unwrap_or(file_policy.coverage_averaging),
        };
        let clinic_placement = match cli.clinic_placement {
            Some(value) => value,
            None => env_value(ENV_CLINIC_PLACEMENT)?.unwrap_or(file_policy.clinic_placement),
        };

        let policy = AlignmentPolicy {
            coverage_averaging,
            clinic_placement,
            late_phase_index: file_policy.late_phase_index,
        };
        tracing::debug!(
            coverage_averaging = %policy.coverage_averaging,
            clinic_placement = %policy.clinic_placement,
            late_phase_index = policy.late_phase_index,
            "resolved alignment policy"
        );

        Ok(Self { policy })
    }
}

/// Parse an env var, treating unset or empty as absent.
fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} env var is invalid")),
        _ => Ok(None),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
