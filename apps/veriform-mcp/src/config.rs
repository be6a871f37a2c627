//! # Host Configuration
//!
//! `SolverConfig` from a TOML file, then environment overrides.
//!
//! - `VERIFORM_CONFIG`: config file path (default: `./veriform.toml` if present)
//! - `VERIFORM_BACKEND`: default backend name (empty clears it)
//! - `VERIFORM_TIMEOUT_MS`: default time bound in milliseconds
//! - `VERIFORM_SMT_COMMAND`: solver executable for the `smtlib` backend

use std::path::Path;
use veriform_core::SolverConfig;

pub const CONFIG_ENV: &str = "VERIFORM_CONFIG";
pub const BACKEND_ENV: &str = "VERIFORM_BACKEND";
pub const TIMEOUT_ENV: &str = "VERIFORM_TIMEOUT_MS";
pub const SMT_COMMAND_ENV: &str = "VERIFORM_SMT_COMMAND";

const DEFAULT_CONFIG_FILE: &str = "veriform.toml";

/// Load the configuration from the process environment.
pub fn load() -> Result<SolverConfig, String> {
    load_with(|key| std::env::var(key).ok())
}

/// Load the configuration with `env` standing in for the environment.
pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<SolverConfig, String> {
    let mut config = match env(CONFIG_ENV) {
        Some(path) => load_from(Path::new(&path))?,
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                load_from(path)?
            } else {
                SolverConfig::default()
            }
        }
    };
    apply_overrides(&mut config, &env)?;
    Ok(config)
}

/// Parse a config file. Missing keys keep their defaults.
pub fn load_from(path: &Path) -> Result<SolverConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("invalid toml in '{}': {}", path.display(), e))
}

fn apply_overrides(
    config: &mut SolverConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<(), String> {
    if let Some(backend) = env(BACKEND_ENV) {
        let backend = backend.trim();
        config.default_backend = (!backend.is_empty()).then(|| backend.to_string());
    }
    if let Some(timeout) = env(TIMEOUT_ENV) {
        config.default_timeout_ms = timeout
            .trim()
            .parse()
            .map_err(|e| format!("{TIMEOUT_ENV}: '{timeout}' is not a millisecond count: {e}"))?;
    }
    if let Some(command) = env(SMT_COMMAND_ENV)
        && !command.trim().is_empty()
    {
        config.smtlib.command = command.trim().to_string();
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
