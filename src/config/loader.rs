//! Parameter file loader.
//!
//! Two formats are accepted:
//! - plain `key value` lines, `#` comments and blank lines ignored
//! - TOML, when the file name ends in `.toml`
//!
//! Paths are resolved to absolute paths (`~/` expands to the home directory).

use crate::config::CampaignParams;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Keys that must be present in every parameter file.
pub const REQUIRED_KEYS: [&str; 6] = [
    "compiler_suite",
    "project_name",
    "scratch_path",
    "specfem_root",
    "lasif_path",
    "iteration_name",
];

/// Load and resolve a parameter file.
pub fn load_parameter_file(path: &Path) -> Result<CampaignParams, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let mut params = if path.extension().map_or(false, |ext| ext == "toml") {
        toml::from_str::<CampaignParams>(&content)?
    } else {
        parse_key_values(&content)?
    };

    let base = std::env::current_dir()?;
    params.scratch_path = resolve_path(&params.scratch_path, &base);
    params.specfem_root = resolve_path(&params.specfem_root, &base);
    params.lasif_path = resolve_path(&params.lasif_path, &base);

    log::debug!("[Config] Loaded parameter file {}", path.display());
    Ok(params)
}

/// Parse `key value` lines. Later duplicates win; extra fields on a line are ignored.
pub fn parse_key_values(content: &str) -> Result<CampaignParams, ConfigError> {
    let mut values: HashMap<String, String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        if let (Some(key), Some(value)) = (fields.next(), fields.next()) {
            values.insert(key.to_string(), value.to_string());
        } else {
            return Err(ConfigError::InvalidValue {
                key: line.to_string(),
                reason: "expected 'key value'".to_string(),
            });
        }
    }

    for key in REQUIRED_KEYS {
        if !values.contains_key(key) {
            return Err(ConfigError::MissingParameter(key.to_string()));
        }
    }

    let mut take = |key: &str| values.remove(key);
    let required = |v: Option<String>, key: &str| {
        v.ok_or_else(|| ConfigError::MissingParameter(key.to_string()))
    };

    let submission_cap = match take("submission_cap") {
        Some(raw) => Some(raw.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
            key: "submission_cap".to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    Ok(CampaignParams {
        compiler_suite: required(take("compiler_suite"), "compiler_suite")?,
        project_name: required(take("project_name"), "project_name")?,
        scratch_path: PathBuf::from(required(take("scratch_path"), "scratch_path")?),
        specfem_root: PathBuf::from(required(take("specfem_root"), "specfem_root")?),
        lasif_path: PathBuf::from(required(take("lasif_path"), "lasif_path")?),
        iteration_name: required(take("iteration_name"), "iteration_name")?,
        compile_script: take("compile_script"),
        scheduler: take("scheduler"),
        mesher_script: take("mesher_script"),
        solver_script: take("solver_script"),
        solver_array_script: take("solver_array_script"),
        submission_cap,
    })
}

/// Expand `~/` and make relative paths absolute against `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
