//! Parameter validation.

use crate::config::CampaignParams;
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._\-]+$").expect("identifier regex is valid")
});

/// Identifier used as a single path component or a bare command argument.
pub fn validate_identifier(key: &str, value: &str) -> Result<(), ConfigError> {
    if value == "." || value == ".." || !IDENTIFIER.is_match(value) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!(
                "'{}' must contain only letters, digits, '.', '_' or '-'",
                value
            ),
        });
    }
    Ok(())
}

/// Validate all parameters that end up in paths or external commands.
pub fn validate_params(params: &CampaignParams) -> Result<(), ConfigError> {
    validate_identifier("project_name", &params.project_name)?;
    validate_identifier("iteration_name", &params.iteration_name)?;
    validate_identifier("compiler_suite", &params.compiler_suite)?;

    let scripts = [
        ("compile_script", &params.compile_script),
        ("mesher_script", &params.mesher_script),
        ("solver_script", &params.solver_script),
        ("solver_array_script", &params.solver_array_script),
    ];
    for (key, value) in scripts {
        if let Some(name) = value {
            validate_identifier(key, name)?;
        }
    }

    if params.submission_cap == Some(0) {
        return Err(ConfigError::InvalidValue {
            key: "submission_cap".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
