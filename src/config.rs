use thiserror::Error;

use crate::constants::{
    DEFAULT_ROLE_SESSION_NAME, INPUT_DURATION_SECONDS, INPUT_EXPORT_VARIABLES, INPUT_ROLE_ARN,
};

/// Raw action inputs as handed over by the runner, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    pub role_arn: Option<String>,
    pub audience: Option<String>,
    pub sts_region: Option<String>,
    pub role_session_name: Option<String>,
    pub duration_seconds: Option<String>,
    pub export_variables: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Input required and not supplied: {0}")]
    MissingInput(&'static str),

    #[error("Input {name} must be a positive integer number of seconds, got '{value}'")]
    InvalidDuration { name: &'static str, value: String },

    #[error(
        "Input does not meet YAML 1.2 \"Core Schema\" specification: {name} (got '{value}'). \
         Supported boolean inputs: true | True | TRUE | false | False | FALSE"
    )]
    InvalidBoolean { name: &'static str, value: String },
}

/// Validated exchange configuration, resolved once at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub role_arn: String,
    pub audience: Option<String>,
    pub sts_region: Option<String>,
    pub role_session_name: String,
    /// `None` lets STS apply its own default lifetime.
    pub duration_seconds: Option<i32>,
    pub export_variables: bool,
}

impl Config {
    pub fn resolve(inputs: &Inputs) -> Result<Self, ConfigError> {
        let role_arn =
            non_empty(&inputs.role_arn).ok_or(ConfigError::MissingInput(INPUT_ROLE_ARN))?;

        let duration_seconds = non_empty(&inputs.duration_seconds)
            .map(|raw| parse_duration(&raw))
            .transpose()?;

        let export_variables = non_empty(&inputs.export_variables)
            .map(|raw| parse_bool(INPUT_EXPORT_VARIABLES, &raw))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            role_arn,
            audience: non_empty(&inputs.audience),
            sts_region: non_empty(&inputs.sts_region),
            role_session_name: non_empty(&inputs.role_session_name)
                .unwrap_or_else(|| DEFAULT_ROLE_SESSION_NAME.to_string()),
            duration_seconds,
            export_variables,
        })
    }
}

// The runner passes unset inputs as empty strings.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_duration(raw: &str) -> Result<i32, ConfigError> {
    raw.parse::<i32>()
        .ok()
        .filter(|seconds| *seconds > 0)
        .ok_or_else(|| ConfigError::InvalidDuration {
            name: INPUT_DURATION_SECONDS,
            value: raw.to_string(),
        })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            name,
            value: raw.to_string(),
        }),
    }
}
