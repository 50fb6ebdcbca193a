//! Connection parameters and placeholder expansion
//!
//! `name`, `type` and `url` may carry placeholders that are resolved when a
//! connection is created:
//!
//! - `{{ env "NAME" }}` - value of an environment variable (empty when unset)
//! - `{{ exec "command" }}` - trimmed stdout of `sh -c command`

use crate::error::{DataError, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::debug;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\{\s*(env|exec)\s+"((?:[^"\\]|\\.)*)"\s*\}\}"#)
        .expect("placeholder pattern is valid")
});

/// Parameters identifying and locating one data source
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Driver type or alias (postgres, mongo, redis, ...)
    #[serde(rename = "type")]
    pub driver_type: String,
    pub url: String,
}

impl ConnectionParams {
    pub fn new(driver_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            driver_type: driver_type.into(),
            url: url.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Resolve placeholders in name, type and url. The id is kept verbatim.
    pub fn expand(&self) -> Result<ConnectionParams> {
        Ok(ConnectionParams {
            id: self.id.clone(),
            name: expand_placeholders(&self.name)?,
            driver_type: expand_placeholders(&self.driver_type)?,
            url: expand_placeholders(&self.url)?,
        })
    }
}

fn expand_placeholders(input: &str) -> Result<String> {
    let mut failure = None;

    let expanded = PLACEHOLDER.replace_all(input, |caps: &Captures| {
        let arg = caps[2].replace("\\\"", "\"").replace("\\\\", "\\");
        let resolved = match &caps[1] {
            "env" => Ok(std::env::var(&arg).unwrap_or_default()),
            _ => run_command(&arg),
        };
        resolved.unwrap_or_else(|e| {
            failure.get_or_insert(e);
            String::new()
        })
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn run_command(command: &str) -> Result<String> {
    debug!("Expanding exec placeholder: {}", command);

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|e| {
            DataError::invalid_configuration(format!("failed to run '{}': {}", command, e))
        })?;

    if !output.status.success() {
        return Err(DataError::invalid_configuration(format!(
            "command '{}' exited with {}: {}",
            command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
