use std::{env, fs};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

/// Where a secret comes from.
///
/// ```yaml
/// issuer: { value: svc@example.iam.gserviceaccount.com }
/// private_key: { from_env: GOOGLE_PRIVATE_KEY }
/// spreadsheet_id: { path: /run/secrets/sheet_id }
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SecretValue {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

impl SecretValue {
    pub fn from_env(name: &str) -> Self {
        SecretValue::FromEnv {
            from_env: name.to_owned(),
        }
    }

    /// Resolves the value. Missing variables, unreadable files and empty
    /// results are errors.
    pub fn resolve(&self) -> Result<String> {
        let resolved = match self {
            SecretValue::Literal { value } => value.to_owned(),
            SecretValue::FromEnv { from_env } => env::var(from_env)
                .map_err(|err| anyhow!("env var {}: {}", from_env, err))?,
            SecretValue::FromFile { path } => fs::read_to_string(path)
                .with_context(|| format!("failed to read secret file {}", path))?
                .trim()
                .to_string(),
        };
        if resolved.trim().is_empty() {
            bail!("{} is empty", self.describe());
        }
        Ok(resolved)
    }

    /// Printable origin, never the secret itself.
    pub fn describe(&self) -> String {
        match self {
            SecretValue::Literal { .. } => "literal value".to_owned(),
            SecretValue::FromEnv { from_env } => format!("env var {}", from_env),
            SecretValue::FromFile { path } => format!("file {}", path),
        }
    }
}
