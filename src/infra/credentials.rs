// ============================================================
// Layer 6 - Kaggle Credentials
// ============================================================
// Finds the Kaggle API username and key, in this order:
//   1. KAGGLE_USERNAME + KAGGLE_KEY environment variables
//   2. $KAGGLE_CONFIG_DIR/kaggle.json
//   3. ~/.kaggle/kaggle.json
//
// kaggle.json is the file the Kaggle website hands out:
//   {"username": "...", "key": "..."}

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key:      String,
}

// The key must never reach the logs.
impl std::fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"***")
            .finish()
    }
}

/// Where credentials may come from, resolved once so the lookup
/// can be tested without touching the real environment.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub env_username: Option<String>,
    pub env_key:      Option<String>,
    pub config_dir:   Option<PathBuf>,
    pub home_dir:     Option<PathBuf>,
}

impl CredentialSources {
    pub fn from_env() -> Self {
        Self {
            env_username: std::env::var("KAGGLE_USERNAME").ok(),
            env_key:      std::env::var("KAGGLE_KEY").ok(),
            config_dir:   std::env::var_os("KAGGLE_CONFIG_DIR").map(PathBuf::from),
            home_dir:     dirs::home_dir(),
        }
    }

    /// Candidate kaggle.json locations, most specific first.
    fn json_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = &self.config_dir {
            paths.push(dir.join("kaggle.json"));
        }
        if let Some(home) = &self.home_dir {
            paths.push(home.join(".kaggle").join("kaggle.json"));
        }
        paths
    }

    pub fn load(&self) -> Result<KaggleCredentials> {
        if let (Some(username), Some(key)) = (&self.env_username, &self.env_key) {
            tracing::debug!("Using Kaggle credentials from environment");
            return Ok(KaggleCredentials { username: username.clone(), key: key.clone() });
        }

        let paths = self.json_paths();
        for path in &paths {
            if path.exists() {
                tracing::debug!("Using Kaggle credentials from '{}'", path.display());
                return read_kaggle_json(path);
            }
        }

        let tried: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        anyhow::bail!(
            "Could not find Kaggle credentials. Set KAGGLE_USERNAME and KAGGLE_KEY, \
             or place kaggle.json in one of: {}",
            if tried.is_empty() { "(no home directory)".to_string() } else { tried.join(", ") }
        )
    }
}

fn read_kaggle_json(path: &Path) -> Result<KaggleCredentials> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a valid kaggle.json", path.display()))
}
