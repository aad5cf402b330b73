use crate::error::{Result, SyncError};
use crate::models::SsoToken;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Read-only view of the AWS CLI v2 token cache (~/.aws/sso/cache/)
pub struct TokenCache {
    cache_dir: PathBuf,
}

impl TokenCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Default cache location used by AWS CLI v2
    pub fn default_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".aws").join("sso").join("cache"))
            .ok_or_else(|| SyncError::Config("Could not determine home directory".to_string()))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Newest cached token whose start URL contains `start_domain`.
    ///
    /// An empty domain matches every token. Files that cannot be read or do
    /// not parse as a token are skipped. When two files share a modification
    /// time the one enumerated last wins.
    pub fn find_latest(&self, start_domain: &str) -> Result<SsoToken> {
        let entries = fs::read_dir(&self.cache_dir).map_err(|e| {
            SyncError::NotFound(format!(
                "Unable to read the SSO token cache at {}: {}",
                self.cache_dir.display(),
                e
            ))
        })?;

        let mut selected: Option<(SystemTime, PathBuf, SsoToken)> = None;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let token = match read_token(&path) {
                Ok(token) => token,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if !start_domain.is_empty() && !token.start_url.contains(start_domain) {
                tracing::debug!(
                    "Skipping {}: start URL {} does not match {}",
                    path.display(),
                    token.start_url,
                    start_domain
                );
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::debug!("Skipping {}: no modification time ({})", path.display(), e);
                    continue;
                }
            };

            let newer = selected
                .as_ref()
                .map(|(latest, _, _)| modified >= *latest)
                .unwrap_or(true);
            if newer {
                selected = Some((modified, path, token));
            }
        }

        let (_, path, token) = selected.ok_or_else(|| {
            SyncError::NotFound(format!(
                "Unable to find an AWS SSO token for domain {}",
                start_domain
            ))
        })?;

        tracing::debug!("Using SSO token from {}", path.display());
        if token.is_expired() {
            tracing::warn!(
                "The cached SSO token for {} has expired; run `aws sso login` to refresh it",
                token.start_url
            );
        }

        Ok(token)
    }
}

fn read_token(path: &Path) -> Result<SsoToken> {
    let contents = fs::read_to_string(path).map_err(|e| SyncError::file_io("read", path, e))?;
    serde_json::from_str(&contents).map_err(|e| SyncError::Validation(e.to_string()))
}
