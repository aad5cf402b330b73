use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Cached SSO-OIDC token as written by AWS CLI v2 into ~/.aws/sso/cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoToken {
    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: String,

    pub region: String,

    #[serde(rename = "startUrl", alias = "start_url")]
    pub start_url: String,

    /// Older CLI builds write a non-RFC3339 timestamp; those read as `None`
    #[serde(
        rename = "expiresAt",
        alias = "expires_at",
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

impl SsoToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Utc::now() >= expires_at)
            .unwrap_or(false)
    }
}

/// Represents an AWS account available through SSO
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AwsAccount {
    pub account_id: String,
    pub account_name: String,
}

impl AwsAccount {
    pub fn new(account_id: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            account_name: account_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Create or update one profile per account
    Apply,
    /// Delete profiles written for this start URL / role / region
    Remove,
}

/// Everything a run needs, resolved once from flags, environment and settings
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub start_domain: String,
    pub role_name: String,
    pub profile_prefix: Option<String>,
    pub region_override: Option<String>,
    pub mode: SyncMode,
    pub dry_run: bool,
    pub cache_dir: PathBuf,
    pub config_path: PathBuf,
}

impl SyncOptions {
    /// Explicit region wins over the one recorded in the token
    pub fn effective_region(&self, token: &SsoToken) -> String {
        self.region_override
            .clone()
            .unwrap_or_else(|| token.region.clone())
    }
}

/// Values stamped into (or matched against) every managed section of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub start_url: String,
    pub region: String,
    pub role_name: String,
    pub profile_prefix: Option<String>,
}

impl SyncTarget {
    pub fn new(options: &SyncOptions, token: &SsoToken) -> Self {
        Self {
            start_url: token.start_url.clone(),
            region: options.effective_region(token),
            role_name: options.role_name.clone(),
            profile_prefix: options.profile_prefix.clone(),
        }
    }
}

pub const KEY_START_URL: &str = "sso_start_url";
pub const KEY_SSO_REGION: &str = "sso_region";
pub const KEY_ACCOUNT_ID: &str = "sso_account_id";
pub const KEY_ROLE_NAME: &str = "sso_role_name";
pub const KEY_REGION: &str = "region";

/// A fully-resolved profile section ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub profile_name: String,
    pub account_name: String,
    pub sso_start_url: String,
    pub sso_region: String,
    pub sso_account_id: String,
    pub sso_role_name: String,
    pub region: String,
}

impl ProfileEntry {
    pub fn new(profile_name: String, account: &AwsAccount, target: &SyncTarget) -> Self {
        Self {
            profile_name,
            account_name: account.account_name.clone(),
            sso_start_url: target.start_url.clone(),
            sso_region: target.region.clone(),
            sso_account_id: account.account_id.clone(),
            sso_role_name: target.role_name.clone(),
            region: target.region.clone(),
        }
    }

    /// Key/value pairs in the order they are written to the config file
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            (KEY_START_URL, self.sso_start_url.as_str()),
            (KEY_SSO_REGION, self.sso_region.as_str()),
            (KEY_ACCOUNT_ID, self.sso_account_id.as_str()),
            (KEY_ROLE_NAME, self.sso_role_name.as_str()),
            (KEY_REGION, self.region.as_str()),
        ]
    }
}
