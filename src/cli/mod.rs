// CLI interface
pub mod output;

use crate::accounts::{self, SdkPortal};
use crate::auth::{self, TokenCache};
use crate::aws_config;
use crate::config::Settings;
use crate::error::{Result, SyncError};
use crate::models::{SyncMode, SyncOptions, SyncTarget};
use crate::reconcile;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "aws-sso-profiles")]
#[command(
    about = "Generate ~/.aws/config profiles for every AWS SSO account you can access",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Print changes instead of modifying the AWS config file
    #[arg(long)]
    pub dry_run: bool,

    /// The prefix to use on an AWS profile name
    #[arg(long, env = "AWS_SSO_PROFILES_PREFIX")]
    pub profile_prefix: Option<String>,

    /// The region to use. Overrides the region recorded with the SSO token
    #[arg(long, env = "AWS_SSO_PROFILES_REGION")]
    pub region: Option<String>,

    /// AWS role to generate configuration for
    #[arg(short = 'r', long)]
    pub role_name: String,

    /// SSO start domain to generate configuration for
    #[arg(short = 's', long)]
    pub start_domain: String,

    /// Remove profiles that match the provided criteria
    #[arg(long)]
    pub remove: bool,

    /// AWS config file to update
    #[arg(long, env = "AWS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Directory holding cached SSO tokens
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// A fatal error together with the stage that produced it
#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct StageError {
    pub stage: &'static str,
    #[source]
    pub source: SyncError,
}

trait StageContext<T> {
    fn stage(self, stage: &'static str) -> std::result::Result<T, StageError>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: &'static str) -> std::result::Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}

/// Combine flags (and their env vars) with the settings file into run options
pub fn sync_options(args: &Cli, settings: &Settings) -> Result<SyncOptions> {
    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => TokenCache::default_dir()?,
    };
    let config_path = match &args.config_file {
        Some(path) => path.clone(),
        None => aws_config::default_config_path()?,
    };

    let profile_prefix = args
        .profile_prefix
        .clone()
        .or_else(|| settings.defaults.profile_prefix.clone())
        .filter(|p| !p.is_empty());
    let region_override = args
        .region
        .clone()
        .or_else(|| settings.defaults.region.clone())
        .filter(|r| !r.is_empty());

    Ok(SyncOptions {
        start_domain: args.start_domain.clone(),
        role_name: args.role_name.clone(),
        profile_prefix,
        region_override,
        mode: if args.remove {
            SyncMode::Remove
        } else {
            SyncMode::Apply
        },
        dry_run: args.dry_run,
        cache_dir,
        config_path,
    })
}

pub async fn execute(args: Cli) -> std::result::Result<(), StageError> {
    let settings = Settings::load().stage("Error loading settings")?;
    let options = sync_options(&args, &settings).stage("Error resolving paths")?;

    let token = auth::resolve_token(&options).stage("Error reading the SSO token")?;
    let target = SyncTarget::new(&options, &token);

    let portal = SdkPortal::new(&target.region)
        .await
        .stage("Error loading AWS config")?;
    let enumeration = accounts::enumerate(&portal, &token.access_token, Some(&options.role_name))
        .await
        .stage("Error listing accounts")?;
    output::skipped_accounts(&enumeration.skipped, &options.role_name);

    let report = reconcile::reconcile(
        &options.config_path,
        &enumeration.accounts,
        &target,
        options.mode,
        options.dry_run,
    )
    .stage("Error updating AWS config")?;
    output::sync_report(&report, &options.config_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use clap::CommandFactory;

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = vec![
            "aws-sso-profiles",
            "-r",
            "AdministratorAccess",
            "-s",
            "mock-sso",
            "--config-file",
            "/tmp/aws/config",
            "--cache-dir",
            "/tmp/aws/sso/cache",
        ];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_role_and_domain_are_required() {
        assert!(Cli::try_parse_from(["aws-sso-profiles", "-s", "mock-sso"]).is_err());
        assert!(Cli::try_parse_from(["aws-sso-profiles", "-r", "Admin"]).is_err());
    }

    #[test]
    fn test_long_flags() {
        let args = Cli::try_parse_from([
            "aws-sso-profiles",
            "--role-name",
            "AdministratorAccess",
            "--start-domain",
            "mock-sso",
            "--profile-prefix",
            "mock",
            "--region",
            "eu-west-1",
            "--dry-run",
            "--remove",
        ])
        .unwrap();
        assert_eq!(args.role_name, "AdministratorAccess");
        assert_eq!(args.start_domain, "mock-sso");
        assert_eq!(args.profile_prefix.as_deref(), Some("mock"));
        assert_eq!(args.region.as_deref(), Some("eu-west-1"));
        assert!(args.dry_run);
        assert!(args.remove);
    }

    #[test]
    fn test_sync_options_from_flags() {
        let args = parse(&["--profile-prefix", "mock", "--remove", "--dry-run"]);
        let options = sync_options(&args, &Settings::default()).unwrap();

        assert_eq!(options.role_name, "AdministratorAccess");
        assert_eq!(options.start_domain, "mock-sso");
        assert_eq!(options.profile_prefix.as_deref(), Some("mock"));
        assert_eq!(options.mode, SyncMode::Remove);
        assert!(options.dry_run);
        assert_eq!(options.config_path, PathBuf::from("/tmp/aws/config"));
        assert_eq!(options.cache_dir, PathBuf::from("/tmp/aws/sso/cache"));
    }

    #[test]
    fn test_settings_fill_unset_flags() {
        let settings = Settings {
            defaults: Defaults {
                profile_prefix: Some("acme".to_string()),
                region: Some("eu-west-1".to_string()),
            },
        };

        let options = sync_options(&parse(&[]), &settings).unwrap();
        assert_eq!(options.profile_prefix.as_deref(), Some("acme"));
        assert_eq!(options.region_override.as_deref(), Some("eu-west-1"));
        assert_eq!(options.mode, SyncMode::Apply);

        let options = sync_options(
            &parse(&["--profile-prefix", "mock", "--region", "us-east-2"]),
            &settings,
        )
        .unwrap();
        assert_eq!(options.profile_prefix.as_deref(), Some("mock"));
        assert_eq!(options.region_override.as_deref(), Some("us-east-2"));
    }

    #[test]
    fn test_empty_prefix_means_no_prefix() {
        let options = sync_options(&parse(&["--profile-prefix", ""]), &Settings::default()).unwrap();
        assert_eq!(options.profile_prefix, None);
    }

    #[test]
    fn test_stage_error_message() {
        let result: Result<()> = Err(SyncError::NotFound(
            "Unable to find an AWS SSO token for domain acme".to_string(),
        ));
        let err = result.stage("Error reading the SSO token").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error reading the SSO token: Unable to find an AWS SSO token for domain acme"
        );
    }
}
