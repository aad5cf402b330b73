// Merge or remove generated profiles in ~/.aws/config
use crate::aws_config::{ConfigDocument, Section};
use crate::error::Result;
use crate::models::{
    AwsAccount, ProfileEntry, SyncMode, SyncTarget, KEY_ACCOUNT_ID, KEY_REGION, KEY_ROLE_NAME,
    KEY_START_URL,
};
use crate::profile::profile_name;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Written(ProfileEntry),
    WouldWrite(ProfileEntry),
    Removed(String),
    WouldRemove(String),
    /// The account name sanitizes to nothing and there is no prefix
    Unnamed(AwsAccount),
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub actions: Vec<SyncAction>,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn changed(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Written(_) | SyncAction::Removed(_)))
            .count()
    }
}

/// Load the config file, apply or remove the run's profiles, and save unless
/// this is a dry run.
pub fn reconcile(
    config_path: &Path,
    accounts: &[AwsAccount],
    target: &SyncTarget,
    mode: SyncMode,
    dry_run: bool,
) -> Result<SyncReport> {
    let mut doc = ConfigDocument::load(config_path)?;

    let actions = match mode {
        SyncMode::Apply => apply_profiles(&mut doc, accounts, target, dry_run),
        SyncMode::Remove => remove_profiles(&mut doc, accounts, target, dry_run),
    };

    if dry_run {
        tracing::info!("Dry run enabled, {} left untouched", config_path.display());
    } else {
        doc.save(config_path)?;
        tracing::info!("Saved {}", config_path.display());
    }

    Ok(SyncReport { actions, dry_run })
}

/// Create or overwrite one section per account. Accounts whose names
/// normalize to the same profile name overwrite each other in order.
pub fn apply_profiles(
    doc: &mut ConfigDocument,
    accounts: &[AwsAccount],
    target: &SyncTarget,
    dry_run: bool,
) -> Vec<SyncAction> {
    let mut actions = Vec::with_capacity(accounts.len());
    let mut seen: HashSet<String> = HashSet::new();

    for account in accounts {
        let name = profile_name(target.profile_prefix.as_deref(), &account.account_name);
        if name.is_empty() {
            tracing::debug!(
                "Account {} ({}) has no usable profile name",
                account.account_name,
                account.account_id
            );
            actions.push(SyncAction::Unnamed(account.clone()));
            continue;
        }

        if !seen.insert(name.clone()) {
            tracing::debug!(
                "Profile {} is derived from more than one account; {} wins",
                name,
                account.account_id
            );
        }

        let entry = ProfileEntry::new(name, account, target);
        if dry_run {
            actions.push(SyncAction::WouldWrite(entry));
            continue;
        }

        tracing::debug!(
            "{} profile {}",
            if doc.has_section(&entry.profile_name) {
                "Updating"
            } else {
                "Creating"
            },
            entry.profile_name
        );
        let section = doc.section_mut_or_insert(&entry.profile_name);
        for (key, value) in entry.pairs() {
            section.set(key, value);
        }
        actions.push(SyncAction::Written(entry));
    }

    actions
}

/// Delete every section written for one of `accounts` with this run's
/// start URL, role and region.
pub fn remove_profiles(
    doc: &mut ConfigDocument,
    accounts: &[AwsAccount],
    target: &SyncTarget,
    dry_run: bool,
) -> Vec<SyncAction> {
    let mut actions = Vec::new();

    for account in accounts {
        for section in doc.sections() {
            if is_managed_by(section, &account.account_id, target) {
                let name = section.name().to_string();
                actions.push(if dry_run {
                    SyncAction::WouldRemove(name)
                } else {
                    SyncAction::Removed(name)
                });
            }
        }
    }

    if !dry_run {
        let account_ids: HashSet<&str> = accounts.iter().map(|a| a.account_id.as_str()).collect();
        doc.retain_sections(|section| {
            !account_ids
                .iter()
                .any(|account_id| is_managed_by(section, account_id, target))
        });
    }

    actions
}

/// A section belongs to this run when all identifying keys match
fn is_managed_by(section: &Section, account_id: &str, target: &SyncTarget) -> bool {
    section.get(KEY_START_URL) == Some(target.start_url.as_str())
        && section.get(KEY_ACCOUNT_ID) == Some(account_id)
        && section.get(KEY_ROLE_NAME) == Some(target.role_name.as_str())
        && section.get(KEY_REGION) == Some(target.region.as_str())
}
