// Terminal presentation for sync results
use crate::accounts::{SkipReason, SkippedAccount};
use crate::cli::StageError;
use crate::models::ProfileEntry;
use crate::reconcile::{SyncAction, SyncReport};
use colored::Colorize;
use std::path::Path;

pub fn skipped_accounts(skipped: &[SkippedAccount], role_name: &str) {
    for skip in skipped {
        let account = &skip.account;
        match &skip.reason {
            SkipReason::RoleNotAssignable => println!(
                "{}",
                format!(
                    "Skipping account {} ({}): Role {} is not valid for the account",
                    account.account_name, account.account_id, role_name
                )
                .yellow()
            ),
            SkipReason::LookupFailed(message) => println!(
                "{} {}",
                format!("Error validating role for account {}:", account.account_id).red(),
                message
            ),
        }
    }
}

pub fn sync_report(report: &SyncReport, config_path: &Path) {
    for action in &report.actions {
        match action {
            SyncAction::WouldWrite(entry) => {
                println!(
                    "{}",
                    "Running without dry run would add or update the following profile".blue()
                );
                println!("{}", entry_block(entry));
            }
            SyncAction::Written(entry) => println!(
                "{} {} ({})",
                "Writing:".blue(),
                entry.profile_name,
                entry.account_name
            ),
            SyncAction::Removed(name) | SyncAction::WouldRemove(name) => {
                println!("{} {}", "Removing:".blue(), name)
            }
            SyncAction::Unnamed(account) => println!(
                "{}",
                format!(
                    "Skipping account {} ({}): name has no usable characters for a profile",
                    account.account_name, account.account_id
                )
                .yellow()
            ),
        }
    }

    if report.dry_run {
        println!("{}", "Dry run enabled, no changes were made".blue());
    } else {
        println!(
            "{}",
            format!(
                "AWS SSO profiles updated successfully in {} ({} changed)",
                config_path.display(),
                report.changed()
            )
            .green()
        );
    }
}

pub fn failure(err: &StageError) {
    println!("{} {}", format!("{}:", err.stage).red(), err.source);
}

/// The section exactly as it would be written to the config file
pub fn entry_block(entry: &ProfileEntry) -> String {
    let mut block = format!("[{}]\n", entry.profile_name);
    for (key, value) in entry.pairs() {
        block.push_str(&format!("{} = {}\n", key, value));
    }
    block
}
