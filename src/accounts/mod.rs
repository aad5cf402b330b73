// Account and role enumeration against the SSO portal
mod portal;

pub use portal::{SdkPortal, SsoPortal};

use crate::error::Result;
use crate::models::AwsAccount;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The account does not offer the requested role
    RoleNotAssignable,
    /// Listing the account's roles failed
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAccount {
    pub account: AwsAccount,
    pub reason: SkipReason,
}

/// Accounts that qualify for a run, plus the ones left out and why
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub accounts: Vec<AwsAccount>,
    pub skipped: Vec<SkippedAccount>,
}

/// Every account visible to the token, across all pages
pub async fn list_accounts<P>(portal: &P, access_token: &str) -> Result<Vec<AwsAccount>>
where
    P: SsoPortal + ?Sized,
{
    let mut accounts = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = portal.list_accounts_page(access_token, next_token).await?;
        tracing::debug!(
            "Received {} accounts (more pages: {})",
            page.accounts.len(),
            page.next_token.is_some()
        );
        accounts.extend(page.accounts);

        next_token = page.next_token;
        if next_token.is_none() {
            break;
        }
    }

    Ok(accounts)
}

/// Whether `role_name` is assignable in the account (exact, case-sensitive)
pub async fn role_is_assignable<P>(
    portal: &P,
    access_token: &str,
    account_id: &str,
    role_name: &str,
) -> Result<bool>
where
    P: SsoPortal + ?Sized,
{
    let mut next_token: Option<String> = None;

    loop {
        let page = portal
            .list_account_roles_page(access_token, account_id, next_token)
            .await?;

        if page.roles.iter().any(|role| role == role_name) {
            return Ok(true);
        }

        next_token = page.next_token;
        if next_token.is_none() {
            return Ok(false);
        }
    }
}

/// List accounts and, when a role filter is given, keep only accounts that
/// offer that role. Role lookup failures skip the account.
pub async fn enumerate<P>(
    portal: &P,
    access_token: &str,
    role_filter: Option<&str>,
) -> Result<Enumeration>
where
    P: SsoPortal + ?Sized,
{
    let accounts = list_accounts(portal, access_token).await?;
    tracing::info!("Found {} accounts", accounts.len());

    let role_name = match role_filter.filter(|r| !r.is_empty()) {
        Some(role_name) => role_name,
        None => {
            return Ok(Enumeration {
                accounts,
                skipped: Vec::new(),
            })
        }
    };

    let mut result = Enumeration::default();
    for account in accounts {
        match role_is_assignable(portal, access_token, &account.account_id, role_name).await {
            Ok(true) => result.accounts.push(account),
            Ok(false) => {
                tracing::debug!(
                    "Role {} is not assignable in {} ({})",
                    role_name,
                    account.account_name,
                    account.account_id
                );
                result.skipped.push(SkippedAccount {
                    account,
                    reason: SkipReason::RoleNotAssignable,
                });
            }
            Err(e) => {
                tracing::debug!(
                    "Error validating role for account {}: {}",
                    account.account_id,
                    e
                );
                result.skipped.push(SkippedAccount {
                    account,
                    reason: SkipReason::LookupFailed(e.to_string()),
                });
            }
        }
    }

    Ok(result)
}
