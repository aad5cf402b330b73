use crate::error::{Result, SyncError};
use crate::models::AwsAccount;
use async_trait::async_trait;
use aws_sdk_sso::Client as SsoClient;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_types::region::Region;

/// One page of `ListAccounts`
#[derive(Debug, Clone, Default)]
pub struct AccountPage {
    pub accounts: Vec<AwsAccount>,
    pub next_token: Option<String>,
}

/// One page of `ListAccountRoles`
#[derive(Debug, Clone, Default)]
pub struct RolePage {
    pub roles: Vec<String>,
    pub next_token: Option<String>,
}

/// The AWS SSO portal API, one page per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SsoPortal: Send + Sync {
    async fn list_accounts_page(
        &self,
        access_token: &str,
        next_token: Option<String>,
    ) -> Result<AccountPage>;

    async fn list_account_roles_page(
        &self,
        access_token: &str,
        account_id: &str,
        next_token: Option<String>,
    ) -> Result<RolePage>;
}

/// `SsoPortal` backed by the AWS SDK
pub struct SdkPortal {
    client: SsoClient,
}

impl SdkPortal {
    pub async fn new(region: &str) -> Result<Self> {
        validate_region(region)?;

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let client = SsoClient::new(&config);

        Ok(Self { client })
    }
}

#[async_trait]
impl SsoPortal for SdkPortal {
    async fn list_accounts_page(
        &self,
        access_token: &str,
        next_token: Option<String>,
    ) -> Result<AccountPage> {
        let response = self
            .client
            .list_accounts()
            .access_token(access_token)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                SyncError::Transport(format!(
                    "Failed to list accounts: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let accounts = response
            .account_list()
            .iter()
            .map(|account| {
                AwsAccount::new(
                    account.account_id().unwrap_or_default(),
                    account.account_name().unwrap_or_default(),
                )
            })
            .collect();

        Ok(AccountPage {
            accounts,
            next_token: continuation(response.next_token()),
        })
    }

    async fn list_account_roles_page(
        &self,
        access_token: &str,
        account_id: &str,
        next_token: Option<String>,
    ) -> Result<RolePage> {
        let response = self
            .client
            .list_account_roles()
            .access_token(access_token)
            .account_id(account_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                SyncError::Transport(format!(
                    "Failed to list roles for account {}: {}",
                    account_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        let roles = response
            .role_list()
            .iter()
            .filter_map(|role| role.role_name().map(str::to_string))
            .collect();

        Ok(RolePage {
            roles,
            next_token: continuation(response.next_token()),
        })
    }
}

// Region names are lowercase letters, digits and hyphens, e.g. `us-east-1`
fn validate_region(region: &str) -> Result<()> {
    let well_formed = !region.is_empty()
        && !region.starts_with('-')
        && !region.ends_with('-')
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "Invalid AWS region {:?}",
            region
        )))
    }
}

// An empty continuation token ends pagination the same as a missing one
fn continuation(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_treats_empty_as_end() {
        assert_eq!(continuation(None), None);
        assert_eq!(continuation(Some("")), None);
        assert_eq!(continuation(Some("abc")), Some("abc".to_string()));
    }

    #[test]
    fn test_validate_region() {
        assert!(validate_region("us-east-1").is_ok());
        assert!(validate_region("us-gov-west-1").is_ok());
        assert!(matches!(
            validate_region(""),
            Err(SyncError::Validation(_))
        ));
        assert!(validate_region("US-EAST-1").is_err());
        assert!(validate_region("us east 1").is_err());
        assert!(validate_region("-us-east-1").is_err());
    }

    #[tokio::test]
    async fn test_sdk_portal_rejects_malformed_region() {
        let result = SdkPortal::new("not a region").await;
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }
}
