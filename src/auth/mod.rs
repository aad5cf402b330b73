// Cached SSO token discovery
mod token_cache;

pub use token_cache::TokenCache;

use crate::error::Result;
use crate::models::{SsoToken, SyncOptions};

/// Resolve the token a run will use from the configured cache directory
pub fn resolve_token(options: &SyncOptions) -> Result<SsoToken> {
    let cache = TokenCache::new(&options.cache_dir);
    tracing::info!(
        "Looking for an SSO token matching '{}' in {}",
        options.start_domain,
        cache.cache_dir().display()
    );
    cache.find_latest(&options.start_domain)
}
