use async_trait::async_trait;

use super::CommandOutput;
use crate::app_error::AppResult;

/// Control surface of the running reverse-proxy process.
#[async_trait]
pub trait ProxyController: Send + Sync {
    /// Run the proxy's built-in configuration test over the whole config tree.
    async fn test_config(&self) -> AppResult<CommandOutput>;

    /// Ask the service manager to reload the proxy.
    async fn reload(&self) -> AppResult<CommandOutput>;
}
