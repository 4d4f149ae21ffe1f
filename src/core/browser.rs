use crate::core::config::BrowserConfig;
use crate::core::PageTrait;
use crate::errors::Result;
use crate::types::TabId;
use async_trait::async_trait;

#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type Page: PageTrait + 'static;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &BrowserConfig) -> Result<()>;

    /// Create a new tab and return its id together with a page handle
    async fn new_page(&self) -> Result<(TabId, Self::Page)>;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}
