pub mod browser;
pub mod config;
pub mod page;

pub use browser::BrowserTrait;
pub use config::{AutomationConfig, BrowserConfig, Config, LoggingConfig, PlannerConfig};
pub use page::{FormSubmit, PageTrait};
