#[cfg(feature = "chrome")]
pub mod chrome;
pub mod tabs;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeBrowser, ChromePage};
pub use tabs::TabRegistry;
