use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a browsing tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where a page currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    pub url: String,
    pub title: String,
}

impl PageLocation {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// ASCII serialization of the URL origin, empty when the URL does not parse.
    pub fn origin(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(parsed) => match parsed.origin() {
                origin @ url::Origin::Tuple(..) => origin.ascii_serialization(),
                url::Origin::Opaque(_) => String::new(),
            },
            Err(_) => String::new(),
        }
    }

    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_scheme_host_port() {
        let loc = PageLocation::new("https://news.example.com:8443/a/b?q=1", "News");
        assert_eq!(loc.origin(), "https://news.example.com:8443");
        assert_eq!(loc.host().as_deref(), Some("news.example.com"));
    }

    #[test]
    fn origin_of_garbage_is_empty() {
        let loc = PageLocation::new("not a url", "");
        assert_eq!(loc.origin(), "");
        assert!(loc.host().is_none());
    }
}
