use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use tracing::debug;
use url::Url;

use crate::core::PageTrait;
use crate::dom::element::{collapse_whitespace, css_path};
use crate::errors::{AgentError, Result};
use crate::types::PageLocation;

/// Everything the planner treats as an interactive control.
pub const CONTROL_SELECTOR: &str = "a[href], button, [role=button], input, textarea, select, [role]";

pub const DEFAULT_MAX_LINKS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlDescriptor {
    pub tag: String,
    pub text: String,
    pub role: Option<String>,
    pub name: String,
    pub href: Option<String>,
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub url: String,
    pub title: String,
    pub origin: String,
    pub controls: Vec<ControlDescriptor>,
    pub links: Vec<String>,
}

impl Snapshot {
    /// Hash of the url and controls; equal fingerprints mean the page did not
    /// visibly change between two observations.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.url.hash(&mut hasher);
        self.controls.hash(&mut hasher);
        hasher.finish()
    }
}

/// Produces structural snapshots of a page.
#[derive(Debug, Clone)]
pub struct SnapshotProducer {
    max_links: usize,
}

impl Default for SnapshotProducer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINKS)
    }
}

impl SnapshotProducer {
    pub fn new(max_links: usize) -> Self {
        Self { max_links }
    }

    pub async fn capture(&self, page: &dyn PageTrait) -> Result<Snapshot> {
        let location = page
            .location()
            .await
            .map_err(|e| AgentError::SnapshotFailed(e.to_string()))?;
        let html = page
            .content()
            .await
            .map_err(|e| AgentError::SnapshotFailed(e.to_string()))?;
        let snapshot = self.from_html(&location, &html);
        debug!(
            url = %snapshot.url,
            controls = snapshot.controls.len(),
            links = snapshot.links.len(),
            "captured snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_html(&self, location: &PageLocation, html: &str) -> Snapshot {
        let document = Html::parse_document(html);
        let controls = match Selector::parse(CONTROL_SELECTOR) {
            Ok(selector) => document.select(&selector).map(describe_control).collect(),
            Err(_) => Vec::new(),
        };
        let links = self.collect_links(&location.url, &controls);

        Snapshot {
            url: location.url.clone(),
            title: location.title.clone(),
            origin: location.origin(),
            controls,
            links,
        }
    }

    fn collect_links(&self, page_url: &str, controls: &[ControlDescriptor]) -> Vec<String> {
        let base = Url::parse(page_url).ok();
        let mut seen = HashSet::new();
        controls
            .iter()
            .filter(|c| c.tag == "a")
            .filter_map(|c| c.href.as_deref())
            .filter_map(|href| match &base {
                Some(base) => base.join(href).ok(),
                None => Url::parse(href).ok(),
            })
            .map(String::from)
            .filter(|link| seen.insert(link.clone()))
            .take(self.max_links)
            .collect()
    }
}

fn describe_control(element: ElementRef<'_>) -> ControlDescriptor {
    let value = element.value();
    let attr = |name: &str| value.attr(name).map(str::trim).filter(|s| !s.is_empty());

    let inner_text = collapse_whitespace(&element.text().collect::<String>());
    let text = if inner_text.is_empty() {
        attr("value").unwrap_or_default().to_string()
    } else {
        inner_text.clone()
    };
    let name = attr("aria-label")
        .or_else(|| attr("name"))
        .or_else(|| attr("title"))
        .or_else(|| attr("placeholder"))
        .map(str::to_string)
        .unwrap_or(inner_text);

    ControlDescriptor {
        tag: value.name().to_string(),
        text,
        role: value.attr("role").map(str::to_string),
        name,
        href: value.attr("href").map(str::to_string),
        selector: css_path(element),
    }
}
