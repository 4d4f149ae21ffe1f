use std::collections::HashSet;
use tracing::debug;

use crate::actions::{Query, Step};
use crate::core::PageTrait;
use crate::dom::DomElement;
use crate::errors::Result;

const SCORE_EXACT: u32 = 1000;
const SCORE_PREFIX: u32 = 500;
const SCORE_SUBSTRING: u32 = 300;
const SCORE_OVERLAP_BASE: u32 = 100;
const SCORE_OVERLAP_TOKEN: u32 = 10;
const SCORE_UNNAMED: u32 = 5;
const SCORE_ANY: u32 = 10;

/// Structural patterns an ARIA-ish role can be realized by.
pub fn role_selector(role: &str) -> &'static str {
    match role.trim().to_lowercase().as_str() {
        "textbox" => {
            r#"input:not([type]), input[type="text"], input[type="search"], input[type="email"], input[type="url"], textarea, [role="textbox"], [contenteditable="true"]"#
        }
        "button" => r#"button, [role="button"], input[type="button"], input[type="submit"]"#,
        "link" => r#"a[href], [role="link"]"#,
        "combobox" => r#"select, [role="combobox"], input[list]"#,
        "checkbox" => r#"input[type="checkbox"], [role="checkbox"]"#,
        "radio" => r#"input[type="radio"], [role="radio"]"#,
        "listbox" => r#"[role="listbox"], select[size]"#,
        _ => r#"a[href], button, [role="button"], input, textarea, select, [role]"#,
    }
}

/// How well an element's accessible name matches the requested name.
pub fn score_against_name(element: &DomElement, target: &str) -> u32 {
    let wanted = target.trim().to_lowercase();
    if wanted.is_empty() {
        return SCORE_ANY;
    }
    let candidate = element.accessible_name().to_lowercase();
    if candidate.is_empty() {
        return SCORE_UNNAMED;
    }
    if candidate == wanted {
        return SCORE_EXACT;
    }
    if candidate.starts_with(&wanted) {
        return SCORE_PREFIX;
    }
    if candidate.contains(&wanted) {
        return SCORE_SUBSTRING;
    }
    let have: HashSet<&str> = candidate.split_whitespace().collect();
    let overlap = wanted
        .split_whitespace()
        .collect::<HashSet<_>>()
        .iter()
        .filter(|token| have.contains(*token))
        .count() as u32;
    SCORE_OVERLAP_BASE + overlap * SCORE_OVERLAP_TOKEN
}

/// Locates the element a step targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementResolver;

impl ElementResolver {
    pub fn new() -> Self {
        Self
    }

    /// Best visible candidate for `query`; ties go to the earliest element.
    pub fn best_match<'a>(&self, candidates: &'a [DomElement], query: &Query) -> Option<&'a DomElement> {
        let mut best: Option<(&DomElement, u32)> = None;
        for candidate in candidates.iter().filter(|c| c.is_visible()) {
            let score = score_against_name(candidate, &query.name);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best.map(|(element, _)| element)
    }

    /// First element matching `selector`, if it is visible.
    pub async fn resolve_selector(
        &self,
        page: &dyn PageTrait,
        selector: &str,
    ) -> Result<Option<DomElement>> {
        let first = page.query_all(selector).await?.into_iter().next();
        Ok(first.filter(DomElement::is_visible))
    }

    pub async fn resolve_query(&self, page: &dyn PageTrait, query: &Query) -> Result<Option<DomElement>> {
        let candidates = page.query_all(role_selector(&query.role)).await?;
        let found = self.best_match(&candidates, query).cloned();
        debug!(
            role = %query.role,
            name = %query.name,
            candidates = candidates.len(),
            found = found.as_ref().map(|e| e.css_selector.as_str()).unwrap_or("-"),
            "resolved query"
        );
        Ok(found)
    }

    /// Selector first, then the semantic query.
    pub async fn resolve(&self, page: &dyn PageTrait, step: &Step) -> Result<Option<DomElement>> {
        if let Some(selector) = step.selector.as_deref().filter(|s| !s.trim().is_empty()) {
            if let Some(found) = self.resolve_selector(page, selector).await? {
                return Ok(Some(found));
            }
        }
        if let Some(query) = &step.query {
            return self.resolve_query(page, query).await;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementRect;
    use crate::testing::FakePage;

    fn shown(el: DomElement) -> DomElement {
        el.with_rect(ElementRect::new(0.0, 0.0, 100.0, 20.0))
    }

    fn query(role: &str, name: &str) -> Query {
        Query::new(role, name)
    }

    #[test]
    fn scoring_ladder() {
        let named = |n: &str| DomElement::new("input", "x").with_attribute("aria-label", n);
        assert_eq!(score_against_name(&named("Search"), "search"), SCORE_EXACT);
        assert_eq!(score_against_name(&named("Search the web"), "search"), SCORE_PREFIX);
        assert_eq!(score_against_name(&named("Site search"), "search"), SCORE_SUBSTRING);
        assert_eq!(
            score_against_name(&named("find news today"), "news find"),
            SCORE_OVERLAP_BASE + 2 * SCORE_OVERLAP_TOKEN
        );
        assert_eq!(score_against_name(&named("Login"), "search"), SCORE_OVERLAP_BASE);
        assert_eq!(score_against_name(&DomElement::new("input", "x"), "search"), SCORE_UNNAMED);
        assert_eq!(score_against_name(&named("Login"), "  "), SCORE_ANY);
    }

    #[test]
    fn best_match_skips_hidden_and_breaks_ties_by_order() {
        let candidates = vec![
            DomElement::new("input", "#hidden").with_attribute("aria-label", "Search"),
            shown(DomElement::new("input", "#first").with_attribute("aria-label", "Query")),
            shown(DomElement::new("input", "#second").with_attribute("aria-label", "Query")),
            shown(DomElement::new("input", "#prefix").with_attribute("aria-label", "Search box")),
        ];
        let resolver = ElementResolver::new();
        let best = resolver.best_match(&candidates, &query("textbox", "search")).unwrap();
        assert_eq!(best.css_selector, "#prefix");

        let tie = resolver.best_match(&candidates, &query("textbox", "other")).unwrap();
        assert_eq!(tie.css_selector, "#first");
    }

    #[test]
    fn no_visible_candidates_is_none() {
        let candidates = vec![DomElement::new("input", "#a")];
        assert!(ElementResolver::new()
            .best_match(&candidates, &query("textbox", "a"))
            .is_none());
    }

    const PAGE: &str = r#"<body>
        <select id="cat" aria-label="Search in"><option>All</option></select>
        <input id="news" type="text" aria-label="Newsletter email">
        <input id="q" type="search" aria-label="Search">
        <textarea id="hidden-search" aria-label="Search" hidden></textarea>
        <button id="go">Search</button>
        </body>"#;

    #[tokio::test]
    async fn query_resolution_is_deterministic() {
        let page = FakePage::new("https://example.com/", PAGE);
        let resolver = ElementResolver::new();
        let q = query("textbox", "Search");
        for _ in 0..5 {
            let found = resolver.resolve_query(&page, &q).await.unwrap().unwrap();
            assert_eq!(found.css_selector, "#q");
        }
        let button = resolver
            .resolve_query(&page, &query("button", "search"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(button.css_selector, "#go");
    }

    #[tokio::test]
    async fn selector_first_then_query() {
        let page = FakePage::new("https://example.com/", PAGE);
        let resolver = ElementResolver::new();

        let mut step = Step::click_query("textbox", "Search");
        step.selector = Some("#news".into());
        let found = resolver.resolve(&page, &step).await.unwrap().unwrap();
        assert_eq!(found.css_selector, "#news");

        step.selector = Some("#hidden-search".into());
        let found = resolver.resolve(&page, &step).await.unwrap().unwrap();
        assert_eq!(found.css_selector, "#q");

        step.selector = Some("###broken".into());
        let found = resolver.resolve(&page, &step).await.unwrap().unwrap();
        assert_eq!(found.css_selector, "#q");

        let missing = Step::click_selector("#nope");
        assert!(resolver.resolve(&page, &missing).await.unwrap().is_none());
    }
}
