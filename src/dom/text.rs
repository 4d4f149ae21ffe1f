use scraper::{ElementRef, Html, Selector};

use crate::core::PageTrait;
use crate::dom::element::collapse_whitespace;
use crate::dom::SnapshotProducer;
use crate::errors::Result;
use crate::planner::SummaryContext;

pub const DEFAULT_MAX_TEXT_CHARS: usize = 20_000;
pub const DEFAULT_MAX_HEADINGS: usize = 40;
pub const DEFAULT_MAX_SUMMARY_CONTROLS: usize = 200;

/// What the summarizer is shown of the page.
pub async fn summary_context(page: &dyn PageTrait, producer: &SnapshotProducer) -> Result<SummaryContext> {
    let location = page.location().await?;
    let html = page.content().await?;
    let mut snapshot = producer.from_html(&location, &html);
    snapshot.controls.truncate(DEFAULT_MAX_SUMMARY_CONTROLS);

    let document = Html::parse_document(&html);
    Ok(SummaryContext {
        url: snapshot.url,
        title: snapshot.title,
        text: readable_text(&document, DEFAULT_MAX_TEXT_CHARS),
        headings: headings(&document, DEFAULT_MAX_HEADINGS),
        dom: snapshot.controls,
    })
}

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "canvas", "iframe", "nav", "footer", "aside", "form",
    "button", "menu", "dialog", "head", "template",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "li", "ul", "ol", "table", "tr", "h1",
    "h2", "h3", "h4", "h5", "h6", "br", "pre", "blockquote",
];

/// Readable text of the page's main content, for summarization.
pub fn readable_text(document: &Html, max_chars: usize) -> String {
    let root = main_content(document);
    let mut raw = String::new();
    collect_text(root, &mut raw);

    let text = raw
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if text.chars().count() > max_chars {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str(" …");
        truncated
    } else {
        text
    }
}

/// Non-empty h1–h3 texts in document order.
pub fn headings(document: &Html, limit: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse("h1, h2, h3") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|h| collapse_whitespace(&h.text().collect::<String>()))
        .filter(|h| !h.is_empty())
        .take(limit)
        .collect()
}

fn main_content(document: &Html) -> ElementRef<'_> {
    ["main, [role=main], article", "body"]
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }
        let block = BLOCK_TAGS.contains(&name);
        if block {
            out.push('\n');
        }
        collect_text(child, out);
        if block {
            out.push('\n');
        }
    }
}
