use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "email", "url", "number"];

/// One element as seen by the resolver: structural attributes plus the
/// bounding box reported by the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomElement {
    pub tag_name: String,
    pub element_id: Option<String>,
    pub text_content: Option<String>,
    pub attributes: HashMap<String, String>,
    /// Text of a `<label for=…>` pointing at this element.
    pub label: Option<String>,
    pub value: Option<String>,
    pub rect: Option<ElementRect>,
    pub is_content_editable: bool,
    pub css_selector: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl DomElement {
    pub fn new(tag_name: impl Into<String>, css_selector: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_lowercase(),
            css_selector: css_selector.into(),
            ..Default::default()
        }
    }

    pub fn with_text_content(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == "id" {
            self.element_id = Some(value.clone());
        }
        if key == "contenteditable" {
            self.is_content_editable = value.eq_ignore_ascii_case("true");
        }
        self.attributes.insert(key, value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    /// Non-zero bounding box.
    pub fn is_visible(&self) -> bool {
        self.rect
            .map(|r| r.width > 0.0 && r.height > 0.0)
            .unwrap_or(false)
    }

    /// aria-label, then `<label for>`, title, placeholder, name, text.
    pub fn accessible_name(&self) -> String {
        let candidates = [
            self.attr("aria-label"),
            self.label.as_deref(),
            self.attr("title"),
            self.attr("placeholder"),
            self.attr("name"),
            self.text_content.as_deref(),
        ];
        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Inputs that accept free text, textareas, textbox roles and editable regions.
    pub fn is_text_input(&self) -> bool {
        let input_type = self.attr("type").unwrap_or("").to_lowercase();
        match self.tag_name.as_str() {
            "input" => input_type.is_empty() || TEXT_INPUT_TYPES.contains(&input_type.as_str()),
            "textarea" => true,
            _ => {
                self.is_content_editable
                    || self
                        .role()
                        .map(|r| r.eq_ignore_ascii_case("textbox"))
                        .unwrap_or(false)
            }
        }
    }

    /// Builds an element from parsed markup. The rect is left unset; only a
    /// live page knows layout.
    pub fn from_element_ref(element: ElementRef<'_>, document: &Html) -> Self {
        let value = element.value();
        let mut dom = DomElement::new(value.name(), css_path(element));
        for (key, attr_value) in value.attrs() {
            dom = dom.with_attribute(key, attr_value);
        }
        let text = collapse_whitespace(&element.text().collect::<String>());
        if !text.is_empty() {
            dom.text_content = Some(text);
        }
        dom.value = value.attr("value").map(str::to_string);
        if let Some(id) = value.id() {
            dom.label = label_for(document, id);
        }
        dom
    }
}

fn label_for(document: &Html, id: &str) -> Option<String> {
    let selector = Selector::parse("label[for]").ok()?;
    document
        .select(&selector)
        .find(|label| label.value().attr("for") == Some(id))
        .map(|label| collapse_whitespace(&label.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A CSS path that re-selects the element: `#id` when it has one, otherwise
/// `tag.class:nth-of-type(n)` segments from below `body` down to the element.
pub fn css_path(element: ElementRef<'_>) -> String {
    if let Some(id) = element.value().id() {
        return format!("#{}", css_escape(id));
    }

    let mut parts = Vec::new();
    let mut current = Some(element);
    while let Some(node) = current {
        let name = node.value().name();
        if name == "body" || name == "html" {
            break;
        }

        let mut segment = name.to_string();
        if let Some(classes) = node.value().attr("class") {
            for class in classes.split_whitespace() {
                segment.push('.');
                segment.push_str(&css_escape(class));
            }
        }

        let parent = node.parent().and_then(ElementRef::wrap);
        if let Some(parent) = parent {
            let same_tag: Vec<_> = parent
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|sibling| sibling.value().name() == name)
                .collect();
            if same_tag.len() > 1 {
                if let Some(index) = same_tag.iter().position(|s| s.id() == node.id()) {
                    segment.push_str(&format!(":nth-of-type({})", index + 1));
                }
            }
        }

        parts.push(segment);
        current = parent;
    }

    parts.reverse();
    parts.join(" > ")
}

/// Escapes an identifier for use in a CSS selector, like `CSS.escape`.
pub fn css_escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, c) in ident.chars().enumerate() {
        match c {
            '0'..='9' if i == 0 => out.push_str(&format!("\\3{} ", c)),
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => out.push(c),
            c if !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}
