//! Scripts the Chrome page driver evaluates in the tab.
//!
//! Every script is an expression that yields a JSON string, so results come
//! back as plain strings regardless of how the protocol serializes objects.

/// Quotes `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    // JSON string syntax is valid JavaScript, except for the two line
    // separators JSON leaves unescaped.
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Helpers shared by the element scripts: a CSS path matching the one the
/// snapshot producer computes, and the element description the resolver reads.
const PRELUDE: &str = r#"
const __cssPath = (el) => {
  if (el.id) return '#' + CSS.escape(el.id);
  const parts = [];
  let node = el;
  while (node && node.nodeType === 1) {
    const tag = node.tagName.toLowerCase();
    if (tag === 'body' || tag === 'html') break;
    let seg = tag;
    for (const c of node.classList) seg += '.' + CSS.escape(c);
    const parent = node.parentElement;
    if (parent) {
      const same = Array.from(parent.children).filter(s => s.tagName === node.tagName);
      if (same.length > 1) seg += ':nth-of-type(' + (same.indexOf(node) + 1) + ')';
    }
    parts.unshift(seg);
    node = parent;
  }
  return parts.join(' > ');
};
const __describe = (el) => {
  const r = el.getBoundingClientRect();
  const attributes = {};
  for (const a of el.attributes) attributes[a.name] = a.value;
  let label = null;
  if (el.id) {
    const l = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
    if (l && l.innerText.trim()) label = l.innerText.trim();
  }
  const text = (el.innerText || el.textContent || '').replace(/\s+/g, ' ').trim();
  return {
    tag_name: el.tagName.toLowerCase(),
    element_id: el.id || null,
    text_content: text || null,
    attributes,
    label,
    value: typeof el.value === 'string' ? el.value : null,
    rect: { x: r.x, y: r.y, width: r.width, height: r.height },
    is_content_editable: !!el.isContentEditable,
    css_selector: __cssPath(el),
  };
};
const __find = (sel) => {
  try { return document.querySelector(sel); } catch (e) { return null; }
};
const __enter = (el) => {
  const opts = { key: 'Enter', code: 'Enter', keyCode: 13, which: 13, bubbles: true, cancelable: true };
  for (const type of ['keydown', 'keypress', 'keyup']) el.dispatchEvent(new KeyboardEvent(type, opts));
};
const __visible = (el) => { const r = el.getBoundingClientRect(); return r.width > 0 && r.height > 0; };
"#;

fn wrap(body: &str) -> String {
    format!(
        "JSON.stringify((() => {{ {prelude}\n{body}\n}})())",
        prelude = PRELUDE,
        body = body
    )
}

pub fn ping() -> String {
    wrap("return true;")
}

pub fn location() -> String {
    wrap("return { url: location.href, title: document.title };")
}

pub fn content() -> String {
    wrap("return document.documentElement ? document.documentElement.outerHTML : '';")
}

pub fn ready_state() -> String {
    wrap("return document.readyState;")
}

pub fn body_text() -> String {
    wrap("return document.body ? document.body.innerText : '';")
}

pub fn query_all(css: &str) -> String {
    wrap(&format!(
        "let found = []; try {{ found = Array.from(document.querySelectorAll({})); }} catch (e) {{ return []; }}\n\
         return found.map(__describe);",
        js_string(css)
    ))
}

pub fn active_element() -> String {
    wrap(
        "const el = document.activeElement;\n\
         if (!el || el === document.body || el === document.documentElement) return null;\n\
         return __describe(el);",
    )
}

pub fn set_location(url: &str) -> String {
    wrap(&format!("location.href = {}; return true;", js_string(url)))
}

pub fn scroll_into_view(selector: &str) -> String {
    wrap(&format!(
        "const el = __find({});\n\
         if (!el) return false;\n\
         el.scrollIntoView({{ block: 'center', inline: 'center' }});\n\
         return true;",
        js_string(selector)
    ))
}

pub fn click(selector: &str) -> String {
    wrap(&format!(
        "const el = __find({});\n\
         if (!el) return false;\n\
         el.click();\n\
         return true;",
        js_string(selector)
    ))
}

pub fn fill(selector: &str, text: &str) -> String {
    wrap(&format!(
        "const el = __find({sel});\n\
         if (!el) return false;\n\
         el.focus();\n\
         if (el.isContentEditable) {{ el.innerText = {text}; }}\n\
         else {{\n\
           const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;\n\
           const setter = Object.getOwnPropertyDescriptor(proto, 'value');\n\
           if (setter && setter.set && (el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement)) setter.set.call(el, {text});\n\
           else el.value = {text};\n\
         }}\n\
         el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
         el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
         return true;",
        sel = js_string(selector),
        text = js_string(text)
    ))
}

pub fn press_enter(selector: Option<&str>) -> String {
    let target = match selector {
        Some(selector) => format!("__find({}) || document.activeElement", js_string(selector)),
        None => "document.activeElement".to_string(),
    };
    wrap(&format!(
        "const el = {} || document.body;\n\
         __enter(el);\n\
         return true;",
        target
    ))
}

/// Yields `"clicked"`, `"submitted"`, `"no-form"` or `null` when the element
/// is gone.
pub fn submit_form(selector: &str) -> String {
    wrap(&format!(
        "const el = __find({});\n\
         if (!el) return null;\n\
         const form = el.closest('form');\n\
         if (!form) return 'no-form';\n\
         const button = Array.from(form.querySelectorAll('button[type=submit], input[type=submit], button:not([type])')).find(__visible);\n\
         if (button) {{ button.click(); return 'clicked'; }}\n\
         if (typeof form.requestSubmit === 'function') form.requestSubmit(); else form.submit();\n\
         return 'submitted';",
        js_string(selector)
    ))
}

pub fn scroll_by(dy: i64) -> String {
    wrap(&format!("window.scrollBy(0, {}); return true;", dy))
}
