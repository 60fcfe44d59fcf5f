//! Annotation rendering: widget syntax `<type:name>[label]{data}` is pulled
//! out into placeholders, the remainder goes through V&E and then a markdown
//! renderer, and placeholders are substituted back with each widget's
//! rendered HTML (spec §4.5).
//!
//! Grounded on `original_source/server/pfsc/lang/freestrings.py`'s
//! description of `render_anno_markdown`, reimplemented with `pulldown-cmark`
//! in place of `mistletoe` (the teacher pack carries no markdown renderer of
//! its own; `pulldown-cmark` is the idiomatic ecosystem choice, noted in
//! SPEC_FULL.md).

use crate::json::{parse_value_from_str, Value};
use crate::vertex::vertex_and_escape;
use pfsc_errors::PfscError;
use pulldown_cmark::{html, Options, Parser};

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetStub {
    pub kind: String,
    pub uid: String,
    pub label: String,
    pub data: Value,
}

/// Replaces every `<type:name>[label]{data}` occurrence with a numbered
/// placeholder, returning the placeholder text and the extracted stubs in
/// encounter order.
pub fn extract_widgets(src: &str) -> Result<(String, Vec<WidgetStub>), PfscError> {
    let mut out = String::with_capacity(src.len());
    let mut widgets = Vec::new();
    let bytes: Vec<char> = src.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '<' {
            if let Some((stub, next)) = try_parse_widget(&bytes, i)? {
                let idx = widgets.len();
                out.push_str(&format!("\u{0}WIDGET{idx}\u{0}"));
                widgets.push(stub);
                i = next;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    Ok((out, widgets))
}

fn try_parse_widget(chars: &[char], start: usize) -> Result<Option<(WidgetStub, usize)>, PfscError> {
    let mut i = start + 1;
    let kind_start = i;
    while i < chars.len() && chars[i] != ':' {
        if chars[i] == '>' || chars[i] == '\n' {
            return Ok(None);
        }
        i += 1;
    }
    if i >= chars.len() {
        return Ok(None);
    }
    let kind: String = chars[kind_start..i].iter().collect();
    i += 1;
    let uid_start = i;
    while i < chars.len() && chars[i] != '>' {
        i += 1;
    }
    if i >= chars.len() {
        return Ok(None);
    }
    let uid: String = chars[uid_start..i].iter().collect();
    i += 1;
    if chars.get(i) != Some(&'[') {
        return Ok(None);
    }
    i += 1;
    let label_start = i;
    while i < chars.len() && chars[i] != ']' {
        i += 1;
    }
    if i >= chars.len() {
        return Ok(None);
    }
    let label: String = chars[label_start..i].iter().collect();
    i += 1;
    if chars.get(i) != Some(&'{') {
        return Ok(None);
    }
    let data_start = i;
    let mut depth = 0i32;
    while i < chars.len() {
        match chars[i] {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return Ok(None);
    }
    let data_text: String = chars[data_start..i].iter().collect();
    let data = parse_value_from_str(&data_text)?;
    Ok(Some((WidgetStub { kind, uid, label, data }, i)))
}

/// Renders an annotation's raw text to `(html, widgets)`: V&E the
/// placeholder-substituted text, run it through CommonMark, then splice in
/// each widget's own rendered HTML fragment.
pub fn render_anno_markdown(
    raw: &str,
    render_widget: impl Fn(&WidgetStub) -> String,
) -> Result<(String, Vec<WidgetStub>), PfscError> {
    let (stubbed, widgets) = extract_widgets(raw)?;
    let escaped = vertex_and_escape(&stubbed);
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(&escaped, opts);
    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    for (idx, w) in widgets.iter().enumerate() {
        let placeholder = format!("\u{0}WIDGET{idx}\u{0}");
        html_out = html_out.replace(&placeholder, &render_widget(w));
    }
    Ok((html_out, widgets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_widget() {
        let (stubbed, widgets) = extract_widgets("before <chart:fig1>[a figure]{\"kind\": \"bar\"} after").unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].kind, "chart");
        assert_eq!(widgets[0].uid, "fig1");
        assert_eq!(widgets[0].label, "a figure");
        assert!(stubbed.contains("WIDGET0"));
    }

    #[test]
    fn renders_markdown_with_widget_substitution() {
        let raw = "# Title\n\nSee <link:w1>[here]{\"to\": \"a.b\"} for more.";
        let (html, widgets) = render_anno_markdown(raw, |w| format!("<a href=\"#{}\">{}</a>", w.uid, w.label)).unwrap();
        assert_eq!(widgets.len(), 1);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<a href=\"#w1\">here</a>"));
    }

    #[test]
    fn escapes_html_in_plain_text() {
        let (html, _) = render_anno_markdown("a <script>bad()</script> b", |_| String::new()).unwrap();
        assert!(!html.contains("<script>"));
    }
}
