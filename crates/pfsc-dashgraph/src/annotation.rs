//! Annotation emission: renders an annotation's markdown body to HTML and
//! builds the accompanying `data` document carrying per-widget data (spec
//! §4.6). Trust/approval flags and resolved cross-references are injected
//! at read time by the server that serves this data, not here.

use crate::convert::to_json;
use pfsc_errors::PfscError;
use pfsc_parser::markdown::{render_anno_markdown, WidgetStub};
use serde_json::{json, Map, Value};

pub fn build_annotation(
    libpath: &str,
    version: &str,
    raw_markdown: &str,
    doc_info: Option<Value>,
    render_widget: impl Fn(&WidgetStub) -> String,
) -> Result<(String, Value), PfscError> {
    let (html, stubs) = render_anno_markdown(raw_markdown, render_widget)?;

    let mut widgets = Map::new();
    for stub in &stubs {
        widgets.insert(
            stub.uid.clone(),
            json!({ "type": stub.kind, "label": stub.label, "data": to_json(&stub.data) }),
        );
    }

    let data = json!({
        "libpath": libpath,
        "version": version,
        "widgets": Value::Object(widgets),
        "docInfo": doc_info,
    });
    Ok((html, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_data_carries_widget_by_uid() {
        let raw = "See <goal:g1>[the goal]{\"libpath\": a.b.Thm}\n";
        let (html, data) = build_annotation("a.b.Notes", "1.0.0", raw, None, |stub| {
            format!("<span data-uid=\"{}\">{}</span>", stub.uid, stub.label)
        })
        .unwrap();
        assert!(html.contains("data-uid"));
        assert_eq!(data["libpath"], "a.b.Notes");
        let uid = data["widgets"].as_object().unwrap().keys().next().unwrap().clone();
        assert_eq!(data["widgets"][&uid]["type"], "goal");
    }
}
