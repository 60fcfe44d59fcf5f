//! Renders a parsed `ModuleTree` back into pfsc source text (spec §4.2's
//! parser-idempotence invariant: reparsing the rendered text yields a
//! structurally equal tree). Every string renders triple-quoted: triple
//! quotes do no escape processing, so round-tripping text that already went
//! through [`crate::vertex::vertex_and_escape`] at the first parse doesn't
//! run it a second time over backslash sequences the first pass introduced.
//!
//! Grounded on `codegraph-prep/src/core/parse.rs`'s dispatch-by-item-kind
//! shape, mirrored here as a `match` over [`Item`] instead of over tokens.

use crate::ast::{Anno, Assignment, ChangeLogDecl, Deduc, Defn, Import, Item, ModuleTree};
use crate::json::Value;

/// Renders every item in `tree`, one per line, in declaration order.
pub fn render_module(tree: &ModuleTree) -> String {
    let mut out = String::new();
    for item in &tree.items {
        render_item(item, &mut out);
        out.push('\n');
    }
    out
}

fn render_item(item: &Item, out: &mut String) {
    match item {
        Item::Import(Import::Direct { libpath, alias, .. }) => {
            out.push_str("import ");
            out.push_str(libpath);
            if let Some(a) = alias {
                out.push_str(" as ");
                out.push_str(a);
            }
        }
        Item::Import(Import::From { module, names, .. }) => {
            out.push_str("from ");
            out.push_str(module);
            out.push_str(" import ");
            let rendered: Vec<String> = names
                .iter()
                .map(|(n, alias)| match alias {
                    Some(a) => format!("{n} as {a}"),
                    None => n.clone(),
                })
                .collect();
            out.push_str(&rendered.join(", "));
        }
        Item::Assignment(Assignment { name, value, .. }) => {
            out.push_str(name);
            out.push_str(" = ");
            render_value(value, out);
        }
        Item::Defn(Defn { name, definiendum, definiens, .. }) => {
            out.push_str("defn ");
            out.push_str(name);
            out.push(' ');
            render_triple_quoted(definiendum, out);
            out.push(' ');
            render_triple_quoted(definiens, out);
        }
        Item::Deduc(Deduc { name, of_targets, with_targets, body, .. }) => {
            out.push_str("deduc ");
            out.push_str(name);
            if !of_targets.is_empty() {
                out.push_str(" of ");
                out.push_str(&of_targets.join(", "));
            }
            if !with_targets.is_empty() {
                out.push_str(" with ");
                out.push_str(&with_targets.join(", "));
            }
            out.push_str(" { ");
            out.push_str(body);
            out.push_str(" }");
        }
        Item::Anno(Anno { name, raw, .. }) => {
            out.push_str("anno ");
            out.push_str(name);
            out.push_str(" @@@");
            out.push_str(raw);
            out.push_str("@@@");
        }
        Item::ChangeLog(ChangeLogDecl { moved, deletions, .. }) => {
            out.push_str("excepts { moved: { ");
            let moved_rendered: Vec<String> = moved
                .iter()
                .map(|(from, to)| {
                    let mut key = String::new();
                    render_triple_quoted(from, &mut key);
                    format!("{key}: {to}")
                })
                .collect();
            out.push_str(&moved_rendered.join(", "));
            out.push_str(" }, deletions: [");
            out.push_str(&deletions.join(", "));
            out.push_str("] }");
        }
    }
}

fn render_triple_quoted(s: &str, out: &mut String) {
    out.push_str("\"\"\"");
    out.push_str(s);
    out.push_str("\"\"\"");
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        // `{:?}` always keeps a decimal point (`1.0`, not `1`), so the
        // re-parsed token is still read as `Value::Float`.
        Value::Float(f) => out.push_str(&format!("{f:?}")),
        Value::Str(s) => render_triple_quoted(s, out),
        Value::Libpath(s) => out.push_str(s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(item, out);
            }
            out.push(']');
        }
        Value::Object(pairs) => {
            out.push('{');
            for (i, (key, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                render_value(v, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;
    use crate::module::parse_module;
    use proptest::prelude::*;

    fn zero_span(item: Item) -> Item {
        let span = Span { line: 0, col: 0 };
        match item {
            Item::Import(Import::Direct { libpath, alias, .. }) => {
                Item::Import(Import::Direct { libpath, alias, span })
            }
            Item::Import(Import::From { module, names, .. }) => {
                Item::Import(Import::From { module, names, span })
            }
            Item::Assignment(Assignment { name, value, .. }) => Item::Assignment(Assignment { name, value, span }),
            Item::Defn(Defn { name, definiendum, definiens, .. }) => {
                Item::Defn(Defn { name, definiendum, definiens, span })
            }
            Item::Deduc(Deduc { name, of_targets, with_targets, body, .. }) => {
                Item::Deduc(Deduc { name, of_targets, with_targets, body, span })
            }
            Item::Anno(Anno { name, raw, .. }) => Item::Anno(Anno { name, raw, span }),
            Item::ChangeLog(ChangeLogDecl { moved, deletions, .. }) => {
                Item::ChangeLog(ChangeLogDecl { moved, deletions, span })
            }
        }
    }

    fn zero_spans(tree: ModuleTree) -> ModuleTree {
        ModuleTree { items: tree.items.into_iter().map(zero_span).collect() }
    }

    /// Reparses `render_module(tree)` and asserts the result is the same
    /// tree, spans aside.
    fn assert_round_trips(tree: ModuleTree) {
        let text = render_module(&tree);
        let reparsed = parse_module(&text).unwrap_or_else(|e| panic!("reparse of {text:?} failed: {e}"));
        assert_eq!(zero_spans(tree), zero_spans(reparsed));
    }

    fn safe_ident() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_]{0,6}"
    }

    fn safe_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{0,12}"
    }

    fn safe_libpath() -> impl Strategy<Value = String> {
        proptest::collection::vec(safe_ident(), 1..3).prop_map(|segs| segs.join("."))
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|i| Value::Int(i as i64)),
            safe_text().prop_map(Value::Str),
            safe_libpath().prop_map(Value::Libpath),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::vec((safe_ident(), inner), 0..4).prop_map(Value::Object),
            ]
        })
    }

    proptest! {
        #[test]
        fn assignment_round_trips(name in safe_ident(), value in value_strategy()) {
            let tree = ModuleTree {
                items: vec![Item::Assignment(Assignment { name, value, span: Span { line: 0, col: 0 } })],
            };
            assert_round_trips(tree);
        }

        #[test]
        fn defn_round_trips(name in safe_ident(), definiendum in safe_text(), definiens in safe_text()) {
            let tree = ModuleTree {
                items: vec![Item::Defn(Defn { name, definiendum, definiens, span: Span { line: 0, col: 0 } })],
            };
            assert_round_trips(tree);
        }

        #[test]
        fn anno_round_trips(name in safe_ident(), raw in safe_text()) {
            let tree = ModuleTree {
                items: vec![Item::Anno(Anno { name, raw, span: Span { line: 0, col: 0 } })],
            };
            assert_round_trips(tree);
        }

        #[test]
        fn direct_import_round_trips(libpath in safe_libpath(), alias in proptest::option::of(safe_ident())) {
            let tree = ModuleTree {
                items: vec![Item::Import(Import::Direct { libpath, alias, span: Span { line: 0, col: 0 } })],
            };
            assert_round_trips(tree);
        }

        #[test]
        fn change_log_round_trips(
            moved in proptest::collection::vec((safe_libpath(), safe_libpath()), 0..3),
            deletions in proptest::collection::vec(safe_libpath(), 0..3),
        ) {
            let tree = ModuleTree {
                items: vec![Item::ChangeLog(ChangeLogDecl { moved, deletions, span: Span { line: 0, col: 0 } })],
            };
            assert_round_trips(tree);
        }
    }

    #[test]
    fn deduc_round_trips() {
        let tree = ModuleTree {
            items: vec![Item::Deduc(Deduc {
                name: "Pf".to_string(),
                of_targets: vec!["a.b.Thm".to_string()],
                with_targets: vec!["a.b.Lem".to_string()],
                body: "suppose x. so y by z".to_string(),
                span: Span { line: 0, col: 0 },
            })],
        };
        assert_round_trips(tree);
    }

    #[test]
    fn module_with_several_items_round_trips() {
        let tree = ModuleTree {
            items: vec![
                Item::Import(Import::Direct {
                    libpath: "a.b.c".to_string(),
                    alias: Some("abc".to_string()),
                    span: Span { line: 0, col: 0 },
                }),
                Item::Assignment(Assignment {
                    name: "x".to_string(),
                    value: Value::Int(42),
                    span: Span { line: 0, col: 0 },
                }),
                Item::Defn(Defn {
                    name: "Foo".to_string(),
                    definiendum: "the foo".to_string(),
                    definiens: "a definition".to_string(),
                    span: Span { line: 0, col: 0 },
                }),
            ],
        };
        assert_round_trips(tree);
    }
}
