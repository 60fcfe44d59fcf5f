//! Recursive-descent parser for the top-level pfsc module grammar: imports,
//! assignments, `defn`, `deduc`, `anno` (spec §4.2). Grounded on
//! `codegraph-prep/src/core/parse.rs`'s dispatch-by-leading-token shape,
//! adapted from source-file parsing to this module's line-oriented keyword
//! grammar.

use crate::ast::{Anno, Assignment, ChangeLogDecl, Deduc, Defn, Import, Item, ModuleTree};
use crate::json::{parse_value, Value};
use crate::lexer::Cursor;
use pfsc_errors::PfscError;

pub fn parse_module(src: &str) -> Result<ModuleTree, PfscError> {
    let mut cur = Cursor::new(src);
    let mut items = Vec::new();
    loop {
        cur.skip_ws();
        if cur.at_end() {
            break;
        }
        let start = cur.pos();
        let kw = peek_keyword(&mut cur);
        let item = match kw.as_deref() {
            Some("import") => parse_direct_import(&mut cur, start)?,
            Some("from") => parse_from_import(&mut cur, start)?,
            Some("defn") => parse_defn(&mut cur, start)?,
            Some("deduc") => parse_deduc(&mut cur, start)?,
            Some("anno") => parse_anno(&mut cur, start)?,
            Some("excepts") => parse_excepts(&mut cur, start)?,
            _ => parse_assignment(&mut cur, start)?,
        };
        items.push(item);
    }
    Ok(ModuleTree { items })
}

/// Peeks an identifier without consuming it unless it matches a reserved
/// keyword; assignment names are themselves identifiers so we must not
/// consume speculatively.
fn peek_keyword(cur: &mut Cursor) -> Option<String> {
    let save = cur.pos();
    if !cur.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
        return None;
    }
    let ident = cur.take_ident();
    let is_kw = matches!(ident.as_str(), "import" | "from" | "defn" | "deduc" | "anno" | "excepts");
    if is_kw {
        Some(ident)
    } else {
        cur.reset_to(save);
        None
    }
}

fn parse_libpath_token(cur: &mut Cursor) -> Result<String, PfscError> {
    cur.skip_ws();
    let start = cur.pos();
    while cur.peek() == Some('.') {
        cur.bump();
    }
    if !cur.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
        return Err(PfscError::ParsingError(format!(
            "expected libpath at {}",
            cur.span_from(cur.pos())
        )));
    }
    cur.take_ident();
    while cur.peek() == Some('.') {
        cur.bump();
        cur.take_ident();
    }
    Ok(cur.slice_from(start))
}

fn try_parse_alias(cur: &mut Cursor) -> Option<String> {
    cur.skip_ws();
    let save = cur.pos();
    if cur.peek().is_some_and(|c| c.is_alphabetic()) {
        let ident = cur.take_ident();
        if ident == "as" {
            cur.skip_ws();
            return Some(cur.take_ident());
        }
    }
    cur.reset_to(save);
    None
}

fn parse_direct_import(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    let libpath = parse_libpath_token(cur)?;
    let alias = try_parse_alias(cur);
    Ok(Item::Import(Import::Direct { libpath, alias, span: cur.span_from(start) }))
}

fn parse_from_import(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    let module = parse_libpath_token(cur)?;
    cur.skip_ws();
    let kw = cur.take_ident();
    if kw != "import" {
        return Err(PfscError::ParsingError(format!(
            "expected 'import' after 'from LP' at {}",
            cur.span_from(cur.pos())
        )));
    }
    let mut names = Vec::new();
    loop {
        cur.skip_ws();
        let name = cur.take_ident();
        let alias = try_parse_alias(cur);
        names.push((name, alias));
        cur.skip_ws();
        if cur.peek() == Some(',') {
            cur.bump();
        } else {
            break;
        }
    }
    Ok(Item::Import(Import::From { module, names, span: cur.span_from(start) }))
}

fn parse_assignment(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    let name = cur.take_ident();
    if name.is_empty() {
        return Err(PfscError::ParsingError(format!(
            "unexpected token at {}",
            cur.span_from(cur.pos())
        )));
    }
    cur.skip_ws();
    cur.expect('=')?;
    let value = parse_value(cur)?;
    Ok(Item::Assignment(Assignment { name, value, span: cur.span_from(start) }))
}

fn parse_defn(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    cur.skip_ws();
    let name = cur.take_ident();
    cur.skip_ws();
    let definiendum = cur.take_string_literal()?;
    cur.skip_ws();
    let definiens = cur.take_string_literal()?;
    Ok(Item::Defn(Defn {
        name,
        definiendum: crate::vertex::vertex_and_escape(&definiendum),
        definiens: crate::vertex::vertex_and_escape(&definiens),
        span: cur.span_from(start),
    }))
}

fn parse_target_list(cur: &mut Cursor) -> Result<Vec<String>, PfscError> {
    let mut targets = Vec::new();
    loop {
        targets.push(parse_libpath_token(cur)?);
        cur.skip_ws();
        if cur.peek() == Some(',') {
            cur.bump();
        } else {
            break;
        }
    }
    Ok(targets)
}

fn parse_deduc(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    cur.skip_ws();
    let name = cur.take_ident();
    let mut of_targets = Vec::new();
    let mut with_targets = Vec::new();
    loop {
        cur.skip_ws();
        let save = cur.pos();
        if cur.peek().is_some_and(|c| c.is_alphabetic()) {
            let kw = cur.take_ident();
            match kw.as_str() {
                "of" => {
                    of_targets = parse_target_list(cur)?;
                    continue;
                }
                "with" => {
                    with_targets = parse_target_list(cur)?;
                    continue;
                }
                _ => {
                    cur.reset_to(save);
                }
            }
        }
        break;
    }
    cur.skip_ws();
    cur.expect('{')?;
    let body_start = cur.pos();
    let mut depth = 1i32;
    loop {
        match cur.bump() {
            None => return Err(PfscError::ParsingError("unterminated deduc body".into())),
            Some('{') => depth += 1,
            Some('}') => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    let body_end = cur.pos() - 1;
    let body = cur
        .slice_from(body_start)
        .chars()
        .take(body_end - body_start)
        .collect();
    Ok(Item::Deduc(Deduc { name, of_targets, with_targets, body, span: cur.span_from(start) }))
}

fn parse_anno(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    cur.skip_ws();
    let name = cur.take_ident();
    cur.skip_ws();
    for _ in 0..3 {
        cur.expect('@')?;
    }
    let body_start = cur.pos();
    loop {
        if cur.at_end() {
            return Err(PfscError::ParsingError("unterminated annotation".into()));
        }
        if cur.peek() == Some('@') && cur.peek_at(1) == Some('@') && cur.peek_at(2) == Some('@') {
            let raw = cur.slice_from(body_start);
            cur.bump();
            cur.bump();
            cur.bump();
            return Ok(Item::Anno(Anno { name, raw, span: cur.span_from(start) }));
        }
        cur.bump();
    }
}

/// `excepts { moved: { "old.path": new.path, ... }, deletions: [old.path, ...] }`,
/// reusing the JSON sublanguage for the body (spec §4.7's repo-root change
/// log). `moved`'s keys are quoted strings (the sublanguage's bare-libpath
/// keys don't admit dots); its values and `deletions`' entries may be bare
/// libpaths. Either key may be omitted; an empty `excepts {}` is legal but
/// pointless.
fn parse_excepts(cur: &mut Cursor, start: usize) -> Result<Item, PfscError> {
    cur.skip_ws();
    let value = parse_value(cur)?;
    let pairs = match value {
        Value::Object(pairs) => pairs,
        _ => return Err(PfscError::ParsingError("expected '{' after 'excepts'".into())),
    };
    let mut moved = Vec::new();
    let mut deletions = Vec::new();
    for (key, val) in pairs {
        match key.as_str() {
            "moved" => {
                let moved_pairs = match val {
                    Value::Object(p) => p,
                    _ => return Err(PfscError::ParsingError("'moved' must be an object".into())),
                };
                for (from, to) in moved_pairs {
                    let to = to
                        .as_str()
                        .ok_or_else(|| PfscError::ParsingError("'moved' values must be libpaths".into()))?
                        .to_string();
                    moved.push((from, to));
                }
            }
            "deletions" => {
                let items = match val {
                    Value::Array(items) => items,
                    _ => return Err(PfscError::ParsingError("'deletions' must be an array".into())),
                };
                for item in items {
                    let s = item
                        .as_str()
                        .ok_or_else(|| PfscError::ParsingError("'deletions' entries must be libpaths".into()))?
                        .to_string();
                    deletions.push(s);
                }
            }
            other => {
                return Err(PfscError::ParsingError(format!("unrecognised 'excepts' key '{other}'")));
            }
        }
    }
    Ok(Item::ChangeLog(ChangeLogDecl { moved, deletions, span: cur.span_from(start) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::Value;

    #[test]
    fn parses_direct_import_with_alias() {
        let tree = parse_module("import a.b.c as d\n").unwrap();
        assert_eq!(tree.items.len(), 1);
        match &tree.items[0] {
            Item::Import(Import::Direct { libpath, alias, .. }) => {
                assert_eq!(libpath, "a.b.c");
                assert_eq!(alias.as_deref(), Some("d"));
            }
            _ => panic!("expected direct import"),
        }
    }

    #[test]
    fn parses_from_import_with_multiple_names() {
        let tree = parse_module("from .sibling import Foo, Bar as B\n").unwrap();
        match &tree.items[0] {
            Item::Import(Import::From { module, names, .. }) => {
                assert_eq!(module, ".sibling");
                assert_eq!(names.len(), 2);
                assert_eq!(names[1], ("Bar".to_string(), Some("B".to_string())));
            }
            _ => panic!("expected from import"),
        }
    }

    #[test]
    fn parses_assignment() {
        let tree = parse_module("x = 42\n").unwrap();
        match &tree.items[0] {
            Item::Assignment(Assignment { name, value, .. }) => {
                assert_eq!(name, "x");
                assert_eq!(*value, Value::Int(42));
            }
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn parses_defn() {
        let tree = parse_module(r#"defn Foo "the foo" "definition of foo""#).unwrap();
        match &tree.items[0] {
            Item::Defn(Defn { name, definiendum, definiens, .. }) => {
                assert_eq!(name, "Foo");
                assert_eq!(definiendum, "the foo");
                assert_eq!(definiens, "definition of foo");
            }
            _ => panic!("expected defn"),
        }
    }

    #[test]
    fn parses_deduc_with_of_and_with() {
        let tree = parse_module("deduc Pf of a.Thm with b.Lem { suppose x; so y; }").unwrap();
        match &tree.items[0] {
            Item::Deduc(Deduc { name, of_targets, with_targets, body, .. }) => {
                assert_eq!(name, "Pf");
                assert_eq!(of_targets, &["a.Thm".to_string()]);
                assert_eq!(with_targets, &["b.Lem".to_string()]);
                assert!(body.contains("suppose x"));
            }
            _ => panic!("expected deduc"),
        }
    }

    #[test]
    fn parses_anno() {
        let tree = parse_module("anno Notes @@@ hello *world* @@@").unwrap();
        match &tree.items[0] {
            Item::Anno(Anno { name, raw, .. }) => {
                assert_eq!(name, "Notes");
                assert_eq!(raw.trim(), "hello *world*");
            }
            _ => panic!("expected anno"),
        }
    }

    #[test]
    fn parses_multiple_items_in_sequence() {
        let tree = parse_module("import a.b\nx = 1\ndefn D \"a\" \"b\"\n").unwrap();
        assert_eq!(tree.items.len(), 3);
    }

    #[test]
    fn parses_excepts_with_moved_and_deletions() {
        let tree = parse_module(
            r#"excepts { moved: { "a.b.Old": a.b.New }, deletions: [a.b.Gone, a.b.Stale] }"#,
        )
        .unwrap();
        match &tree.items[0] {
            Item::ChangeLog(ChangeLogDecl { moved, deletions, .. }) => {
                assert_eq!(moved, &[("a.b.Old".to_string(), "a.b.New".to_string())]);
                assert_eq!(deletions, &["a.b.Gone".to_string(), "a.b.Stale".to_string()]);
            }
            _ => panic!("expected change log"),
        }
    }

    #[test]
    fn parses_excepts_with_only_deletions() {
        let tree = parse_module("excepts { deletions: [a.b.Gone] }").unwrap();
        match &tree.items[0] {
            Item::ChangeLog(ChangeLogDecl { moved, deletions, .. }) => {
                assert!(moved.is_empty());
                assert_eq!(deletions, &["a.b.Gone".to_string()]);
            }
            _ => panic!("expected change log"),
        }
    }
}
