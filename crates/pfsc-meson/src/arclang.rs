//! Arc-listing parser: `name ARROW name [ARROW name ...]` chains, no modal
//! or supposition semantics (spec §4.3, grounded on `meson.py`'s
//! `arc_parser`/`ArcLangTransformer`).

use crate::graph::{EdgeKind, Graph, GraphSource};
use pfsc_errors::PfscError;

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '?' || c == '!'
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    _src: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner { chars: src.chars().collect(), pos: 0, _src: src }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.chars.get(self.pos) {
            if c.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn take_name(&mut self) -> Result<String, PfscError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(&c) = self.chars.get(self.pos) {
            if is_name_char(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(PfscError::ArclangError(format!(
                "expected a node name at position {}",
                self.pos
            )));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn take_arrow(&mut self) -> Result<&'static str, PfscError> {
        self.skip_ws();
        for (text, out) in [("-->", "-->"), ("<--", "<--"), ("..>", "..>")] {
            if self.chars[self.pos..].starts_with(&text.chars().collect::<Vec<_>>()[..]) {
                self.pos += text.chars().count();
                return Ok(out);
            }
        }
        Err(PfscError::ArclangError(format!("expected an arrow at position {}", self.pos)))
    }

    fn peek_arrow(&mut self) -> bool {
        self.skip_ws();
        for text in ["-->", "<--", "..>"] {
            if self.chars[self.pos..].starts_with(&text.chars().collect::<Vec<_>>()[..]) {
                return true;
            }
        }
        false
    }
}

pub fn build_graph_from_arcs(arc_listing: &str) -> Result<Graph, PfscError> {
    let mut sc = Scanner::new(arc_listing);
    let mut graph = Graph::new(GraphSource::Arcs);
    sc.skip_ws();
    if sc.at_end() {
        return Err(PfscError::ArclangError("empty arc listing".into()));
    }
    while !sc.at_end() {
        let mut prev = sc.take_name()?;
        loop {
            if !sc.peek_arrow() {
                break;
            }
            let arrow = sc.take_arrow()?;
            let next = sc.take_name()?;
            let (p, q) = if arrow == "<--" { (next.clone(), prev.clone()) } else { (prev.clone(), next.clone()) };
            let kind = if arrow == "..>" { EdgeKind::Flow } else { EdgeKind::Ded };
            graph.create_edge(&p, &q, kind);
            prev = next;
        }
        sc.skip_ws();
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_chain() {
        let g = build_graph_from_arcs("a --> b --> c").unwrap();
        assert!(g.edge_between("a", "b").is_some());
        assert!(g.edge_between("b", "c").is_some());
    }

    #[test]
    fn reversed_arrow_flips_direction() {
        let g = build_graph_from_arcs("a <-- b").unwrap();
        let e = g.edge_between("a", "b").unwrap();
        assert_eq!(e.src, "b");
        assert_eq!(e.tgt, "a");
    }

    #[test]
    fn flow_arrow_sets_flow_kind() {
        let g = build_graph_from_arcs("a ..> b").unwrap();
        assert_eq!(g.edge_between("a", "b").unwrap().kind, EdgeKind::Flow);
    }

    #[test]
    fn multiple_chains() {
        let g = build_graph_from_arcs("a --> b\nc --> d").unwrap();
        assert!(g.edge_between("a", "b").is_some());
        assert!(g.edge_between("c", "d").is_some());
    }

    #[test]
    fn rejects_empty_listing() {
        assert!(build_graph_from_arcs("   ").is_err());
    }
}
