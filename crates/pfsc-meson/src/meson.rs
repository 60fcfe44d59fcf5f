//! Meson prose-DSL parser: a small recursive-descent implementation of the
//! grammar in `original_source/server/pfsc/lang/meson.py`'s `meson_parser`
//! (spec §4.3). Graph-building actions run inline as phrases are parsed,
//! mirroring the order the original's bottom-up Lark transformer performs
//! them in.

use crate::graph::{EdgeKind, Graph, GraphSource};
use pfsc_errors::PfscError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cat {
    Modal,
    Inf,
    Sup,
    Flow,
    Roam,
    How,
    Conj,
    Name,
}

fn classify(word: &str) -> Cat {
    let lower = word.to_ascii_lowercase();
    match lower.as_str() {
        "let" | "suppose" => Cat::Modal,
        "so" | "then" | "therefore" | "hence" | "thus" | "get" | "infer" | "find" | "implies"
        | "whence" | "whereupon" | "-->" => Cat::Inf,
        "by" | "since" | "using" | "because" | "for" | "<--" => Cat::Sup,
        "now" | "next" | "claim" | "..>" => Cat::Flow,
        "but" | "meanwhile" | "note" | "have" | "from" | "observe" | "consider" => Cat::Roam,
        "applying" | "via" => Cat::How,
        "and" | "plus" => Cat::Conj,
        _ => Cat::Name,
    }
}

struct Token {
    text: String,
    cat: Cat,
    pos: usize,
}

fn tokenize(src: &str) -> Vec<Token> {
    let mut out = Vec::new();
    for (i, raw) in src.split_whitespace().enumerate() {
        let trimmed = raw.trim_matches(|c| c == ',' || c == ';' || c == '.' && raw != "-->" && raw != "..>");
        let word = if trimmed.is_empty() { raw } else { trimmed };
        if word.is_empty() {
            continue;
        }
        out.push(Token { text: word.to_string(), cat: classify(word), pos: i });
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    None,
    Roam,
    Flow,
    Inf,
}

fn edge_type_for_prefix(p: Prefix) -> Option<EdgeKind> {
    match p {
        Prefix::None => Some(EdgeKind::Flow),
        Prefix::Roam => None,
        Prefix::Flow => Some(EdgeKind::Flow),
        Prefix::Inf => Some(EdgeKind::Ded),
    }
}

struct Phrase {
    prefix: Prefix,
    first_nodes: Vec<String>,
    last_nodes: Vec<String>,
    factorable_edges: Vec<usize>,
    method: Option<String>,
    is_conclusion: bool,
    is_supposition: bool,
}

struct Parser<'a> {
    toks: &'a [Token],
    idx: usize,
    graph: Graph,
    name_first_pos: HashMap<String, usize>,
}

impl<'a> Parser<'a> {
    fn peek_cat(&self) -> Option<Cat> {
        self.toks.get(self.idx).map(|t| t.cat)
    }

    fn bump(&mut self) -> Result<&'a Token, PfscError> {
        let t = self.toks.get(self.idx).ok_or_else(|| {
            PfscError::ParsingError("unexpected end of meson script".into())
        })?;
        self.idx += 1;
        Ok(t)
    }

    fn expect(&mut self, cat: Cat, what: &str) -> Result<&'a Token, PfscError> {
        if self.peek_cat() == Some(cat) {
            self.bump()
        } else {
            Err(PfscError::ParsingError(format!("expected {what}")))
        }
    }

    fn parse_node(&mut self) -> Result<String, PfscError> {
        let t = self.expect(Cat::Name, "a node name")?;
        let name = t.text.clone();
        let pos = t.pos;
        if let std::collections::hash_map::Entry::Vacant(e) = self.name_first_pos.entry(name.clone()) {
            e.insert(pos);
            self.graph.create_node(&name);
        }
        Ok(name)
    }

    fn parse_nodes(&mut self) -> Result<Vec<String>, PfscError> {
        let mut nodes = vec![self.parse_node()?];
        while self.peek_cat() == Some(Cat::Conj) {
            self.bump()?;
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn is_first_occurrence(&self, name: &str, pos: usize) -> bool {
        self.name_first_pos.get(name).copied() == Some(pos)
    }

    fn parse_supposition(&mut self) -> Result<Phrase, PfscError> {
        self.expect(Cat::Modal, "'let'/'suppose'")?;
        let start_idx = self.idx;
        let nodes = self.parse_nodes()?;
        let poss: Vec<usize> = self.toks[start_idx..self.idx]
            .iter()
            .filter(|t| t.cat == Cat::Name)
            .map(|t| t.pos)
            .collect();
        for (name, pos) in nodes.iter().zip(poss.iter()) {
            if self.is_first_occurrence(name, *pos) {
                mark_first_in_supposition(&mut self.graph, name);
            } else {
                return Err(PfscError::MesonExcessModal(name.clone()));
            }
        }
        Ok(Phrase {
            prefix: Prefix::None,
            first_nodes: nodes.clone(),
            last_nodes: nodes,
            factorable_edges: Vec::new(),
            method: None,
            is_conclusion: false,
            is_supposition: true,
        })
    }

    fn parse_assertion(&mut self) -> Result<Phrase, PfscError> {
        let targets = self.parse_nodes()?;
        let mut factorable_edges = Vec::new();
        let mut cur_targets = targets.clone();
        let mut first_reason_set = true;
        while self.peek_cat() == Some(Cat::Sup) {
            self.bump()?;
            let sources = self.parse_nodes()?;
            for src in &sources {
                for tgt in &cur_targets {
                    let eidx = self.graph.create_edge(src, tgt, EdgeKind::Ded);
                    if first_reason_set {
                        factorable_edges.push(eidx);
                    }
                }
            }
            cur_targets = sources;
            first_reason_set = false;
        }
        Ok(Phrase {
            prefix: Prefix::None,
            first_nodes: targets.clone(),
            last_nodes: targets,
            factorable_edges,
            method: None,
            is_conclusion: false,
            is_supposition: false,
        })
    }

    fn parse_initial_phrase(&mut self) -> Result<Phrase, PfscError> {
        if self.peek_cat() == Some(Cat::Modal) {
            self.parse_supposition()
        } else {
            self.parse_assertion()
        }
    }

    fn parse_conclusion(&mut self) -> Result<Phrase, PfscError> {
        self.expect(Cat::Inf, "an inferential keyword")?;
        let assertion = self.parse_assertion()?;
        let mut method = None;
        if self.peek_cat() == Some(Cat::How) {
            self.bump()?;
            method = Some(self.parse_node()?);
        }
        Ok(Phrase {
            prefix: Prefix::Inf,
            first_nodes: assertion.first_nodes,
            last_nodes: assertion.last_nodes,
            factorable_edges: assertion.factorable_edges,
            method,
            is_conclusion: true,
            is_supposition: false,
        })
    }

    fn parse_phrase(&mut self) -> Result<Phrase, PfscError> {
        if self.peek_cat() == Some(Cat::Inf) {
            return self.parse_conclusion();
        }
        let prefix = match self.peek_cat() {
            Some(Cat::Roam) => {
                self.bump()?;
                Prefix::Roam
            }
            Some(Cat::Flow) => {
                self.bump()?;
                Prefix::Flow
            }
            _ => Prefix::None,
        };
        let mut mp = self.parse_initial_phrase()?;
        mp.prefix = prefix;
        if mp.is_supposition {
            let nodes = mp.first_nodes.clone();
            let flow_prefix = mp.prefix == Prefix::Flow;
            if flow_prefix || mp.prefix == Prefix::None {
                mp.first_nodes = vec![nodes[0].clone()];
                mp.last_nodes = vec![nodes[nodes.len() - 1].clone()];
                if nodes.len() >= 2 {
                    for pair in nodes.windows(2) {
                        self.graph.create_edge(&pair[0], &pair[1], EdgeKind::Flow);
                    }
                }
            }
        }
        Ok(mp)
    }

    fn parse_mesonscript(mut self) -> Result<Graph, PfscError> {
        if self.peek_cat() == Some(Cat::Roam) {
            self.bump()?;
        }
        if self.toks.is_empty() {
            return Err(PfscError::ParsingError("empty meson script".into()));
        }
        let first = self.parse_initial_phrase()?;
        let mut phrases = vec![first];
        while self.idx < self.toks.len() {
            phrases.push(self.parse_phrase()?);
        }
        for i in 1..phrases.len() {
            let k = edge_type_for_prefix(phrases[i].prefix);
            let Some(kind) = k else { continue };
            let mut sources = phrases[i - 1].last_nodes.clone();
            let mut targets = phrases[i].first_nodes.clone();
            if kind == EdgeKind::Flow {
                if let Some(last) = sources.last().cloned() {
                    sources = vec![last];
                }
                if let Some(first) = targets.first().cloned() {
                    targets = vec![first];
                }
            }
            let mut edges = Vec::new();
            for s in &sources {
                for t in &targets {
                    edges.push(self.graph.create_edge(s, t, kind));
                }
            }
            if phrases[i].is_conclusion {
                if let Some(method) = phrases[i].method.clone() {
                    edges.extend(phrases[i].factorable_edges.iter().copied());
                    self.graph.factor_edges_through_method(&edges, &method);
                }
            }
        }
        Ok(self.graph)
    }
}

fn mark_first_in_supposition(graph: &mut Graph, name: &str) {
    // Graph exposes only shared references publicly; mutate through a
    // small helper so `Parser` doesn't need a `pub(crate)` mutable getter.
    graph.mark_first_occurs_in_supposition(name);
}

pub fn build_graph_from_meson(meson_script: &str) -> Result<Graph, PfscError> {
    let toks = tokenize(meson_script);
    let parser = Parser { toks: &toks, idx: 0, graph: Graph::new(GraphSource::Meson), name_first_pos: HashMap::new() };
    parser.parse_mesonscript()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_assertion_chain_with_reason() {
        let g = build_graph_from_meson("suppose x. so y by z").unwrap();
        assert!(g.get_node("x").unwrap().first_occurs_in_supposition);
        assert!(g.edge_between("z", "y").is_some());
    }

    #[test]
    fn flow_chain_between_suppositions() {
        let g = build_graph_from_meson("suppose x and y. now z").unwrap();
        assert!(g.edge_between("x", "y").is_some());
    }

    #[test]
    fn second_modal_mention_is_an_error() {
        let err = build_graph_from_meson("suppose x. suppose x").unwrap_err();
        matches!(err, PfscError::MesonExcessModal(_));
    }

    #[test]
    fn method_factors_edges() {
        let g = build_graph_from_meson("x. so y by z applying m").unwrap();
        assert!(g.edge_between("z", "m").is_some() || g.edge_between("y", "m").is_some());
    }
}
