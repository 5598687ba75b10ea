//! Boolean query AST and the parser that builds it.
//!
//! A query is a list of conjuncts that get AND-ed together. Each conjunct alternates
//! control operators and operands, e.g. `NOT a b OR c` becomes
//! `[Control(LeadingNot), Phrase([a, b]), Control(Or), Term(c)]`.

use crate::error::QueryError;
use crate::tokenizer::normalize_term;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    static ref PROXIMITY: Regex = Regex::new(r"^\\(\d+)$").expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlOp {
    /// Conjunct opens with a negated operand and also contains an OR.
    LeadingNot,
    /// Conjunct is a single negated operand.
    AndNot,
    Or,
    /// OR whose right operand is negated.
    OrNot,
}

/// Handle to an intermediate result list, valid for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Term(String),
    Proximity { left: String, right: String, distance: u32 },
    Phrase(Vec<String>),
    Result(ResultId),
    Control(ControlOp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conjunct {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub conjuncts: Vec<Conjunct>,
}

/// Location of one term inside a [`Query`]; `term` indexes into a proximity or phrase group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSlot {
    pub conjunct: usize,
    pub node: usize,
    pub term: usize,
}

impl Query {
    /// Every term of every operand group, in reading order.
    pub fn term_slots(&self) -> Vec<(TermSlot, &str)> {
        let mut out = Vec::new();
        for (c, conjunct) in self.conjuncts.iter().enumerate() {
            for (n, node) in conjunct.nodes.iter().enumerate() {
                let slot = |term| TermSlot { conjunct: c, node: n, term };
                match node {
                    Node::Term(t) => out.push((slot(0), t.as_str())),
                    Node::Proximity { left, right, .. } => {
                        out.push((slot(0), left.as_str()));
                        out.push((slot(1), right.as_str()));
                    }
                    Node::Phrase(terms) => {
                        out.extend(terms.iter().enumerate().map(|(i, t)| (slot(i), t.as_str())));
                    }
                    Node::Result(_) | Node::Control(_) => {}
                }
            }
        }
        out
    }

    /// Returns false if `slot` does not point at a term.
    pub fn replace_term(&mut self, slot: TermSlot, replacement: &str) -> bool {
        let node = self.conjuncts.get_mut(slot.conjunct).and_then(|c| c.nodes.get_mut(slot.node));
        let target = match (node, slot.term) {
            (Some(Node::Term(t)), 0) => t,
            (Some(Node::Proximity { left, .. }), 0) => left,
            (Some(Node::Proximity { right, .. }), 1) => right,
            (Some(Node::Phrase(terms)), i) => match terms.get_mut(i) {
                Some(t) => t,
                None => return false,
            },
            _ => return false,
        };
        *target = replacement.to_string();
        true
    }

    /// Replace every occurrence of `from`; returns how many were replaced.
    pub fn replace_all_terms(&mut self, from: &str, to: &str) -> usize {
        let slots: Vec<TermSlot> =
            self.term_slots().into_iter().filter(|(_, t)| *t == from).map(|(slot, _)| slot).collect();
        slots.into_iter().filter(|&slot| self.replace_term(slot, to)).count()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Term(t) => write!(f, "{t}"),
            Node::Proximity { left, right, distance } => write!(f, "{left} \\{distance} {right}"),
            Node::Phrase(terms) => write!(f, "\"{}\"", terms.join(" ")),
            Node::Result(id) => write!(f, "#{}", id.0),
            Node::Control(ControlOp::LeadingNot | ControlOp::AndNot) => write!(f, "NOT"),
            Node::Control(ControlOp::Or) => write!(f, "OR"),
            Node::Control(ControlOp::OrNot) => write!(f, "OR NOT"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conjunct) in self.conjuncts.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            for (j, node) in conjunct.nodes.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{node}")?;
            }
        }
        Ok(())
    }
}

fn is_control(token: &str) -> bool {
    matches!(token, "AND" | "OR" | "NOT")
}

/// Parse a raw boolean query. Quotes and parentheses are ignored; the string is split into
/// conjuncts on the `AND` keyword (operators are case-sensitive).
pub fn tokenize_query(raw: &str) -> Result<Query, QueryError> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '"' | '(' | ')')).collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(QueryError::EmptyQuery);
    }
    let mut conjuncts = Vec::new();
    for (i, segment) in tokens.split(|t| *t == "AND").enumerate() {
        if segment.is_empty() {
            return Err(QueryError::EmptyConjunct(i));
        }
        conjuncts.push(parse_conjunct(segment)?);
    }
    Ok(Query { conjuncts })
}

fn parse_conjunct(segment: &[&str]) -> Result<Conjunct, QueryError> {
    if let [single] = segment {
        if is_control(single) {
            return Err(QueryError::DanglingOperator(single.to_string()));
        }
        return Ok(Conjunct { nodes: vec![parse_operand(segment)?] });
    }

    let has_or = segment.contains(&"OR");
    let mut nodes = Vec::new();
    let mut pos = 0;
    loop {
        if let Some((op, width)) = classify(&segment[pos..], pos == 0, has_or)? {
            nodes.push(Node::Control(op));
            pos += width;
        }
        let end = segment[pos..].iter().position(|t| is_control(t)).map_or(segment.len(), |o| pos + o);
        if end == pos {
            let op = pos.checked_sub(1).map_or("", |p| segment[p]);
            return Err(QueryError::DanglingOperator(op.to_string()));
        }
        nodes.push(parse_operand(&segment[pos..end])?);
        pos = end;
        if pos == segment.len() {
            return Ok(Conjunct { nodes });
        }
    }
}

/// Classifies the control word at the head of `window`, returning the operator and how many
/// tokens it spans. `None` if the window starts with an operand.
fn classify(window: &[&str], at_start: bool, has_or: bool) -> Result<Option<(ControlOp, usize)>, QueryError> {
    match window {
        ["OR", "NOT", ..] if !at_start => Ok(Some((ControlOp::OrNot, 2))),
        ["OR", ..] if !at_start => Ok(Some((ControlOp::Or, 1))),
        ["NOT", ..] if at_start => {
            let op = if has_or { ControlOp::LeadingNot } else { ControlOp::AndNot };
            Ok(Some((op, 1)))
        }
        [op, ..] if is_control(op) => Err(QueryError::MisplacedOperator(op.to_string())),
        _ => Ok(None),
    }
}

fn parse_operand(group: &[&str]) -> Result<Node, QueryError> {
    let markers: Vec<usize> =
        group.iter().enumerate().filter(|(_, t)| t.starts_with('\\')).map(|(i, _)| i).collect();
    if markers.is_empty() {
        let mut terms: Vec<String> =
            group.iter().map(|t| normalize_term(t)).filter(|t| !t.is_empty()).collect();
        return match terms.len() {
            0 => Err(QueryError::EmptyOperand(group.join(" "))),
            1 => Ok(Node::Term(terms.remove(0))),
            _ => Ok(Node::Phrase(terms)),
        };
    }

    if group.len() != 3 || markers != [1] {
        return Err(QueryError::ProximityArity(group.join(" ")));
    }
    let distance = PROXIMITY
        .captures(group[1])
        .and_then(|c| c[1].parse::<u32>().ok())
        .ok_or_else(|| QueryError::MalformedProximity(group[1].to_string()))?;
    let side = |raw: &str| {
        let term = normalize_term(raw);
        if term.is_empty() { Err(QueryError::EmptyOperand(raw.to_string())) } else { Ok(term) }
    };
    Ok(Node::Proximity { left: side(group[0])?, right: side(group[2])?, distance })
}
