//! Evaluates a parsed query against the index.
//!
//! Evaluation order: spelling correction, phrase/proximity groups, leading negations,
//! OR / OR NOT chains, then AND across conjuncts, smallest estimated result first.

use crate::config::SearchConfig;
use crate::error::QueryError;
use crate::index::{DocId, PositionalIndex};
use crate::merge::{and_merge, and_not_merge, not_merge, or_merge, or_not_merge, Merger};
use crate::query::{tokenize_query, ControlOp, Node, Query, ResultId};
use crate::spelling::{Correction, SpellingController};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::debug;

/// Chooses among corrected variants of a query. Returning `None` keeps the literal term.
pub trait CorrectionSelector {
    fn select(&mut self, corrections: &[Correction]) -> Option<usize>;
}

/// Always takes the closest suggestion.
#[derive(Debug, Default, Clone, Copy)]
pub struct BestCandidate;

impl CorrectionSelector for BestCandidate {
    fn select(&mut self, corrections: &[Correction]) -> Option<usize> {
        (!corrections.is_empty()).then_some(0)
    }
}

impl<F> CorrectionSelector for F
where
    F: FnMut(&[Correction]) -> Option<usize>,
{
    fn select(&mut self, corrections: &[Correction]) -> Option<usize> {
        self(corrections)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedCorrection {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// The query actually evaluated, after corrections.
    pub query: String,
    pub doc_ids: Vec<DocId>,
    pub corrections: Vec<AppliedCorrection>,
}

/// Intermediate lists of one evaluation, addressed by [`ResultId`].
#[derive(Default)]
struct ResultArena {
    lists: Vec<Vec<DocId>>,
}

impl ResultArena {
    fn store(&mut self, list: Vec<DocId>) -> ResultId {
        self.lists.push(list);
        ResultId(self.lists.len() - 1)
    }

    fn take(&mut self, id: ResultId) -> Vec<DocId> {
        self.lists.get_mut(id.0).map(std::mem::take).unwrap_or_default()
    }
}

/// A fully resolved conjunct. `Negated` holds the list whose complement it stands for.
#[derive(Debug)]
enum Resolved {
    Docs(Vec<DocId>),
    Negated(Vec<DocId>),
}

impl Resolved {
    fn estimate(&self, document_count: DocId) -> usize {
        match self {
            Resolved::Docs(docs) => docs.len(),
            Resolved::Negated(docs) => (document_count as usize).saturating_sub(docs.len()),
        }
    }
}

pub struct QueryProcessor<'a> {
    index: &'a PositionalIndex,
    document_count: DocId,
    config: SearchConfig,
}

impl<'a> QueryProcessor<'a> {
    /// `document_count` is the highest doc id; NOT is taken over `1..=document_count`.
    pub fn new(index: &'a PositionalIndex, document_count: DocId) -> Self {
        Self::with_config(index, document_count, SearchConfig::default())
    }

    pub fn with_config(index: &'a PositionalIndex, document_count: DocId, config: SearchConfig) -> Self {
        Self { index, document_count, config }
    }

    /// Parse, auto-correct with the best suggestion, and evaluate.
    pub fn process_query(&self, raw: &str) -> Result<Vec<DocId>, QueryError> {
        Ok(self.process_query_with(raw, &mut BestCandidate)?.doc_ids)
    }

    pub fn process_query_with(
        &self,
        raw: &str,
        selector: &mut dyn CorrectionSelector,
    ) -> Result<QueryOutcome, QueryError> {
        let parsed = tokenize_query(raw)?;
        let (query, corrections) = self.correct(parsed, selector);
        let rendered = query.to_string();
        let doc_ids = self.evaluate(query);
        debug!(query = %rendered, hits = doc_ids.len(), "query evaluated");
        Ok(QueryOutcome { query: rendered, doc_ids, corrections })
    }

    /// Offers corrections term by term until no unknown term has suggestions left.
    fn correct(&self, mut query: Query, selector: &mut dyn CorrectionSelector) -> (Query, Vec<AppliedCorrection>) {
        let speller = SpellingController::new(self.index, &self.config);
        let mut settled: HashSet<String> = HashSet::new();
        let mut applied = Vec::new();
        loop {
            let corrections = speller.check_query_excluding(&query, &settled);
            let Some(first) = corrections.first() else {
                return (query, applied);
            };
            let original = first.original.clone();
            if let Some(chosen) = selector.select(&corrections).and_then(|i| corrections.into_iter().nth(i)) {
                let replacement = chosen.suggestion.term;
                query = chosen.query;
                query.replace_all_terms(&original, &replacement);
                applied.push(AppliedCorrection { from: original.clone(), to: replacement });
            }
            settled.insert(original);
        }
    }

    /// Evaluate an already parsed query. Unknown terms simply contribute empty lists.
    pub fn evaluate(&self, mut query: Query) -> Vec<DocId> {
        let merger = Merger::new(self.index);
        let mut arena = ResultArena::default();

        for conjunct in &mut query.conjuncts {
            for node in &mut conjunct.nodes {
                let list = match node {
                    Node::Proximity { left, right, distance } => merger.positional_intersect(left, right, *distance),
                    Node::Phrase(terms) => merger.phrase_query(terms.as_slice()),
                    _ => continue,
                };
                *node = Node::Result(arena.store(list));
            }
        }

        let mut resolved = Vec::with_capacity(query.conjuncts.len());
        for conjunct in query.conjuncts {
            let conjunct = self.resolve_conjunct(conjunct.nodes, &mut arena);
            if matches!(&conjunct, Resolved::Docs(docs) if docs.is_empty()) {
                debug!("empty conjunct, short-circuiting");
                return Vec::new();
            }
            resolved.push(conjunct);
        }
        self.reduce(resolved)
    }

    fn lookup(&self, node: &Node, arena: &mut ResultArena) -> Vec<DocId> {
        match node {
            Node::Term(term) => self.index.get_document_list(term),
            Node::Result(id) => arena.take(*id),
            Node::Proximity { left, right, distance } => {
                Merger::new(self.index).positional_intersect(left, right, *distance)
            }
            Node::Phrase(terms) => Merger::new(self.index).phrase_query(terms.as_slice()),
            Node::Control(_) => Vec::new(),
        }
    }

    fn resolve_conjunct(&self, mut nodes: Vec<Node>, arena: &mut ResultArena) -> Resolved {
        let mut negated = false;
        match nodes.first() {
            Some(Node::Control(ControlOp::AndNot)) => {
                nodes.remove(0);
                negated = true;
            }
            Some(Node::Control(ControlOp::LeadingNot)) if nodes.len() > 1 => {
                nodes.remove(0);
                let operand = self.lookup(&nodes[0], arena);
                nodes[0] = Node::Result(arena.store(not_merge(&operand, self.document_count)));
            }
            _ => {}
        }

        while let Some((pos, op)) = leftmost_binary_op(&nodes) {
            if pos == 0 || pos + 1 >= nodes.len() {
                break;
            }
            let left = self.lookup(&nodes[pos - 1], arena);
            let right = self.lookup(&nodes[pos + 1], arena);
            let merged = match op {
                ControlOp::OrNot => or_not_merge(&left, &right, self.document_count),
                _ => or_merge(&left, &right),
            };
            let id = arena.store(merged);
            nodes.drain(pos - 1..=pos + 1);
            nodes.insert(pos - 1, Node::Result(id));
        }

        if nodes.len() != 1 {
            debug!(remaining = nodes.len(), "conjunct did not reduce to a single operand");
        }
        let docs = nodes.first().map(|node| self.lookup(node, arena)).unwrap_or_default();
        if negated {
            Resolved::Negated(docs)
        } else {
            Resolved::Docs(docs)
        }
    }

    /// AND all conjuncts, always merging the two with the smallest estimated size.
    fn reduce(&self, mut resolved: Vec<Resolved>) -> Vec<DocId> {
        let n = self.document_count;
        while resolved.len() > 1 {
            resolved.sort_by_key(|r| Reverse(r.estimate(n)));
            let (Some(a), Some(b)) = (resolved.pop(), resolved.pop()) else {
                break;
            };
            let merged = match (a, b) {
                (Resolved::Docs(a), Resolved::Docs(b)) => and_merge(&a, &b),
                (Resolved::Docs(docs), Resolved::Negated(excluded))
                | (Resolved::Negated(excluded), Resolved::Docs(docs)) => and_not_merge(&docs, &excluded),
                (Resolved::Negated(a), Resolved::Negated(b)) => and_not_merge(&not_merge(&a, n), &b),
            };
            if merged.is_empty() {
                return merged;
            }
            resolved.push(Resolved::Docs(merged));
        }
        match resolved.pop() {
            Some(Resolved::Docs(docs)) => docs,
            Some(Resolved::Negated(excluded)) => not_merge(&excluded, n),
            None => Vec::new(),
        }
    }
}

fn leftmost_binary_op(nodes: &[Node]) -> Option<(usize, ControlOp)> {
    nodes.iter().enumerate().find_map(|(i, node)| match node {
        Node::Control(op @ (ControlOp::Or | ControlOp::OrNot)) => Some((i, *op)),
        _ => None,
    })
}
