//! Algorithms over ascending, duplicate-free doc id lists.
//!
//! The free functions only look at the lists they are given; [`Merger`] additionally reads
//! positions from a [`PositionalIndex`] for phrase and proximity queries.

use crate::index::{DocId, Position, PositionalIndex};
use std::cmp::Ordering;

/// Two-pointer intersection.
pub fn and_merge(list1: &[DocId], list2: &[DocId]) -> Vec<DocId> {
    let mut answer = Vec::with_capacity(list1.len().min(list2.len()));
    let (mut i, mut j) = (0, 0);
    while i < list1.len() && j < list2.len() {
        match list1[i].cmp(&list2[j]) {
            Ordering::Equal => {
                answer.push(list1[i]);
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    answer
}

fn skip_stride(len: usize) -> usize {
    ((len as f64).sqrt() as usize).max(1)
}

/// Intersection with skip pointers of stride `floor(sqrt(len))`; same output as [`and_merge`].
pub fn and_merge_fast(list1: &[DocId], list2: &[DocId]) -> Vec<DocId> {
    let skip1 = skip_stride(list1.len());
    let skip2 = skip_stride(list2.len());
    let mut answer = Vec::with_capacity(list1.len().min(list2.len()));
    let (mut i, mut j) = (0, 0);
    while i < list1.len() && j < list2.len() {
        match list1[i].cmp(&list2[j]) {
            Ordering::Equal => {
                answer.push(list1[i]);
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                if i % skip1 == 0 && i + skip1 < list1.len() && list1[i + skip1] < list2[j] {
                    i += skip1;
                } else {
                    i += 1;
                }
            }
            Ordering::Greater => {
                if j % skip2 == 0 && j + skip2 < list2.len() && list2[j + skip2] < list1[i] {
                    j += skip2;
                } else {
                    j += 1;
                }
            }
        }
    }
    answer
}

/// Sorted union.
pub fn or_merge(list1: &[DocId], list2: &[DocId]) -> Vec<DocId> {
    let mut answer = Vec::with_capacity(list1.len() + list2.len());
    let (mut i, mut j) = (0, 0);
    while i < list1.len() && j < list2.len() {
        match list1[i].cmp(&list2[j]) {
            Ordering::Equal => {
                answer.push(list1[i]);
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                answer.push(list1[i]);
                i += 1;
            }
            Ordering::Greater => {
                answer.push(list2[j]);
                j += 1;
            }
        }
    }
    answer.extend_from_slice(&list1[i..]);
    answer.extend_from_slice(&list2[j..]);
    answer
}

/// Every doc id in `1..=document_count` that is absent from `list`.
pub fn not_merge(list: &[DocId], document_count: DocId) -> Vec<DocId> {
    let mut answer = Vec::with_capacity((document_count as usize).saturating_sub(list.len()));
    let mut i = 0;
    for doc_id in 1..=document_count {
        while i < list.len() && list[i] < doc_id {
            i += 1;
        }
        if i < list.len() && list[i] == doc_id {
            i += 1;
        } else {
            answer.push(doc_id);
        }
    }
    answer
}

/// Set difference `list1 - list2`.
pub fn and_not_merge(list1: &[DocId], list2: &[DocId]) -> Vec<DocId> {
    let mut answer = Vec::with_capacity(list1.len());
    let (mut i, mut j) = (0, 0);
    while i < list1.len() && j < list2.len() {
        match list1[i].cmp(&list2[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Greater => j += 1,
            Ordering::Less => {
                answer.push(list1[i]);
                i += 1;
            }
        }
    }
    answer.extend_from_slice(&list1[i..]);
    answer
}

/// `list1 ∪ complement(list2)` over `1..=document_count`, without building the complement.
///
/// Walks `list2`: the gap before each of its ids is emitted wholesale, the id itself only if
/// `list1` has it. Ids of `list1` beyond the universe are kept at the end.
pub fn or_not_merge(list1: &[DocId], list2: &[DocId], document_count: DocId) -> Vec<DocId> {
    let mut answer = Vec::with_capacity(document_count as usize);
    let mut i = 0;
    let mut next: DocId = 1;
    for &excluded in list2.iter().take_while(|&&d| d <= document_count) {
        if excluded < next {
            continue;
        }
        answer.extend(next..excluded);
        while i < list1.len() && list1[i] < excluded {
            i += 1;
        }
        if i < list1.len() && list1[i] == excluded {
            answer.push(excluded);
            i += 1;
        }
        next = excluded + 1;
    }
    if next <= document_count {
        answer.extend(next..=document_count);
    }
    answer.extend(list1.iter().copied().filter(|&d| d > document_count));
    answer
}

/// True if some pair of positions is at most `k` apart.
fn within_distance(positions1: &[Position], positions2: &[Position], k: u32) -> bool {
    let (mut a, mut b) = (0, 0);
    while a < positions1.len() && b < positions2.len() {
        if positions1[a].abs_diff(positions2[b]) <= k {
            return true;
        }
        if positions1[a] < positions2[b] {
            a += 1;
        } else {
            b += 1;
        }
    }
    false
}

/// Positional algorithms, reading postings from the index.
#[derive(Clone, Copy)]
pub struct Merger<'a> {
    index: &'a PositionalIndex,
}

impl<'a> Merger<'a> {
    pub fn new(index: &'a PositionalIndex) -> Self {
        Self { index }
    }

    /// Documents where `term1` and `term2` occur within `k` positions of each other, in either order.
    pub fn positional_intersect(&self, term1: &str, term2: &str, k: u32) -> Vec<DocId> {
        let docs1 = self.index.get_document_list(term1);
        let docs2 = self.index.get_document_list(term2);
        and_merge(&docs1, &docs2)
            .into_iter()
            .filter(|&doc_id| {
                within_distance(
                    self.index.get_positions_in_document(term1, doc_id),
                    self.index.get_positions_in_document(term2, doc_id),
                    k,
                )
            })
            .collect()
    }

    /// Documents containing the terms at consecutive positions, for phrases of any length.
    pub fn phrase_query<S: AsRef<str>>(&self, phrase: &[S]) -> Vec<DocId> {
        let Some((first, rest)) = phrase.split_first() else {
            return Vec::new();
        };
        let mut candidates = self.index.get_document_list(first.as_ref());
        for term in rest {
            if candidates.is_empty() {
                break;
            }
            candidates = and_merge_fast(&candidates, &self.index.get_document_list(term.as_ref()));
        }
        candidates
            .into_iter()
            .filter(|&doc_id| {
                let lists: Vec<&[Position]> = phrase
                    .iter()
                    .map(|t| self.index.get_positions_in_document(t.as_ref(), doc_id))
                    .collect();
                lists[0].iter().any(|&anchor| {
                    lists.iter().enumerate().skip(1).all(|(offset, positions)| {
                        anchor
                            .checked_add(offset as Position)
                            .is_some_and(|want| positions.binary_search(&want).is_ok())
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_pointers_jump_over_long_runs() {
        let long: Vec<DocId> = (1..=100).collect();
        assert_eq!(and_merge_fast(&long, &[3, 50, 99, 150]), vec![3, 50, 99]);
        assert_eq!(and_merge_fast(&[3, 50, 99, 150], &long), vec![3, 50, 99]);
        assert!(and_merge_fast(&[], &long).is_empty());
    }

    #[test]
    fn not_merge_complements_universe() {
        assert_eq!(not_merge(&[2, 4], 5), vec![1, 3, 5]);
        assert!(not_merge(&[], 0).is_empty());
        assert_eq!(not_merge(&[], 3), vec![1, 2, 3]);
    }

    #[test]
    fn and_not_keeps_tail_of_first_list() {
        assert_eq!(and_not_merge(&[1, 3, 5, 7, 9], &[3, 4]), vec![1, 5, 7, 9]);
        assert_eq!(and_not_merge(&[], &[1]), Vec::<DocId>::new());
    }

    #[test]
    fn or_not_fills_gaps() {
        // complement of [2, 5] in 1..=6 is [1, 3, 4, 6]; union with [5] adds 5
        assert_eq!(or_not_merge(&[5], &[2, 5], 6), vec![1, 3, 4, 5, 6]);
        assert_eq!(or_not_merge(&[], &[], 3), vec![1, 2, 3]);
        assert_eq!(or_not_merge(&[2], &[1, 2, 3], 3), vec![2]);
    }

    #[test]
    fn proximity_distance_is_inclusive() {
        let mut ix = PositionalIndex::new(2);
        for (term, doc, pos) in [
            ("information", 1, 3),
            ("retrieval", 1, 5),
            ("information", 1, 10),
            ("retrieval", 1, 12),
            ("information", 2, 3),
            ("retrieval", 2, 6),
        ] {
            ix.add_position(term, doc, pos);
        }
        let merger = Merger::new(&ix);
        assert_eq!(merger.positional_intersect("information", "retrieval", 2), vec![1]);
        assert_eq!(merger.positional_intersect("retrieval", "information", 3), vec![1, 2]);
    }

    #[test]
    fn phrase_requires_adjacency_for_every_pair() {
        let mut ix = PositionalIndex::new(2);
        for (pos, term) in ["the", "library", "of", "congress"].iter().enumerate() {
            ix.add_position(term, 7, pos as Position + 3);
        }
        for (pos, term) in ["library", "and", "of", "the", "congress"].iter().enumerate() {
            ix.add_position(term, 9, pos as Position);
        }
        let merger = Merger::new(&ix);
        assert_eq!(merger.phrase_query(&["library", "of", "congress"]), vec![7]);
        assert_eq!(merger.phrase_query(&["the", "library", "of", "congress"]), vec![7]);
        assert_eq!(merger.phrase_query(&["of", "the"]), vec![9]);
        assert!(merger.phrase_query::<&str>(&[]).is_empty());
    }
}
