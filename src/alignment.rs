//! Sentence level alignment of two revisions.
//!
//! [`align`] partitions both sentence sequences into [`AlignedSpan`]s. Sentences with the same
//! [`anchor_key`] are the anchors; a minimal diff over the keys keeps as many anchors as possible
//! and every maximal gap between them becomes one inserted, deleted or replaced span.
//!
//! [`decompose`] then splits a replaced span into the sentence groups that correspond to each
//! other.

use std::{borrow::Cow, ops::Range};

use imara_diff::{
    intern::{Interner, Token},
    Algorithm,
};

use crate::{
    scoring::Scorer,
    utils::{anchor_key, join_sentences},
};

/// Largest number of sentences on one side of a decomposed group.
pub const MAX_GROUP_SIZE: usize = 3;
/// Replaced spans with more cells than this are paired positionally.
pub const MAX_DECOMPOSITION_CELLS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Position in the sentence sequence of its revision.
    pub index: usize,
    pub text: String,
}

impl Sentence {
    pub fn sequence(texts: impl IntoIterator<Item = String>) -> Vec<Sentence> {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Sentence { index, text })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Unchanged,
    Inserted,
    Deleted,
    Replaced,
}

/// A run of old sentences mapped to a run of new sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSpan {
    pub kind: SpanKind,
    pub old: Range<usize>,
    pub new: Range<usize>,
}

impl AlignedSpan {
    fn gap(old: Range<usize>, new: Range<usize>) -> Self {
        let kind = match (old.is_empty(), new.is_empty()) {
            (true, _) => SpanKind::Inserted,
            (false, true) => SpanKind::Deleted,
            (false, false) => SpanKind::Replaced,
        };
        AlignedSpan { kind, old, new }
    }
}

fn to_usize(range: Range<u32>) -> Range<usize> {
    range.start as usize..range.end as usize
}

/// Align two sentence sequences.
///
/// The spans are ordered and cover every sentence of both sides exactly once. Two empty inputs
/// give no spans.
pub fn align(old: &[Sentence], new: &[Sentence]) -> Vec<AlignedSpan> {
    let mut interner: Interner<Cow<'_, str>> = Interner::new(old.len() + new.len());
    let old_tokens: Vec<Token> = old
        .iter()
        .map(|sentence| interner.intern(anchor_key(&sentence.text)))
        .collect();
    let new_tokens: Vec<Token> = new
        .iter()
        .map(|sentence| interner.intern(anchor_key(&sentence.text)))
        .collect();

    let mut hunks: Vec<(Range<usize>, Range<usize>)> = Vec::new();
    imara_diff::diff_with_tokens(
        Algorithm::MyersMinimal,
        &old_tokens,
        &new_tokens,
        interner.num_tokens(),
        |before: Range<u32>, after: Range<u32>| {
            let (before, after) = (to_usize(before), to_usize(after));
            match hunks.last_mut() {
                // touching hunks form a single gap
                Some((last_old, last_new))
                    if last_old.end == before.start && last_new.end == after.start =>
                {
                    last_old.end = before.end;
                    last_new.end = after.end;
                }
                _ => hunks.push((before, after)),
            }
        },
    );

    let mut spans = Vec::with_capacity(hunks.len() * 2 + 1);
    let (mut old_pos, mut new_pos) = (0, 0);
    for (before, after) in hunks {
        if before.start > old_pos {
            spans.push(AlignedSpan {
                kind: SpanKind::Unchanged,
                old: old_pos..before.start,
                new: new_pos..after.start,
            });
        }
        old_pos = before.end;
        new_pos = after.end;
        spans.push(AlignedSpan::gap(before, after));
    }
    if old_pos < old.len() {
        spans.push(AlignedSpan {
            kind: SpanKind::Unchanged,
            old: old_pos..old.len(),
            new: new_pos..new.len(),
        });
    }

    spans
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Move {
    SkipOld,
    SkipNew,
    Group(usize, usize),
}

impl Move {
    fn step(self) -> (usize, usize) {
        match self {
            Move::SkipOld => (1, 0),
            Move::SkipNew => (0, 1),
            Move::Group(a, b) => (a, b),
        }
    }
}

// smaller groups first, so they win ties
const GROUPS: [(usize, usize); 5] = [(1, 1), (1, 2), (2, 1), (1, 3), (3, 1)];
const EPSILON: f64 = 1e-9;

/// Split a replaced span into corresponding sentence groups.
///
/// Returns `(old, new)` index ranges relative to the two runs, in order. Each group has one
/// sentence on at least one side and at most [`MAX_GROUP_SIZE`] on the other. Sentences left out
/// count as inserted or deleted.
///
/// The groups minimize `skipped sentences + sum(a + b - 2 * ratio)` over all groups, where `a`
/// and `b` are the group sizes and `ratio` is the word similarity of the joined group texts.
pub fn decompose<C: Scorer>(
    old: &[Sentence],
    new: &[Sentence],
    scorer: &C,
) -> Vec<(Range<usize>, Range<usize>)> {
    let (n, m) = (old.len(), new.len());
    if n == 0 || m == 0 {
        return Vec::new();
    }
    if n * m > MAX_DECOMPOSITION_CELLS {
        tracing::debug!(
            message = "Replaced span too large for decomposition, pairing positionally",
            old_sentences = n,
            new_sentences = m
        );
        return (0..n.min(m)).map(|i| (i..i + 1, i..i + 1)).collect();
    }

    let width = m + 1;
    let cell = |i: usize, j: usize| i * width + j;

    // cost[cell(i, j)] aligns old[i..] with new[j..]
    let mut cost = vec![0.0f64; (n + 1) * width];
    let mut choice = vec![Move::SkipOld; (n + 1) * width];

    for i in (0..=n).rev() {
        for j in (0..=m).rev() {
            if i == n && j == m {
                continue;
            }

            let mut best: Option<(f64, Move)> = None;
            let mut consider = |candidate: f64, mv: Move| match best {
                Some((best_cost, _)) if candidate >= best_cost - EPSILON => {}
                _ => best = Some((candidate, mv)),
            };

            for (a, b) in GROUPS {
                if i + a > n || j + b > m {
                    continue;
                }
                let old_text = join_sentences(old[i..i + a].iter().map(|s| s.text.as_str()));
                let new_text = join_sentences(new[j..j + b].iter().map(|s| s.text.as_str()));
                let ratio = scorer.ratio(&old_text, &new_text);
                let group_cost = (a + b) as f64 - 2.0 * ratio;
                consider(group_cost + cost[cell(i + a, j + b)], Move::Group(a, b));
            }
            if i < n {
                consider(1.0 + cost[cell(i + 1, j)], Move::SkipOld);
            }
            if j < m {
                consider(1.0 + cost[cell(i, j + 1)], Move::SkipNew);
            }

            if let Some((best_cost, mv)) = best {
                cost[cell(i, j)] = best_cost;
                choice[cell(i, j)] = mv;
            }
        }
    }

    let mut groups = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        let mv = choice[cell(i, j)];
        let (a, b) = mv.step();
        if let Move::Group(..) = mv {
            groups.push((i..i + a, j..j + b));
        }
        i += a;
        j += b;
    }
    groups
}
