//! Word-level diff between two HTML bodies based on the longest common
//! subsequence of their visible words.

use super::text::{strip_html, words};
use serde::Serialize;

/// Largest word count per side the quadratic table is built for.
pub const MAX_DIFF_WORDS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Same,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSegment {
    pub kind: DiffKind,
    pub text: String,
}

impl DiffSegment {
    pub fn new(kind: DiffKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Diff the visible text of two HTML documents word by word.
///
/// Adjacent words of the same kind are merged into one segment. When
/// either side exceeds [`MAX_DIFF_WORDS`] the table is not built and the
/// result is a single removal of the old text followed by a single
/// addition of the new text.
pub fn diff(old_html: &str, new_html: &str) -> Vec<DiffSegment> {
    let old_text = strip_html(old_html);
    let new_text = strip_html(new_html);
    let old_words = words(&old_text);
    let new_words = words(&new_text);

    if old_words.len() > MAX_DIFF_WORDS || new_words.len() > MAX_DIFF_WORDS {
        tracing::warn!(
            "Skipping word diff: {} old / {} new words exceeds limit of {}",
            old_words.len(),
            new_words.len(),
            MAX_DIFF_WORDS
        );
        return coarse_diff(&old_text, &new_text);
    }

    merge_segments(lcs_backtrack(&old_words, &new_words))
}

/// Per-word segments in forward order.
///
/// On equal scores the walk steps through the new sequence first, so an
/// addition is emitted before the removal it competes with is reached.
fn lcs_backtrack<'a>(old_words: &[&'a str], new_words: &[&'a str]) -> Vec<(DiffKind, &'a str)> {
    let m = old_words.len();
    let n = new_words.len();

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if old_words[i - 1] == new_words[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut segments = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_words[i - 1] == new_words[j - 1] {
            segments.push((DiffKind::Same, old_words[i - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            segments.push((DiffKind::Added, new_words[j - 1]));
            j -= 1;
        } else {
            segments.push((DiffKind::Removed, old_words[i - 1]));
            i -= 1;
        }
    }

    segments.reverse();
    segments
}

fn merge_segments(words: Vec<(DiffKind, &str)>) -> Vec<DiffSegment> {
    let mut merged: Vec<DiffSegment> = Vec::new();
    for (kind, word) in words {
        match merged.last_mut() {
            Some(last) if last.kind == kind => {
                last.text.push(' ');
                last.text.push_str(word);
            }
            _ => merged.push(DiffSegment::new(kind, word)),
        }
    }
    merged
}

fn coarse_diff(old_text: &str, new_text: &str) -> Vec<DiffSegment> {
    if old_text == new_text {
        return vec![DiffSegment::new(DiffKind::Same, old_text)];
    }

    let mut segments = Vec::with_capacity(2);
    if !old_text.is_empty() {
        segments.push(DiffSegment::new(DiffKind::Removed, old_text));
    }
    if !new_text.is_empty() {
        segments.push(DiffSegment::new(DiffKind::Added, new_text));
    }
    segments
}

/// Number of words added and removed across `segments`.
pub fn diff_stats(segments: &[DiffSegment]) -> (usize, usize) {
    segments.iter().fold((0, 0), |(added, removed), segment| {
        let count = words(&segment.text).len();
        match segment.kind {
            DiffKind::Added => (added + count, removed),
            DiffKind::Removed => (added, removed + count),
            DiffKind::Same => (added, removed),
        }
    })
}
