//! Sentence-to-page and sentence-to-fragment mapping.
//!
//! Extraction order is not reading order and fragment boundaries rarely line
//! up with sentence boundaries, so the default strategy scores fragments by
//! how many of a sentence's significant words they contain. The offset-based
//! strategy is kept for documents whose fragments concatenate cleanly.

use crate::document::{Sentence, TextFragment, page_text};
use crate::highlight::canvas_rect;
use crate::text_utils::{count_sentences, match_form, significant_words, split_sentences};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

/// Minimum significant-word hits for a completed-sentence marker.
const MIN_COMPLETED_SCORE: f64 = 2.0;
/// Share of a sentence's significant words a completed marker must cover.
const COMPLETED_SCORE_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum LocatorStrategy {
    Exact,
    #[default]
    WordOverlap,
}

impl std::fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorStrategy::Exact => write!(f, "exact"),
            LocatorStrategy::WordOverlap => write!(f, "word-overlap"),
        }
    }
}

/// Best-scoring fragment for a sentence on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentMatch {
    pub fragment_index: usize,
    pub score: usize,
}

/// Fragments to paint for the current sentence and for already-read ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightPlan {
    pub current: Vec<usize>,
    pub completed: Vec<usize>,
}

impl HighlightPlan {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.completed.is_empty()
    }
}

/// Sentence sequence plus the per-page bookkeeping needed to locate them.
///
/// Built once per loaded document; nothing here depends on zoom.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    sentences: Vec<Sentence>,
    page_texts: Vec<String>,
    /// Sentence count of `' ' + page_1 + ' ' + ... + page_n`, per page.
    cumulative_counts: Vec<usize>,
}

impl DocumentIndex {
    /// `page_texts[0]` is page 1.
    pub fn build(page_texts: Vec<String>) -> Self {
        let mut cumulative = String::new();
        let mut cumulative_counts = Vec::with_capacity(page_texts.len());
        for text in &page_texts {
            cumulative.push(' ');
            cumulative.push_str(text);
            cumulative_counts.push(count_sentences(&cumulative));
        }
        let sentences = split_sentences(&page_texts.join(" "))
            .into_iter()
            .enumerate()
            .map(|(index, text)| Sentence { index, text })
            .collect::<Vec<_>>();
        debug!(
            pages = page_texts.len(),
            sentences = sentences.len(),
            "Built document sentence index"
        );
        Self {
            sentences,
            page_texts,
            cumulative_counts,
        }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.page_texts.len()
    }

    /// First 1-indexed page whose cumulative sentence count exceeds `index`.
    pub fn target_page(&self, index: usize) -> Option<usize> {
        self.cumulative_counts
            .iter()
            .position(|count| *count > index)
            .map(|idx| idx + 1)
    }

    /// Sentence the reader most plausibly meant by pointing at a fragment:
    /// the last one started in the document text up to and including it.
    pub fn sentence_at_fragment(&self, fragments: &[TextFragment], fragment_index: usize) -> Option<usize> {
        if self.sentences.is_empty() {
            return None;
        }
        let page_number = fragments.get(fragment_index)?.page_number;
        let mut prefix = String::new();
        for text in self.page_texts.iter().take(page_number.saturating_sub(1)) {
            prefix.push(' ');
            prefix.push_str(text);
        }
        prefix.push(' ');
        prefix.push_str(&page_text(&fragments[..=fragment_index]));

        let started = count_sentences(&prefix);
        Some(started.saturating_sub(1).min(self.sentences.len() - 1))
    }
}

/// Sentence index to page and fragment resolution with a fixed strategy.
#[derive(Debug, Clone)]
pub struct FragmentLocator {
    strategy: LocatorStrategy,
}

impl FragmentLocator {
    pub fn new(strategy: LocatorStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> LocatorStrategy {
        self.strategy
    }

    /// Work out what to paint on `page_number` while `current` is spoken.
    ///
    /// Returns an empty plan when nothing scores; callers skip painting.
    pub fn plan(
        &self,
        index: &DocumentIndex,
        current: usize,
        page_number: usize,
        fragments: &[TextFragment],
    ) -> HighlightPlan {
        let Some(sentence) = index.sentence(current) else {
            return HighlightPlan::default();
        };
        let plan = match self.strategy {
            LocatorStrategy::Exact => HighlightPlan {
                current: exact_fragments(&sentence.text, fragments),
                completed: Vec::new(),
            },
            LocatorStrategy::WordOverlap => {
                let lowered = lowered_fragments(fragments);
                let current_match = best_match(&sentence.text, &lowered);
                let mut completed = Vec::new();
                for previous in index.sentences().iter().take(current) {
                    // Markers are only meaningful for sentences attributed to this page.
                    if index.target_page(previous.index) != Some(page_number) {
                        continue;
                    }
                    if let Some(hit) = completed_match(&previous.text, &lowered) {
                        if !completed.contains(&hit.fragment_index) {
                            completed.push(hit.fragment_index);
                        }
                    }
                }
                HighlightPlan {
                    current: current_match.map(|hit| vec![hit.fragment_index]).unwrap_or_default(),
                    completed,
                }
            }
        };
        if plan.current.is_empty() {
            debug!(
                sentence_idx = current,
                page = page_number,
                strategy = %self.strategy,
                "No fragment matched sentence; skipping highlight"
            );
        }
        plan
    }
}

/// Fragment texts in match form, computed once per page pass.
fn lowered_fragments(fragments: &[TextFragment]) -> Vec<String> {
    fragments.iter().map(|fragment| match_form(&fragment.text)).collect()
}

fn score(words: &[String], lowered_fragment: &str) -> usize {
    words
        .iter()
        .filter(|word| lowered_fragment.contains(word.as_str()))
        .count()
}

fn best_match(sentence: &str, lowered: &[String]) -> Option<FragmentMatch> {
    let words = significant_words(sentence);
    if words.is_empty() {
        return None;
    }
    let mut best: Option<FragmentMatch> = None;
    for (fragment_index, text) in lowered.iter().enumerate() {
        let score = score(&words, text);
        if score > 0 && best.is_none_or(|current| score > current.score) {
            best = Some(FragmentMatch {
                fragment_index,
                score,
            });
        }
    }
    best
}

/// Hits required before a previous sentence earns a completed marker.
pub fn completion_threshold(significant_word_count: usize) -> f64 {
    MIN_COMPLETED_SCORE.max(COMPLETED_SCORE_RATIO * significant_word_count as f64)
}

/// Single highest-scoring fragment for `sentence`; ties go to the earliest.
pub fn best_fragment(sentence: &str, fragments: &[TextFragment]) -> Option<FragmentMatch> {
    best_match(sentence, &lowered_fragments(fragments))
}

fn completed_match(sentence: &str, lowered: &[String]) -> Option<FragmentMatch> {
    let needed = completion_threshold(significant_words(sentence).len());
    best_match(sentence, lowered).filter(|hit| hit.score as f64 >= needed)
}

/// Offset-range strategy: every fragment overlapping the sentence's first
/// occurrence in the concatenated page text.
pub fn exact_fragments(sentence: &str, fragments: &[TextFragment]) -> Vec<usize> {
    let needle = sentence.trim();
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack = page_text(fragments);
    let Some(start) = haystack.find(needle) else {
        return Vec::new();
    };
    let end = start + needle.len();

    let mut offset = 0;
    let mut hits = Vec::new();
    for (idx, fragment) in fragments.iter().enumerate() {
        let fragment_end = offset + fragment.text.len();
        if offset < end && fragment_end > start {
            hits.push(idx);
        }
        offset = fragment_end;
    }
    hits
}

/// Fragment whose canvas rectangle lies closest to a click, within `max_distance` px.
pub fn nearest_fragment(
    fragments: &[TextFragment],
    click_x: f32,
    click_y: f32,
    scale: f32,
    canvas_height: f32,
    max_distance: f32,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, fragment) in fragments.iter().enumerate() {
        let rect = canvas_rect(fragment, scale, canvas_height);
        let dx = (rect.x - click_x).max(click_x - (rect.x + rect.width)).max(0.0);
        let dy = (rect.y - click_y).max(click_y - (rect.y + rect.height)).max(0.0);
        let distance = dx.hypot(dy);
        if distance < max_distance && best.is_none_or(|(_, closest)| distance < closest) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}
