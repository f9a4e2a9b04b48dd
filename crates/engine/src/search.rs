//! Palette ranking.
//!
//! Ranking is a pure function of `(commands, query, recency)`:
//! - empty/whitespace query: browse mode, recent commands first (most recent
//!   first) then everything else in registry order
//! - otherwise: weighted sum of label/description/keyword matches plus a
//!   recency bonus, zero scores dropped, stable sort by descending score
//!
//! Matching is case- and diacritic-insensitive ("é" matches "e").

use moa_config::RankingWeights;
use moa_core::Command;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::recency::RecencyList;

/// Normalize text for matching: decompose, drop combining marks, lowercase.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// A ranked command, by index into the slice given to [`RankingEngine::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    pub index: usize,
    /// 0 in browse mode.
    pub score: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    weights: RankingWeights,
}

impl RankingEngine {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    pub fn rank(&self, commands: &[Command], query: &str, recency: &RecencyList) -> Vec<Ranked> {
        if query.trim().is_empty() {
            return browse(commands, recency);
        }

        // Surrounding spaces are part of the needle once there is text
        let needle = fold(query);
        let mut ranked: Vec<Ranked> = commands
            .iter()
            .enumerate()
            .filter_map(|(index, cmd)| {
                let score = self.score(cmd, &needle, recency);
                (score > 0).then_some(Ranked { index, score })
            })
            .collect();

        // Stable: ties keep registry order
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Convenience over [`rank`](Self::rank) returning the commands themselves.
    pub fn rank_commands<'a>(
        &self,
        commands: &'a [Command],
        query: &str,
        recency: &RecencyList,
    ) -> Vec<&'a Command> {
        self.rank(commands, query, recency)
            .into_iter()
            .map(|r| &commands[r.index])
            .collect()
    }

    /// Score one command against an already folded, non-empty needle.
    ///
    /// The recency bonus only applies on top of a text match, so a recent
    /// command that doesn't mention the query is still excluded.
    pub fn score(&self, cmd: &Command, needle: &str, recency: &RecencyList) -> u32 {
        let w = &self.weights;
        let text = self.text_score(cmd, needle);
        if text == 0 {
            return 0;
        }

        let bonus = match recency.position(cmd.id.as_str()) {
            Some(pos) if pos < w.recency_window => u32::try_from(w.recency_window - pos)
                .unwrap_or(u32::MAX)
                .saturating_mul(w.recency_step),
            _ => 0,
        };
        text.saturating_add(bonus)
    }

    /// Weights come from user settings, so sums saturate instead of wrapping.
    fn text_score(&self, cmd: &Command, needle: &str) -> u32 {
        let w = &self.weights;
        let mut score: u32 = 0;

        let label = fold(&cmd.label);
        if label == needle {
            // Exact implies prefix: take the higher, never both
            score = score.saturating_add(w.label_exact.max(w.label_prefix));
        } else if label.starts_with(needle) {
            score = score.saturating_add(w.label_prefix);
        }
        if label.contains(needle) {
            score = score.saturating_add(w.label_contains);
        }

        if let Some(desc) = &cmd.description {
            if fold(desc).contains(needle) {
                score = score.saturating_add(w.description_contains);
            }
        }

        let keywords: Vec<String> = cmd.keywords.iter().map(|k| fold(k)).collect();
        if keywords.iter().any(|k| k.contains(needle)) {
            score = score.saturating_add(w.keyword_contains);
        }
        if keywords.iter().any(|k| k == needle) {
            score = score.saturating_add(w.keyword_exact);
        }

        score
    }
}

/// Recent commands first, then the rest in registry order; no duplicates.
fn browse(commands: &[Command], recency: &RecencyList) -> Vec<Ranked> {
    let mut taken = vec![false; commands.len()];
    let mut out = Vec::with_capacity(commands.len());

    // Ids no longer registered are skipped
    for id in recency.iter() {
        if let Some(index) = commands.iter().position(|c| &c.id == id) {
            if !taken[index] {
                taken[index] = true;
                out.push(Ranked { index, score: 0 });
            }
        }
    }

    for (index, was_taken) in taken.iter().enumerate() {
        if !was_taken {
            out.push(Ranked { index, score: 0 });
        }
    }
    out
}
