//! Ranked retrieval context
//!
//! Turns a list of search results into the numbered context block handed
//! to the chat model, plus the matching citations.

use std::fmt::Write;

use vecrag_core::{Citation, SearchResult};

/// A search result with its 1-based position in the context
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub result: SearchResult,
}

/// Ordered, non-empty retrieval context
#[derive(Debug, Clone, PartialEq)]
pub struct RankedContext {
    entries: Vec<RankedEntry>,
}

impl RankedContext {
    /// Rank results in the order given. Entries with blank text are
    /// skipped; `None` when nothing remains.
    pub fn from_results(results: Vec<SearchResult>) -> Option<Self> {
        let entries: Vec<RankedEntry> = results
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .enumerate()
            .map(|(i, result)| RankedEntry { rank: i + 1, result })
            .collect();

        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `[#rank] text` line per entry
    pub fn context_block(&self) -> String {
        let mut block = String::new();
        for entry in &self.entries {
            let _ = writeln!(block, "[#{}] {}", entry.rank, entry.result.text);
        }
        block
    }

    pub fn citations(&self) -> Vec<Citation> {
        self.entries
            .iter()
            .map(|e| Citation {
                rank: e.rank,
                id: e.result.id,
                score: e.result.score,
            })
            .collect()
    }

    /// One `[#rank] id score` line per entry
    pub fn render_citations(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "[#{}] {} {:.4}",
                entry.rank, entry.result.id, entry.result.score
            );
        }
        out
    }
}

/// Result of a retrieval: usable context or a distinct empty outcome
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Context(RankedContext),
    NoRelevantContext,
}

impl RetrievalOutcome {
    pub fn from_results(results: Vec<SearchResult>) -> Self {
        match RankedContext::from_results(results) {
            Some(context) => RetrievalOutcome::Context(context),
            None => RetrievalOutcome::NoRelevantContext,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RetrievalOutcome::NoRelevantContext)
    }
}
