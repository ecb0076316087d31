//! Run-state types threaded through the briefing pipeline.

// ---------------------------------------------------------------------------
// ArticleRecord
// ---------------------------------------------------------------------------

/// A fetched page: the link it came from and its extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// The originating link, exactly as read from the spreadsheet.
    pub url: String,
    /// Extracted Markdown text, capped at the configured character budget.
    pub text: String,
}

impl ArticleRecord {
    /// Build a record, truncating `text` to at most `max_chars` characters.
    pub fn new(url: impl Into<String>, text: &str, max_chars: usize) -> Self {
        Self {
            url: url.into(),
            text: truncate_chars(text, max_chars).to_string(),
        }
    }
}

/// Cut `text` to at most `max_chars` Unicode scalar values.
///
/// Shorter text comes back unchanged; the cut never splits a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// The single record threaded through all stages of one run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Links in spreadsheet row order.
    pub links: Vec<String>,
    /// Successfully fetched articles, in fetch order.
    pub processed_articles: Vec<ArticleRecord>,
    /// Composed newsletter essay; empty until the summarize stage runs.
    pub summary: String,
}

/// Partial update returned by a stage and applied by the runner.
#[derive(Debug, Clone)]
pub enum StageUpdate {
    Links(Vec<String>),
    Articles(Vec<ArticleRecord>),
    Summary(String),
    Unchanged,
}

impl RunState {
    /// Apply a stage's partial update.
    pub fn apply(&mut self, update: StageUpdate) {
        match update {
            StageUpdate::Links(links) => self.links = links,
            StageUpdate::Articles(articles) => self.processed_articles = articles,
            StageUpdate::Summary(summary) => self.summary = summary,
            StageUpdate::Unchanged => {}
        }
    }
}
