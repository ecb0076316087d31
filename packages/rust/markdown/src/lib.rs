//! Article text extraction: HTML in, clean Markdown out.
//!
//! Parses a fetched page with `scraper`, optionally detaches overlay
//! elements (cookie banners, consent walls, modal dialogs), picks the most
//! article-like content root, converts it with `htmd`, and then applies the
//! cleanup passes in [`cleanup`].

mod cleanup;
mod overlay;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use newsbrief_shared::{NewsbriefError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options controlling extraction of one page.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Page URL, used to resolve relative links.
    pub source_url: String,
    /// Detach cookie/consent banners and modal overlays before conversion.
    pub remove_overlay_elements: bool,
}

/// Result of extracting one page.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Cleaned Markdown body.
    pub markdown: String,
    /// First H1 of the body, falling back to the document `<title>`.
    pub title: Option<String>,
    /// Words of prose (fenced code and link targets excluded).
    pub word_count: usize,
    /// Number of overlay elements detached.
    pub overlays_removed: usize,
}

/// Tags dropped wholesale by the converter, content included.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "iframe", "noscript", "svg", "footer", "aside", "form", "button",
];

/// Candidate content roots. The candidate with the most prose wins; on a
/// tie the earlier selector wins. `body` is used when none has any text.
const CONTENT_ROOTS: &[&str] = &[
    "article",
    "main",
    r#"[role="main"]"#,
    ".article-body",
    ".post-content",
    ".entry-content",
    ".content",
];

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract readable Markdown from a full HTML document.
#[instrument(skip(html), fields(url = %opts.source_url))]
pub fn extract(html: &str, opts: &ExtractOptions) -> Result<Extracted> {
    let mut doc = Html::parse_document(html);

    let overlays_removed = if opts.remove_overlay_elements {
        overlay::remove_overlays(&mut doc)
    } else {
        0
    };

    let content_html = content_root_html(&doc).unwrap_or_else(|| html.to_string());

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| NewsbriefError::Conversion(format!("htmd conversion failed: {e}")))?;

    let base_url = Url::parse(&opts.source_url).ok();
    let markdown = cleanup::run_pipeline(&raw_markdown, base_url.as_ref());

    let title = first_heading(&markdown).or_else(|| document_title(&doc));
    let word_count = count_words(&markdown);

    debug!(
        overlays_removed,
        raw_len = raw_markdown.len(),
        final_len = markdown.len(),
        word_count,
        "extraction complete"
    );

    Ok(Extracted {
        markdown,
        title,
        word_count,
        overlays_removed,
    })
}

/// Inner HTML of the wordiest content root, falling back to `<body>`.
///
/// Every element matching a candidate selector is scored, so a teaser
/// `<article>` in a sidebar cannot shadow the story in `<main>`.
fn content_root_html(doc: &Html) -> Option<String> {
    let mut best: Option<(usize, ElementRef<'_>)> = None;

    for sel_str in CONTENT_ROOTS {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };
        for el in doc.select(&selector) {
            let words = element_words(el);
            if best.as_ref().is_none_or(|(top, _)| words > *top) {
                best = Some((words, el));
            }
        }
    }

    match best {
        Some((words, el)) if words > 0 => {
            debug!(root = el.value().name(), words, "content root selected");
            Some(el.inner_html())
        }
        _ => {
            let body = Selector::parse("body").ok()?;
            doc.select(&body).next().map(|el| el.inner_html())
        }
    }
}

/// Words of visible text under `el`.
fn element_words(el: ElementRef<'_>) -> usize {
    el.text()
        .flat_map(str::split_whitespace)
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Text of the first level-one Markdown heading.
fn first_heading(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid regex"));

    H1_RE
        .captures(md)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Text of the document's `<title>` element.
fn document_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Count prose words, ignoring fenced code blocks and link targets.
pub fn count_words(md: &str) -> usize {
    static CODE_BLOCK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));
    static LINK_TARGET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\]\([^)]*\)").expect("valid regex"));

    let without_code = CODE_BLOCK_RE.replace_all(md, " ");
    let without_targets = LINK_TARGET_RE.replace_all(&without_code, "]");

    without_targets
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
