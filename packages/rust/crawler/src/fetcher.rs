//! Sequential article fetcher.
//!
//! One `reqwest::Client` is built per [`Fetcher`] and reused for every link,
//! so a run opens exactly one session and releases it when the fetcher is
//! dropped. Links are visited strictly in order, one request in flight at a
//! time. A page that fails for any reason is skipped, never retried.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use newsbrief_markdown::ExtractOptions;
use newsbrief_shared::{ArticleRecord, FetchConfig, NewsbriefError, Result};

/// User-Agent string for article requests.
const USER_AGENT: &str = concat!("newsbrief/", env!("CARGO_PKG_VERSION"));

/// Redirects followed before a request is abandoned.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

/// Result of visiting every link once.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Successfully extracted articles, in link order.
    pub articles: Vec<ArticleRecord>,
    /// Links that were dropped, with the reason (for logging only).
    pub skipped: Vec<(String, String)>,
    /// Wall-clock time spent fetching.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Per-page progress callback.
pub trait FetchProgress {
    /// Called before each link is requested; `current` is 1-based.
    fn page_started(&self, url: &str, current: usize, total: usize);
}

/// No-op fetch progress.
pub struct SilentFetchProgress;

impl FetchProgress for SilentFetchProgress {
    fn page_started(&self, _url: &str, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Fetches article pages and turns them into [`ArticleRecord`]s.
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
}

impl Fetcher {
    /// Open the HTTP session used for every request of this fetcher.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NewsbriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Visit every link in order and keep the ones that extract cleanly.
    ///
    /// Never fails: each failed page is logged and recorded in
    /// [`FetchOutcome::skipped`].
    #[instrument(skip_all, fields(links = links.len()))]
    pub async fn fetch_all(&self, links: &[String], progress: &dyn FetchProgress) -> FetchOutcome {
        let start = Instant::now();
        let total = links.len();
        let mut outcome = FetchOutcome::default();

        info!(
            word_count_threshold = self.config.word_count_threshold,
            max_article_chars = self.config.max_article_chars,
            remove_overlay_elements = self.config.remove_overlay_elements,
            "starting fetch"
        );

        for (i, url) in links.iter().enumerate() {
            progress.page_started(url, i + 1, total);

            match self.fetch_article(url).await {
                Ok(article) => outcome.articles.push(article),
                Err(e) => {
                    warn!(%url, error = %e, "skipping page");
                    outcome.skipped.push((url.clone(), e.to_string()));
                }
            }
        }

        outcome.duration = start.elapsed();

        info!(
            fetched = outcome.articles.len(),
            skipped = outcome.skipped.len(),
            duration_ms = outcome.duration.as_millis(),
            "fetch completed"
        );

        outcome
    }

    /// Fetch one page and extract it into an article.
    ///
    /// Fails on an unparseable URL, a transport error, a non-2xx status, an
    /// extraction error, or a word count below the configured threshold.
    pub async fn fetch_article(&self, url: &str) -> Result<ArticleRecord> {
        let parsed = Url::parse(url)
            .map_err(|e| NewsbriefError::validation(format!("invalid URL '{url}': {e}")))?;

        debug!(%parsed, "fetching page");

        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .await
            .map_err(|e| NewsbriefError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsbriefError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NewsbriefError::Network(format!("{url}: body read failed: {e}")))?;

        let opts = ExtractOptions {
            source_url: parsed.to_string(),
            remove_overlay_elements: self.config.remove_overlay_elements,
        };
        let extracted = newsbrief_markdown::extract(&body, &opts)?;

        if extracted.word_count < self.config.word_count_threshold {
            return Err(NewsbriefError::validation(format!(
                "{url}: {} words extracted, below threshold of {}",
                extracted.word_count, self.config.word_count_threshold
            )));
        }

        debug!(
            %url,
            title = extracted.title.as_deref().unwrap_or(""),
            word_count = extracted.word_count,
            "page extracted"
        );

        Ok(ArticleRecord::new(
            url,
            &extracted.markdown,
            self.config.max_article_chars,
        ))
    }
}
