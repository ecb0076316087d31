//! End-to-end briefing run: links → articles → essay → mail.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use newsbrief_crawler::{FetchProgress, Fetcher};
use newsbrief_links::LinkSource;
use newsbrief_mailer::MailTransport;
use newsbrief_shared::{ArticleRecord, FetchConfig, Result, RunState, StageUpdate};

use crate::dispatcher::{DeliveryStatus, Dispatcher};
use crate::model::TextGenerator;
use crate::summarizer::Summarizer;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// One step of a run. Stages always execute in [`Stage::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadLinks,
    FetchArticles,
    Summarize,
    Dispatch,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::LoadLinks,
        Stage::FetchArticles,
        Stage::Summarize,
        Stage::Dispatch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::LoadLinks => "Reading links",
            Stage::FetchArticles => "Fetching articles",
            Stage::Summarize => "Composing briefing",
            Stage::Dispatch => "Sending briefing",
        }
    }
}

/// Knobs that change how a run ends, not what it computes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after the summarize stage; nothing is mailed.
    pub dry_run: bool,
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub delivery: DeliveryStatus,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called before each page is requested.
    fn page_fetched(&self, url: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_fetched(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Adapts a `ProgressReporter` to the fetcher's `FetchProgress` interface.
struct PipelineFetchProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl FetchProgress for PipelineFetchProgress<'_> {
    fn page_started(&self, url: &str, current: usize, total: usize) {
        self.inner.page_fetched(url, current, total);
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The four-stage briefing pipeline.
pub struct Pipeline<S, G, T> {
    links: S,
    fetch: FetchConfig,
    summarizer: Summarizer<G>,
    dispatcher: Dispatcher<T>,
    options: RunOptions,
}

impl<S, G, T> Pipeline<S, G, T>
where
    S: LinkSource,
    G: TextGenerator,
    T: MailTransport,
{
    pub fn new(links: S, fetch: FetchConfig, generator: G, dispatcher: Dispatcher<T>) -> Self {
        Self {
            links,
            fetch,
            summarizer: Summarizer::new(generator),
            dispatcher,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Traverse every stage once.
    ///
    /// Loader and model failures abort the run with an error. Page failures
    /// are skipped, and delivery failures end up in [`RunReport::delivery`].
    #[instrument(skip_all, fields(run_id = %Uuid::now_v7(), dry_run = self.options.dry_run))]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = RunState::default();
        let mut delivery = DeliveryStatus::Skipped;

        info!("starting briefing run");

        for stage in Stage::ORDER {
            progress.phase(stage.label());

            let update = match stage {
                Stage::LoadLinks => StageUpdate::Links(self.links.load()?),
                Stage::FetchArticles => {
                    StageUpdate::Articles(self.fetch_articles(&state.links, progress).await?)
                }
                Stage::Summarize => {
                    StageUpdate::Summary(self.summarizer.summarize(&state.processed_articles).await?)
                }
                Stage::Dispatch => {
                    if self.options.dry_run {
                        info!("dry run, not sending");
                    } else {
                        delivery = self.dispatcher.dispatch(&state.summary).await;
                    }
                    StageUpdate::Unchanged
                }
            };

            state.apply(update);
        }

        let report = RunReport {
            state,
            delivery,
            started_at,
            elapsed: start.elapsed(),
        };

        progress.done(&report);

        info!(
            links = report.state.links.len(),
            articles = report.state.processed_articles.len(),
            sent = report.delivery.is_sent(),
            elapsed_ms = report.elapsed.as_millis(),
            "briefing run complete"
        );

        Ok(report)
    }

    /// The fetcher (and its HTTP session) lives only for this stage.
    async fn fetch_articles(
        &self,
        links: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ArticleRecord>> {
        let fetcher = Fetcher::new(self.fetch.clone())?;
        let outcome = fetcher
            .fetch_all(links, &PipelineFetchProgress { inner: progress })
            .await;

        if outcome.articles.is_empty() && !links.is_empty() {
            warn!(links = links.len(), "every page failed to fetch");
        }

        Ok(outcome.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use newsbrief_links::{SpreadsheetLinks, StaticLinks};
    use newsbrief_shared::{ModelConfig, NewsbriefError};
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::dispatcher::tests::{RecordingTransport, mail_settings};
    use crate::model::OllamaClient;

    const ESSAY: &str = "**Chips and Llamas**\n\nA busy day [Source](https://a.example/1).";

    fn page(words: usize) -> String {
        let body = (0..words)
            .map(|i| format!("token{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!("<html><body><article><h1>Story</h1><p>{body}</p></article></body></html>")
    }

    fn fetch_config() -> FetchConfig {
        FetchConfig {
            timeout_secs: 5,
            ..FetchConfig::default()
        }
    }

    async fn mount_model(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": ESSAY },
                "done": true
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    /// Prompt text of the single model request received by `server`.
    async fn model_prompt(server: &MockServer) -> String {
        let requests = server.received_requests().await.unwrap_or_default();
        let chat = requests
            .iter()
            .find(|r| r.url.path() == "/api/chat")
            .expect("model was called");
        let body: Value = serde_json::from_slice(&chat.body).unwrap();
        body["messages"][0]["content"].as_str().unwrap().to_string()
    }

    fn model(server: &MockServer) -> OllamaClient {
        OllamaClient::new(&ModelConfig {
            base_url: server.uri(),
            ..ModelConfig::default()
        })
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        pages: Mutex<usize>,
        finished: Mutex<bool>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn page_fetched(&self, _url: &str, _current: usize, _total: usize) {
            *self.pages.lock().unwrap() += 1;
        }
        fn done(&self, _report: &RunReport) {
            *self.finished.lock().unwrap() = true;
        }
    }

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(
            Stage::ORDER,
            [
                Stage::LoadLinks,
                Stage::FetchArticles,
                Stage::Summarize,
                Stage::Dispatch
            ]
        );
    }

    #[tokio::test]
    async fn two_good_links_produce_one_mail() {
        let server = MockServer::start().await;
        for route in ["/1", "/2"] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(page(80)))
                .mount(&server)
                .await;
        }
        mount_model(&server).await;

        let links = vec![format!("{}/1", server.uri()), format!("{}/2", server.uri())];
        let transport = RecordingTransport::default();
        let pipeline = Pipeline::new(
            StaticLinks(links.clone()),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(Some("pw")), &transport),
        );

        let progress = RecordingProgress::default();
        let report = pipeline.run(&progress).await.unwrap();

        assert_eq!(report.state.links, links);
        assert_eq!(report.state.processed_articles.len(), 2);
        assert_eq!(report.state.summary, ESSAY);
        assert_eq!(report.delivery, DeliveryStatus::Sent);

        let prompt = model_prompt(&server).await;
        assert!(prompt.contains(&format!("--- STORY 1 ---\nSOURCE_URL: {}", links[0])));
        assert!(prompt.contains(&format!("--- STORY 2 ---\nSOURCE_URL: {}", links[1])));
        assert!(!prompt.contains("--- STORY 3 ---"));

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Chips and Llamas"));

        let phases = progress.phases.lock().unwrap();
        assert_eq!(
            *phases,
            Stage::ORDER.map(|s| s.label().to_string()).to_vec()
        );
        assert_eq!(*progress.pages.lock().unwrap(), 2);
        assert!(*progress.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn failed_fetch_still_summarizes_and_mails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_model(&server).await;

        let transport = RecordingTransport::default();
        let pipeline = Pipeline::new(
            StaticLinks(vec![format!("{}/down", server.uri())]),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(Some("pw")), &transport),
        );

        let report = pipeline.run(&SilentProgress).await.unwrap();

        assert!(report.state.processed_articles.is_empty());
        assert!(!model_prompt(&server).await.contains("--- STORY"));
        assert_eq!(report.delivery, DeliveryStatus::Sent);
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn thin_page_still_summarizes_and_mails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(3)))
            .mount(&server)
            .await;
        mount_model(&server).await;

        let transport = RecordingTransport::default();
        let link = format!("{}/thin", server.uri());
        let pipeline = Pipeline::new(
            StaticLinks(vec![link.clone()]),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(Some("pw")), &transport),
        );

        let report = pipeline.run(&SilentProgress).await.unwrap();

        assert_eq!(report.state.links, vec![link]);
        assert!(report.state.processed_articles.is_empty());

        let prompt = model_prompt(&server).await;
        assert!(prompt.contains("[DATA TO PROCESS]\n\n"));
        assert!(!prompt.contains("--- STORY"));

        assert_eq!(report.state.summary, ESSAY);
        assert_eq!(report.delivery, DeliveryStatus::Sent);
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_password_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(80)))
            .mount(&server)
            .await;
        mount_model(&server).await;

        let transport = RecordingTransport::default();
        let pipeline = Pipeline::new(
            StaticLinks(vec![format!("{}/1", server.uri())]),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(None), &transport),
        );

        let report = pipeline.run(&SilentProgress).await.unwrap();

        assert_eq!(report.state.summary, ESSAY);
        match &report.delivery {
            DeliveryStatus::Failed { reason } => assert!(reason.contains("EMAIL_PASSWORD")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_skips_dispatch() {
        let server = MockServer::start().await;
        mount_model(&server).await;

        let transport = RecordingTransport::default();
        let pipeline = Pipeline::new(
            StaticLinks(Vec::new()),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(Some("pw")), &transport),
        )
        .with_options(RunOptions { dry_run: true });

        let report = pipeline.run(&SilentProgress).await.unwrap();
        assert_eq!(report.delivery, DeliveryStatus::Skipped);
        assert_eq!(report.state.summary, ESSAY);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_spreadsheet_aborts_before_network() {
        let server = MockServer::start().await;

        let transport = RecordingTransport::default();
        let pipeline = Pipeline::new(
            SpreadsheetLinks::new("does/not/exist.xlsx", "URL"),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(Some("pw")), &transport),
        );

        let err = pipeline.run(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, NewsbriefError::Spreadsheet { .. }));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_aborts_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
            .mount(&server)
            .await;

        let transport = RecordingTransport::default();
        let pipeline = Pipeline::new(
            StaticLinks(Vec::new()),
            fetch_config(),
            model(&server),
            Dispatcher::new(mail_settings(Some("pw")), &transport),
        );

        let err = pipeline.run(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, NewsbriefError::Model(_)));
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
