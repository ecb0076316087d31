//! Briefing pipeline orchestration for newsbrief.
//!
//! Ties the link loader, article fetcher, language model and mailer into a
//! single run (see [`pipeline::Pipeline`]).

pub mod dispatcher;
pub mod model;
pub mod pipeline;
pub mod summarizer;

pub use dispatcher::{DeliveryStatus, Dispatcher};
pub use model::{OllamaClient, TextGenerator};
pub use pipeline::{Pipeline, ProgressReporter, RunOptions, RunReport, SilentProgress, Stage};
pub use summarizer::{NEWSLETTER_PROMPT, Summarizer, format_articles, render_prompt};
