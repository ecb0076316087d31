//! Newsletter composition: articles in, one essay out.

use tracing::{info, instrument, warn};

use newsbrief_shared::{ArticleRecord, Result};

use crate::model::TextGenerator;

/// Editorial prompt. `{content}` is replaced with the formatted stories.
pub const NEWSLETTER_PROMPT: &str = r#"
You are a Senior AI Correspondent. Your task is to write a 250-word "Daily Intelligence" newsletter essay.

[EDITORIAL STRUCTURE]
1. HEADLINE: A punchy, bold title that captures the day's theme.
2. NARRATIVE ESSAY: Write a single, flowing narrative of 3-4 paragraphs.
3. LINK RULE: Do NOT list links at the end. You MUST embed them naturally as [Source](URL) immediately after the fact they support.
4. HIGHLIGHTS: Use **bold text** for new model names, companies, and key technical breakthroughs.
5. NO FLUFF: Skip the "Based on the text" intros and the concluding questions. Start directly with the news.

[DATA TO PROCESS]
{content}

[NEWSLETTER OUTPUT]
"#;

const PLACEHOLDER: &str = "{content}";

/// Concatenate articles into numbered story blocks.
pub fn format_articles(articles: &[ArticleRecord]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "--- STORY {} ---\nSOURCE_URL: {}\nCONTENT: {}\n\n",
                i + 1,
                a.url,
                a.text
            )
        })
        .collect()
}

/// Substitute `content` into the template's single placeholder.
pub fn render_prompt(template: &str, content: &str) -> String {
    template.replacen(PLACEHOLDER, content, 1)
}

/// Composes the briefing with a [`TextGenerator`].
pub struct Summarizer<G> {
    generator: G,
}

impl<G: TextGenerator> Summarizer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// One model call over all articles. The reply is returned untouched.
    #[instrument(skip_all, fields(articles = articles.len(), model = %self.generator.model_name()))]
    pub async fn summarize(&self, articles: &[ArticleRecord]) -> Result<String> {
        if articles.is_empty() {
            warn!("no articles were fetched; composing from an empty story block");
        }

        let prompt = render_prompt(NEWSLETTER_PROMPT, &format_articles(articles));
        let essay = self.generator.generate(&prompt).await?;

        info!(essay_chars = essay.chars().count(), "briefing composed");
        Ok(essay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a canned reply and remembers prompts.
    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl TextGenerator for Canned {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn article(url: &str, text: &str) -> ArticleRecord {
        ArticleRecord {
            url: url.into(),
            text: text.into(),
        }
    }

    #[test]
    fn format_numbers_stories_from_one() {
        let block = format_articles(&[
            article("https://a.example/1", "First text"),
            article("https://a.example/2", "Second text"),
        ]);
        assert_eq!(
            block,
            "--- STORY 1 ---\nSOURCE_URL: https://a.example/1\nCONTENT: First text\n\n\
             --- STORY 2 ---\nSOURCE_URL: https://a.example/2\nCONTENT: Second text\n\n"
        );
    }

    #[test]
    fn format_counts_markers() {
        let articles: Vec<_> = (0..7)
            .map(|i| article(&format!("https://a.example/{i}"), "x"))
            .collect();
        let block = format_articles(&articles);
        assert_eq!(block.matches("--- STORY ").count(), 7);
        assert!(block.contains("--- STORY 7 ---"));
        assert!(!block.contains("--- STORY 0 ---"));
    }

    #[test]
    fn format_empty_is_empty() {
        assert_eq!(format_articles(&[]), "");
    }

    #[test]
    fn render_fills_placeholder_once() {
        let prompt = render_prompt(NEWSLETTER_PROMPT, "STORIES HERE");
        assert!(prompt.contains("[DATA TO PROCESS]\nSTORIES HERE\n"));
        assert!(!prompt.contains(PLACEHOLDER));
        assert!(prompt.contains("[Source](URL)"));
    }

    #[tokio::test]
    async fn summarize_returns_reply_verbatim() {
        let summarizer = Summarizer::new(Canned {
            reply: "  **Bold** essay\n".into(),
            prompts: Mutex::default(),
        });
        let essay = summarizer
            .summarize(&[article("https://a.example/1", "text")])
            .await
            .unwrap();
        assert_eq!(essay, "  **Bold** essay\n");

        let prompts = summarizer.generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("SOURCE_URL: https://a.example/1"));
    }

    #[tokio::test]
    async fn summarize_still_calls_model_without_articles() {
        let summarizer = Summarizer::new(Canned {
            reply: "quiet day".into(),
            prompts: Mutex::default(),
        });
        assert_eq!(summarizer.summarize(&[]).await.unwrap(), "quiet day");
        let prompts = summarizer.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("[DATA TO PROCESS]\n\n"));
    }
}
