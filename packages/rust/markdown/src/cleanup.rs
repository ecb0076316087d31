//! Post-conversion cleanup for article Markdown.
//!
//! Each pass is a `&str -> String` function applied in order. The goal is
//! compact prose for a model prompt, so images go, layout wrappers go, and
//! links are made absolute so they can be cited.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run every cleanup pass over freshly converted Markdown.
///
/// Non-empty output ends with exactly one newline.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = drop_images(md);
    result = strip_wrapper_tags(&result);
    result = absolutize_links(&result, base_url);
    result = trim_line_ends(&result);
    result = collapse_blank_lines(&result);

    let body = result.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Remove image syntax, including images wrapped in a link.
fn drop_images(md: &str) -> String {
    static LINKED_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[!\[[^\]]*\]\([^)]*\)\]\([^)]*\)").expect("valid regex")
    });
    static IMAGE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"));

    let without_linked = LINKED_IMAGE_RE.replace_all(md, "");
    IMAGE_RE.replace_all(&without_linked, "").to_string()
}

// ---------------------------------------------------------------------------
// Leftover HTML
// ---------------------------------------------------------------------------

/// Strip layout tags the converter passed through, keeping their text.
/// Fenced code is left alone.
fn strip_wrapper_tags(md: &str) -> String {
    static WRAPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|header|figure|figcaption|picture|source|details|summary|time)(?:\s[^>]*)?/?>",
        )
        .expect("valid regex")
    });

    let mut in_fence = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                line.to_string()
            } else {
                WRAPPER_RE.replace_all(line, "").to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Resolve relative link targets against the page URL.
fn absolutize_links(md: &str, base_url: Option<&Url>) -> String {
    let Some(base) = base_url else {
        return md.to_string();
    };

    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)([^)]*)\)").expect("valid regex"));

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let text = &caps[1];
            let href = &caps[2];
            let rest = &caps[3];

            let keep_as_is = href.starts_with('#')
                || href.contains("://")
                || href.starts_with("mailto:")
                || href.starts_with("tel:");
            if keep_as_is {
                return caps[0].to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved}{rest})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Collapse any run of blank lines into a single blank line.
fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    BLANK_RUN_RE.replace_all(md, "\n\n").to_string()
}
