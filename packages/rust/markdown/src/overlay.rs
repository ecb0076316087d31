//! Overlay removal: cookie banners, consent walls, modal dialogs.
//!
//! Matching elements are detached from the parsed tree before the content
//! root is chosen, so they never reach the converter.

use scraper::node::Element;
use scraper::{Html, Selector};

/// Structural elements that are never detached, whatever their classes say.
const PROTECTED_TAGS: &[&str] = &["html", "head", "body", "main", "article"];

/// Id/class fragments that mark an element as an overlay.
const OVERLAY_MARKERS: &[&str] = &[
    "cookie", "consent", "gdpr", "onetrust", "overlay", "modal", "popup",
];

/// Detach every overlay element from `doc`. Returns how many were detached.
pub(crate) fn remove_overlays(doc: &mut Html) -> usize {
    let Ok(all) = Selector::parse("*") else {
        return 0;
    };

    let ids: Vec<_> = doc
        .select(&all)
        .filter(|el| is_overlay(el.value()))
        .map(|el| el.id())
        .collect();

    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }

    ids.len()
}

fn is_overlay(el: &Element) -> bool {
    let tag = el.name();
    if PROTECTED_TAGS.contains(&tag) {
        return false;
    }
    if tag == "dialog" {
        return true;
    }

    if matches!(el.attr("role"), Some("dialog" | "alertdialog")) {
        return true;
    }
    if el.attr("aria-modal") == Some("true") {
        return true;
    }

    if let Some(style) = el.attr("style") {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.contains("position:fixed") || compact.contains("position:sticky") {
            return true;
        }
    }

    [el.attr("id"), el.attr("class")]
        .into_iter()
        .flatten()
        .map(str::to_ascii_lowercase)
        .any(|value| OVERLAY_MARKERS.iter().any(|m| value.contains(m)))
}
