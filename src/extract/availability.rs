use super::element_text;
use scraper::{Html, Selector};

/// Whether the loaded document is a real product page rather than the
/// mirrors' not-found page. Pure inspection, no network.
///
/// The mirrors do not use HTTP status codes consistently; the reliable
/// signal is "404" in the title or in a top-level heading.
pub fn is_available(doc: &Html) -> bool {
    if let Ok(sel) = Selector::parse("title") {
        if let Some(title) = doc.select(&sel).next() {
            if element_text(&title).to_lowercase().contains("404") {
                return false;
            }
        }
    }
    if let Ok(sel) = Selector::parse("h1") {
        for h1 in doc.select(&sel) {
            if element_text(&h1).contains("404") {
                return false;
            }
        }
    }
    true
}
