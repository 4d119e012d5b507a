pub mod availability;
pub mod characteristics;
pub mod prices;

pub use availability::is_available;
pub use characteristics::extract_characteristics;
pub use prices::extract_prices;

use crate::services::log::CityLog;
use crate::types::NAME_NOT_SPECIFIED;
use scraper::{ElementRef, Html, Selector};

/// Product name from the first `h1`, or the fallback marker when the
/// page has none.
pub fn product_name(doc: &Html, log: &CityLog) -> String {
    if let Ok(sel) = Selector::parse("h1") {
        if let Some(h1) = doc.select(&sel).next() {
            let text = element_text(&h1);
            if !text.is_empty() {
                return text;
            }
        }
    }
    log.warn("page has no h1, recording name as not specified");
    NAME_NOT_SPECIFIED.to_string()
}

pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_name_from_h1() {
        let doc = Html::parse_document("<html><body><h1> Теплица Урожай </h1></body></html>");
        assert_eq!(product_name(&doc, &CityLog::disabled()), "Теплица Урожай");
    }

    #[test]
    fn product_name_falls_back_without_h1() {
        let doc = Html::parse_document("<html><body><p>нет заголовка</p></body></html>");
        assert_eq!(product_name(&doc, &CityLog::disabled()), NAME_NOT_SPECIFIED);
    }

    #[test]
    fn product_name_falls_back_on_empty_h1() {
        let doc = Html::parse_document("<html><body><h1>  </h1></body></html>");
        assert_eq!(product_name(&doc, &CityLog::disabled()), NAME_NOT_SPECIFIED);
    }
}
