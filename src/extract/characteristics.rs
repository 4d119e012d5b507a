use crate::services::log::CityLog;
use crate::types::is_characteristic_key;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Description container selectors, tried in order; first found wins.
const DESCRIPTION_SELECTORS: [&str; 2] = ["div.prod_desc", "div.description"];

/// Parse the free-text description block into whitelisted key/value
/// characteristics.
///
/// The mirrors render the block in two layouts: `Ключ: значение` on one
/// line, or the bare key with its value on the following line prefixed
/// by a colon. A single pass with a pending key handles both. Malformed
/// and unknown lines are logged and skipped; extraction never aborts on
/// a bad line, and a missing container yields an empty map.
pub fn extract_characteristics(doc: &Html, log: &CityLog) -> BTreeMap<String, String> {
    let mut characteristics = BTreeMap::new();

    let Some(block) = description_block(doc) else {
        log.warn("description block not found (div.prod_desc / div.description)");
        return characteristics;
    };

    // Text nodes joined with explicit newlines, so `<br>` breaks and
    // nested tags all act as line separators.
    let text = block.text().collect::<Vec<_>>().join("\n");
    let mut pending_key: Option<String> = None;

    for raw in text.split('\n') {
        let line = raw.trim_start_matches(|c: char| c == '-' || c.is_whitespace());
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        log.debug(&format!("description line: {line}"));

        if let Some(rest) = line.strip_prefix(':') {
            // Value continuation for a key seen on a previous line.
            let value = rest.trim();
            match &pending_key {
                Some(key) => {
                    log.info(&format!("characteristic: {key} = {value}"));
                    characteristics.insert(key.clone(), value.to_string());
                }
                None => log.warn(&format!("value without a key: {value}")),
            }
            continue;
        }

        match split_key_value(line) {
            Some((key, value)) => {
                if is_characteristic_key(key) {
                    log.info(&format!("characteristic: {key} = {value}"));
                    characteristics.insert(key.to_string(), value.to_string());
                } else {
                    log.warn(&format!("unknown characteristic key: {key}"));
                }
                pending_key = None;
            }
            None => {
                if is_characteristic_key(line) {
                    pending_key = Some(line.to_string());
                } else {
                    log.warn(&format!("unrecognized description line: {line}"));
                }
            }
        }
    }

    characteristics
}

fn description_block(doc: &Html) -> Option<ElementRef<'_>> {
    for css in DESCRIPTION_SELECTORS {
        if let Ok(sel) = Selector::parse(css) {
            if let Some(el) = doc.select(&sel).next() {
                return Some(el);
            }
        }
    }
    None
}

/// `Ключ: значение` with a non-empty key and value; the value keeps any
/// further colons.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
