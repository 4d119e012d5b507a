use super::element_text;
use crate::services::log::CityLog;
use crate::types::{PriceTableLayout, PRICE_ABSENT};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// The polycarbonate price grid.
const PRIMARY_GRID: &str = "table.tb2.adaptive.poly-price";
/// Base class shared by every pricing table on the page, including the
/// tie and foundation supplements.
const PRICING_TABLES: &str = "table.tb2.adaptive";

/// Canonical length labels; headers are normalized onto these.
const CANONICAL_LENGTHS: [(&str, &str); 5] = [
    ("4", "4 метра"),
    ("6", "6 метров"),
    ("8", "8 метров"),
    ("10", "10 метров"),
    ("12", "12 метров"),
];

/// Collect every price on the page into `"<variant> (<length>)"` keys.
///
/// The primary grid comes in two shapes across the mirrors: cells that
/// carry their length label as a `data-label` attribute (Shape A), and
/// grids that put the lengths in the header row (Shape B). Secondary
/// tables (ties, foundation) contribute flat per-row prices. Table or
/// row absence is non-fatal; whatever parsed is returned.
pub fn extract_prices(
    doc: &Html,
    layout: &PriceTableLayout,
    log: &CityLog,
) -> BTreeMap<String, String> {
    let mut prices = BTreeMap::new();

    match primary_grid(doc) {
        Some(table) => extract_poly_grid(&table, layout, log, &mut prices),
        None => log.warn("polycarbonate price grid not found"),
    }

    if let Ok(sel) = Selector::parse(PRICING_TABLES) {
        for table in doc.select(&sel) {
            let Some(header) = first_header(&table) else { continue };
            let lowered = header.to_lowercase();
            if lowered.contains("стяжки") {
                supplement_rows(&table, "Цена 1 стяжки", log, &mut prices);
            } else if lowered.contains("фундамент") {
                supplement_rows(&table, "Цена фундамента", log, &mut prices);
            }
        }
    }

    prices
}

fn primary_grid(doc: &Html) -> Option<ElementRef<'_>> {
    let sel = Selector::parse(PRIMARY_GRID).ok()?;
    doc.select(&sel).next()
}

fn first_header(table: &ElementRef<'_>) -> Option<String> {
    let sel = Selector::parse("th").ok()?;
    table.select(&sel).next().map(|th| element_text(&th))
}

fn extract_poly_grid(
    table: &ElementRef<'_>,
    layout: &PriceTableLayout,
    log: &CityLog,
    prices: &mut BTreeMap<String, String>,
) {
    let Ok(td_sel) = Selector::parse("td") else { return };

    // The data-label attribute is the one reliable discriminator between
    // the two grid shapes the mirrors ship.
    let labelled = table
        .select(&td_sel)
        .any(|td| td.value().attr("data-label").is_some());
    if labelled {
        extract_labelled_cells(table, layout, log, prices);
    } else {
        extract_by_headers(table, layout, log, prices);
    }
}

/// Shape A: every price cell names its own length via `data-label`.
/// An empty cell is still a slot in the grid and is recorded with the
/// absence sentinel, so it stays distinguishable from a key that was
/// never produced.
fn extract_labelled_cells(
    table: &ElementRef<'_>,
    layout: &PriceTableLayout,
    log: &CityLog,
    prices: &mut BTreeMap<String, String>,
) {
    let (Ok(tr_sel), Ok(td_sel)) = (Selector::parse("tr"), Selector::parse("td")) else {
        return;
    };

    for row in table.select(&tr_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
        if cells.len() < layout.grid_min_row_cells {
            continue;
        }
        let variant = element_text(&cells[0]);
        for cell in cells.iter().skip(layout.grid_first_price_cell) {
            let label = cell.value().attr("data-label").unwrap_or("").trim();
            if label.is_empty() {
                log.debug("price cell without data-label, skipped");
                continue;
            }
            let key = format!("{variant} ({label})");
            let value = element_text(cell);
            if value.is_empty() {
                log.warn(&format!("no price for {key}"));
                prices.insert(key, PRICE_ABSENT.to_string());
            } else {
                log.info(&format!("price: {key} = {value}"));
                prices.insert(key, value);
            }
        }
    }
}

/// Shape B: `th` cells from column 1 onward define the ordered lengths;
/// each data row then carries one price per length, after the variant
/// column (and the cost column, on mirrors that have one).
fn extract_by_headers(
    table: &ElementRef<'_>,
    layout: &PriceTableLayout,
    log: &CityLog,
    prices: &mut BTreeMap<String, String>,
) {
    let (Ok(tr_sel), Ok(td_sel), Ok(th_sel)) = (
        Selector::parse("tr"),
        Selector::parse("td"),
        Selector::parse("th"),
    ) else {
        return;
    };

    let lengths = header_lengths(table, log);
    if lengths.is_empty() {
        log.warn("price grid headers define no lengths");
        return;
    }
    let expected = lengths.len() + layout.header_value_offset;

    for row in table.select(&tr_sel) {
        if row.select(&th_sel).next().is_some() {
            continue; // header row
        }
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < expected {
            log.warn(&format!(
                "price row has {} cells, expected {}; skipped",
                cells.len(),
                expected
            ));
            continue;
        }
        let variant = element_text(&cells[0]);
        for (idx, length) in lengths.iter().enumerate() {
            let key = format!("{variant} ({length})");
            let value = element_text(&cells[layout.header_value_offset + idx]);
            if value.is_empty() {
                log.warn(&format!("no price for {key}"));
                continue;
            }
            log.info(&format!("price: {key} = {value}"));
            prices.insert(key, value);
        }
    }
}

/// Ordered length labels from the grid header, normalized onto the
/// canonical set. Headers without a digit are skipped; digit-bearing
/// labels that match no canonical marker pass through as written.
fn header_lengths(table: &ElementRef<'_>, log: &CityLog) -> Vec<String> {
    let Ok(th_sel) = Selector::parse("th") else {
        return Vec::new();
    };
    let patterns = length_patterns();
    let mut lengths = Vec::new();
    for th in table.select(&th_sel).skip(1) {
        let label = element_text(&th).to_lowercase().replace('\u{a0}', " ");
        if !label.chars().any(|c| c.is_ascii_digit()) {
            log.warn(&format!("length header without digits, skipped: {label}"));
            continue;
        }
        lengths.push(normalize_length_label(&label, &patterns));
    }
    lengths
}

fn length_patterns() -> Vec<(Regex, &'static str)> {
    CANONICAL_LENGTHS
        .iter()
        .filter_map(|(n, canonical)| {
            Regex::new(&format!(r"\b{n}\s*(метров|метра|м)\b"))
                .ok()
                .map(|re| (re, *canonical))
        })
        .collect()
}

fn normalize_length_label(label: &str, patterns: &[(Regex, &'static str)]) -> String {
    for (re, canonical) in patterns {
        if re.is_match(label) {
            return (*canonical).to_string();
        }
    }
    label.to_string()
}

/// Tie/foundation tables: label in column 0, price in column 1.
fn supplement_rows(
    table: &ElementRef<'_>,
    label: &str,
    log: &CityLog,
    prices: &mut BTreeMap<String, String>,
) {
    let (Ok(tr_sel), Ok(td_sel)) = (Selector::parse("tr"), Selector::parse("td")) else {
        return;
    };

    for row in table.select(&tr_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let key = format!("{label} {}", element_text(&cells[0]));
        let value = element_text(&cells[1]);
        if value.is_empty() {
            log.warn(&format!("no price for {key}"));
            continue;
        }
        log.info(&format!("price: {key} = {value}"));
        prices.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> BTreeMap<String, String> {
        extract_with(html, &PriceTableLayout::default())
    }

    fn extract_with(html: &str, layout: &PriceTableLayout) -> BTreeMap<String, String> {
        let doc = Html::parse_document(html);
        extract_prices(&doc, layout, &CityLog::disabled())
    }

    #[test]
    fn header_shape_uses_row_variant_and_normalized_lengths() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>4 метра</th><th>6 метров</th></tr>
                <tr><td>Стандарт</td><td>16990</td><td>18990</td></tr>
            </table>"#,
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map["Стандарт (4 метра)"], "16990");
        assert_eq!(map["Стандарт (6 метров)"], "18990");
    }

    #[test]
    fn header_spelling_variants_normalize_to_canonical() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>4 м</th><th>6&nbsp;МЕТРА</th><th>8метров</th></tr>
                <tr><td>Люкс</td><td>20990</td><td>24990</td><td>28990</td></tr>
            </table>"#,
        );
        assert_eq!(map["Люкс (4 метра)"], "20990");
        assert_eq!(map["Люкс (6 метров)"], "24990");
        assert_eq!(map["Люкс (8 метров)"], "28990");
    }

    #[test]
    fn unrecognized_digit_header_passes_through() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>3 секции</th></tr>
                <tr><td>Стандарт</td><td>9990</td></tr>
            </table>"#,
        );
        assert_eq!(map["Стандарт (3 секции)"], "9990");
    }

    #[test]
    fn digitless_header_is_skipped() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>стоимость</th><th>4 метра</th></tr>
                <tr><td>Стандарт</td><td>от</td><td>16990</td></tr>
            </table>"#,
        );
        // Only one length survives, so the row needs variant + 1 cell and
        // the price is read right after the variant column.
        assert_eq!(map.len(), 1);
        assert_eq!(map["Стандарт (4 метра)"], "от");
    }

    #[test]
    fn cost_column_layout_shifts_value_cells() {
        let layout = PriceTableLayout {
            header_value_offset: 2,
            ..PriceTableLayout::default()
        };
        let map = extract_with(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>стоимость</th><th>4 метра</th></tr>
                <tr><td>Стандарт</td><td>от</td><td>16990</td></tr>
            </table>"#,
            &layout,
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map["Стандарт (4 метра)"], "16990");
    }

    #[test]
    fn short_header_shape_row_is_skipped() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>4 метра</th><th>6 метров</th></tr>
                <tr><td>Обрезанная строка</td><td>16990</td></tr>
                <tr><td>Полная</td><td>17990</td><td>19990</td></tr>
            </table>"#,
        );
        assert_eq!(map.len(), 2);
        assert!(!map.keys().any(|k| k.starts_with("Обрезанная")));
        assert_eq!(map["Полная (4 метра)"], "17990");
    }

    #[test]
    fn labelled_shape_reads_data_labels() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><th>Материал</th><th>стоимость</th><th>цена</th></tr>
                <tr>
                    <td>Стандарт 4мм</td><td>от</td>
                    <td data-label="4 метра">16990</td>
                    <td data-label="6 метров">18990</td>
                </tr>
            </table>"#,
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map["Стандарт 4мм (4 метра)"], "16990");
        assert_eq!(map["Стандарт 4мм (6 метров)"], "18990");
    }

    #[test]
    fn empty_labelled_cell_records_absence_sentinel() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr>
                    <td>Стандарт</td><td>от</td>
                    <td data-label="4 метра"></td>
                    <td data-label="6 метров">18990</td>
                </tr>
            </table>"#,
        );
        assert_eq!(map["Стандарт (4 метра)"], PRICE_ABSENT);
        assert_eq!(map["Стандарт (6 метров)"], "18990");
    }

    #[test]
    fn labelled_cell_without_label_is_skipped() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr>
                    <td>Стандарт</td><td>от</td>
                    <td>просто текст</td>
                    <td data-label="4 метра">16990</td>
                </tr>
            </table>"#,
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map["Стандарт (4 метра)"], "16990");
    }

    #[test]
    fn short_labelled_row_is_ignored() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr><td>Стандарт</td><td data-label="4 метра">16990</td></tr>
            </table>"#,
        );
        assert!(map.is_empty());
    }

    #[test]
    fn tie_and_foundation_tables_contribute_rows() {
        let map = extract(
            r#"
            <table class="tb2 adaptive poly-price">
                <tr><th>Длина</th><th>4 метра</th></tr>
                <tr><td>Стандарт</td><td>16990</td></tr>
            </table>
            <table class="tb2 adaptive">
                <tr><th>Стяжки</th><th>Цена</th></tr>
                <tr><td>Дополнительная</td><td>500 руб.</td></tr>
            </table>
            <table class="tb2 adaptive">
                <tr><th>Фундамент</th><th>Цена</th></tr>
                <tr><td>Брус 100х100</td><td>4500 руб.</td></tr>
                <tr><td>Без цены</td><td></td></tr>
            </table>"#,
        );
        assert_eq!(map["Стандарт (4 метра)"], "16990");
        assert_eq!(map["Цена 1 стяжки Дополнительная"], "500 руб.");
        assert_eq!(map["Цена фундамента Брус 100х100"], "4500 руб.");
        assert!(!map.keys().any(|k| k.contains("Без цены")));
    }

    #[test]
    fn missing_grid_yields_partial_or_empty_result() {
        let map = extract("<html><body><p>нет таблиц</p></body></html>");
        assert!(map.is_empty());

        // Supplements still parse when the primary grid is absent.
        let map = extract(
            r#"<table class="tb2 adaptive">
                <tr><th>Стяжки</th><th>Цена</th></tr>
                <tr><td>Дополнительная</td><td>500 руб.</td></tr>
            </table>"#,
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map["Цена 1 стяжки Дополнительная"], "500 руб.");
    }

    #[test]
    fn later_cell_overwrites_same_key() {
        let map = extract(
            r#"<table class="tb2 adaptive poly-price">
                <tr>
                    <td>Стандарт</td><td>от</td>
                    <td data-label="4 метра">16990</td>
                    <td data-label="4 метра">17990</td>
                </tr>
            </table>"#,
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map["Стандарт (4 метра)"], "17990");
    }
}
