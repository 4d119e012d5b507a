use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Attribute names the characteristics extractor is allowed to keep.
/// Everything else on the description block is discarded with a warning.
pub const CHARACTERISTIC_KEYS: [&str; 6] = [
    "Каркас",
    "Ширина",
    "Высота",
    "Снеговая нагрузка",
    "Горизонтальные стяжки",
    "Комплектация",
];

pub fn is_characteristic_key(key: &str) -> bool {
    CHARACTERISTIC_KEYS.contains(&key)
}

/// Recorded for a price cell that exists but has no visible text.
/// Distinguishes "the grid has this slot, empty" from "no such slot".
pub const PRICE_ABSENT: &str = "Цена отсутствует";

/// Fallback product name when the page has no usable `h1`.
pub const NAME_NOT_SPECIFIED: &str = "Не указано";

/// One (product, city, URL) unit of work. Field names follow the columns
/// of the links CSV, so the file deserializes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    #[serde(rename = "Название")]
    pub name: String,
    #[serde(rename = "Город")]
    pub city: String,
    #[serde(rename = "ГородКод")]
    pub city_code: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl ScrapeTarget {
    /// A target is usable only when every column carried a value.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
            && !self.city.is_empty()
            && !self.city_code.is_empty()
            && !self.url.is_empty()
    }
}

/// One extracted catalog record. Terminal: assembled once, never mutated.
/// Serialized field names match the original output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Название")]
    pub name: String,
    #[serde(rename = "Характеристики")]
    pub characteristics: BTreeMap<String, String>,
    #[serde(rename = "Цены")]
    pub prices: BTreeMap<String, String>,
    #[serde(rename = "Город")]
    pub city: String,
}

impl Record {
    /// Pure merge of the extraction results for one target. No validation
    /// beyond presence; consumers must tolerate missing characteristic keys.
    pub fn assemble(
        name: String,
        characteristics: BTreeMap<String, String>,
        prices: BTreeMap<String, String>,
        city: &str,
    ) -> Self {
        Self {
            name,
            characteristics,
            prices,
            city: city.to_string(),
        }
    }
}

/// Column conventions for the price grids. The regional mirrors disagree
/// on whether a "cost" column sits between the variant name and the first
/// price cell, so the skip counts are configuration, not constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTableLayout {
    /// Shape A: index of the first cell that may carry a `data-label`.
    pub grid_first_price_cell: usize,
    /// Shape A: rows with fewer cells than this are ignored.
    pub grid_min_row_cells: usize,
    /// Shape B: index of the first value cell after the variant column
    /// (1 = no cost column, 2 = cost column present).
    pub header_value_offset: usize,
}

impl Default for PriceTableLayout {
    fn default() -> Self {
        Self {
            grid_first_price_cell: 2,
            grid_min_row_cells: 3,
            header_value_offset: 1,
        }
    }
}

/// Retry and timing knobs for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Consecutive failed attempts allowed per target before giving up.
    pub max_retries: u32,
    /// Budget for the document to become ready after navigation.
    pub ready_timeout: Duration,
    /// Fixed sleep between failed attempts.
    pub retry_backoff: Duration,
    pub tables: PriceTableLayout,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            ready_timeout: Duration::from_secs(15),
            retry_backoff: Duration::from_secs(3),
            tables: PriceTableLayout::default(),
        }
    }
}

/// Uniform range for the courtesy delay between targets.
#[derive(Debug, Clone, Copy)]
pub struct PacingRange {
    pub min: Duration,
    pub max: Duration,
}

impl Default for PacingRange {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(3),
        }
    }
}
