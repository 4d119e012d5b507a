use crate::controller::Controller;
use crate::services::log::{CityLog, CityLogs};
use crate::services::session::{HttpSessionFactory, SessionConfig};
use crate::services::{store, targets};
use crate::types::{ControllerConfig, PacingRange, Record};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Links CSV (`Название, Город, ГородКод, URL`).
    pub links: PathBuf,
    /// Destination for the extracted records (pretty JSON).
    pub output: PathBuf,
    /// Optional flat per-price CSV export.
    pub price_csv: Option<PathBuf>,
    /// Directory for the per-city log files.
    pub log_dir: PathBuf,
    /// Only process these cities; empty processes everything.
    pub cities: Vec<String>,
    pub controller: ControllerConfig,
    pub session: SessionConfig,
    pub pacing: PacingRange,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            links: PathBuf::from("teplicy_links_final.csv"),
            output: PathBuf::from("teplicy_data.json"),
            price_csv: None,
            log_dir: PathBuf::from("logs"),
            cities: Vec::new(),
            controller: ControllerConfig::default(),
            session: SessionConfig::default(),
            pacing: PacingRange::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Targets taken on after the city filter.
    pub targets: usize,
    /// Records written to the output.
    pub extracted: usize,
    /// Targets that produced nothing (not found, or retries exhausted).
    pub missed: usize,
}

/// Process the whole target list sequentially over one owned session
/// and persist the extracted records. Failed targets are absent from
/// the output; only the summary counts them.
pub fn run(opts: &RunOptions) -> crate::Result<RunSummary> {
    let run_log = CityLog::open(&opts.log_dir, "run").unwrap_or_else(|_| CityLog::disabled());
    let mut logs = CityLogs::new(&opts.log_dir);

    let all = targets::read_targets(&opts.links, &run_log)?;
    let list = targets::filter_cities(all, &opts.cities);
    if !opts.cities.is_empty() {
        run_log.info(&format!(
            "city filter {:?} kept {} targets",
            opts.cities,
            list.len()
        ));
    }

    let factory = HttpSessionFactory {
        config: opts.session.clone(),
    };
    let mut controller = Controller::new(Box::new(factory), opts.controller.clone())?;

    let mut records: Vec<Record> = Vec::new();
    let total = list.len();
    for (idx, target) in list.iter().enumerate() {
        let log = logs.for_city(&target.city);
        log.info(&format!("processing {} ({})", target.name, target.city));
        match controller.fetch(target, log) {
            Some(record) => {
                log.info(&format!("done: {}", target.name));
                records.push(record);
            }
            None => log.warn(&format!("no record for {} ({})", target.name, target.city)),
        }
        if idx + 1 < total {
            pacing_delay(opts.pacing);
        }
    }

    store::write_json(&opts.output, &records)?;
    if let Some(csv_path) = &opts.price_csv {
        store::write_price_csv(csv_path, &records)?;
    }
    run_log.info(&format!(
        "run finished: {}/{} records extracted",
        records.len(),
        total
    ));

    Ok(RunSummary {
        targets: total,
        extracted: records.len(),
        missed: total - records.len(),
    })
}

/// Courtesy delay between targets, uniform-ish over the configured range.
fn pacing_delay(range: PacingRange) {
    let span_ms = range
        .max
        .as_millis()
        .saturating_sub(range.min.as_millis()) as u64;
    let wait = range.min + Duration::from_millis(jitter_ms(span_ms.max(1)));
    std::thread::sleep(wait);
}

fn jitter_ms(range: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_nanos(0));
    let nanos = now.subsec_nanos() as u64;
    let micros = (now.as_micros() & 0xFFFF) as u64;
    (nanos ^ (micros << 5)) % range
}
