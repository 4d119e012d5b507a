use crate::services::log::CityLog;
use crate::types::ScrapeTarget;
use std::path::Path;
use url::Url;

/// Read the links CSV (`Название, Город, ГородКод, URL`) into targets.
///
/// Rows missing a field or carrying an unparsable URL are skipped with a
/// warning; a bad row never aborts the load.
pub fn read_targets(path: &Path, log: &CityLog) -> crate::Result<Vec<ScrapeTarget>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut targets = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<ScrapeTarget>() {
        match row {
            Ok(target) => {
                if !target.is_complete() {
                    skipped += 1;
                    log.warn(&format!("incomplete row skipped: {:?}", target.name));
                    continue;
                }
                if Url::parse(&target.url).is_err() {
                    skipped += 1;
                    log.warn(&format!("invalid url skipped: {}", target.url));
                    continue;
                }
                targets.push(target);
            }
            Err(e) => {
                skipped += 1;
                log.warn(&format!("unreadable row skipped: {e}"));
            }
        }
    }

    log.info(&format!(
        "{} targets loaded from {} ({} rows skipped)",
        targets.len(),
        path.display(),
        skipped
    ));
    Ok(targets)
}

/// Keep only targets for the named cities; an empty filter keeps all.
pub fn filter_cities(targets: Vec<ScrapeTarget>, cities: &[String]) -> Vec<ScrapeTarget> {
    if cities.is_empty() {
        return targets;
    }
    targets
        .into_iter()
        .filter(|t| cities.iter().any(|c| c == &t.city))
        .collect()
}

/// Build a product URL on a regional mirror from the city code and a
/// catalog path: `.html` is stripped and a trailing slash ensured.
pub fn mirror_url(site: &str, city_code: &str, path: &str) -> String {
    let trimmed = path
        .strip_suffix(".html")
        .unwrap_or(path)
        .trim_start_matches('/');
    let mut tail = trimmed.to_string();
    if !tail.ends_with('/') {
        tail.push('/');
    }
    format!("https://{city_code}.{site}/{tail}")
}
