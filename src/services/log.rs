use chrono::Utc;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Append-only diagnostic stream for one city, passed explicitly into
/// every component that wants to narrate — there is no global registry.
/// The stream is purely observational: write failures are swallowed so
/// logging can never fail the pipeline.
pub struct CityLog {
    path: Option<PathBuf>,
}

impl CityLog {
    pub fn open(dir: &Path, city: &str) -> crate::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: Some(dir.join(format!("parnik_{city}.log"))),
        })
    }

    /// A handle that drops everything. Used by tests and as the fallback
    /// when a log file cannot be created.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        let _ = self.write(level, message);
    }

    fn write(&self, level: LogLevel, message: &str) -> crate::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(
            file,
            "{} - {} - {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            level.as_str(),
            message
        )?;
        Ok(())
    }
}

/// Lazily opened per-city log handles for one run. Owned by the run
/// loop and handed out by reference; failing to open a file degrades
/// that city to a disabled handle.
pub struct CityLogs {
    dir: PathBuf,
    open: BTreeMap<String, CityLog>,
}

impl CityLogs {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open: BTreeMap::new(),
        }
    }

    pub fn for_city(&mut self, city: &str) -> &CityLog {
        self.open
            .entry(city.to_string())
            .or_insert_with(|| CityLog::open(&self.dir, city).unwrap_or_else(|_| CityLog::disabled()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("parnik_log_{}_{}", std::process::id(), name))
    }

    #[test]
    fn lines_carry_timestamp_and_level() {
        let dir = temp_dir("lines");
        let log = CityLog::open(&dir, "Москва").unwrap();
        log.info("поехали");
        log.warn("что-то не так");

        let content = fs::read_to_string(log.path().unwrap()).unwrap();
        let mut lines = content.lines();
        let first = lines.next().unwrap();
        assert!(first.contains(" - INFO - поехали"));
        // "YYYY-MM-DD HH:MM:SS" prefix
        assert_eq!(first.split(" - ").next().unwrap().len(), 19);
        assert!(lines.next().unwrap().contains(" - WARNING - что-то не так"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn appends_across_handles() {
        let dir = temp_dir("append");
        CityLog::open(&dir, "Тверь").unwrap().info("раз");
        CityLog::open(&dir, "Тверь").unwrap().info("два");

        let path = dir.join("parnik_Тверь.log");
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn disabled_handle_writes_nothing() {
        let log = CityLog::disabled();
        log.error("в пустоту");
        assert!(log.path().is_none());
    }

    #[test]
    fn registry_reuses_city_handles() {
        let dir = temp_dir("registry");
        let mut logs = CityLogs::new(&dir);
        logs.for_city("Казань").info("первая");
        logs.for_city("Казань").info("вторая");

        let content = fs::read_to_string(dir.join("parnik_Казань.log")).unwrap();
        assert_eq!(content.lines().count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }
}
