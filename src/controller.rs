use crate::error::FetchError;
use crate::extract::{extract_characteristics, extract_prices, is_available, product_name};
use crate::services::log::CityLog;
use crate::services::session::{Session, SessionFactory};
use crate::types::{ControllerConfig, Record, ScrapeTarget};

/// Attempt lifecycle for one target. `Failed` is the `Err` channel of
/// [`Controller::run_attempt`]; a not-found page resolves the attempt to
/// `Ok(None)` from `Deciding` without touching the retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Loading,
    WaitingReady,
    Deciding,
    Extracting,
}

/// Owns the active session and drives each target through
/// load → ready-wait → availability gate → extraction.
///
/// The session handle lives here in every state. A session fault
/// discards the handle and replaces it with a fresh one from the
/// factory; no other failure touches it.
pub struct Controller {
    session: Box<dyn Session>,
    factory: Box<dyn SessionFactory>,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(
        factory: Box<dyn SessionFactory>,
        config: ControllerConfig,
    ) -> Result<Self, FetchError> {
        let session = factory.create()?;
        Ok(Self {
            session,
            factory,
            config,
        })
    }

    /// Drive one target to completion. `None` means the target produced
    /// no record: a not-found page, or the retry budget ran out. The run
    /// always continues with the next target either way.
    pub fn fetch(&mut self, target: &ScrapeTarget, log: &CityLog) -> Option<Record> {
        let mut attempt = 0u32;
        while attempt < self.config.max_retries {
            match self.run_attempt(target, log) {
                Ok(outcome) => return outcome,
                Err(err) => {
                    attempt += 1;
                    log.error(&format!(
                        "attempt {attempt}/{}: {err} ({})",
                        self.config.max_retries, target.url
                    ));
                    if err.forces_restart() {
                        self.restart_session(log);
                    }
                    std::thread::sleep(self.config.retry_backoff);
                }
            }
        }
        log.error(&format!(
            "giving up on {} after {} attempts",
            target.url, self.config.max_retries
        ));
        None
    }

    fn run_attempt(
        &mut self,
        target: &ScrapeTarget,
        log: &CityLog,
    ) -> Result<Option<Record>, FetchError> {
        let mut state = FetchState::Loading;
        loop {
            state = match state {
                FetchState::Loading => {
                    log.info(&format!("loading {}", target.url));
                    self.session.navigate(&target.url)?;
                    FetchState::WaitingReady
                }
                FetchState::WaitingReady => {
                    self.session.wait_ready(self.config.ready_timeout)?;
                    FetchState::Deciding
                }
                FetchState::Deciding => {
                    let doc = self.session.document().ok_or(FetchError::NoDocument)?;
                    if !is_available(doc) {
                        log.warn(&format!("page not found (404): {}", target.url));
                        return Ok(None);
                    }
                    FetchState::Extracting
                }
                FetchState::Extracting => {
                    let doc = self.session.document().ok_or(FetchError::NoDocument)?;
                    let name = product_name(doc, log);
                    let characteristics = extract_characteristics(doc, log);
                    let prices = extract_prices(doc, &self.config.tables, log);
                    log.info(&format!("record extracted: {name}"));
                    return Ok(Some(Record::assemble(
                        name,
                        characteristics,
                        prices,
                        &target.city,
                    )));
                }
            };
        }
    }

    /// Replace the owned session wholesale. The old handle is dropped,
    /// never reused. A factory failure keeps the old handle so the next
    /// attempt can still try.
    fn restart_session(&mut self, log: &CityLog) {
        match self.factory.create() {
            Ok(session) => {
                self.session = session;
                log.info("session recreated");
            }
            Err(err) => log.error(&format!("failed to recreate session: {err}")),
        }
    }
}
