use crate::error::FetchError;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    USER_AGENT,
};
use scraper::{Html, Selector};
use std::time::{Duration, Instant};

/// The owned navigation handle the controller drives: load a URL, wait
/// for the document to become ready, expose the parsed document.
///
/// One session is shared sequentially across the whole target list;
/// there are no concurrent navigations. A faulted session is never
/// reused — the controller asks its factory for a fresh one instead.
pub trait Session {
    fn navigate(&mut self, url: &str) -> Result<(), FetchError>;
    fn wait_ready(&mut self, timeout: Duration) -> Result<(), FetchError>;
    fn document(&self) -> Option<&Html>;
}

/// Builds replacement sessions when the current one faults.
pub trait SessionFactory {
    fn create(&self) -> Result<Box<dyn Session>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Sleep between readiness polls.
    pub ready_poll: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent:
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)"
                    .to_string(),
            request_timeout: Duration::from_secs(10),
            ready_poll: Duration::from_millis(500),
        }
    }
}

/// HTTP-backed session: navigation is a GET plus a parse, readiness is
/// bounded re-polling until the document has a non-empty `body`.
pub struct HttpSession {
    client: Client,
    config: SessionConfig,
    url: Option<String>,
    doc: Option<Html>,
}

impl HttpSession {
    pub fn new(config: SessionConfig) -> Result<Self, FetchError> {
        // Force HTTP/1.1; some of the mirrors' WAFs expect 1.1 + keep-alive
        let client = Client::builder()
            .http1_only()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            url: None,
            doc: None,
        })
    }

    fn get(&self, url: &str) -> Result<Html, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.8,en;q=0.5"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent)
                .unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
        );

        let resp = self.client.get(url).headers(headers).send()?;
        // Status is deliberately not inspected: the mirrors serve their
        // not-found page with inconsistent codes, so availability is
        // decided from the document itself.
        let text = resp.text()?;
        Ok(Html::parse_document(&text))
    }
}

impl Session for HttpSession {
    fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        let doc = self.get(url)?;
        self.url = Some(url.to_string());
        self.doc = Some(doc);
        Ok(())
    }

    fn wait_ready(&mut self, timeout: Duration) -> Result<(), FetchError> {
        let url = self.url.clone().ok_or(FetchError::NoDocument)?;
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(doc) = &self.doc {
                if document_ready(doc) {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(FetchError::ReadinessTimeout(timeout));
            }
            std::thread::sleep(self.config.ready_poll);
            self.doc = Some(self.get(&url)?);
        }
    }

    fn document(&self) -> Option<&Html> {
        self.doc.as_ref()
    }
}

/// Minimal structural readiness: the parsed document has a `body` with
/// any content at all. Empty and truncated-to-nothing responses fail.
fn document_ready(doc: &Html) -> bool {
    let Ok(sel) = Selector::parse("body") else {
        return false;
    };
    doc.select(&sel)
        .next()
        .map(|body| {
            body.children().next().is_some()
                || !body.text().collect::<String>().trim().is_empty()
        })
        .unwrap_or(false)
}

pub struct HttpSessionFactory {
    pub config: SessionConfig,
}

impl SessionFactory for HttpSessionFactory {
    fn create(&self) -> Result<Box<dyn Session>, FetchError> {
        Ok(Box::new(HttpSession::new(self.config.clone())?))
    }
}
