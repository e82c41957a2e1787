use std::future::Future;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::tle::{parse_tle_lines, ElementSet, Provenance, TleCache, TleError};

/// Transport used to download the element feed.
pub trait TleFetcher: Send + Sync {
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, TleError>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, TleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl TleFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, TleError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub retries: u32,
    pub retry_delay: Duration,
    /// How long a served fallback is reused before the network is tried again.
    pub fallback_retry: Duration,
}

/// Supplies the current element set: fresh cache, then network, then the
/// embedded fallback. [`ElementSource::fetch`] never fails.
pub struct ElementSource<F = HttpFetcher> {
    settings: SourceSettings,
    cache: TleCache,
    fetcher: F,
    fallback_since: StdMutex<Option<Instant>>,
    refresh: Mutex<()>,
}

impl<F: TleFetcher> ElementSource<F> {
    pub fn new(settings: SourceSettings, cache: TleCache, fetcher: F) -> Self {
        Self {
            settings,
            cache,
            fetcher,
            fallback_since: StdMutex::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &TleCache {
        &self.cache
    }

    pub async fn fetch(&self) -> ElementSet {
        if let Some(cached) = self.cached() {
            return cached;
        }

        // One refresh at a time; whoever waited re-checks the cache first.
        let _guard = self.refresh.lock().await;
        if let Some(cached) = self.cached() {
            return cached;
        }
        if self.fallback_is_current() {
            return ElementSet::fallback();
        }

        match self.download().await {
            Ok(elements) => {
                if let Err(e) = self.cache.write(&elements) {
                    log::warn!(
                        "Failed to write TLE cache {}: {}",
                        self.cache.path().display(),
                        e
                    );
                }
                self.set_fallback_since(None);
                elements
            }
            Err(e) => {
                log::warn!("{}; using embedded fallback elements", e);
                self.set_fallback_since(Some(Instant::now()));
                ElementSet::fallback()
            }
        }
    }

    fn cached(&self) -> Option<ElementSet> {
        if !self.cache.is_fresh() {
            return None;
        }
        match self.cache.read() {
            Ok(elements) => Some(elements),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable TLE cache {}: {}",
                    self.cache.path().display(),
                    e
                );
                None
            }
        }
    }

    async fn download(&self) -> Result<ElementSet, TleError> {
        let attempts = self.settings.retries.max(1);
        let mut last = String::new();

        for attempt in 1..=attempts {
            match self.download_once().await {
                Ok(elements) => {
                    log::info!("Downloaded elements for {}", elements.name);
                    return Ok(elements);
                }
                Err(e) => {
                    log::warn!("TLE download attempt {}/{} failed: {}", attempt, attempts, e);
                    last = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.retry_delay).await;
                    }
                }
            }
        }

        Err(TleError::Exhausted { attempts, last })
    }

    async fn download_once(&self) -> Result<ElementSet, TleError> {
        let body = self.fetcher.fetch_text(&self.settings.url).await?;
        let (name, line1, line2) = parse_tle_lines(&body)?;
        ElementSet::parse(&name, &line1, &line2, Provenance::Network)
    }

    fn fallback_is_current(&self) -> bool {
        let since = *self
            .fallback_since
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        since
            .map(|at| at.elapsed() < self.settings.fallback_retry)
            .unwrap_or(false)
    }

    fn set_fallback_since(&self, value: Option<Instant>) {
        *self
            .fallback_since
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}
