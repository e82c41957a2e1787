use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use orbit_watch::tle::{
    ElementSet, ElementSource, Provenance, SourceSettings, TleCache, TleError, TleFetcher,
};

const LINE1: &str = "1 25544U 98067A   24241.03733169  .00022625  00000+0  40054-3 0  9997";
const LINE2: &str = "2 25544  51.6393 319.3593 0006301 282.8570 136.4539 15.50177998469691";

#[derive(Clone)]
struct ScriptedFetcher {
    body: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn offline() -> Self {
        Self {
            body: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TleFetcher for ScriptedFetcher {
    async fn fetch_text(&self, _url: &str) -> Result<String, TleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone().ok_or(TleError::InvalidFormat(0))
    }
}

fn feed() -> String {
    format!("ISS (LIVE)\n{}\n{}\n", LINE1, LINE2)
}

fn temp_cache() -> PathBuf {
    std::env::temp_dir().join(format!("orbit-watch-tle-{}.txt", uuid::Uuid::new_v4()))
}

fn settings(retries: u32) -> SourceSettings {
    SourceSettings {
        url: "http://tle.invalid/stations.txt".to_string(),
        retries,
        retry_delay: Duration::ZERO,
        fallback_retry: Duration::ZERO,
    }
}

fn source(path: &PathBuf, fetcher: ScriptedFetcher, retries: u32) -> ElementSource<ScriptedFetcher> {
    let cache = TleCache::new(path.clone(), Duration::from_secs(24 * 60 * 60));
    ElementSource::new(settings(retries), cache, fetcher)
}

#[tokio::test]
async fn downloads_and_populates_cache() {
    let path = temp_cache();
    let fetcher = ScriptedFetcher::serving(&feed());
    let source = source(&path, fetcher.clone(), 3);

    let first = source.fetch().await;
    assert_eq!(first.provenance, Provenance::Network);
    assert_eq!(first.name, "ISS (LIVE)");
    assert_eq!(fetcher.calls(), 1);

    let second = source.fetch().await;
    assert_eq!(second.provenance, Provenance::Cache);
    assert!(second.same_elements(&first));
    assert_eq!(fetcher.calls(), 1);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn stale_cache_triggers_refresh() {
    let path = temp_cache();
    fs::write(&path, feed()).unwrap();
    let two_days_ago = SystemTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(two_days_ago)
        .unwrap();

    let fetcher = ScriptedFetcher::serving(&feed());
    let source = source(&path, fetcher.clone(), 1);
    assert!(!source.cache().is_fresh());

    let elements = source.fetch().await;
    assert_eq!(elements.provenance, Provenance::Network);
    assert_eq!(fetcher.calls(), 1);
    assert!(source.cache().is_fresh());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn falls_back_after_retries() {
    let path = temp_cache();
    let fetcher = ScriptedFetcher::offline();
    let source = source(&path, fetcher.clone(), 3);

    let elements = source.fetch().await;
    assert!(elements.is_fallback());
    assert!(elements.same_elements(&ElementSet::fallback()));
    assert_eq!(fetcher.calls(), 3);
    assert!(!path.exists());
}

#[tokio::test]
async fn malformed_download_falls_back() {
    let path = temp_cache();
    let fetcher = ScriptedFetcher::serving("<html>maintenance</html>\n");
    let source = source(&path, fetcher.clone(), 2);

    assert!(source.fetch().await.is_fallback());
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn corrupt_cache_is_a_miss() {
    let path = temp_cache();
    fs::write(&path, "ISS (ZARYA)\n1 25544U garbage\n2 25544 garbage\n").unwrap();

    let fetcher = ScriptedFetcher::serving(&feed());
    let source = source(&path, fetcher.clone(), 1);

    let elements = source.fetch().await;
    assert_eq!(elements.provenance, Provenance::Network);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(source.cache().read().unwrap().name, "ISS (LIVE)");

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn fallback_is_reused_within_retry_window() {
    let path = temp_cache();
    let fetcher = ScriptedFetcher::offline();
    let cache = TleCache::new(path.clone(), Duration::from_secs(60));
    let source = ElementSource::new(
        SourceSettings {
            fallback_retry: Duration::from_secs(600),
            ..settings(1)
        },
        cache,
        fetcher.clone(),
    );

    assert!(source.fetch().await.is_fallback());
    assert!(source.fetch().await.is_fallback());
    assert_eq!(fetcher.calls(), 1);
}
