//! Elevation tile download with bounded retry.
//!
//! The transport is behind the [`TileSource`] trait so the fetcher can be
//! driven by an in-memory source in tests. [`ReqwestTileSource`] is the
//! production implementation using a blocking `reqwest` client.

use crate::region::Region;
use crate::{DemError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of extra attempts after a failed download.
pub const DEFAULT_RETRIES: u32 = 2;

/// Default delay before the first retry; doubles on each further attempt.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Default ceiling for the retry delay.
pub const DEFAULT_MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Default whole-request timeout for a tile download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Something that can return the bytes behind a URL.
pub trait TileSource {
    /// Fetch the full response body for `url`.
    ///
    /// Non-success statuses must be reported as [`DemError::TransferFailed`].
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP tile source backed by `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestTileSource {
    client: reqwest::blocking::Client,
}

impl ReqwestTileSource {
    /// Create a source with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Some(DEFAULT_TIMEOUT))
    }

    /// Create a source with an explicit timeout. `None` blocks until the
    /// server completes or drops the connection.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl TileSource for ReqwestTileSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(DemError::TransferFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        Ok(response.bytes()?.to_vec())
    }
}

/// Options controlling a [`TileFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Archive base URL; region URLs are built under it.
    pub archive_base_url: String,
    /// Skip regions whose local file already exists.
    pub skip_existing: bool,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before the first retry.
    pub retry_backoff: Duration,
    /// Upper bound for the doubled retry delay.
    pub max_retry_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            archive_base_url: crate::region::DEFAULT_ARCHIVE_BASE_URL.to_string(),
            skip_existing: false,
            retries: DEFAULT_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_retry_backoff: DEFAULT_MAX_RETRY_BACKOFF,
        }
    }
}

/// What happened to a single region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The tile was downloaded and written to `path`.
    Downloaded {
        /// Local file.
        path: PathBuf,
        /// Body size in bytes.
        bytes: u64,
    },
    /// The local file already existed and `skip_existing` was set.
    Skipped {
        /// Local file.
        path: PathBuf,
    },
}

impl FetchOutcome {
    /// Local path of the tile.
    pub fn path(&self) -> &Path {
        match self {
            FetchOutcome::Downloaded { path, .. } | FetchOutcome::Skipped { path } => path,
        }
    }
}

/// Download statistics for the fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Number of tiles downloaded.
    pub tiles_downloaded: usize,
    /// Number of tiles left in place because they were already present.
    pub tiles_skipped: usize,
    /// Total bytes downloaded.
    pub bytes_downloaded: u64,
}

/// Downloads region tiles from an archive into a local directory.
pub struct TileFetcher<S> {
    source: S,
    options: FetchOptions,
    tiles_downloaded: AtomicUsize,
    tiles_skipped: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl<S> std::fmt::Debug for TileFetcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFetcher")
            .field("options", &self.options)
            .field("stats", &self.download_stats())
            .finish()
    }
}

impl<S> TileFetcher<S> {
    /// Create a fetcher over a tile source.
    pub fn new(source: S, options: FetchOptions) -> Self {
        Self {
            source,
            options,
            tiles_downloaded: AtomicUsize::new(0),
            tiles_skipped: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Underlying tile source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Download statistics so far.
    pub fn download_stats(&self) -> DownloadStats {
        DownloadStats {
            tiles_downloaded: self.tiles_downloaded.load(Ordering::Relaxed),
            tiles_skipped: self.tiles_skipped.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }

    /// Delay before retry number `attempt` (1-based): the base delay doubled
    /// per earlier retry, capped at `max_retry_backoff`.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.options
            .retry_backoff
            .saturating_mul(factor)
            .min(self.options.max_retry_backoff)
    }
}

impl<S: TileSource> TileFetcher<S> {

    /// Download one region's tile into `download_root`.
    ///
    /// The body is written to a `.part` file first and renamed into place so
    /// an interrupted transfer never leaves a truncated tile under the final
    /// name.
    pub fn fetch_region(&self, region: &Region, download_root: &Path) -> Result<FetchOutcome> {
        let path = region.local_path(download_root);

        if self.options.skip_existing && path.exists() {
            debug!(region = %region, path = %path.display(), "Tile already present, skipping");
            self.tiles_skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(FetchOutcome::Skipped { path });
        }

        let url = region.download_url(&self.options.archive_base_url);
        let body = self.fetch_with_retry(region, &url)?;

        fs::create_dir_all(download_root)?;
        let part = path.with_extension("tif.part");
        write_file(&part, &body)?;
        fs::rename(&part, &path).map_err(|source| DemError::StoreFailed {
            path: path.clone(),
            source,
        })?;

        let bytes = body.len() as u64;
        self.tiles_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
        info!(region = %region, bytes, path = %path.display(), "Downloaded tile");

        Ok(FetchOutcome::Downloaded { path, bytes })
    }

    fn fetch_with_retry(&self, region: &Region, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            debug!(region = %region, url, attempt, "Requesting tile");
            match self.source.fetch(url) {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.options.retries => {
                    attempt += 1;
                    let delay = self.retry_delay(attempt);
                    warn!(
                        region = %region,
                        error = %err,
                        attempt,
                        max_retries = self.options.retries,
                        "Tile download failed, retrying in {:?}",
                        delay
                    );
                    std::thread::sleep(delay);
                }
                Err(DemError::TransferFailed { url, reason }) => {
                    return Err(DemError::TransferFailed { url, reason })
                }
                Err(err) => {
                    return Err(DemError::TransferFailed {
                        url: url.to_string(),
                        reason: err.to_string(),
                    })
                }
            }
        }
    }
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|source| DemError::StoreFailed {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(body).map_err(|source| DemError::StoreFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays scripted responses and records requested URLs.
    struct ScriptedSource {
        responses: RefCell<VecDeque<Result<Vec<u8>>>>,
        requests: RefCell<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<u8>>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl TileSource for ScriptedSource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(DemError::TransferFailed {
                    url: url.to_string(),
                    reason: "no scripted response".to_string(),
                }))
        }
    }

    fn not_found(url: &str) -> DemError {
        DemError::TransferFailed {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        }
    }

    fn options(retries: u32) -> FetchOptions {
        FetchOptions {
            archive_base_url: "http://archive.test/TIFF".to_string(),
            skip_existing: false,
            retries,
            retry_backoff: Duration::ZERO,
            max_retry_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn test_downloads_body_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::parse("n29w082").unwrap();
        let fetcher = TileFetcher::new(ScriptedSource::new(vec![Ok(b"tiff-bytes".to_vec())]), options(0));

        let outcome = fetcher.fetch_region(&region, dir.path()).unwrap();

        let expected = dir.path().join("USGS_1_n29w082.tif");
        assert_eq!(
            outcome,
            FetchOutcome::Downloaded {
                path: expected.clone(),
                bytes: 10
            }
        );
        assert_eq!(fs::read(&expected).unwrap(), b"tiff-bytes");
        assert!(!dir.path().join("USGS_1_n29w082.tif.part").exists());
        assert_eq!(
            fetcher.source().requests.borrow().as_slice(),
            ["http://archive.test/TIFF/n29w082/USGS_1_n29w082.tif"]
        );
        assert_eq!(
            fetcher.download_stats(),
            DownloadStats {
                tiles_downloaded: 1,
                tiles_skipped: 0,
                bytes_downloaded: 10
            }
        );
    }

    #[test]
    fn test_retries_then_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::parse("n29w082").unwrap();
        let source = ScriptedSource::new(vec![Err(not_found("u")), Ok(vec![1, 2, 3])]);
        let fetcher = TileFetcher::new(source, options(2));

        let outcome = fetcher.fetch_region(&region, dir.path()).unwrap();
        assert!(matches!(outcome, FetchOutcome::Downloaded { bytes: 3, .. }));
        assert_eq!(fetcher.source().requests.borrow().len(), 2);
    }

    #[test]
    fn test_gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::parse("n29w082").unwrap();
        let source = ScriptedSource::new(vec![
            Err(not_found("u")),
            Err(not_found("u")),
            Err(not_found("u")),
            Ok(vec![0]),
        ]);
        let fetcher = TileFetcher::new(source, options(2));

        let err = fetcher.fetch_region(&region, dir.path()).unwrap_err();
        assert!(matches!(err, DemError::TransferFailed { .. }));
        assert_eq!(fetcher.source().requests.borrow().len(), 3);
        assert!(!region.local_path(dir.path()).exists());
        assert_eq!(fetcher.download_stats(), DownloadStats::default());
    }

    #[test]
    fn test_default_redownloads_existing() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::parse("n29w082").unwrap();
        fs::write(region.local_path(dir.path()), b"old").unwrap();

        let fetcher = TileFetcher::new(ScriptedSource::new(vec![Ok(b"new".to_vec())]), options(0));
        fetcher.fetch_region(&region, dir.path()).unwrap();

        assert_eq!(fs::read(region.local_path(dir.path())).unwrap(), b"new");
    }

    #[test]
    fn test_skip_existing() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::parse("n29w082").unwrap();
        fs::write(region.local_path(dir.path()), b"old").unwrap();

        let mut opts = options(0);
        opts.skip_existing = true;
        let fetcher = TileFetcher::new(ScriptedSource::new(vec![]), opts);
        let outcome = fetcher.fetch_region(&region, dir.path()).unwrap();

        assert!(matches!(outcome, FetchOutcome::Skipped { .. }));
        assert!(fetcher.source().requests.borrow().is_empty());
        assert_eq!(fetcher.download_stats().tiles_skipped, 1);
        assert_eq!(fetcher.download_stats().tiles_downloaded, 0);
    }

    #[test]
    fn test_retry_delay_doubles_up_to_cap() {
        let opts = FetchOptions {
            retry_backoff: Duration::from_millis(500),
            max_retry_backoff: Duration::from_secs(3),
            ..options(20)
        };
        let fetcher = TileFetcher::new(ScriptedSource::new(vec![]), opts);

        let delays: Vec<u128> = (1..=5).map(|n| fetcher.retry_delay(n).as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 3000, 3000]);
        assert_eq!(fetcher.retry_delay(20), Duration::from_secs(3));
        assert_eq!(fetcher.retry_delay(64), Duration::from_secs(3));
    }

    #[test]
    fn test_debug_shows_stats() {
        let fetcher = TileFetcher::new((), FetchOptions::default());
        let text = format!("{:?}", fetcher);
        assert!(text.contains("tiles_downloaded: 0"));
    }
}
