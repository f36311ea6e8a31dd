//! Catalog fetching and tabular parsing.
//!
//! A catalog is fetched exactly once per session, either from a local file or
//! over HTTP, optionally gzipped. Remote fetches are retried with exponential
//! backoff; once the attempts are exhausted the caller gets a
//! [`StarmapError::FetchExhausted`] to surface instead of waiting forever.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use super::{Catalog, NormalizeReport, RawRow};
use crate::error::{Result, StarmapError};

/// Gzip stream magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Where the catalog text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Path(PathBuf),
    Url(String),
}

impl FromStr for CatalogSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Catalog source cannot be empty".to_string());
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(CatalogSource::Url(s.to_string()))
        } else {
            Ok(CatalogSource::Path(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::Path(path) => write!(f, "{}", path.display()),
            CatalogSource::Url(url) => write!(f, "{url}"),
        }
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Path(PathBuf::from("data/hygdata.csv"))
    }
}

/// Retry schedule for remote catalog fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_backoff_ms: u64,
    /// Growth factor applied to the delay after each failure
    pub backoff_multiplier: f64,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
            request_timeout_secs: 30,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `failed_attempts` failures (1-based).
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1) as i32;
        let ms = self.initial_backoff_ms as f64 * self.backoff_multiplier.max(1.0).powi(exponent);
        Duration::from_millis(ms.min(u64::MAX as f64) as u64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Completion message delivered by [`spawn_catalog_load`].
pub type LoadResult = Result<(Catalog, NormalizeReport)>;

/// Catalog bytes to text. Invalid UTF-8 is replaced, never fatal, whether
/// or not the bytes were gzipped.
fn decode(bytes: Vec<u8>) -> Result<String> {
    let bytes = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut inflated = Vec::new();
        decoder.read_to_end(&mut inflated)?;
        inflated
    } else {
        bytes
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn fetch_url_once(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send()?;

    if !response.status().is_success() {
        return Err(StarmapError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    Ok(response.bytes()?.to_vec())
}

fn fetch_url(url: &str, policy: &RetryPolicy) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(policy.request_timeout())
        .build()?;

    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match fetch_url_once(&client, url) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                last_error = e.to_string();
                if attempt < attempts {
                    let delay = policy.backoff(attempt);
                    log::warn!(
                        "Catalog fetch attempt {attempt}/{attempts} failed ({e}), \
                         retrying in {delay:?}"
                    );
                    thread::sleep(delay);
                } else {
                    log::error!("Catalog fetch attempt {attempt}/{attempts} failed ({e})");
                }
            }
        }
    }

    Err(StarmapError::FetchExhausted {
        attempts,
        last_error,
    })
}

/// Fetch the catalog text, decompressing gzip content transparently.
///
/// Local files are read once; a missing file will not appear by waiting.
/// URLs are retried according to `policy`.
pub fn fetch_catalog_text(source: &CatalogSource, policy: &RetryPolicy) -> Result<String> {
    let bytes = match source {
        CatalogSource::Path(path) => fs::read(path)?,
        CatalogSource::Url(url) => fetch_url(url, policy)?,
    };
    decode(bytes)
}

/// Split catalog text into header-keyed rows.
///
/// Records the tokenizer cannot read are skipped with a warning; short
/// records simply lack the trailing columns.
pub fn parse_catalog_text(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(StarmapError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let row: RawRow = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect();
                rows.push(row);
            }
            Err(e) => log::warn!("Skipping unreadable catalog record {}: {e}", i + 1),
        }
    }

    Ok(rows)
}

/// Fetch, parse and normalize a catalog.
pub fn load_catalog(source: &CatalogSource, policy: &RetryPolicy) -> LoadResult {
    let start = Instant::now();
    log::info!("Loading star catalog from {source}");

    let text = fetch_catalog_text(source, policy)?;
    let rows = parse_catalog_text(&text)?;
    let (catalog, report) = Catalog::from_rows(&rows);

    log::info!(
        "Loaded {} stars from {source} in {:?}",
        catalog.len(),
        start.elapsed()
    );
    Ok((catalog, report))
}

/// Load a catalog on a background thread.
///
/// Exactly one [`LoadResult`] is delivered on the returned channel. The load
/// cannot be cancelled; dropping the receiver just discards the result.
pub fn spawn_catalog_load(source: CatalogSource, policy: RetryPolicy) -> Receiver<LoadResult> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let fallback_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name("catalog-load".to_string())
        .spawn(move || {
            let result = load_catalog(&source, &policy);
            if tx.send(result).is_err() {
                log::debug!("Catalog load finished after its receiver was dropped");
            }
        });

    if let Err(e) = spawned {
        let _ = fallback_tx.send(Err(StarmapError::Io(e)));
    }

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = "id,x,y,z,ci,proper\n\
                          0,0,0,0,0.656,Sol\n\
                          1,-1.6,8.0,-2.2,0.0,Sirius\n\
                          2,,1,1,,\n";

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            backoff_multiplier: 2.0,
            request_timeout_secs: 2,
        }
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!(
            "https://example.com/hyg.csv".parse::<CatalogSource>().unwrap(),
            CatalogSource::Url("https://example.com/hyg.csv".to_string())
        );
        assert_eq!(
            "data/hyg.csv".parse::<CatalogSource>().unwrap(),
            CatalogSource::Path(PathBuf::from("data/hyg.csv"))
        );
        assert!("  ".parse::<CatalogSource>().is_err());
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy {
            initial_backoff_ms: 100,
            backoff_multiplier: 3.0,
            ..Default::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(300));
        assert_eq!(policy.backoff(3), Duration::from_millis(900));
    }

    #[test]
    fn test_parse_rows_keyed_by_header() {
        let rows = parse_catalog_text(SAMPLE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["proper"], "Sirius");
        assert_eq!(rows[1]["x"], "-1.6");
        assert_eq!(rows[2]["x"], "");
    }

    #[test]
    fn test_parse_short_record_lacks_trailing_columns() {
        let rows = parse_catalog_text("x,y,z,proper\n1,2,3\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("proper"));
    }

    #[test]
    fn test_parse_empty_text_has_no_header() {
        assert!(matches!(
            parse_catalog_text(""),
            Err(StarmapError::MissingHeader)
        ));
    }

    #[test]
    fn test_load_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, SAMPLE).unwrap();

        let (catalog, report) =
            load_catalog(&CatalogSource::Path(path), &RetryPolicy::default()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(catalog.stars()[1].proper_name.as_deref(), Some("Sirius"));
    }

    #[test]
    fn test_load_gzipped_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let text = fetch_catalog_text(&CatalogSource::Path(path), &RetryPolicy::default()).unwrap();
        assert_eq!(text, SAMPLE);
    }

    #[test]
    fn test_non_utf8_bytes_load_the_same_plain_or_gzipped() {
        let dir = TempDir::new().unwrap();
        let mut bytes = b"x,y,z,proper\n1,0,0,Caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"\n2,0,0,Vega\n");

        let plain = dir.path().join("latin1.csv");
        fs::write(&plain, &bytes).unwrap();

        let gzipped = dir.path().join("latin1.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes).unwrap();
        fs::write(&gzipped, encoder.finish().unwrap()).unwrap();

        let policy = RetryPolicy::default();
        let (from_plain, _) = load_catalog(&CatalogSource::Path(plain), &policy).unwrap();
        let (from_gzip, _) = load_catalog(&CatalogSource::Path(gzipped), &policy).unwrap();

        assert_eq!(from_gzip.len(), 2);
        assert_eq!(from_plain.stars(), from_gzip.stars());
        assert_eq!(
            from_gzip.stars()[0].proper_name.as_deref(),
            Some("Caf\u{FFFD}")
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let source = CatalogSource::Path(dir.path().join("absent.csv"));
        assert!(matches!(
            fetch_catalog_text(&source, &fast_policy(3)),
            Err(StarmapError::Io(_))
        ));
    }

    #[test]
    fn test_unreachable_url_exhausts_retries() {
        // Port 9 (discard) is not expected to accept HTTP connections locally
        let source = CatalogSource::Url("http://127.0.0.1:9/hygdata.csv".to_string());
        match fetch_catalog_text(&source, &fast_policy(2)) {
            Err(StarmapError::FetchExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected FetchExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_spawn_delivers_single_result() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, SAMPLE).unwrap();

        let rx = spawn_catalog_load(CatalogSource::Path(path), RetryPolicy::default());
        let (catalog, _) = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("load should complete")
            .expect("load should succeed");
        assert_eq!(catalog.len(), 2);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
