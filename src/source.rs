//! Database source locators and fetching.
//!
//! A locator is classified once, when the configuration is built, as either
//! a remote URL or a local file path. Fetching returns the complete contents;
//! gzip-compressed sources are decompressed transparently.

use flate2::read::GzDecoder;
use reqwest::Url;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Default download timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options controlling how a source is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Overall timeout for a remote download
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Where the database bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// HTTP(S) URL, fetched with a GET request
    Remote {
        url: Url,
        /// Locator as written, used in diagnostics
        locator: String,
    },
    /// File on the local filesystem
    Local(PathBuf),
}

impl SourceLocator {
    /// Classify a locator string.
    ///
    /// Absolute `http`/`https` URLs are remote, `file://` URLs and anything
    /// that does not parse as a URL are local paths.
    pub fn parse(locator: &str) -> Self {
        let parsed = match Url::parse(locator) {
            Ok(url) => url,
            Err(_) => return SourceLocator::Local(PathBuf::from(locator)),
        };

        let scheme = parsed.scheme().to_string();
        match scheme.as_str() {
            "http" | "https" if parsed.has_host() => SourceLocator::Remote {
                url: parsed,
                locator: locator.to_string(),
            },
            "file" => match parsed.to_file_path() {
                Ok(path) => SourceLocator::Local(path),
                Err(()) => SourceLocator::Local(PathBuf::from(locator)),
            },
            _ => SourceLocator::Local(PathBuf::from(locator)),
        }
    }

    /// Check if this locator points at a remote URL.
    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocator::Remote { .. })
    }

    /// Read the complete contents of the source.
    pub fn fetch(&self, options: &FetchOptions) -> Result<Vec<u8>> {
        let raw = match self {
            SourceLocator::Remote { url, .. } => self.download(url, options)?,
            SourceLocator::Local(path) => self.read_file(path)?,
        };

        let raw_len = raw.len();
        if !is_gzip(&raw) {
            log::info!("Read {} bytes from {}", raw_len, self);
            return Ok(raw);
        }

        let mut decoder = GzDecoder::new(&raw[..]);
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| Error::source_unavailable(self.to_string(), e))?;

        log::info!(
            "Read {} bytes from {} (compressed: {} bytes)",
            data.len(),
            self,
            raw_len
        );
        Ok(data)
    }

    fn download(&self, url: &Url, options: &FetchOptions) -> Result<Vec<u8>> {
        log::debug!("Downloading {} (timeout {:?})", url, options.timeout);

        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::source_unavailable(self.to_string(), e))?;

        let response = client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::source_unavailable(self.to_string(), e))?;

        let body = response
            .bytes()
            .map_err(|e| Error::source_unavailable(self.to_string(), e))?;
        Ok(body.to_vec())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        log::debug!("Reading {}", path.display());
        fs::read(path).map_err(|e| Error::source_unavailable(self.to_string(), e))
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Remote { locator, .. } => write!(f, "{}", locator),
            SourceLocator::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Check if data is gzip compressed.
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}
