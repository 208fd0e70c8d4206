//! Bing image-of-the-day feed and validated image downloads.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use image::ImageFormat;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use daywall_core::fs_util::atomic_write;
use daywall_core::namer;
use daywall_core::ports::{FeedEntry, ImageDownloader, MetadataFeed};
use daywall_core::FetchError;

pub const BING_BASE_URL: &str = "https://www.bing.com";

const USER_AGENT: &str = concat!("daywall/", env!("CARGO_PKG_VERSION"));
const FEED_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ArchiveWire {
    #[serde(default)]
    images: Vec<ImageWire>,
}

#[derive(Debug, Deserialize)]
struct ImageWire {
    url: Option<String>,
    startdate: Option<String>,
    title: Option<String>,
    copyright: Option<String>,
}

pub struct BingClient {
    feed_agent: ureq::Agent,
    image_agent: ureq::Agent,
    base_url: String,
}

impl Default for BingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BingClient {
    pub fn new() -> Self {
        Self::with_base_url(BING_BASE_URL)
    }

    /// Point the client at another host, e.g. a local test server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            feed_agent: ureq::AgentBuilder::new().timeout(FEED_TIMEOUT).build(),
            image_agent: ureq::AgentBuilder::new()
                .timeout_connect(DOWNLOAD_CONNECT_TIMEOUT)
                .timeout_read(DOWNLOAD_READ_TIMEOUT)
                .build(),
            base_url: base_url.into(),
        }
    }

    fn archive_url(&self, region: &str) -> Result<Url, FetchError> {
        let endpoint = format!(
            "{}/HPImageArchive.aspx",
            self.base_url.trim_end_matches('/')
        );
        Url::parse_with_params(
            &endpoint,
            &[("format", "js"), ("idx", "0"), ("n", "1"), ("mkt", region)],
        )
        .map_err(|e| FetchError::Feed(format!("bad feed endpoint {endpoint}: {e}")))
    }
}

impl MetadataFeed for BingClient {
    fn fetch_metadata(&self, region: &str) -> Result<FeedEntry, FetchError> {
        let url = self.archive_url(region)?;
        debug!(%url, "fetching feed");

        let body = self
            .feed_agent
            .get(url.as_str())
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(network_error)?
            .into_string()
            .map_err(|e| FetchError::Network(format!("read feed body: {e}")))?;

        let entry = parse_archive(&body, &self.base_url)?;
        info!(date = %entry.date, title = %entry.title, "feed entry");
        Ok(entry)
    }
}

impl ImageDownloader for BingClient {
    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "downloading image");
        let resp = self
            .image_agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(network_error)?;

        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_IMAGE_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::Network(format!("read image body: {e}")))?;
        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(FetchError::Validation(format!(
                "image larger than {MAX_IMAGE_BYTES} bytes"
            )));
        }

        let format = validate_image(&bytes)?;
        debug!(bytes = bytes.len(), ?format, "image validated");
        Ok(bytes)
    }
}

fn network_error(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, resp) => {
            FetchError::Network(format!("HTTP {code} from {}", resp.get_url()))
        }
        ureq::Error::Transport(t) => FetchError::Network(t.to_string()),
    }
}

/// Parse the first image of an `HPImageArchive` JSON response.
pub fn parse_archive(body: &str, base_url: &str) -> Result<FeedEntry, FetchError> {
    let wire: ArchiveWire = serde_json::from_str(body)
        .map_err(|e| FetchError::Feed(format!("invalid feed JSON: {e}")))?;
    let image = wire
        .images
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Feed("feed has no images".to_string()))?;

    let raw_url = image
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| FetchError::Feed("feed image has no url".to_string()))?;
    let source_url = Url::parse(base_url)
        .and_then(|base| base.join(&raw_url))
        .map_err(|e| FetchError::Feed(format!("bad image url {raw_url:?}: {e}")))?;

    let date = image
        .startdate
        .as_deref()
        .and_then(namer::parse_feed_date)
        .ok_or_else(|| FetchError::Feed(format!("bad startdate {:?}", image.startdate)))?;

    let copyright = image.copyright.unwrap_or_default();
    let description = copyright
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(FeedEntry {
        source_url: source_url.into(),
        date,
        title: image.title.unwrap_or_default(),
        description,
    })
}

/// Accept only bytes that decode as JPEG or PNG.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, FetchError> {
    if bytes.is_empty() {
        return Err(FetchError::Validation("empty image body".to_string()));
    }
    let format = image::guess_format(bytes)
        .map_err(|_| FetchError::Validation("unrecognized image data".to_string()))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(FetchError::Validation(format!(
            "unsupported image format {format:?}"
        )));
    }
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| FetchError::Validation(format!("corrupt {format:?} image: {e}")))?;
    Ok(format)
}

/// Download `url` and write it to `dest`. Nothing is left at `dest` when validation fails.
pub fn download_to(
    downloader: &impl ImageDownloader,
    url: &str,
    dest: &Path,
) -> anyhow::Result<()> {
    let bytes = downloader
        .download(url)
        .with_context(|| format!("download {url}"))?;
    atomic_write(dest, &bytes).with_context(|| format!("write {}", dest.display()))?;
    info!(path = %dest.display(), bytes = bytes.len(), "image saved");
    Ok(())
}
