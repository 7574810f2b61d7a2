use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::encoding;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("bad url {url:?}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A fetched page: raw bytes plus the decoding strategies the site needs.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    url: Url,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl FetchedPage {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode honouring the charset the server declared.
    pub fn text_declared(&self) -> String {
        encoding::declared(&self.bytes, self.charset().as_deref())
    }

    /// Decode by content sniffing, ignoring the declared charset. The
    /// presentation pages label themselves Latin-1 while serving UTF-8.
    pub fn text_sniffed(&self) -> String {
        encoding::sniffed(&self.bytes)
    }

    fn charset(&self) -> Option<String> {
        let content_type = self.content_type.as_deref()?.to_ascii_lowercase();
        content_type.split(';').find_map(|part| {
            part.trim()
                .strip_prefix("charset=")
                .map(|value| value.trim_matches('"').to_owned())
        })
    }
}

/// Build a [`SiteClient`] from the raw CLI options.
pub fn client_from(base_url: &str, timeout_secs: u64, delay_ms: u64) -> anyhow::Result<SiteClient> {
    let base = Url::parse(base_url).with_context(|| format!("parse base url: {base_url}"))?;
    SiteClient::new(base, Duration::from_secs(timeout_secs), Duration::from_millis(delay_ms))
}

/// HTTP client pair for the site: one side follows redirects for pages and
/// documents, the other disables them for version probing.
pub struct SiteClient {
    base: Url,
    pages: reqwest::Client,
    probes: reqwest::Client,
    delay: Duration,
}

impl SiteClient {
    pub fn new(base: Url, timeout: Duration, delay: Duration) -> anyhow::Result<Self> {
        let user_agent = concat!("sornette-mirror/", env!("CARGO_PKG_VERSION"));
        let pages = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .user_agent(user_agent)
            .build()
            .context("build page http client")?;
        let probes = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .user_agent(user_agent)
            .build()
            .context("build probe http client")?;
        Ok(Self { base, pages, probes, delay })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a site-relative path against the base URL.
    pub fn site_url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|source| FetchError::BadUrl { url: path.to_owned(), source })
    }

    /// Politeness pause before a request; no-op when the delay is zero.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// GET a page, requiring a 200 response.
    pub async fn get_page(&self, url: Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .pages
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status { url: url.to_string(), status });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;
        Ok(FetchedPage { url, content_type, bytes: bytes.to_vec() })
    }

    /// GET a document body.
    pub async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let page = self.get_page(url).await?;
        Ok(page.bytes)
    }

    /// Probe a URL with redirects disabled: only a direct 200 means the
    /// resource exists under that exact URL. The body is never read.
    pub async fn probe(&self, url: Url) -> Result<bool, FetchError> {
        let response = self
            .probes
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;
        Ok(response.status().as_u16() == 200)
    }
}
