//! Content fetching from URLs, files, and stdin.
//!
//! The scrape orchestrator only depends on the [`Fetcher`] trait. With the
//! `fetch` feature enabled, [`ReqwestFetcher`] provides the HTTP
//! implementation. Bodies are normalized to UTF-8 by [`decode_html`].

use std::fs;
use std::path::PathBuf;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::model::Feed;
use crate::{ColligoError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Colligo/0.1; +https://github.com/colligo/colligo)";

/// Per-request fetch settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Raw `Cookie` header value.
    pub cookie: Option<String>,
    /// Basic-auth user name.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Proxy URL used for every scheme.
    pub proxy: Option<String>,
    /// Accept invalid or self-signed TLS certificates.
    pub allow_self_signed: bool,
    /// Restrict the client to HTTP/1.1.
    pub disable_http2: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            username: None,
            password: None,
            proxy: None,
            allow_self_signed: false,
            disable_http2: false,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

impl FetchOptions {
    /// Options for crawling a feed's entries.
    ///
    /// `proxy_url` is only used when the feed asks to be fetched via proxy.
    pub fn for_feed(feed: &Feed, base: &FetchOptions, proxy_url: Option<&str>) -> Self {
        Self {
            timeout: base.timeout,
            user_agent: non_empty(&feed.user_agent).unwrap_or_else(|| base.user_agent.clone()),
            cookie: non_empty(&feed.cookie),
            username: non_empty(&feed.username),
            password: non_empty(&feed.password),
            proxy: if feed.fetch_via_proxy { proxy_url.map(str::to_string) } else { None },
            allow_self_signed: feed.allow_self_signed_certificates,
            disable_http2: feed.disable_http2,
        }
    }

    /// The same options without cookie, credentials or proxy.
    pub fn without_credentials(&self) -> Self {
        Self { cookie: None, username: None, password: None, proxy: None, ..self.clone() }
    }
}

/// A fetched resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// URL after redirects.
    pub effective_url: String,
    pub status: u16,
    /// Raw `Content-Type` header value, empty when absent.
    pub content_type: String,
    /// Body decoded to UTF-8.
    pub body: String,
}

impl FetchResponse {
    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> String {
        self.content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
    }

    /// Whether the response is an HTML or XHTML document.
    pub fn is_html(&self) -> bool {
        matches!(self.media_type().as_str(), "text/html" | "application/xhtml+xml")
    }
}

/// HTTP fetch collaborator.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, following redirects.
    ///
    /// Failure statuses are returned as responses; only transport problems are errors.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse>;
}

/// reqwest-backed [`Fetcher`].
#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher;

#[cfg(feature = "fetch")]
impl ReqwestFetcher {
    pub fn new() -> Self {
        Self
    }

    fn build_client(options: &FetchOptions) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(options.timeout))
            .user_agent(options.user_agent.as_str())
            .danger_accept_invalid_certs(options.allow_self_signed);

        if options.disable_http2 {
            builder = builder.http1_only();
        }

        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ColligoError::ConfigError(format!("Invalid proxy URL {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(ColligoError::HttpError)
    }
}

#[cfg(feature = "fetch")]
#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse> {
        use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};

        let parsed_url = url::Url::parse(url).map_err(|e| ColligoError::InvalidUrl(e.to_string()))?;
        let client = Self::build_client(options)?;

        let mut request = client
            .get(parsed_url)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
        if let Some(cookie) = &options.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }
        if let Some(username) = &options.username {
            request = request.basic_auth(username, options.password.as_deref());
        }

        let timeout = options.timeout;
        let map_err = move |e: reqwest::Error| {
            if e.is_timeout() { ColligoError::Timeout { timeout } } else { ColligoError::HttpError(e) }
        };

        let response = request.send().await.map_err(map_err)?;

        let effective_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response.bytes().await.map_err(map_err)?;
        let body = decode_html(&bytes, Some(content_type.as_str()));

        tracing::debug!(url, effective_url = %effective_url, status, content_type = %content_type, "Fetched");
        Ok(FetchResponse { effective_url, status, content_type, body })
    }
}

/// Decode raw bytes to UTF-8: BOM, then Content-Type charset, then a chardetng guess.
///
/// Malformed sequences become replacement characters.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.decode(bytes).0.into_owned();
    }

    if let Some(encoding) = content_type.and_then(charset_label).and_then(|l| Encoding::for_label(l.as_bytes())) {
        return encoding.decode(bytes).0.into_owned();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true).decode(bytes).0.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        return Err(ColligoError::FileNotFound(path_buf));
    }
    let bytes = fs::read(&path_buf)?;
    Ok(decode_html(&bytes, None))
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;

    Ok(decode_html(&buffer, None))
}
