use crate::feed::extract::extract_feed_meta;
use crate::feed::meta::FeedMeta;
use crate::util::{check_public_host, validate_url, UrlValidationError};
use futures::stream::{self, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// `Accept` header sent with every feed request, in preference order.
pub const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml, text/xml";

/// Default cap on the response body (10MB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Redirect hops followed before giving up (reqwest's default).
const MAX_REDIRECTS: usize = 10;

/// Redirect policy for feed requests.
///
/// Limits the chain to 10 hops and stops on loops. With
/// `block_private_hosts`, every hop must also pass [`check_public_host`];
/// the request fails with [`ResolveError::ForbiddenHost`] otherwise.
pub fn redirect_policy(block_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("Too many redirects");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }

        if block_private_hosts {
            if let Err(e) = check_public_host(url) {
                tracing::debug!(to = %url, error = %e, "Refusing redirect to private host");
                return attempt.error(e);
            }
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len(),
            "Following redirect"
        );
        attempt.follow()
    })
}

/// Errors returned by [`FeedMetadataResolver::resolve`].
///
/// Every failure is terminal for the call. Callers should match on the
/// variant rather than on the message text.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input is not an absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[source] url::ParseError),
    /// The URL scheme is neither http nor https
    #[error("URL must use http or https protocol")]
    InvalidScheme { scheme: String },
    /// Host is localhost or a private IP while private hosts are blocked
    #[error("Host not allowed: {0}")]
    ForbiddenHost(String),
    /// HTTP response with non-2xx status code
    #[error("Failed to fetch RSS feed: HTTP {status}")]
    Http { status: u16 },
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The configured timeout elapsed before the body was read
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    TooLarge,
    /// Neither the RSS nor the Atom rule matched the body
    #[error("The URL does not point to a valid RSS or Atom feed")]
    UnrecognizedFeedFormat,
}

impl From<UrlValidationError> for ResolveError {
    fn from(err: UrlValidationError) -> Self {
        match err {
            UrlValidationError::InvalidUrl(e) => ResolveError::InvalidUrl(e),
            UrlValidationError::UnsupportedScheme(scheme) => ResolveError::InvalidScheme { scheme },
            e @ (UrlValidationError::Localhost | UrlValidationError::PrivateIp(_)) => {
                ResolveError::ForbiddenHost(e.to_string())
            }
        }
    }
}

/// Tunables for [`FeedMetadataResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Upper bound on request plus body read. `None` leaves it to the HTTP client.
    pub timeout: Option<Duration>,
    /// Maximum number of body bytes read before giving up.
    pub max_body_bytes: usize,
    /// Reject localhost and private IP literals before connecting.
    ///
    /// Only the initial URL is checked here. Redirect hops are checked when
    /// the client was built with [`redirect_policy`]`(true)`.
    pub block_private_hosts: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            block_private_hosts: false,
        }
    }
}

/// Fetches a URL and extracts the feed's title and description.
///
/// Holds no per-call state; cloning is cheap and clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct FeedMetadataResolver {
    client: reqwest::Client,
    options: ResolverOptions,
}

impl FeedMetadataResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_options(client, ResolverOptions::default())
    }

    pub fn with_options(client: reqwest::Client, options: ResolverOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolves feed metadata for `url`.
    ///
    /// Issues a single GET (no retries) and runs the RSS/Atom fallback chain
    /// over the body, whatever its declared content type.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidUrl`] / [`ResolveError::InvalidScheme`] before any network I/O
    /// - [`ResolveError::ForbiddenHost`] when private hosts are blocked
    /// - [`ResolveError::Http`] for a non-2xx status
    /// - [`ResolveError::Network`], [`ResolveError::Timeout`], [`ResolveError::TooLarge`]
    /// - [`ResolveError::UnrecognizedFeedFormat`] when no rule matches
    pub async fn resolve(&self, url: &str) -> Result<FeedMeta, ResolveError> {
        let url = validate_url(url)?;
        if self.options.block_private_hosts {
            check_public_host(&url)?;
        }

        let bytes = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_body(&url))
                .await
                .map_err(|_| ResolveError::Timeout)??,
            None => self.fetch_body(&url).await?,
        };

        let body = String::from_utf8_lossy(&bytes);
        extract_feed_meta(&body).ok_or_else(|| {
            tracing::debug!(url = %url, bytes = bytes.len(), "No RSS or Atom metadata found");
            ResolveError::UnrecognizedFeedFormat
        })
    }

    /// Resolves several URLs with at most `concurrency` requests in flight.
    ///
    /// Results are returned in input order.
    pub async fn resolve_many<I, S>(
        &self,
        urls: I,
        concurrency: usize,
    ) -> Vec<Result<FeedMeta, ResolveError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        stream::iter(urls)
            .map(|url| async move { self.resolve(url.as_ref()).await })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn fetch_body(&self, url: &Url) -> Result<Vec<u8>, ResolveError> {
        tracing::debug!(url = %url, "Fetching feed");

        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, FEED_ACCEPT)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "Feed request failed");
            return Err(ResolveError::Http {
                status: status.as_u16(),
            });
        }

        read_limited_bytes(response, self.options.max_body_bytes).await
    }
}

/// Surfaces a host rejected by [`redirect_policy`] as `ForbiddenHost`.
fn classify_send_error(err: reqwest::Error) -> ResolveError {
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        if let Some(rejected) = cause.downcast_ref::<UrlValidationError>() {
            return ResolveError::ForbiddenHost(rejected.to_string());
        }
        source = cause.source();
    }
    ResolveError::Network(err)
}

/// Reads the response body, failing once it grows past `limit` bytes.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ResolveError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ResolveError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ResolveError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
