use std::net::IpAddr;
use thiserror::Error;
use url::{Host, Url};

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Parses a feed URL and enforces the http/https scheme policy.
///
/// Relative URLs fail to parse and are reported as
/// [`UrlValidationError::InvalidUrl`].
///
/// # Examples
///
/// ```
/// use curio_feed::util::validate_url;
///
/// let url = validate_url("https://example.com/feed.xml").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("ftp://example.com/feed.xml").is_err());
/// assert!(validate_url("/relative/feed.xml").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

/// Rejects URLs whose host is localhost or a private/internal IP literal.
///
/// `localhost` matches case-insensitively, with or without a trailing dot,
/// and covers every `*.localhost` name. IPv4-mapped IPv6 literals
/// (`::ffff:a.b.c.d`) are judged by their IPv4 address. Other hostnames are
/// not resolved, so a public name that points at a private address passes.
pub fn check_public_host(url: &Url) -> Result<(), UrlValidationError> {
    match url.host() {
        None => Ok(()),
        Some(Host::Domain(domain)) => {
            let name = domain.trim_end_matches('.').to_ascii_lowercase();
            if name == "localhost" || name.ends_with(".localhost") {
                Err(UrlValidationError::Localhost)
            } else {
                Ok(())
            }
        }
        Some(Host::Ipv4(ipv4)) => check_public_ip(IpAddr::V4(ipv4)),
        Some(Host::Ipv6(ipv6)) => match ipv6.to_ipv4_mapped() {
            Some(ipv4) => check_public_ip(IpAddr::V4(ipv4)),
            None => check_public_ip(IpAddr::V6(ipv6)),
        },
    }
}

fn check_public_ip(ip: IpAddr) -> Result<(), UrlValidationError> {
    if ip.is_loopback() {
        return Err(UrlValidationError::Localhost);
    }
    if is_private_ip(&ip) {
        return Err(UrlValidationError::PrivateIp(ip.to_string()));
    }
    Ok(())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
