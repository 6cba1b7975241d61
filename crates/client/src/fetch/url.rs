//! URL validation for outgoing requests and the configured origin.

/// Error type for URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("not a bare origin: {0}")]
    NotAnOrigin(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

fn parse_http(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Parse an absolute http(s) request URL.
///
/// The fragment is dropped since it never reaches the server; the query
/// string is kept as-is.
pub fn parse_request_url(input: &str) -> Result<url::Url, UrlError> {
    let mut parsed = parse_http(input)?;
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Normalize an origin to `scheme://host[:port]`.
///
/// The host is lowercased and a default port is removed. Anything beyond
/// the origin (path other than `/`, query, fragment) is rejected.
pub fn normalize_origin(input: &str) -> Result<String, UrlError> {
    let parsed = parse_http(input)?;

    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(UrlError::NotAnOrigin(input.trim().to_string()));
    }
    if parsed.host_str().is_none() {
        return Err(UrlError::InvalidUrl(format!("missing host: {input}")));
    }

    Ok(parsed.origin().ascii_serialization())
}
