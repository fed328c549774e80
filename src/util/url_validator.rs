use thiserror::Error;
use url::Url;

/// Errors from validating backend and media URLs.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The URL embeds `user:password@` credentials.
    #[error("URLs with embedded credentials are not allowed")]
    EmbeddedCredentials,
}

fn check_http(url: &Url) -> Result<(), UrlValidationError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(UrlValidationError::EmbeddedCredentials);
    }
    Ok(())
}

/// Validate the backend base URL.
///
/// Only http(s) is accepted. Plain http is allowed because the backend
/// commonly runs on `localhost`, but a warning is logged for remote hosts
/// since login passwords travel in the request body.
///
/// ```
/// use reelfeed::util::validate_base_url;
///
/// let url = validate_base_url("http://localhost:5000").unwrap();
/// assert_eq!(url.port(), Some(5000));
/// assert!(validate_base_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    check_http(&url)?;

    if url.scheme() == "http" {
        let local = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
        if !local {
            tracing::warn!(base_url = %url, "Using plain HTTP for a remote backend; credentials are sent unencrypted");
        }
    }
    Ok(url)
}

/// Resolve a reel's media reference against the backend URL and validate it.
///
/// The backend usually hands out same-origin paths such as
/// `/static/videos/clip.mp4`; absolute URLs are accepted as-is. Anything
/// that is not http(s) is rejected before it can reach the media player or
/// the system opener.
pub fn resolve_media_url(base: &Url, raw: &str) -> Result<Url, UrlValidationError> {
    let url = base.join(raw.trim())?;
    check_http(&url)?;
    Ok(url)
}
