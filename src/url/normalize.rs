use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used as the deduplication key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https` schemes (the scheme itself is kept)
/// 3. Lowercase the host (any `www.` prefix is kept, it is a distinct host)
/// 4. Normalize the path:
///    - Remove empty and dot segments (`.` and `..`)
///    - Remove trailing slash (except for root `/`)
/// 5. Remove the fragment
/// 6. Sort query parameters by key, keeping their original encoding
/// 7. Remove an empty query string
///
/// The result is also the URL that gets fetched, so nothing that could
/// change the served page is altered.
///
/// # Examples
///
/// ```
/// use tabelog_crawler::url::normalize_url;
///
/// let url = normalize_url("https://Tabelog.com/tokyo/#top").unwrap();
/// assert_eq!(url.as_str(), "https://tabelog.com/tokyo");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already parsed URL (see [`normalize_url`])
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if host.bytes().any(|b| b.is_ascii_uppercase()) {
        let host = host.to_ascii_lowercase();
        url.set_host(Some(&host))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    let query = url.query().map(sort_query);
    match query {
        Some(query) if !query.is_empty() => url.set_query(Some(&query)),
        _ => url.set_query(None),
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Sorts raw `key=value` pairs by key without decoding them
fn sort_query(query: &str) -> String {
    let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();

    // Stable sort keeps repeated keys in their original order
    pairs.sort_by(|a, b| query_key(a).cmp(query_key(b)));

    pairs.join("&")
}

fn query_key(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(key, _)| key)
}
