//! Canonical form of annotated page URIs.
//!
//! Two annotations made on `https://Example.com/page/?utm_source=feed` and
//! `http://example.com/page` target the same document, so lookups and the
//! `document` table key on [`normalize`]d URIs.

use url::form_urlencoded;
use url::Url;

/// Query parameter keys that only carry tracking information.
const IGNORED_QUERY_KEYS: &[&str] = &["via", "fbclid", "gclid"];

/// Prefix shared by all Google Analytics campaign parameters.
const IGNORED_QUERY_PREFIX: &str = "utm_";

/// Return the normalized form of `uri`.
///
/// Inputs that do not parse, or that use a scheme other than http(s), are
/// returned trimmed but otherwise untouched (PDF fingerprints such as
/// `urn:x-pdf:...` fall in this bucket).
pub fn normalize(uri: &str) -> String {
    let trimmed = uri.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => return trimmed.to_string(),
    };
    let Some(host) = url.host_str() else {
        return trimmed.to_string();
    };

    let mut out = String::with_capacity(trimmed.len());
    out.push_str("http://");

    if !url.username().is_empty() {
        out.push_str(url.username());
        if let Some(password) = url.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }

    out.push_str(host);
    // Output is always http, so 80 is the default whatever the input scheme.
    // `Url` has already dropped 443 for https inputs.
    if let Some(port) = url.port().filter(|&p| p != 80) {
        out.push(':');
        out.push_str(&port.to_string());
    }

    out.push_str(url.path().trim_end_matches('/'));

    if let Some(query) = normalize_query(&url) {
        out.push('?');
        out.push_str(&query);
    }

    if let Some(fragment) = url.fragment() {
        if fragment.starts_with('!') || fragment.starts_with('/') {
            out.push('#');
            out.push_str(fragment);
        }
    }

    out
}

fn normalize_query(url: &Url) -> Option<String> {
    url.query()?;

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_ignored_key(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    Some(serializer.finish())
}

fn is_ignored_key(key: &str) -> bool {
    key.starts_with(IGNORED_QUERY_PREFIX) || IGNORED_QUERY_KEYS.contains(&key)
}
