//! URL comparison helpers for form matching.
//!
//! Observed forms and stored credentials carry full URLs; the matching rules
//! compare them at different granularities (exact, scheme+host+port, path
//! prefix, http/https substitution). These helpers keep that vocabulary in
//! one place.

use url::Url;

/// Splits a URL path into its directory segments. The leading slash does not
/// produce a segment; `/` and the empty path produce no segments at all.
pub fn path_segments(url: &Url) -> Vec<String> {
    let path = url.path();
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(|s| s.trim().to_string()).collect()
}

/// True for schemes that provide transport security.
pub fn is_cryptographic_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}

/// Scheme+host+port equality, ignoring path, query and fragment.
pub fn same_scheme_host_port(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Scheme+host+port equality over optional URLs; two absent URLs compare
/// equal, mirroring how two empty URLs do.
pub fn same_scheme_host_port_opt(a: Option<&Url>, b: Option<&Url>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_scheme_host_port(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Compares everything but the scheme: credentials, host, explicit port,
/// path, query and fragment.
fn contents_equal(a: &Url, b: &Url) -> bool {
    a.username() == b.username()
        && a.password() == b.password()
        && a.host_str() == b.host_str()
        && a.port() == b.port()
        && a.path() == b.path()
        && a.query() == b.query()
        && a.fragment() == b.fragment()
}

fn is_http_or_https(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Equality that tolerates an http↔https switch. First-time and retry login
/// forms sometimes differ only in the scheme of their action URL.
pub fn urls_equal_up_to_http_https_substitution(a: &Url, b: &Url) -> bool {
    if a == b {
        return true;
    }
    if is_http_or_https(a) && is_http_or_https(b) {
        return contents_equal(a, b);
    }
    false
}
