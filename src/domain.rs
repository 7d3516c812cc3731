//! Registrable-domain and account-equivalence helpers.
//!
//! Form matching proper works on full URLs; these helpers cover the two
//! places where a coarser notion of identity is needed: telemetry about
//! where a submission navigated to, and recognizing that two stored
//! usernames denote the same e-mail account.

use url::Url;

/// Common two-level public TLDs for root domain extraction.
static TWO_LEVEL_TLDS: &[&str] = &[
    // Australia / New Zealand
    "com.au", "net.au", "org.au", "edu.au", "gov.au",
    "co.nz", "net.nz", "org.nz", "govt.nz", "ac.nz",
    // United Kingdom
    "co.uk", "org.uk", "net.uk", "ac.uk", "gov.uk", "ltd.uk", "me.uk",
    // Japan / South Korea
    "co.jp", "ne.jp", "or.jp", "ac.jp", "go.jp",
    "co.kr", "or.kr", "go.kr", "ac.kr",
    // India / South-East Asia
    "co.in", "net.in", "org.in", "gov.in", "ac.in",
    "co.id", "or.id", "ac.id", "co.th", "in.th",
    // Americas
    "com.br", "net.br", "org.br", "gov.br",
    "com.mx", "org.mx", "gob.mx",
    "com.ar", "net.ar", "org.ar",
    // Europe
    "co.at", "or.at", "ac.at",
    "co.il", "org.il", "ac.il", "gov.il",
    "com.pl", "net.pl", "org.pl", "edu.pl",
    "com.ru", "net.ru", "org.ru",
    // Africa
    "co.za", "net.za", "org.za", "gov.za", "ac.za",
    "co.ke", "or.ke", "go.ke",
];

/// Extract the registrable (root) domain from a host.
/// E.g., "sub.example.com" -> "example.com"
/// E.g., "sub.example.co.uk" -> "example.co.uk"
pub fn extract_root_domain(host: &str) -> String {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return host.to_string();
    }

    if parts.len() >= 3 {
        let last_two = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
        if TWO_LEVEL_TLDS.contains(&last_two.as_str()) {
            return parts[parts.len() - 3..].join(".");
        }
    }

    parts[parts.len() - 2..].join(".")
}

/// True when the two URLs point at the same host or at hosts sharing a
/// registrable domain. Used to report whether a submission landed on a
/// different site than it started from.
pub fn same_domain_or_host(a: &Url, b: &Url) -> bool {
    let (host_a, host_b) = match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => (a.to_ascii_lowercase(), b.to_ascii_lowercase()),
        _ => return false,
    };
    if host_a == host_b {
        return true;
    }
    extract_root_domain(&host_a) == extract_root_domain(&host_b)
}

/// True when two usernames denote the same e-mail account.
///
/// Comparison is case-insensitive. For Gmail addresses the dots in the local
/// part carry no meaning and `googlemail.com` is an alias of `gmail.com`;
/// both are normalized away before comparing.
pub fn are_emails_equivalent(a: &str, b: &str) -> bool {
    canonicalize_email(a) == canonicalize_email(b)
}

fn canonicalize_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) => {
            let domain = if domain == "googlemail.com" { "gmail.com" } else { domain };
            let local = if domain == "gmail.com" {
                local.replace('.', "")
            } else {
                local.to_string()
            };
            format!("{}@{}", local, domain)
        }
        None => email,
    }
}
