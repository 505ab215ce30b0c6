//! Browser-imitation headers.
//!
//! The SAT portal fingerprints requests; the flow replicates the header
//! set a desktop Chrome sends on navigation so the server keeps serving
//! the same redirect chain a real browser would see.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// User agent presented on every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Default header set applied to every request of the session.
pub fn browser_headers() -> HeaderMap {
    let pairs: &[(&str, &str)] = &[
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
             image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
        ),
        ("accept-language", "es-MX,es;q=0.9"),
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
        (
            "sec-ch-ua",
            "\"Chromium\";v=\"142\", \"Google Chrome\";v=\"142\", \"Not_A Brand\";v=\"99\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"macOS\""),
    ];

    let mut headers = HeaderMap::with_capacity(pairs.len());
    for &(name, value) in pairs {
        // All entries are static ASCII, so these parses cannot fail.
        let name = HeaderName::from_static(name);
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
    headers
}
