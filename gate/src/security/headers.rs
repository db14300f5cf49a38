//! Security response headers.
//!
//! Headers a handler already set are left alone.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use super::policy::SecurityPolicy;

const NO_CACHE: &str = "no-cache, no-store, max-age=0, must-revalidate";
const HSTS: &str = "max-age=31536000 ; includeSubDomains";

/// Write the framing, sniffing, caching and transport headers for `path`.
pub fn write_security_headers(
    headers: &mut HeaderMap,
    policy: &SecurityPolicy,
    path: &str,
    secure: bool,
) {
    let frame_options = policy.frame_options_for(path).header_value();
    set_default(headers, header::X_FRAME_OPTIONS, frame_options);
    set_default(headers, header::X_CONTENT_TYPE_OPTIONS, "nosniff");
    set_default(headers, header::CACHE_CONTROL, NO_CACHE);
    set_default(headers, header::PRAGMA, "no-cache");
    set_default(headers, header::EXPIRES, "0");
    // Browsers ignore HSTS over plaintext.
    if secure {
        set_default(headers, header::STRICT_TRANSPORT_SECURITY, HSTS);
    }
}

fn set_default(headers: &mut HeaderMap, name: HeaderName, value: &'static str) {
    headers
        .entry(name)
        .or_insert_with(|| HeaderValue::from_static(value));
}
