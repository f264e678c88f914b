use actix_web::HttpRequest;

use crate::config::Config;

/// Header clients send the shared PIN in.
pub const PIN_HEADER: &str = "X-Pin";

/// True when the request is allowed to mutate the wishlist.
///
/// A server without a configured PIN runs unrestricted; otherwise the
/// request must carry the matching PIN header.
pub fn verify_request(req: &HttpRequest, config: &Config) -> bool {
    match config.pin.as_deref() {
        None => true,
        Some(pin) => req
            .headers()
            .get(PIN_HEADER)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|supplied| pin_matches(pin, supplied)),
    }
}

/// Compare a supplied PIN against the configured one. Form inputs tend
/// to carry stray whitespace, so the supplied side is trimmed.
pub fn pin_matches(expected: &str, supplied: &str) -> bool {
    expected == supplied.trim()
}
