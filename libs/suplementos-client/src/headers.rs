use crate::secret::Secret;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use zeroize::Zeroizing;

/// Shape of the headers attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// Authorization only (bodyless requests: GET, DELETE)
    Plain,
    /// Authorization plus `Content-Type: application/json`
    Json,
}

/// Build the header set for a request.
///
/// Pure with respect to its inputs: the same kind and token always produce
/// the same headers, and nothing is mutated.
///
/// - The `Authorization: Bearer <token>` header is present iff an access
///   token is provided. No token means no header, never an empty one.
/// - `Json` adds `Content-Type: application/json` regardless of whether a
///   token is present, so unauthenticated JSON posts (login, registration)
///   are still well-formed.
///
/// A token containing bytes that are invalid in a header value is skipped
/// with a warning rather than failing the request; the server will answer
/// 401 and the normal recovery path takes over.
#[must_use]
pub fn build_headers(kind: HeaderKind, access: Option<&Secret>) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = Vec::with_capacity(2);

    if let Some(token) = access {
        // Keep the formatted credential on a zeroized buffer.
        let bearer = Zeroizing::new(format!("Bearer {}", token.expose()));
        match HeaderValue::from_str(&bearer) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.push((AUTHORIZATION, value));
            }
            Err(_) => {
                tracing::warn!("access token contains invalid header bytes; sending unauthenticated");
            }
        }
    }

    if kind == HeaderKind::Json {
        headers.push((CONTENT_TYPE, HeaderValue::from_static("application/json")));
    }

    headers
}
