use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use tower::Service;

/// Body type for the request builder
#[derive(Clone, Debug)]
enum BodyKind {
    /// Empty body
    Empty,
    /// Raw bytes body
    Bytes(Bytes),
    /// JSON-serialized body (stored as bytes after serialization)
    Json(Bytes),
}

/// HTTP request builder with fluent API
///
/// Created by [`crate::HttpClient::get`], [`crate::HttpClient::post`], etc.
/// Chain headers and body configuration, then call
/// [`send()`](RequestBuilder::send).
///
/// Builder steps never panic on bad input: an invalid header name or value
/// is recorded and returned as an error from `send()`.
///
/// # URL Construction
///
/// This crate does **not** compose query strings. Build the final URL
/// externally (e.g. via `url::Url`) and pass the string in:
///
/// ```ignore
/// use url::Url;
///
/// let mut url = Url::parse("https://suplementospro.onrender.com/api/proteinas/")?;
/// url.query_pairs_mut().append_pair("marca", "ON");
///
/// let resp = client.get(url.as_str()).send().await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    method: http::Method,
    url: String,
    headers: Vec<(http::header::HeaderName, http::header::HeaderValue)>,
    body: BodyKind,
    /// Error captured during building (deferred to `send()`)
    error: Option<HttpError>,
    /// Transport security mode for URL scheme validation
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    /// Create a new request builder (internal use only)
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: http::Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            method,
            url,
            headers: Vec::new(),
            body: BodyKind::Empty,
            error: None,
            transport_security,
        }
    }

    /// Add a single header to the request
    ///
    /// # Example
    ///
    /// ```ignore
    /// let resp = client
    ///     .get("https://suplementospro.onrender.com/api/carrito/")
    ///     .header("authorization", "Bearer token")
    ///     .send()
    ///     .await?;
    /// ```
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.push((name, value));
            }
            (Err(e), _) => {
                self.error = Some(HttpError::InvalidHeaderName(e));
            }
            (_, Err(e)) => {
                self.error = Some(HttpError::InvalidHeaderValue(e));
            }
        }
        self
    }

    /// Add a pre-built header to the request
    ///
    /// Unlike [`header()`](Self::header) this takes typed values, so
    /// attributes set on the value (such as
    /// [`set_sensitive`](http::header::HeaderValue::set_sensitive) for
    /// credentials) are preserved.
    pub fn typed_header(
        mut self,
        name: http::header::HeaderName,
        value: http::header::HeaderValue,
    ) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Add multiple headers to the request
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        if self.error.is_some() {
            return self;
        }

        for (name, value) in headers {
            match (
                http::header::HeaderName::try_from(name),
                http::header::HeaderValue::try_from(value),
            ) {
                (Ok(name), Ok(value)) => {
                    self.headers.push((name, value));
                }
                (Err(e), _) => {
                    self.error = Some(HttpError::InvalidHeaderName(e));
                    return self;
                }
                (_, Err(e)) => {
                    self.error = Some(HttpError::InvalidHeaderValue(e));
                    return self;
                }
            }
        }
        self
    }

    /// Set request body as JSON
    ///
    /// Serializes the value with `serde_json` and sets Content-Type to
    /// application/json unless a Content-Type header was already provided.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::Json)` if serialization fails.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Serialize)]
    /// struct AddToCart { producto_id: u64, cantidad: u32 }
    ///
    /// let resp = client
    ///     .post("https://suplementospro.onrender.com/api/carrito/agregar/")
    ///     .json(&AddToCart { producto_id: 7, cantidad: 2 })?
    ///     .send()
    ///     .await?;
    /// ```
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let json_bytes = serde_json::to_vec(body)?;
        self.body = BodyKind::Json(Bytes::from(json_bytes));
        Ok(self)
    }

    /// Set request body as raw bytes
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = BodyKind::Bytes(body);
        self
    }

    /// Set request body as a string
    pub fn body_string(mut self, body: String) -> Self {
        self.body = BodyKind::Bytes(Bytes::from(body));
        self
    }

    /// Validate URL and scheme against transport security configuration.
    ///
    /// Uses `http::Uri` parsing instead of string prefix matching.
    /// Returns the parsed URI on success for use in request building.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        // Require authority (host) for absolute URLs
        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Send the request and return the response
    ///
    /// Any status code is returned as `Ok`; use
    /// [`HttpResponse::error_for_status`] or the checked body readers to
    /// convert non-2xx statuses into errors.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if:
    /// - Request building failed (invalid headers, URL, etc.)
    /// - URL scheme is invalid for the transport security mode
    /// - Network/transport error
    /// - Request timeout
    /// - Concurrency limit reached (`Overloaded`)
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        // Return any deferred error
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;

        let mut builder = Request::builder().method(self.method).uri(uri);

        // Add default Content-Type only if caller didn't supply one
        let has_content_type = self
            .headers
            .iter()
            .any(|(name, _)| name == http::header::CONTENT_TYPE);
        if !has_content_type {
            if let BodyKind::Json(_) = &self.body {
                builder = builder.header("content-type", "application/json");
            }
        }

        // The http builder appends headers rather than replacing, so the
        // default Content-Type was skipped above if the caller set one.
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let body_bytes = match self.body {
            BodyKind::Empty => Bytes::new(),
            BodyKind::Bytes(b) | BodyKind::Json(b) => b,
        };

        let request = builder.body(Full::new(body_bytes))?;

        // Fail-fast if buffer is full
        try_acquire_buffer_slot(&mut self.service).await?;

        let inner: Response<ResponseBody> =
            self.service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::HttpClientBuilder;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client() -> crate::HttpClient {
        HttpClientBuilder::new()
            .allow_insecure_http()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn invalid_header_name_deferred_to_send() {
        let client = test_client();
        let err = client
            .get("http://127.0.0.1:9/api/carrito/")
            .header("bad header name", "value")
            .send()
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::InvalidHeaderName(_)));
    }

    #[tokio::test]
    async fn invalid_header_value_deferred_to_send() {
        let client = test_client();
        let err = client
            .get("http://127.0.0.1:9/api/carrito/")
            .header("x-token", "bad\nvalue")
            .send()
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::InvalidHeaderValue(_)));
    }

    #[tokio::test]
    async fn relative_url_rejected() {
        let client = test_client();
        let err = client.get("/api/proteinas/").send().await.unwrap_err();

        match err {
            HttpError::InvalidUri { kind, .. } => {
                assert_eq!(kind, InvalidUriKind::MissingAuthority);
            }
            other => panic!("expected InvalidUri, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_scheme_rejected() {
        let client = test_client();
        let err = client
            .get("ftp://suplementospro.onrender.com/api/")
            .send()
            .await
            .unwrap_err();

        match err {
            HttpError::InvalidScheme { scheme, .. } => assert_eq!(scheme, "ftp"),
            other => panic!("expected InvalidScheme, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn caller_content_type_not_overridden() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/api/registro/")
                .header("content-type", "application/json; charset=utf-8");
            then.status(201).json_body(json!({"message": "ok"}));
        });

        let client = test_client();
        let url = format!("{}/api/registro/", server.base_url());
        let resp = client
            .post(&url)
            .header("content-type", "application/json; charset=utf-8")
            .json(&json!({"email": "a@b.cl"}))
            .unwrap()
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::CREATED);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn typed_header_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::GET)
                .path("/api/usuario/actual/")
                .header("authorization", "Bearer abc123");
            then.status(200).json_body(json!({"id": 1}));
        });

        let client = test_client();
        let url = format!("{}/api/usuario/actual/", server.base_url());
        let mut value = http::header::HeaderValue::from_static("Bearer abc123");
        value.set_sensitive(true);
        let resp = client
            .get(&url)
            .typed_header(http::header::AUTHORIZATION, value)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::OK);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn string_body_sent_verbatim() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/api/echo/")
                .body("plain payload");
            then.status(200);
        });

        let client = test_client();
        let url = format!("{}/api/echo/", server.base_url());
        let resp = client
            .post(&url)
            .header("content-type", "text/plain")
            .body_string("plain payload".to_owned())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::OK);
        assert_eq!(mock.calls(), 1);
    }
}
