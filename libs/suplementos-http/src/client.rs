use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use tower::Service;
use tower::buffer::Buffer;

/// Type alias for the future type of the inner service
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

/// Type alias for the buffered service
/// Buffer<Req, F> in tower 0.5 where Req is the request type and F is the service future type
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// HTTP client with tower middleware stack
///
/// Use [`HttpClientBuilder`] to construct instances with custom configuration.
///
/// # Thread Safety
///
/// `HttpClient` is `Clone + Send + Sync`. Cloning is cheap (internal channel
/// clone). Requests flow through a `tower::buffer::Buffer`, so concurrent
/// callers never contend on a mutex; do not wrap the client in one.
///
/// # Example
///
/// ```ignore
/// struct CatalogService {
///     http: HttpClient,
/// }
///
/// impl CatalogService {
///     async fn proteins(&self) -> Result<Vec<Product>, HttpError> {
///         self.http
///             .get("https://suplementospro.onrender.com/api/proteinas/")
///             .send()
///             .await?
///             .json()
///             .await
///     }
/// }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BufferedService,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, HttpError> {
        HttpClientBuilder::new().build()
    }

    /// Create a builder for configuring the HTTP client
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Create a GET request builder
    ///
    /// The URL must be an absolute URI with scheme and authority (host).
    /// Relative URLs like `/api/carrito/` are rejected with
    /// [`HttpError::InvalidUri`]; query parameters must be encoded into the
    /// URL externally (e.g. via `url::Url`).
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::GET, url)
    }

    /// Create a POST request builder
    ///
    /// # Example
    ///
    /// ```ignore
    /// let resp = client
    ///     .post("https://suplementospro.onrender.com/api/token/")
    ///     .json(&credentials)?
    ///     .send()
    ///     .await?;
    /// ```
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::POST, url)
    }

    /// Create a PUT request builder
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PUT, url)
    }

    /// Create a PATCH request builder
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PATCH, url)
    }

    /// Create a DELETE request builder
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::DELETE, url)
    }

    /// Create a request builder for an arbitrary method
    pub fn request(&self, method: http::Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            url.to_owned(),
            self.transport_security,
        )
    }
}

/// Map buffer errors to `HttpError`
///
/// Buffer can return `ServiceError` wrapping the inner service error, or
/// `Closed` if the buffer worker has shut down.
pub(crate) fn map_buffer_error(err: tower::BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(err) => {
            // Buffer closed or other internal failure: the background
            // worker died or the channel was dropped. Distinct from
            // Overloaded (buffer full).
            tracing::error!(
                error = %err,
                "buffer worker closed unexpectedly; service unavailable"
            );
            HttpError::ServiceClosed
        }
    }
}

/// Try to acquire a buffer slot with fail-fast semantics.
///
/// If the buffer is full, returns `HttpError::Overloaded` immediately instead
/// of blocking. This prevents request pile-up under load.
pub(crate) async fn try_acquire_buffer_slot(
    service: &mut BufferedService,
) -> Result<(), HttpError> {
    use std::task::Poll;

    // Poll once to check if buffer has space available
    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None), // Buffer full, don't block
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(HttpError::Overloaded), // Buffer full, fail fast
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client() -> HttpClient {
        HttpClientBuilder::new()
            .allow_insecure_http()
            .build()
            .unwrap()
    }

    // -- trait assertions -----------------------------------------------------

    #[test]
    fn client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<HttpClient>();
    }

    // -- request methods ------------------------------------------------------

    #[tokio::test]
    async fn get_request() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/api/proteinas/");
            then.status(200).json_body(json!([{"id": 1, "nombre": "Whey"}]));
        });

        let client = test_client();
        let url = format!("{}/api/proteinas/", server.base_url());
        let resp = client.get(&url).send().await.unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::OK);
    }

    #[tokio::test]
    async fn post_request_with_json_body() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/api/carrito/agregar/")
                .header("content-type", "application/json")
                .json_body(json!({"producto_id": 7, "cantidad": 2}));
            then.status(201).json_body(json!({"mensaje": "agregado"}));
        });

        let client = test_client();
        let url = format!("{}/api/carrito/agregar/", server.base_url());
        let resp = client
            .post(&url)
            .json(&json!({"producto_id": 7, "cantidad": 2}))
            .unwrap()
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn put_and_delete_requests() {
        let server = MockServer::start();
        let put_mock = server.mock(|when, then| {
            when.method(Method::PUT).path("/api/snacks/3/");
            then.status(200).json_body(json!({"id": 3}));
        });
        let delete_mock = server.mock(|when, then| {
            when.method(Method::DELETE).path("/api/snacks/3/");
            then.status(204);
        });

        let client = test_client();
        let url = format!("{}/api/snacks/3/", server.base_url());

        let resp = client
            .put(&url)
            .json(&json!({"nombre": "Barrita"}))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), hyper::StatusCode::OK);

        let resp = client.delete(&url).send().await.unwrap();
        assert_eq!(resp.status(), hyper::StatusCode::NO_CONTENT);

        assert_eq!(put_mock.calls(), 1);
        assert_eq!(delete_mock.calls(), 1);
    }

    // -- status handling ------------------------------------------------------

    /// send() is reqwest-like: non-2xx statuses come back as Ok(Response).
    #[tokio::test]
    async fn send_returns_ok_for_error_statuses() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/api/carrito/");
            then.status(401).json_body(json!({"detail": "no autenticado"}));
        });

        let client = test_client();
        let url = format!("{}/api/carrito/", server.base_url());
        let resp = client.get(&url).send().await.unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn json_fails_with_http_status_for_non_2xx() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/api/vitaminas/99/");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"detail": "No encontrado."}));
        });

        let client = test_client();
        let url = format!("{}/api/vitaminas/99/", server.base_url());
        let err = client
            .get(&url)
            .send()
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap_err();

        match err {
            HttpError::HttpStatus {
                status,
                body_preview,
                content_type,
            } => {
                assert_eq!(status, hyper::StatusCode::NOT_FOUND);
                assert!(body_preview.contains("No encontrado"));
                assert_eq!(content_type.as_deref(), Some("application/json"));
            }
            other => panic!("expected HttpStatus, got: {other:?}"),
        }
    }

    // -- transport security ---------------------------------------------------

    #[tokio::test]
    async fn tls_only_rejects_http_urls() {
        let client = HttpClientBuilder::new().build().unwrap();
        let err = client
            .get("http://suplementospro.onrender.com/api/proteinas/")
            .send()
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::InvalidScheme { .. }));
    }

    // -- transport failures ---------------------------------------------------

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let client = test_client();
        // Port 1 is essentially guaranteed closed
        let err = client
            .get("http://127.0.0.1:1/api/proteinas/")
            .send()
            .await
            .unwrap_err();

        assert!(err.is_transport(), "expected transport error, got: {err:?}");
    }

    // -- body limits ------------------------------------------------------------

    #[tokio::test]
    async fn body_too_large_rejected() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/api/proteinas/");
            then.status(200).body("x".repeat(4096));
        });

        let client = HttpClientBuilder::new()
            .allow_insecure_http()
            .max_body_size(1024)
            .build()
            .unwrap();
        let url = format!("{}/api/proteinas/", server.base_url());
        let err = client.get(&url).send().await.unwrap().bytes().await.unwrap_err();

        assert!(matches!(err, HttpError::BodyTooLarge { limit: 1024, .. }));
    }

    // -- concurrency ------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_requests_through_buffer() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::GET).path("/api/snacks/");
            then.status(200).json_body(json!([]));
        });

        let client = test_client();
        let url = format!("{}/api/snacks/", server.base_url());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                client.get(&url).send().await.map(|r| r.status())
            }));
        }

        for handle in handles {
            let status = handle.await.unwrap().unwrap();
            assert_eq!(status, hyper::StatusCode::OK);
        }
        assert_eq!(mock.calls(), 8);
    }
}
