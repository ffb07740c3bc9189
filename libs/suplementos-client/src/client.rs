use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorBody};
use crate::headers::{HeaderKind, build_headers};
use crate::refresh::{RefreshError, refresh_access_token};
use crate::secret::Secret;
use crate::store::TokenStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use suplementos_http::{HttpClient, HttpClientBuilder, HttpError, HttpResponse};

/// A single API call, described independently of the session state.
///
/// The header kind defaults to [`HeaderKind::Plain`] for bodyless methods
/// (GET, DELETE) and [`HeaderKind::Json`] otherwise; requests are
/// authenticated unless marked [`public()`](Self::public).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: http::Method,
    path: String,
    body: Option<serde_json::Value>,
    requires_auth: bool,
    header_kind: HeaderKind,
}

impl ApiRequest {
    fn new(method: http::Method, path: impl Into<String>) -> Self {
        let header_kind = if method == http::Method::GET || method == http::Method::DELETE {
            HeaderKind::Plain
        } else {
            HeaderKind::Json
        };
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: true,
            header_kind,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(http::Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(http::Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(http::Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(http::Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(http::Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// Returns `ApiError::Request` if the value cannot be serialized.
    pub fn body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Request(HttpError::Json(e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Mark the request as public: no Bearer header is attached and a 401
    /// is reported as [`ApiError::RequestFailed`] instead of triggering a
    /// token refresh.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Override the default header kind.
    #[must_use]
    pub fn header_kind(mut self, kind: HeaderKind) -> Self {
        self.header_kind = kind;
        self
    }
}

/// Authenticated client for the storefront API.
///
/// Wraps the HTTP transport with session handling: every authenticated
/// request carries the stored access token, and a 401 answer triggers one
/// token refresh followed by one retry. A second 401 (or a failed refresh)
/// ends the session.
///
/// Cloning is cheap; clones share the token store and the refresh gate, so
/// concurrent tasks hitting a 401 at the same time perform a single refresh
/// between them.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    config: Arc<ApiConfig>,
    store: Arc<dyn TokenStore>,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    /// Create a client from a configuration and a token store.
    ///
    /// # Errors
    /// Returns an error if the HTTP transport cannot be constructed
    /// (TLS initialization failure).
    pub fn new(config: ApiConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = HttpClientBuilder::with_config(config.http.clone())
            .build()
            .map_err(ApiError::from_http)?;
        Ok(Self {
            http,
            config: Arc::new(config),
            store,
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Create a client with an externally built HTTP transport.
    ///
    /// Lets tests and embedders share one transport between clients.
    #[must_use]
    pub fn with_http(http: HttpClient, config: ApiConfig, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            config: Arc::new(config),
            store,
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// The token store backing this client.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Execute a request with session handling.
    ///
    /// Returns the response for any 2xx status. All other outcomes map to
    /// an [`ApiError`]:
    /// - a 401 on an authenticated request triggers one refresh and one
    ///   retry; a second 401 clears the session and yields `SessionExpired`
    /// - a 401 with no stored refresh token yields `NoRefreshToken` without
    ///   calling the token endpoint
    /// - any other non-2xx status yields `RequestFailed` with the decoded
    ///   error body
    /// - transport failures yield `Connection` and never trigger a refresh
    pub async fn execute(&self, request: ApiRequest) -> Result<HttpResponse, ApiError> {
        let response = self.execute_with_refresh(&request).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(bytes) => ErrorBody::decode(&bytes),
            Err(HttpError::BodyTooLarge { .. }) => ErrorBody::Unrecognized {
                raw: "<body too large>".to_owned(),
            },
            Err(e) => return Err(ApiError::from_http(e)),
        };

        tracing::debug!(status = %status, "request failed");
        Err(ApiError::RequestFailed { status, body })
    }

    /// Execute a request and decode the 2xx response body as JSON.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response.json().await.map_err(ApiError::from_http)
    }

    /// Status-only state machine; the caller interprets non-401 statuses.
    async fn execute_with_refresh(&self, request: &ApiRequest) -> Result<HttpResponse, ApiError> {
        let session = self.store.get();
        let attempt_access = if request.requires_auth {
            session.access
        } else {
            None
        };

        let response = self.send_once(request, attempt_access.as_ref()).await?;

        if response.status() != http::StatusCode::UNAUTHORIZED || !request.requires_auth {
            return Ok(response);
        }

        tracing::debug!(path = %request.path, "authenticated request rejected; attempting token refresh");
        self.recover_session(attempt_access).await?;

        let refreshed = self.store.get();
        let retry = self.send_once(request, refreshed.access.as_ref()).await?;

        if retry.status() == http::StatusCode::UNAUTHORIZED {
            tracing::info!(path = %request.path, "retry after refresh rejected; session expired");
            self.store.clear();
            return Err(ApiError::SessionExpired);
        }

        Ok(retry)
    }

    /// Refresh the access token, deduplicating concurrent attempts.
    ///
    /// `stale_access` is the token the failed attempt used. If the stored
    /// token already differs once the gate is acquired, another task
    /// refreshed while we waited and the retry can proceed immediately.
    async fn recover_session(&self, stale_access: Option<Secret>) -> Result<(), ApiError> {
        let _guard = self.refresh_gate.lock().await;

        let current = self.store.get().access;
        let stale = stale_access.as_ref().map(Secret::expose);
        if current.as_ref().map(Secret::expose) != stale {
            tracing::debug!("token already refreshed by a concurrent request");
            return Ok(());
        }

        match refresh_access_token(&self.http, &self.config, self.store.as_ref()).await {
            Ok(()) => Ok(()),
            Err(RefreshError::MissingToken) => {
                self.store.clear();
                Err(ApiError::NoRefreshToken)
            }
            Err(RefreshError::Connection(e)) => Err(ApiError::Connection(e)),
            Err(err @ (RefreshError::Rejected { .. } | RefreshError::Invalid(_))) => {
                tracing::info!(error = %err, "token refresh failed; session expired");
                self.store.clear();
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Issue one HTTP request with the given access token, no recovery.
    async fn send_once(
        &self,
        request: &ApiRequest,
        access: Option<&Secret>,
    ) -> Result<HttpResponse, ApiError> {
        let url = self.config.endpoint(&request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        for (name, value) in build_headers(request.header_kind, access) {
            builder = builder.typed_header(name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body).map_err(ApiError::from_http)?;
        }

        builder.send().await.map_err(ApiError::from_http)
    }
}
