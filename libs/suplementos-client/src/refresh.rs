use crate::config::{ApiConfig, endpoints};
use crate::secret::Secret;
use crate::store::{SessionUpdate, TokenStore};
use suplementos_http::{HttpClient, HttpError};
use thiserror::Error;

/// Failure modes of the token refresh exchange.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RefreshError {
    /// No refresh token is stored. Detected locally; no request is made.
    #[error("no refresh token stored")]
    MissingToken,

    /// The token endpoint answered with a non-success status (the refresh
    /// token is expired, revoked, or malformed).
    #[error("token refresh rejected with HTTP {status}")]
    Rejected { status: http::StatusCode },

    /// The exchange produced a response that could not be decoded, or the
    /// request could not be built.
    #[error("token refresh response invalid: {0}")]
    Invalid(#[source] HttpError),

    /// The exchange never produced an HTTP response.
    #[error("token refresh connection error: {0}")]
    Connection(#[source] HttpError),
}

/// Successful response from the token refresh endpoint.
///
/// Deserialize only: tokens never serialize back out implicitly.
#[derive(serde::Deserialize)]
struct RefreshResponse {
    access: Secret,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    refresh: Option<Secret>,
}

/// Exchange the stored refresh token for a fresh access token.
///
/// On success the new access token (and rotated refresh token, if the
/// server sent one) is written to the store. On any failure the store is
/// left untouched; the caller decides whether the session is over.
pub(crate) async fn refresh_access_token(
    http: &HttpClient,
    config: &ApiConfig,
    store: &dyn TokenStore,
) -> Result<(), RefreshError> {
    let Some(refresh) = store.get().refresh else {
        tracing::debug!("token refresh skipped; no refresh token stored");
        return Err(RefreshError::MissingToken);
    };

    let url = config.endpoint(endpoints::TOKEN_REFRESH);
    let body = serde_json::json!({ "refresh": refresh.expose() });

    let response = http
        .post(&url)
        .json(&body)
        .map_err(RefreshError::Invalid)?
        .send()
        .await
        .map_err(|e| {
            if e.is_transport() {
                RefreshError::Connection(e)
            } else {
                RefreshError::Invalid(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(status = %status, "token refresh rejected");
        return Err(RefreshError::Rejected { status });
    }

    let tokens: RefreshResponse = response.json().await.map_err(RefreshError::Invalid)?;

    store.set(SessionUpdate {
        access: Some(tokens.access),
        refresh: tokens.refresh,
    });
    tracing::debug!("access token refreshed");
    Ok(())
}
