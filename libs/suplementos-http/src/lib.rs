#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the SuplementosPro SDK
//!
//! A hyper-based HTTP client behind a tower middleware stack:
//! - TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - Per-request timeouts
//! - User-Agent header injection
//! - Concurrency limiting with fail-fast load shedding
//! - Transparent response decompression (gzip, brotli, deflate)
//!
//! Body size limits apply to **decompressed** bytes, so a small compressed
//! payload cannot expand past the configured limit.
//!
//! # Example
//!
//! ```ignore
//! use suplementos_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .user_agent("suplementos-app/1.0")
//!     .build()?;
//!
//! let products: Vec<Product> = client
//!     .get("https://suplementospro.onrender.com/api/proteinas/")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    DEFAULT_USER_AGENT, HttpClientConfig, RateLimitConfig, TlsRootConfig, TransportSecurity,
};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{UserAgentLayer, UserAgentService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};
