#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Authenticated API client for the SuplementosPro storefront
//!
//! Wraps the [`suplementos_http`] transport with token-based session
//! handling:
//! - durable access/refresh token storage ([`store`])
//! - Bearer header injection for authenticated requests ([`headers`])
//! - transparent one-shot token refresh on 401 ([`client`])
//! - typed endpoint wrappers for the storefront API ([`api`])
//!
//! # Example
//!
//! ```ignore
//! use suplementos_client::{ApiClient, ApiConfig, MemoryTokenStore};
//! use suplementos_client::api::auth::Credentials;
//! use std::sync::Arc;
//!
//! let config = ApiConfig::new("https://suplementospro.onrender.com")?;
//! let client = ApiClient::new(config, Arc::new(MemoryTokenStore::new()))?;
//!
//! client.login(&Credentials {
//!     email: "cliente@correo.cl".into(),
//!     password: "hunter2".into(),
//! }).await?;
//!
//! let cart = client.cart().await?;
//! ```

pub mod api;
mod client;
mod config;
mod error;
mod headers;
mod refresh;
mod secret;
mod store;

pub use client::{ApiClient, ApiRequest};
pub use config::{ApiConfig, endpoints};
pub use error::{ApiError, ErrorBody};
pub use headers::{HeaderKind, build_headers};
pub use refresh::RefreshError;
pub use secret::Secret;
pub use store::{FileTokenStore, MemoryTokenStore, Session, SessionUpdate, TokenStore};
