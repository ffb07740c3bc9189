//! Typed wrappers over the storefront endpoints.
//!
//! Each module groups the operations of one backend area and defines the
//! request/response types its endpoints exchange. All operations go through
//! [`ApiClient::execute`](crate::ApiClient::execute), so the session
//! handling (Bearer header, refresh-and-retry on 401) applies uniformly.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod users;

/// Generic acknowledgement body.
///
/// The backend answers some mutations with `{"message": ...}` and others
/// with `{"mensaje": ...}`; both map here.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StatusMessage {
    #[serde(alias = "mensaje")]
    pub message: String,
}
