//! User administration. Everything here requires an admin session, except
//! that [`User`] is also the shape of the signed-in user's own profile.

use crate::client::{ApiClient, ApiRequest};
use crate::config::endpoints;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

use super::StatusMessage;
use super::auth::{RegistrationForm, RegistrationReceipt};

/// A full user record.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub rut: String,
    pub nombre: String,
    pub apellido_paterno: String,
    #[serde(default)]
    pub apellido_materno: Option<String>,
    /// ISO date
    pub fecha_nacimiento: String,
    pub telefono: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub nombre_completo: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
}

/// Partial update of a user record.
///
/// `rut` and `password` are immutable through this endpoint; only fields
/// set to `Some` are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_paterno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_materno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn user_path(id: u64) -> String {
    format!("{}{id}/", endpoints::USUARIOS)
}

impl ApiClient {
    /// List all users.
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.execute_json(ApiRequest::get(endpoints::USUARIOS)).await
    }

    /// Fetch one user.
    pub async fn user(&self, id: u64) -> Result<User, ApiError> {
        self.execute_json(ApiRequest::get(user_path(id))).await
    }

    /// Create a user. Same field set as self-registration.
    pub async fn create_user(
        &self,
        form: &RegistrationForm,
    ) -> Result<RegistrationReceipt, ApiError> {
        self.execute_json(ApiRequest::post(endpoints::USUARIOS).body(&form.to_body())?)
            .await
    }

    /// Apply a partial update to a user.
    pub async fn update_user(&self, id: u64, update: &UserUpdate) -> Result<User, ApiError> {
        self.execute_json(ApiRequest::patch(user_path(id)).body(update)?)
            .await
    }

    /// Delete a user.
    pub async fn delete_user(&self, id: u64) -> Result<StatusMessage, ApiError> {
        self.execute_json(ApiRequest::delete(user_path(id))).await
    }
}
