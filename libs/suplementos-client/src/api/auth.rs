//! Sign-in, registration, and password recovery.

use crate::client::{ApiClient, ApiRequest};
use crate::config::endpoints;
use crate::error::ApiError;
use crate::secret::Secret;
use crate::store::SessionUpdate;
use serde::Deserialize;

use super::StatusMessage;
use super::users::User;

/// Sign-in credentials.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: Secret,
}

/// User payload attached to a successful sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub nombre: String,
    pub email: String,
    #[serde(default)]
    pub nombre_completo: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Deserialize)]
struct LoginResponse {
    access: Secret,
    refresh: Secret,
    user: UserSummary,
}

/// Account registration fields.
///
/// `apellido_materno` and `direccion` are optional in the backend model;
/// everything else is required.
#[derive(Debug)]
pub struct RegistrationForm {
    pub rut: String,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    /// ISO date, e.g. `1995-04-12`
    pub fecha_nacimiento: String,
    pub telefono: String,
    pub email: String,
    pub direccion: Option<String>,
    pub password: Secret,
}

impl RegistrationForm {
    pub(crate) fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "rut": self.rut,
            "nombre": self.nombre,
            "apellido_paterno": self.apellido_paterno,
            "apellido_materno": self.apellido_materno,
            "fecha_nacimiento": self.fecha_nacimiento,
            "telefono": self.telefono,
            "email": self.email,
            "direccion": self.direccion,
            "password": self.password.expose(),
        })
    }
}

/// Acknowledgement of a created account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationReceipt {
    pub message: String,
    pub usuario: RegisteredUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
    pub nombre: String,
    #[serde(default)]
    pub rut: Option<String>,
}

impl ApiClient {
    /// Sign in and persist the issued token pair.
    ///
    /// # Errors
    /// Bad credentials surface as [`ApiError::RequestFailed`] with the
    /// backend's validation message.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserSummary, ApiError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password.expose(),
        });

        let response: LoginResponse = self
            .execute_json(ApiRequest::post(endpoints::TOKEN).public().body(&body)?)
            .await?;

        self.store()
            .set(SessionUpdate::both(response.access, response.refresh));
        tracing::debug!(user = %response.user.email, "signed in");
        Ok(response.user)
    }

    /// Drop the stored session tokens.
    ///
    /// Purely local; the backend keeps no server-side session to end.
    pub fn logout(&self) {
        self.store().clear();
        tracing::debug!("signed out; session cleared");
    }

    /// Fetch the profile of the signed-in user.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.execute_json(ApiRequest::get(endpoints::USUARIO_ACTUAL))
            .await
    }

    /// Register a new account. Does not sign in.
    pub async fn register(&self, form: &RegistrationForm) -> Result<RegistrationReceipt, ApiError> {
        self.execute_json(
            ApiRequest::post(endpoints::REGISTRO)
                .public()
                .body(&form.to_body())?,
        )
        .await
    }

    /// Request a password reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<StatusMessage, ApiError> {
        let body = serde_json::json!({ "email": email });
        self.execute_json(
            ApiRequest::post(endpoints::PASSWORD_RESET_REQUEST)
                .public()
                .body(&body)?,
        )
        .await
    }

    /// Check whether a password reset token is still valid.
    pub async fn validate_reset_token(&self, token: &str) -> Result<StatusMessage, ApiError> {
        let body = serde_json::json!({ "token": token });
        self.execute_json(
            ApiRequest::post(endpoints::PASSWORD_RESET_VALIDATE)
                .public()
                .body(&body)?,
        )
        .await
    }

    /// Set a new password using a reset token.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &Secret,
    ) -> Result<StatusMessage, ApiError> {
        let body = serde_json::json!({
            "token": token,
            "password": new_password.expose(),
        });
        self.execute_json(
            ApiRequest::post(endpoints::PASSWORD_RESET_CONFIRM)
                .public()
                .body(&body)?,
        )
        .await
    }
}
