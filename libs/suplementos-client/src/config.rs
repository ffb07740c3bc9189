use suplementos_http::{HttpClientConfig, HttpError, InvalidUriKind};
use url::Url;

/// API endpoint paths, relative to the configured base URL.
///
/// Paths keep the trailing slash the backend router expects; a request to
/// the slashless variant would be redirected.
pub mod endpoints {
    // Authentication (JWT)
    pub const TOKEN: &str = "/api/token/";
    pub const TOKEN_REFRESH: &str = "/api/token/refresh/";
    pub const USUARIO_ACTUAL: &str = "/api/usuario/actual/";
    pub const REGISTRO: &str = "/api/registro/";
    pub const PASSWORD_RESET_REQUEST: &str = "/api/password-reset/request/";
    pub const PASSWORD_RESET_CONFIRM: &str = "/api/password-reset/confirm/";
    pub const PASSWORD_RESET_VALIDATE: &str = "/api/password-reset/validate-token/";

    // Product catalog
    pub const PROTEINAS: &str = "/api/proteinas/";
    pub const SNACKS: &str = "/api/snacks/";
    pub const CREATINAS: &str = "/api/creatinas/";
    pub const AMINOACIDOS: &str = "/api/aminoacidos/";
    pub const VITAMINAS: &str = "/api/vitaminas/";

    // Cart
    pub const CARRITO: &str = "/api/carrito/";
    pub const CARRITO_AGREGAR: &str = "/api/carrito/agregar/";
    pub const CARRITO_ACTUALIZAR: &str = "/api/carrito/actualizar/";
    pub const CARRITO_VACIAR: &str = "/api/carrito/vaciar/";
    pub const CARRITO_RESUMEN: &str = "/api/carrito/resumen/";
    pub const CARRITO_PAGAR: &str = "/api/carrito/pagar/";

    // Purchases and user administration
    pub const MIS_COMPRAS: &str = "/api/mis-compras/";
    pub const USUARIOS: &str = "/api/usuarios/";
}

/// Client configuration: the API base URL plus transport settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: Url,
    /// Transport configuration passed to the underlying HTTP client.
    pub http: HttpClientConfig,
}

impl ApiConfig {
    /// Create a configuration for the given base URL with default transport
    /// settings (10 second request timeout, TLS only).
    ///
    /// # Errors
    ///
    /// Returns `HttpError::InvalidUri` if the base URL cannot be parsed or
    /// has no host.
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let url = Url::parse(base_url).map_err(|e| HttpError::InvalidUri {
            url: base_url.to_owned(),
            kind: InvalidUriKind::ParseError,
            reason: e.to_string(),
        })?;

        if url.host_str().is_none() {
            return Err(HttpError::InvalidUri {
                url: base_url.to_owned(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        Ok(Self {
            base_url: url,
            http: HttpClientConfig::default(),
        })
    }

    /// Replace the transport configuration.
    #[must_use]
    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join an endpoint path onto the base URL.
    ///
    /// Paths in [`endpoints`] carry a leading slash; a trailing slash on the
    /// base URL is dropped so the join never doubles up.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn endpoint_joins_cleanly() {
        let config = ApiConfig::new("https://suplementospro.onrender.com").unwrap();
        assert_eq!(
            config.endpoint(endpoints::CARRITO),
            "https://suplementospro.onrender.com/api/carrito/"
        );
    }

    #[test]
    fn endpoint_handles_trailing_slash_on_base() {
        let config = ApiConfig::new("https://suplementospro.onrender.com/").unwrap();
        assert_eq!(
            config.endpoint(endpoints::TOKEN),
            "https://suplementospro.onrender.com/api/token/"
        );
    }

    #[test]
    fn endpoint_preserves_base_path_prefix() {
        let config = ApiConfig::new("https://example.com/staging").unwrap();
        assert_eq!(
            config.endpoint(endpoints::TOKEN),
            "https://example.com/staging/api/token/"
        );
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        let config = ApiConfig::new("https://suplementospro.onrender.com").unwrap();
        assert_eq!(config.http.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(ApiConfig::new("not a url").is_err());
    }

    #[test]
    fn base_url_without_host_rejected() {
        let err = ApiConfig::new("file:///tmp/api").unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            }
        ));
    }
}
