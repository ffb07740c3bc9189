use std::collections::BTreeMap;
use std::fmt;

use suplementos_http::HttpError;
use thiserror::Error;

/// Errors surfaced by [`ApiClient`](crate::ApiClient) operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// An authenticated call hit a 401 and no refresh token is stored.
    ///
    /// Returned without any network round trip to the token endpoint.
    #[error("No refresh token available; sign in required")]
    NoRefreshToken,

    /// The session could not be recovered: the refresh token was rejected,
    /// or the retried request was rejected again. Stored tokens have been
    /// cleared; the user must sign in again.
    #[error("Session expired; sign in required")]
    SessionExpired,

    /// The server answered with a non-success status that is not a
    /// recoverable authentication failure.
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailed {
        status: http::StatusCode,
        body: ErrorBody,
    },

    /// The request never produced an HTTP response (connection refused,
    /// timeout, TLS failure). The session state is untouched.
    #[error("Connection error: {0}")]
    Connection(#[source] HttpError),

    /// The request could not be built or its response could not be decoded.
    #[error("Request error: {0}")]
    Request(#[source] HttpError),
}

impl ApiError {
    /// Classify a transport-crate error.
    ///
    /// Failures below the HTTP layer become [`ApiError::Connection`];
    /// everything else (bad URL, serialization, oversized body) is a
    /// caller-side [`ApiError::Request`].
    #[must_use]
    pub fn from_http(err: HttpError) -> Self {
        if err.is_transport() {
            ApiError::Connection(err)
        } else {
            ApiError::Request(err)
        }
    }
}

/// Decoded shape of an error response body.
///
/// The API reports failures in several JSON shapes depending on which view
/// produced them. Bodies that match none of the known shapes are preserved
/// verbatim in [`ErrorBody::Unrecognized`] so no diagnostic information is
/// lost.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorBody {
    /// `{"detail": "..."}` (DRF authentication/permission errors)
    Detail(String),
    /// `{"error": "..."}` or `{"message": "..."}` (view-level errors)
    Message(String),
    /// `{"non_field_errors": ["..."]}` (serializer-level validation)
    NonField(Vec<String>),
    /// `{"email": ["..."], "rut": ["..."]}` (field-level validation)
    Fields(BTreeMap<String, Vec<String>>),
    /// Body that is not JSON or matches no known shape
    Unrecognized { raw: String },
    /// Empty body
    Empty,
}

impl ErrorBody {
    /// Decode an error response body.
    ///
    /// Never fails: unknown shapes fall through to `Unrecognized` with the
    /// raw text preserved.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return ErrorBody::Empty;
        }

        let raw = || String::from_utf8_lossy(bytes).into_owned();

        let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) else {
            return ErrorBody::Unrecognized { raw: raw() };
        };

        let Some(object) = value.as_object() else {
            return ErrorBody::Unrecognized { raw: raw() };
        };

        if let Some(detail) = object.get("detail").and_then(|v| v.as_str()) {
            return ErrorBody::Detail(detail.to_owned());
        }

        if let Some(errors) = object.get("non_field_errors").and_then(string_list) {
            return ErrorBody::NonField(errors);
        }

        for key in ["error", "message"] {
            if let Some(message) = object.get(key).and_then(|v| v.as_str()) {
                return ErrorBody::Message(message.to_owned());
            }
        }

        // Field-keyed validation errors: every value must be a string list.
        let mut fields = BTreeMap::new();
        for (key, value) in object {
            match string_list(value) {
                Some(errors) => {
                    fields.insert(key.clone(), errors);
                }
                None => return ErrorBody::Unrecognized { raw: raw() },
            }
        }
        if fields.is_empty() {
            return ErrorBody::Unrecognized { raw: raw() };
        }
        ErrorBody::Fields(fields)
    }

    /// The most user-relevant message, if any.
    ///
    /// Precedence: `detail`, then the first non-field error, then
    /// `error`/`message`, then the first field error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorBody::Detail(detail) => Some(detail),
            ErrorBody::NonField(errors) => errors.first().map(String::as_str),
            ErrorBody::Message(message) => Some(message),
            ErrorBody::Fields(fields) => fields
                .values()
                .flat_map(|errors| errors.first())
                .map(String::as_str)
                .next(),
            ErrorBody::Unrecognized { .. } | ErrorBody::Empty => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Detail(detail) => f.write_str(detail),
            ErrorBody::Message(message) => f.write_str(message),
            ErrorBody::NonField(errors) => f.write_str(&errors.join("; ")),
            ErrorBody::Fields(fields) => {
                let mut first = true;
                for (field, errors) in fields {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{field}: {}", errors.join(", "))?;
                }
                Ok(())
            }
            ErrorBody::Unrecognized { raw } => f.write_str(raw),
            ErrorBody::Empty => f.write_str("<empty body>"),
        }
    }
}

fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    let array = value.as_array()?;
    array
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn decodes_detail() {
        let body = ErrorBody::decode(br#"{"detail": "Token invalido o expirado"}"#);
        assert_eq!(body, ErrorBody::Detail("Token invalido o expirado".into()));
        assert_eq!(body.message(), Some("Token invalido o expirado"));
    }

    #[test]
    fn decodes_error_key() {
        let body = ErrorBody::decode(br#"{"error": "El carrito esta vacio"}"#);
        assert_eq!(body, ErrorBody::Message("El carrito esta vacio".into()));
    }

    #[test]
    fn decodes_message_key() {
        let body = ErrorBody::decode(br#"{"message": "Stock insuficiente"}"#);
        assert_eq!(body, ErrorBody::Message("Stock insuficiente".into()));
    }

    #[test]
    fn decodes_non_field_errors() {
        let body =
            ErrorBody::decode(br#"{"non_field_errors": ["Credenciales invalidas"]}"#);
        assert_eq!(
            body,
            ErrorBody::NonField(vec!["Credenciales invalidas".into()])
        );
        assert_eq!(body.message(), Some("Credenciales invalidas"));
    }

    #[test]
    fn decodes_field_errors() {
        let body = ErrorBody::decode(
            br#"{"email": ["Ya existe un usuario con este email"], "rut": ["RUT invalido"]}"#,
        );
        match &body {
            ErrorBody::Fields(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields["rut"], vec!["RUT invalido".to_owned()]);
            }
            other => panic!("expected Fields, got: {other:?}"),
        }
        // BTreeMap iterates keys in order, so "email" wins.
        assert_eq!(body.message(), Some("Ya existe un usuario con este email"));
    }

    #[test]
    fn detail_wins_over_other_keys() {
        let body = ErrorBody::decode(br#"{"detail": "primary", "error": "secondary"}"#);
        assert_eq!(body, ErrorBody::Detail("primary".into()));
    }

    #[test]
    fn non_json_body_preserved_verbatim() {
        let body = ErrorBody::decode(b"<html>502 Bad Gateway</html>");
        assert_eq!(
            body,
            ErrorBody::Unrecognized {
                raw: "<html>502 Bad Gateway</html>".into()
            }
        );
        assert_eq!(body.message(), None);
    }

    #[test]
    fn unknown_json_shape_preserved_verbatim() {
        let body = ErrorBody::decode(br#"{"code": 42}"#);
        assert!(matches!(body, ErrorBody::Unrecognized { .. }));
    }

    #[test]
    fn json_array_is_unrecognized() {
        let body = ErrorBody::decode(br#"["not", "an", "object"]"#);
        assert!(matches!(body, ErrorBody::Unrecognized { .. }));
    }

    #[test]
    fn empty_body() {
        assert_eq!(ErrorBody::decode(b""), ErrorBody::Empty);
        assert_eq!(ErrorBody::Empty.message(), None);
    }

    #[test]
    fn display_formats_fields() {
        let body = ErrorBody::decode(br#"{"rut": ["RUT invalido", "RUT requerido"]}"#);
        assert_eq!(body.to_string(), "rut: RUT invalido, RUT requerido");
    }

    #[test]
    fn from_http_classifies_transport() {
        let err = ApiError::from_http(HttpError::Timeout(std::time::Duration::from_secs(10)));
        assert!(matches!(err, ApiError::Connection(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from_http(HttpError::Json(json_err));
        assert!(matches!(err, ApiError::Request(_)));
    }
}
