//! Error handling for beer catalog operations.

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::StatusResponse;

/// A beer was rejected before it was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BeerValidationError {
    #[error("beer name must not be blank")]
    BlankName,
    #[error("beer style must not be blank")]
    BlankStyle,
    #[error("beer id is assigned by the service and must not be set on create")]
    IdAssigned,
}

/// A non-success response of the beer service.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    status: StatusCode,
    body: Option<String>,
}

impl ErrorResponse {
    pub(crate) fn new(status: StatusCode, body: Option<String>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw response body, if the service sent one.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// A human readable detail extracted from a json error body.
    ///
    /// Understands `{"detail": ..}`, `{"message": ..}`, `{"error": ..}`
    /// and lists of messages as returned for failed validations.
    pub fn detail(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(self.body.as_deref()?).ok()?;
        match value {
            serde_json::Value::Object(fields) => ["detail", "message", "error"]
                .iter()
                .find_map(|key| fields.get(*key)?.as_str())
                .map(ToString::to_string),
            serde_json::Value::Array(messages) => {
                let messages = messages
                    .iter()
                    .filter_map(|message| message.as_str())
                    .collect::<Vec<_>>();
                (!messages.is_empty()).then(|| messages.join("; "))
            },
            serde_json::Value::String(message) => Some(message),
            _ => None,
        }
    }
}

/// Common error type for beer catalog operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("beer not found ({})", .0.status())]
    NotFound(ErrorResponse),
    #[error("{}", fmt_error_response(.0))]
    ErrorResponse(ErrorResponse),
    #[error("failed to communicate with the beer service")]
    Communication(#[source] reqwest::Error),
    #[error("failed to build request")]
    InvalidRequest(#[source] reqwest::Error),
    #[error("failed to decode response ({status})")]
    InvalidResponsePayload {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid beer")]
    InvalidBeer(#[from] BeerValidationError),
    #[error("invalid configuration")]
    Config(#[from] config::ConfigError),
    #[error("{}", .0)]
    Other(String),
}

impl CatalogClientError {
    /// The http status sent by the service, if the request got a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::NotFound(response) | CatalogClientError::ErrorResponse(response) => {
                Some(response.status())
            },
            CatalogClientError::InvalidResponsePayload { status, .. } => Some(*status),
            CatalogClientError::Communication(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogClientError::NotFound(_))
    }
}

fn fmt_error_response(response: &ErrorResponse) -> String {
    let status = response.status();
    match response.detail() {
        Some(detail) => format!("{status}: {detail}"),
        None => format!("{status}"),
    }
}

/// Extension trait for status-only operations
/// whose callers want to handle error statuses as values.
pub trait RecoverStatusExt {
    /// Turns a failure that carries a response status into a
    /// [StatusResponse] with that status.
    ///
    /// Failures without a response (connection errors, invalid beers, ..)
    /// are returned unchanged.
    fn recover_status(self) -> Result<StatusResponse, CatalogClientError>;
}

impl RecoverStatusExt for Result<StatusResponse, CatalogClientError> {
    fn recover_status(self) -> Result<StatusResponse, CatalogClientError> {
        match self {
            Err(CatalogClientError::NotFound(response) | CatalogClientError::ErrorResponse(response)) => {
                Ok(StatusResponse::from_status(response.status()))
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn error_response(status: StatusCode, body: &str) -> ErrorResponse {
        ErrorResponse::new(status, Some(body.to_string()))
    }

    #[test]
    fn detail_from_message_field() {
        let response = error_response(
            StatusCode::BAD_REQUEST,
            r#"{"timestamp":"2021-03-13T19:40:12","status":400,"error":"Bad Request","message":"beerName must not be blank"}"#,
        );
        assert_eq!(
            response.detail().as_deref(),
            Some("beerName must not be blank")
        );
    }

    #[test]
    fn detail_from_message_list() {
        let response = error_response(
            StatusCode::BAD_REQUEST,
            r#"["beerName : must not be blank","beerStyle : must not be blank"]"#,
        );
        assert_eq!(
            response.detail().as_deref(),
            Some("beerName : must not be blank; beerStyle : must not be blank")
        );
    }

    #[test]
    fn no_detail_from_html() {
        let response = error_response(StatusCode::BAD_GATEWAY, "<html>(╯°□°)╯︵ ┻━┻</html>");
        assert_eq!(response.detail(), None);
        assert_eq!(
            CatalogClientError::ErrorResponse(response).to_string(),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn error_response_display_includes_detail() {
        let err = CatalogClientError::ErrorResponse(error_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"invalid upc"}"#,
        ));
        assert_eq!(err.to_string(), "400 Bad Request: invalid upc");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn recovers_not_found_into_status() {
        let result: Result<StatusResponse, _> = Err(CatalogClientError::NotFound(
            ErrorResponse::new(StatusCode::NOT_FOUND, None),
        ));
        let response = result.recover_status().unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn local_failures_are_not_recovered() {
        let result: Result<StatusResponse, _> =
            Err(CatalogClientError::InvalidBeer(BeerValidationError::BlankName));
        assert!(matches!(
            result.recover_status(),
            Err(CatalogClientError::InvalidBeer(BeerValidationError::BlankName))
        ));
    }
}
