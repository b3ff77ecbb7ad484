use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError};
use charybdis::errors::CharybdisError;
use serde_json::json;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum FormflowError {
    // 400s
    StructuralConflict(String),
    ValidationError((String, String)),
    InvalidSlugFormat(String),
    UnknownConnection(String),
    NotAccepting(String),
    NotFound(String),
    SlugConflict(String),
    Conflict(String),
    // 400 | 500
    CharybdisError(CharybdisError),
    // 500
    DatabaseError(String),
    SerdeError(serde_json::Error),
    InternalServerError(String),
}

impl FormflowError {
    /// Caller errors leave persisted state untouched and are not worth an error log line.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl fmt::Display for FormflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormflowError::StructuralConflict(e) => write!(f, "Structural Conflict: {}", e),
            FormflowError::ValidationError((field, message)) => {
                write!(f, "Validation Error: {}: {}", field, message)
            }
            FormflowError::InvalidSlugFormat(e) => write!(f, "Invalid Slug Format: {}", e),
            FormflowError::UnknownConnection(e) => write!(f, "Unknown Connection: {}", e),
            FormflowError::NotAccepting(e) => write!(f, "Not Accepting Responses: {}", e),
            FormflowError::NotFound(e) => write!(f, "Not Found: {}", e),
            FormflowError::SlugConflict(e) => write!(f, "Slug Conflict: {}", e),
            FormflowError::Conflict(e) => write!(f, "Conflict: {}", e),
            FormflowError::CharybdisError(e) => write!(f, "Charybdis Error: \n{}", e),
            FormflowError::DatabaseError(e) => write!(f, "Database Error: \n{}", e),
            FormflowError::SerdeError(e) => write!(f, "Serde Error: \n{}", e),
            FormflowError::InternalServerError(e) => write!(f, "InternalServerError: \n{}", e),
        }
    }
}

impl Error for FormflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormflowError::CharybdisError(e) => Some(e),
            FormflowError::SerdeError(e) => Some(e),
            _ => None,
        }
    }
}

impl ResponseError for FormflowError {
    fn status_code(&self) -> StatusCode {
        match self {
            FormflowError::StructuralConflict(_)
            | FormflowError::ValidationError(_)
            | FormflowError::InvalidSlugFormat(_)
            | FormflowError::UnknownConnection(_) => StatusCode::BAD_REQUEST,
            FormflowError::NotAccepting(_) => StatusCode::FORBIDDEN,
            FormflowError::NotFound(_) => StatusCode::NOT_FOUND,
            FormflowError::SlugConflict(_) | FormflowError::Conflict(_) => StatusCode::CONFLICT,
            FormflowError::CharybdisError(CharybdisError::NotFoundError(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = match self {
            FormflowError::StructuralConflict(e)
            | FormflowError::InvalidSlugFormat(e)
            | FormflowError::UnknownConnection(e)
            | FormflowError::NotAccepting(e)
            | FormflowError::NotFound(e)
            | FormflowError::SlugConflict(e)
            | FormflowError::Conflict(e) => json!(e),
            FormflowError::ValidationError((field, message)) => json!({ field: message }),
            FormflowError::CharybdisError(CharybdisError::NotFoundError(e)) => json!(e.to_string()),
            _ => {
                log::error!("Internal Server Error: {}", self);

                json!("Internal Server Error")
            }
        };

        HttpResponseBuilder::new(status).json(json!({
            "status": status.as_u16(),
            "message": message
        }))
    }
}

impl From<CharybdisError> for FormflowError {
    fn from(e: CharybdisError) -> Self {
        FormflowError::CharybdisError(e)
    }
}

impl From<serde_json::Error> for FormflowError {
    fn from(e: serde_json::Error) -> Self {
        FormflowError::SerdeError(e)
    }
}

impl From<actix_web::error::JsonPayloadError> for FormflowError {
    fn from(e: actix_web::error::JsonPayloadError) -> Self {
        FormflowError::ValidationError(("body".to_string(), e.to_string()))
    }
}
