use serde_json::{json, Value};
use thiserror::Error;

pub const SIGNATURE_FAILURE_MESSAGE: &str = "Signature verification failed.";
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable.";
pub const EVENT_NOT_FOUND_MESSAGE: &str = "Event not found.";
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("`{field}` is required")]
    MissingField { field: &'static str },
    #[error("`{field}` must be between {min} and {max} characters")]
    FieldLength { field: &'static str, min: usize, max: usize },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// What kind of inbound payload was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionKind {
    EventType,
    Command,
    Interaction,
}

impl RejectionKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::EventType => 460,
            Self::Command => 461,
            Self::Interaction => 462,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalService {
    SlackApi,
    SentimentOracle,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("missing or invalid api key")]
    Unauthorized,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported {kind:?}: `{value}`")]
    Unsupported { kind: RejectionKind, value: String },
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
    #[error("{service:?} call failed: {message}")]
    External { service: ExternalService, message: String },
}

/// HTTP-facing shape of an [`ApplicationError`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("unauthorized")]
    Unauthorized { correlation_id: String },
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("cleared: {message}")]
    Cleared { message: String, correlation_id: String },
    #[error("rejected with status {status}")]
    Rejected { status: u16, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("bad gateway: {message}")]
    BadGateway { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            Self::Unauthorized { .. } => 401,
            Self::BadRequest { .. } => 400,
            Self::Unprocessable { .. } => 422,
            Self::Cleared { .. } => 200,
            Self::Rejected { status, .. } => *status,
            Self::ServiceUnavailable { .. } => 503,
            Self::BadGateway { .. } => 502,
            Self::Internal { .. } => 500,
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::Forbidden { .. } => SIGNATURE_FAILURE_MESSAGE,
            Self::Unauthorized { .. } => UNAUTHORIZED_MESSAGE,
            Self::ServiceUnavailable { .. } => UNAVAILABLE_MESSAGE,
            Self::BadRequest { message, .. }
            | Self::Unprocessable { message, .. }
            | Self::Cleared { message, .. }
            | Self::BadGateway { message, .. }
            | Self::Internal { message, .. } => message,
            Self::Rejected { .. } => "",
        }
    }

    /// JSON body returned to the caller.
    pub fn body(&self) -> Value {
        match self {
            Self::Cleared { .. } | Self::Rejected { .. } => json!({ "response_action": "clear" }),
            _ => json!({ "error": self.user_message() }),
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Forbidden { correlation_id, .. }
            | Self::Unauthorized { correlation_id }
            | Self::BadRequest { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::Cleared { correlation_id, .. }
            | Self::Rejected { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::BadGateway { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id }
            | InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::Cleared { correlation_id: id, .. }
            | InterfaceError::Rejected { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::BadGateway { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Authentication(_) => {
                Self::Forbidden { message: SIGNATURE_FAILURE_MESSAGE.to_owned(), correlation_id }
            }
            ApplicationError::Unauthorized => Self::Unauthorized { correlation_id },
            ApplicationError::Domain(error) => {
                Self::Unprocessable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Validation(message) => Self::Unprocessable { message, correlation_id },
            ApplicationError::MalformedPayload(message) => Self::BadRequest { message, correlation_id },
            ApplicationError::NotFound(message) => Self::Cleared { message, correlation_id },
            ApplicationError::Unsupported { kind, .. } => {
                Self::Rejected { status: kind.status_code(), correlation_id }
            }
            ApplicationError::Infrastructure(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::External { service: ExternalService::SlackApi, message } => {
                Self::Internal { message, correlation_id }
            }
            ApplicationError::External { service: ExternalService::SentimentOracle, message } => {
                Self::BadGateway { message, correlation_id }
            }
        }
    }
}
