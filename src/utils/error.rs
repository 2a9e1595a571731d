use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Password hashing error: {message}")]
    PasswordHashError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Access denied")]
    AccessDenied,

    #[error("Login required")]
    LoginRequired { next: String },

    #[error("Already authenticated")]
    AlreadyAuthenticated { landing: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Storage,
    Rendering,
    Client,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AppError::DatabaseError(_) | AppError::MigrationError(_) | AppError::IoError(_) => {
                ErrorCategory::Storage
            }
            AppError::TemplateError(_) | AppError::SerializationError(_) => {
                ErrorCategory::Rendering
            }
            AppError::ValidationError { .. }
            | AppError::NotFound { .. }
            | AppError::AccessDenied
            | AppError::LoginRequired { .. }
            | AppError::AlreadyAuthenticated { .. } => ErrorCategory::Client,
            AppError::PasswordHashError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client => ErrorSeverity::Low,
            ErrorCategory::Rendering => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// Short message for terminal output, without internal detail.
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Storage => "The database could not be reached or updated".to_string(),
            ErrorCategory::Rendering => "A page could not be rendered".to_string(),
            ErrorCategory::Client => self.to_string(),
            ErrorCategory::Internal => "An internal error occurred".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the config file and command line flags",
            ErrorCategory::Storage => "Check the database URL and that the file is writable",
            ErrorCategory::Rendering => "Check the templates for syntax errors",
            ErrorCategory::Client => "Check the request",
            ErrorCategory::Internal => "Retry the operation and inspect the logs",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::LoginRequired { next } => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("next", &next)
                    .finish();
                Redirect::to(&format!("/login/?{}", query)).into_response()
            }
            AppError::AlreadyAuthenticated { landing } => Redirect::to(landing).into_response(),
            AppError::NotFound { .. } | AppError::AccessDenied => html_status(
                StatusCode::NOT_FOUND,
                "<h1>Not Found</h1><p>The requested resource was not found on this server.</p>",
            ),
            AppError::ValidationError { message } => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            other => {
                tracing::error!(
                    "Request failed: {} (Category: {:?}, Severity: {:?})",
                    other,
                    other.category(),
                    other.severity()
                );
                html_status(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "<h1>Server Error</h1>",
                )
            }
        }
    }
}

fn html_status(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

pub type Result<T> = std::result::Result<T, AppError>;
