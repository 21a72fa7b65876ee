use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::form::ValidationError;
use crate::report::ReportError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no scored record for student {student_id}")]
    RecordNotFound { student_id: String },

    #[error("report generation failed: {0}")]
    Render(#[from] ReportError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("login required")]
    Unauthenticated { login_url: String },
}

impl AppError {
    /// Message shown to the caller. Render and session details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(err) => format!("Invalid input: {err}"),
            AppError::RecordNotFound { .. } => "Student not found!".to_string(),
            AppError::Render(_) => "Error generating the PDF report".to_string(),
            AppError::Session(_) => "Session storage is unavailable".to_string(),
            AppError::Unauthenticated { .. } => "Please log in to continue".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Render(_) | AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthenticated { .. } => StatusCode::SEE_OTHER,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(_) | AppError::RecordNotFound { .. } => {
                tracing::warn!(error = %self, "request rejected");
            }
            AppError::Render(_) | AppError::Session(_) => {
                tracing::error!(error = %self, "request failed");
            }
            AppError::Unauthenticated { .. } => {}
        }

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::Unauthenticated { login_url } = self {
            response.insert_header((header::LOCATION, login_url.as_str()));
        }
        response.json(json!({ "error": self.public_message() }))
    }
}
