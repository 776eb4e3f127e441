use std::process::{ExitCode, Termination};

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use error_stack::{AttachmentKind, FrameKind, Report};
use kernel::KernelError;
use serde::Serialize;

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

impl ErrorStatus {
    pub fn status(&self) -> StatusCode {
        match self.0.current_context() {
            KernelError::NotFound => StatusCode::NOT_FOUND,
            KernelError::Conflict
            | KernelError::UserAlreadyRenting
            | KernelError::BikeNotAvailable
            | KernelError::NoOpenRental => StatusCode::CONFLICT,
            KernelError::RentalMismatch | KernelError::Validation => StatusCode::BAD_REQUEST,
            KernelError::Unauthorized => StatusCode::UNAUTHORIZED,
            KernelError::Timeout => StatusCode::REQUEST_TIMEOUT,
            KernelError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client. Ledger and infrastructure failures use their fixed wording;
    /// the rest prefer the most recent printable detail.
    pub fn message(&self) -> String {
        let context = self.0.current_context();
        match context {
            KernelError::NotFound
            | KernelError::Conflict
            | KernelError::Validation
            | KernelError::Unauthorized => self
                .0
                .frames()
                .find_map(|frame| match frame.kind() {
                    FrameKind::Attachment(AttachmentKind::Printable(printable)) => {
                        Some(printable.to_string())
                    }
                    _ => None,
                })
                .unwrap_or_else(|| context.to_string()),
            _ => context.to_string(),
        }
    }
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{:?}", self.0);
        } else {
            tracing::debug!("{:?}", self.0);
        }
        (status, Json(MessageResponse::new(self.message()))).into_response()
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use error_stack::Report;
    use kernel::KernelError;

    use super::ErrorStatus;

    #[test]
    fn maps_contexts_to_status_codes() {
        let cases = [
            (KernelError::NotFound, StatusCode::NOT_FOUND),
            (KernelError::Conflict, StatusCode::CONFLICT),
            (KernelError::UserAlreadyRenting, StatusCode::CONFLICT),
            (KernelError::BikeNotAvailable, StatusCode::CONFLICT),
            (KernelError::NoOpenRental, StatusCode::CONFLICT),
            (KernelError::RentalMismatch, StatusCode::BAD_REQUEST),
            (KernelError::Validation, StatusCode::BAD_REQUEST),
            (KernelError::Unauthorized, StatusCode::UNAUTHORIZED),
            (KernelError::Timeout, StatusCode::REQUEST_TIMEOUT),
            (KernelError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (context, status) in cases {
            assert_eq!(ErrorStatus::from(Report::new(context)).status(), status);
        }
    }

    #[test]
    fn picks_message_by_context() {
        let validation =
            ErrorStatus::from(Report::new(KernelError::Validation).attach_printable("No fields to update"));
        assert_eq!(validation.message(), "No fields to update");

        let mismatch = ErrorStatus::from(
            Report::new(KernelError::RentalMismatch).attach_printable("requested 9 but open is 5"),
        );
        assert_eq!(
            mismatch.message(),
            "Rental in request does not match with current bike rental by user"
        );

        let internal = ErrorStatus::from(
            Report::new(KernelError::Internal).attach_printable("connection reset by peer"),
        );
        assert_eq!(internal.message(), "Transaction failed");
    }
}
