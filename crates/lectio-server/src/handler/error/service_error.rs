//! Service and database error to HTTP error conversions.

use lectio_postgres::PgError;

use super::http_error::{Error as HttpError, ErrorKind};
use crate::{Error as ServiceError, ErrorKind as ServiceErrorKind};

/// Tracing target for service error conversions.
const TRACING_TARGET: &str = "lectio_server::handler::service";

impl From<ServiceError> for HttpError<'static> {
    fn from(error: ServiceError) -> Self {
        let kind = match error.kind() {
            ServiceErrorKind::InvalidInput => ErrorKind::BadRequest,
            ServiceErrorKind::Unauthenticated => ErrorKind::Unauthorized,
            ServiceErrorKind::Conflict => ErrorKind::Conflict,
            ServiceErrorKind::NotFound => ErrorKind::NotFound,
            ServiceErrorKind::RecognitionFailed => ErrorKind::RecognitionFailed,
            ServiceErrorKind::UpstreamUnavailable => ErrorKind::UpstreamUnavailable,
            ServiceErrorKind::UpstreamTimeout => ErrorKind::UpstreamTimeout,
            ServiceErrorKind::StorageFailure => ErrorKind::StorageFailure,
            ServiceErrorKind::Config => ErrorKind::InternalServerError,
        };

        if kind.status_code().is_server_error() {
            tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                source = ?std::error::Error::source(&error),
                "service operation failed"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "service operation rejected"
            );
        }

        let http_error = kind.with_message(error.message().to_owned());
        match std::error::Error::source(&error) {
            Some(source) => http_error.with_context(source.to_string()),
            None => http_error,
        }
    }
}

impl From<PgError> for HttpError<'static> {
    fn from(error: PgError) -> Self {
        tracing::error!(
            target: TRACING_TARGET,
            error = %error,
            transient = error.is_transient(),
            "database operation failed"
        );

        ErrorKind::StorageFailure
            .with_message("Database operation failed")
            .with_context(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_kinds() {
        let cases = [
            (ServiceError::invalid_input("File not provided"), ErrorKind::BadRequest),
            (ServiceError::unauthenticated("Invalid credentials"), ErrorKind::Unauthorized),
            (ServiceError::conflict("taken"), ErrorKind::Conflict),
            (ServiceError::not_found("TextReading not found"), ErrorKind::NotFound),
            (ServiceError::storage("disk full"), ErrorKind::StorageFailure),
        ];

        for (service_error, expected) in cases {
            let http_error = HttpError::from(service_error);
            assert_eq!(http_error.kind(), expected);
        }
    }

    #[test]
    fn message_is_carried_over() {
        let http_error = HttpError::from(ServiceError::not_found("TextReading not found"));
        assert_eq!(http_error.message(), Some("TextReading not found"));
    }

    #[test]
    fn ocr_errors_keep_gateway_statuses() {
        let unavailable = HttpError::from(ServiceError::from(
            lectio_ocr::Error::upstream_unavailable(),
        ));
        assert_eq!(unavailable.kind().status_code().as_u16(), 503);

        let timeout = HttpError::from(ServiceError::from(lectio_ocr::Error::upstream_timeout()));
        assert_eq!(timeout.kind().status_code().as_u16(), 504);
    }
}
