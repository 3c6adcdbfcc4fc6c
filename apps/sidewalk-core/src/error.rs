use axum::http::StatusCode;

/// Store query or transport failure while reading `sidewalk_data`.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("reading query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("reading source unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the insert-notification channel.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("failed to listen on channel {channel}: {source}")]
    Listen {
        channel: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("notification stream failed: {0}")]
    Stream(#[source] sqlx::Error),
}

/// Failure talking to the external completion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion API credential is not configured")]
    MissingCredential,
    #[error("completion API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion API error: {status}")]
    Status { status: u16, body: String },
    #[error("completion API reply has no message content")]
    MissingContent,
}

/// The model reply did not contain a parseable report.
#[derive(Debug, thiserror::Error)]
#[error("completion reply is not a valid report: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

pub fn map_db_error(err: sqlx::Error) -> (StatusCode, String) {
    let status = match &err {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23502") => StatusCode::BAD_REQUEST, // not_null_violation
            Some("23514") => StatusCode::BAD_REQUEST, // check_violation
            Some("22P02") => StatusCode::BAD_REQUEST, // invalid_text_representation
            Some("22003") => StatusCode::BAD_REQUEST, // numeric_value_out_of_range
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::error!(error = %err, status = %status, "database error");

    let message = match status {
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::BAD_REQUEST => "Invalid request",
        _ => "Database error",
    };

    (status, message.to_string())
}

pub fn map_fetch_error(err: FetchError) -> (StatusCode, String) {
    match err {
        FetchError::Query(err) => map_db_error(err),
        FetchError::Unavailable(message) => {
            tracing::error!(error = %message, "reading source unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Reading source unavailable".to_string(),
            )
        }
    }
}
