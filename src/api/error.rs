use thiserror::Error;

/// Errors surfaced by the remote catalog boundary.
///
/// None of these are fatal to the host application: the sync engine
/// degrades to whatever data it already holds and logs the failure.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("catalog endpoint not found: {0}")]
    NotFound(String),

    #[error("rate limited by remote store")]
    RateLimited,

    #[error("remote store error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Cap on response bodies carried inside error values.
const MAX_ERROR_BODY_LEN: usize = 500;

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = truncate_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound(body),
            429 => ApiError::RateLimited,
            s @ 500..=599 => ApiError::Server { status: s, body },
            s => ApiError::UnexpectedResponse(format!("status {}: {}", s, body)),
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    // Back off to a char boundary; a multibyte character straddling the
    // cut must not panic while we are constructing an error.
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... (truncated, {} total bytes)",
        &body[..end],
        body.len()
    )
}
