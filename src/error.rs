use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::headers::CORS_HEADERS;

/// Everything that can stop a relay. The `Display` output is the exact body the caller sees.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("錯誤：請提供 ?url= 參數")]
    MissingUrl,

    #[error("代理伺服器內部錯誤: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.to_string();

        match self {
            // no cors headers on a missing url
            Self::MissingUrl => (status, body).into_response(),
            Self::Upstream(_) => (status, CORS_HEADERS, body).into_response(),
        }
    }
}
