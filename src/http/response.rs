//! Error responses.
//!
//! Per-request errors become a status code plus a short plain-text body.
//! No partial responses: validation errors are rendered before any upstream
//! call has started.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), self.to_string()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = ProxyError::MissingUserAgent.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Missing User-Agent header");
    }
}
