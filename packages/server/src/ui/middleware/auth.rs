//! Access gate in front of the room endpoint.
//!
//! The gate only checks that an `auth` cookie is present. It holds no state
//! and knows nothing about the room.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::ui::error::GateError;

/// Name of the capability cookie.
pub const AUTH_COOKIE: &str = "auth";

/// Where requests without the cookie are sent.
pub const LOGIN_PATH: &str = "/login";

/// Find the auth cookie among the request's `Cookie` headers.
///
/// Returns `Ok(None)` when no auth cookie is present and an error when a
/// `Cookie` header cannot be read as text.
pub fn read_auth_cookie(headers: &HeaderMap) -> Result<Option<String>, GateError> {
    for value in headers.get_all(header::COOKIE) {
        let raw = value
            .to_str()
            .map_err(|e| GateError::Unreadable(e.to_string()))?;
        let found = raw
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| name.trim() == AUTH_COOKIE)
            .map(|(_, token)| token.trim().to_string());
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Admit requests carrying the auth cookie; redirect the rest to sign in.
pub async fn require_auth(request: Request, next: Next) -> Response {
    match read_auth_cookie(request.headers()) {
        Ok(Some(_)) => next.run(request).await,
        Ok(None) => {
            tracing::info!(path = %request.uri().path(), "no auth cookie, redirecting to sign in");
            (
                StatusCode::TEMPORARY_REDIRECT,
                [(header::LOCATION, LOGIN_PATH)],
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::HeaderValue, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn headers_with_cookie(value: HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, value);
        headers
    }

    #[test]
    fn test_read_auth_cookie_present() {
        // given:
        let headers = headers_with_cookie(HeaderValue::from_static("theme=dark; auth=alice"));

        // when:
        let token = read_auth_cookie(&headers);

        // then:
        assert_eq!(token, Ok(Some("alice".to_string())));
    }

    #[test]
    fn test_read_auth_cookie_absent() {
        let headers = headers_with_cookie(HeaderValue::from_static("theme=dark; authx=1"));
        assert_eq!(read_auth_cookie(&headers), Ok(None));
        assert_eq!(read_auth_cookie(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn test_read_auth_cookie_across_multiple_headers() {
        // given:
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("auth=bob"));

        // when:
        let token = read_auth_cookie(&headers);

        // then:
        assert_eq!(token, Ok(Some("bob".to_string())));
    }

    #[test]
    fn test_read_auth_cookie_unreadable_header() {
        // given: a header value that is not visible ASCII
        let value = HeaderValue::from_bytes(b"auth=\xffbad").unwrap();
        let headers = headers_with_cookie(value);

        // when:
        let result = read_auth_cookie(&headers);

        // then:
        assert!(matches!(result, Err(GateError::Unreadable(_))));
    }

    fn gated_app() -> Router {
        Router::new().route(
            "/room",
            get(|| async { "admitted" }).layer(axum::middleware::from_fn(require_auth)),
        )
    }

    #[tokio::test]
    async fn test_gate_passes_request_with_cookie() {
        // given:
        let request = Request::builder()
            .uri("/room")
            .header(header::COOKIE, "auth=alice")
            .body(Body::empty())
            .unwrap();

        // when:
        let response = gated_app().oneshot(request).await.unwrap();

        // then:
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gate_redirects_request_without_cookie() {
        // given:
        let request = Request::builder().uri("/room").body(Body::empty()).unwrap();

        // when:
        let response = gated_app().oneshot(request).await.unwrap();

        // then:
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_gate_rejects_unreadable_cookie_with_internal_error() {
        // given:
        let request = Request::builder()
            .uri("/room")
            .header(header::COOKIE, HeaderValue::from_bytes(b"auth=\xff").unwrap())
            .body(Body::empty())
            .unwrap();

        // when:
        let response = gated_app().oneshot(request).await.unwrap();

        // then:
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
