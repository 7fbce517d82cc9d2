use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::error::ApiError;
use crate::db::{DbError, SessionRepo};
use crate::server::AppState;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
}

/// Resolve the bearer token, if any, to a `SessionUser` request extension.
/// Requests without a valid session pass through untouched; handlers that
/// need a user reject them.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        match state.db.get_token(&token).await {
            Ok(access_token) => {
                req.extensions_mut().insert(SessionUser {
                    user_id: access_token.userid,
                });
            }
            Err(DbError::NotFound(_)) => debug!("Unknown session token"),
            Err(e) => warn!(error = %e, "Session lookup failed"),
        }
    }

    next.run(req).await
}

fn extract_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_bearer)
}

fn parse_bearer(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub fn require_user(user: Option<SessionUser>) -> Result<SessionUser, ApiError> {
    user.ok_or_else(|| ApiError::Unauthenticated("Authentication required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc".to_string()));
        assert_eq!(parse_bearer("bearer   abc "), Some("abc".to_string()));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc"), None);
    }

    #[test]
    fn test_require_user() {
        assert!(matches!(
            require_user(None),
            Err(ApiError::Unauthenticated(_))
        ));
        let user = SessionUser {
            user_id: "u".to_string(),
        };
        assert_eq!(require_user(Some(user.clone())).unwrap(), user);
    }
}
