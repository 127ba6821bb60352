use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use lms_db::{
    models::{User, UserRole, UserStatus},
    repositories::user as user_repo,
};
use uuid::Uuid;

use super::jwt::verify_session_token;
use crate::{error::ApiError, state::{ApiState, AuthConfig}};

/// Cookie the identity provider's frontend SDK stores the session in
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated identity extractor
///
/// Accepts the session token from `Authorization: Bearer` or from the
/// `__session` cookie and validates it. It does not touch the database.
///
/// # Example
/// ```
/// use lms_api::{auth::AuthUser, error::ApiError};
///
/// async fn protected_route(auth_user: AuthUser) -> Result<String, ApiError> {
///     Ok(auth_user.external_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub external_id: String,
    pub email: Option<String>,
}

fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_config = AuthConfig::from_ref(state);

        let token = session_token(parts)
            .ok_or(ApiError::Unauthenticated("Not authenticated".to_string()))?;

        let claims = verify_session_token(&token, &auth_config.jwt_secret)?;

        Ok(AuthUser {
            external_id: claims.sub,
            email: claims.email,
        })
    }
}

/// The signed-in platform user, resolved from the session.
///
/// Suspended and banned accounts are rejected with 403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::OrgAdmin
    }

    /// Approved tutors and org admins may author content.
    pub fn require_author(&self) -> Result<(), ApiError> {
        let active_tutor = self.0.role == UserRole::Tutor && self.0.status == UserStatus::Active;
        if active_tutor || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Tutor access required".to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Course owners and admins may change a course.
    pub fn require_owner(&self, tutor_id: Uuid) -> Result<(), ApiError> {
        if self.0.id == tutor_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("You do not own this course".to_string()))
        }
    }
}

async fn resolve_user(state: &ApiState, auth_user: &AuthUser) -> Result<User, ApiError> {
    let user = user_repo::find_by_external_id(&state.pool, &auth_user.external_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Unknown user".to_string()))?;

    if user.status.is_blocked() {
        tracing::info!(user_id = %user.id, status = ?user.status, "blocked user rejected");
        return Err(ApiError::Forbidden("Account suspended".to_string()));
    }

    Ok(user)
}

impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let user = resolve_user(state, &auth_user).await?;
        Ok(CurrentUser(user))
    }
}

/// Like [`CurrentUser`] but anonymous requests resolve to `None`.
///
/// A session that is present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<ApiState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        if session_token(parts).is_none() {
            return Ok(MaybeUser(None));
        }
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let user = resolve_user(state, &auth_user).await?;
        Ok(MaybeUser(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .uri("/")
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with("authorization", "Bearer abc.def.ghi");
        assert_eq!(session_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_session_cookie_extracted() {
        let parts = parts_with("cookie", "theme=dark; __session=abc.def.ghi");
        assert_eq!(session_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_token() {
        let parts = parts_with("x-other", "value");
        assert!(session_token(&parts).is_none());
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let parts = parts_with("authorization", "Basic dXNlcjpwYXNz");
        assert!(session_token(&parts).is_none());
    }
}
