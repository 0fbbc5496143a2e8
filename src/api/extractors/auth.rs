use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::domain::models::user::{User, UserRole};
use crate::domain::services::auth_service::AuthService;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require_role(&self, role: UserRole) -> Result<&User, AppError> {
        if self.0.role == role || self.0.role == UserRole::Admin {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden(format!("Only {} accounts can do this", role)))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(AppError::InternalWithMsg("Cookie layer missing".into()))?;

        let access_token = cookies.get("access_token")
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = app_state.auth_service.verify(&access_token)?;

        let method = &parts.method;
        if method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .ok_or(AppError::Forbidden("Missing CSRF token".into()))?
                .to_str()
                .map_err(|_| AppError::Forbidden("Invalid CSRF token".into()))?;

            if csrf_header_val != claims.csrf_token {
                return Err(AppError::Forbidden("Invalid CSRF token".into()));
            }
        }

        let user = AuthService::user_from_claims(&claims)?;
        Span::current().record("user_id", &user.id);

        Ok(AuthUser(user))
    }
}
