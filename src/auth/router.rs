use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use minijinja::context;
use serde::Deserialize;
use tracing::error;

use super::user::{AuthSession, Credentials};
use crate::{error::AppError, router::AppState};

pub const DEFAULT_NEXT: &str = "/admin/affiliations";
const INVALID_LOGIN: &str = "Please enter a correct username and password.";

// This allows us to extract the "next" field from the query string. We use this
// to redirect after log in.
#[derive(Debug, Deserialize)]
pub struct NextUrl {
    next: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(self::get::login).post(self::post::login))
        .route("/logout", get(self::get::logout))
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => DEFAULT_NEXT,
    }
}

mod post {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        mut auth_session: AuthSession,
        Form(creds): Form<Credentials>,
    ) -> Result<Response, AppError> {
        let username = creds.username.clone();
        let next = creds.next.clone();

        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                let page = state.render(
                    "login.html",
                    context! { username, next, error => INVALID_LOGIN },
                )?;
                return Ok((StatusCode::UNAUTHORIZED, page).into_response());
            }
            Err(err) => {
                error!("Authentication failed: {:?}", err);
                return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        if let Err(err) = auth_session.login(&user).await {
            error!("Failed to start session: {:?}", err);
            return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }

        Ok(Redirect::to(safe_next(next.as_deref())).into_response())
    }
}

mod get {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> Result<Response, AppError> {
        Ok(state.render("login.html", context! { next })?.into_response())
    }

    pub async fn logout(mut auth_session: AuthSession) -> impl IntoResponse {
        match auth_session.logout().await {
            Ok(_) => Redirect::to("/login").into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_this_site() {
        assert_eq!(safe_next(Some("/admin/affiliations/3")), "/admin/affiliations/3");
        assert_eq!(safe_next(Some("//evil.example.com")), DEFAULT_NEXT);
        assert_eq!(safe_next(Some("https://evil.example.com")), DEFAULT_NEXT);
        assert_eq!(safe_next(Some("/\\evil.example.com")), DEFAULT_NEXT);
        assert_eq!(safe_next(None), DEFAULT_NEXT);
    }
}
