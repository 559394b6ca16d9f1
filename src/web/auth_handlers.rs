//! Login, registration, logout, and the current-user extractor.

use super::AppState;
use super::render;
use crate::auth;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::forms::{FormErrors, LoginForm, SignupForm};
use crate::types::User;
use axum::extract::{Form, FromRequestParts, Query, State};
use axum::http::HeaderMap;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{info, warn};

/// The authenticated user for a request, resolved from the session cookie.
///
/// Extraction failure redirects to the login page, so any handler taking
/// this extractor is login-protected.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            session_token(&parts.headers).ok_or_else(|| Redirect::to("/user/login"))?;

        let user = state
            .db()
            .resolve_session(&auth::token_hash(&token))
            .unwrap_or_else(|e| {
                warn!("session lookup failed: {e:#}");
                None
            });

        match user {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(Redirect::to("/user/login")),
        }
    }
}

/// Pull the session token out of the Cookie header, if any.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == auth::SESSION_COOKIE {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        auth::SESSION_COOKIE,
        token,
        ttl_hours * 3600
    )
}

fn expired_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        auth::SESSION_COOKIE
    )
}

#[derive(Debug, serde::Deserialize)]
pub struct LoginPageParams {
    registered: Option<String>,
}

/// Login page.
pub async fn login_page(Query(params): Query<LoginPageParams>) -> Html<String> {
    let notice = params
        .registered
        .is_some()
        .then_some("Account created, log in to continue");
    render::page("Log in", None, &render::login_form("", None, notice))
}

/// Login form submission: verify credentials, issue a session cookie.
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let (username, password) = match form.validate() {
        Ok(v) => v,
        Err(_) => {
            let body = render::login_form(
                form.username.trim(),
                Some("Username and password are required"),
                None,
            );
            return Ok(render::page("Log in", None, &body).into_response());
        }
    };

    let user = state.db().get_user_by_username(&username)?;
    let verified = user
        .as_ref()
        .map(|u| auth::verify_password(&password, &u.password_hash))
        .unwrap_or(false);

    let Some(user) = user.filter(|_| verified) else {
        info!(username = %username, "failed login attempt");
        let body = render::login_form(
            form.username.trim(),
            Some("Invalid username or password"),
            None,
        );
        return Ok(render::page("Log in", None, &body).into_response());
    };

    let ttl_hours = state.session_ttl_hours();
    let token = auth::generate_token();
    state
        .db()
        .create_session(&user.id, &auth::token_hash(&token), ttl_hours)?;
    info!(username = %user.username, "user logged in");

    Ok((
        [(SET_COOKIE, session_cookie(&token, ttl_hours))],
        Redirect::to("/tasks"),
    )
        .into_response())
}

/// Registration page.
pub async fn signup_page() -> Html<String> {
    render::page(
        "Sign up",
        None,
        &render::signup_form("", &FormErrors::default()),
    )
}

/// Registration form submission.
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let valid = match form.validate() {
        Ok(v) => v,
        Err(errors) => {
            let body = render::signup_form(form.username.trim(), &errors);
            return Ok(render::page("Sign up", None, &body).into_response());
        }
    };

    match state
        .db()
        .create_user(&valid.username, &auth::hash_password(&valid.password))
    {
        Ok(user) => {
            info!(username = %user.username, "user registered");
            Ok(Redirect::to("/user/login?registered=1").into_response())
        }
        Err(err) => {
            let app_err = AppError::from(err);
            if app_err.code == ErrorCode::UsernameTaken {
                let mut errors = FormErrors::default();
                errors.push("username", "That username is already taken");
                let body = render::signup_form(form.username.trim(), &errors);
                Ok(render::page("Sign up", None, &body).into_response())
            } else {
                Err(app_err)
            }
        }
    }
}

/// Log out: drop the session row and expire the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    if let Some(token) = session_token(&headers) {
        state.db().delete_session(&auth::token_hash(&token))?;
    }

    Ok((
        [(SET_COOKIE, expired_cookie())],
        Redirect::to("/user/login"),
    )
        .into_response())
}
