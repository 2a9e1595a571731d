use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use tera::Context;

use crate::app::cookies::{clear_cookie, read_cookie, set_cookie, SESSION_COOKIE};
use crate::app::flash::FlashMessage;
use crate::app::routes::redirect_with_flash;
use crate::app::state::AppState;
use crate::core::access;
use crate::core::accounts::{self, RegistrationForm, BAD_CREDENTIALS};
use crate::core::forms::{FormErrors, Submission};
use crate::domain::model::Viewer;
use crate::utils::error::Result;

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn render_register(
    state: &AppState,
    viewer: &Viewer,
    headers: &HeaderMap,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> Result<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    state.templates.page("register.html", context, viewer, headers)
}

pub async fn register_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
) -> Result<Response> {
    access::unauthenticated_user(&viewer)?;
    render_register(
        &state,
        &viewer,
        &headers,
        &RegistrationForm::default(),
        &FormErrors::default(),
    )
}

pub async fn register_submit(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Form(form): Form<RegistrationForm>,
) -> Result<Response> {
    access::unauthenticated_user(&viewer)?;

    match accounts::register(state.store.as_ref(), &form).await? {
        Submission::Accepted(user) => Ok(redirect_with_flash(
            "/login/",
            FlashMessage::success(format!("Account was created for {}", user.username)),
            state.secure_cookies,
        )),
        Submission::Rejected(errors) => render_register(&state, &viewer, &headers, &form, &errors),
    }
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
) -> Result<Response> {
    access::unauthenticated_user(&viewer)?;

    let mut context = Context::new();
    context.insert("username", "");
    state.templates.page("login.html", context, &viewer, &headers)
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<NextParam>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    access::unauthenticated_user(&viewer)?;
    let store = state.store.as_ref();

    let Some(user) = accounts::authenticate(store, &form.username, &form.password).await? else {
        tracing::info!("Failed login for '{}'", form.username);
        let mut context = Context::new();
        context.insert("username", &form.username);
        return state.templates.page_with_messages(
            "login.html",
            context,
            &viewer,
            &headers,
            vec![FlashMessage::info(BAD_CREDENTIALS)],
        );
    };

    let target = accounts::safe_next(params.next.as_deref()).unwrap_or(user.landing_path());
    let token = accounts::open_session(store, user.id, state.session_ttl_minutes).await?;
    tracing::info!("User '{}' logged in", user.username);

    let mut response = Redirect::to(target).into_response();
    if let Some(cookie) = set_cookie(
        SESSION_COOKIE,
        &token,
        state.session_ttl_minutes * 60,
        state.secure_cookies,
    ) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = read_cookie(&headers, SESSION_COOKIE) {
        accounts::close_session(state.store.as_ref(), token).await?;
    }

    let mut response = Redirect::to("/login/").into_response();
    if let Some(cookie) = clear_cookie(SESSION_COOKIE) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}
