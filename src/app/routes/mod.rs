pub mod accounts;
pub mod dashboard;
pub mod orders;

use axum::http::{header, Uri};
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::flash::{self, FlashMessage};
use crate::utils::error::AppError;

/// Path plus query, used as the post-login `next` target.
pub(crate) fn path_of(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

pub(crate) fn redirect_with_flash(to: &str, message: FlashMessage, secure: bool) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(cookie) = flash::cookie_for(&[message], secure) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found("Page", uri.path())
}
