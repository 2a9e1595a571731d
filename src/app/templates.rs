use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use tera::{Context, Tera};

use crate::app::cookies::{clear_cookie, FLASH_COOKIE};
use crate::app::flash::{self, FlashMessage};
use crate::domain::model::{OrderStatus, Viewer};
use crate::utils::error::Result;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("user.html", include_str!("../../templates/user.html")),
    ("products.html", include_str!("../../templates/products.html")),
    ("customer.html", include_str!("../../templates/customer.html")),
    ("order_form.html", include_str!("../../templates/order_form.html")),
    ("order_formset.html", include_str!("../../templates/order_formset.html")),
    ("delete.html", include_str!("../../templates/delete.html")),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compiles the templates embedded in the binary.
    pub fn load() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(name, context)?)
    }

    /// Renders a full page: adds the viewer, status choices and pending flash
    /// messages, and clears the flash cookie once its messages are shown.
    pub fn page(
        &self,
        name: &str,
        context: Context,
        viewer: &Viewer,
        request_headers: &HeaderMap,
    ) -> Result<Response> {
        self.page_with_messages(name, context, viewer, request_headers, Vec::new())
    }

    /// Like [`Templates::page`], with extra messages raised while handling this request.
    pub fn page_with_messages(
        &self,
        name: &str,
        context: Context,
        viewer: &Viewer,
        request_headers: &HeaderMap,
        extra: Vec<FlashMessage>,
    ) -> Result<Response> {
        let mut messages = flash::from_headers(request_headers);
        let from_cookie = !messages.is_empty();
        messages.extend(extra);
        let body = self.render(name, &with_chrome(context, viewer, &messages))?;

        let mut response = Html(body).into_response();
        if let Some(cookie) = from_cookie.then(|| clear_cookie(FLASH_COOKIE)).flatten() {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        Ok(response)
    }
}

/// Values every page expects from `base.html`.
fn with_chrome(mut context: Context, viewer: &Viewer, messages: &[FlashMessage]) -> Context {
    let user = viewer.user();
    context.insert("viewer_name", &user.map(|u| u.username.as_str()));
    context.insert("is_admin", &user.is_some_and(|u| u.is_admin()));
    context.insert("statuses", &OrderStatus::ALL.map(|s| s.as_str()));
    context.insert("messages", messages);
    context
}
