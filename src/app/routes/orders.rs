use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use tera::Context;

use crate::app::routes::path_of;
use crate::app::state::AppState;
use crate::core::access;
use crate::core::forms::{FormErrors, Submission};
use crate::core::orders::{self, require_customer, require_order, OrderForm, OrderFormset};
use crate::domain::model::{Customer, Order, Viewer};
use crate::utils::error::Result;

async fn render_formset(
    state: &AppState,
    viewer: &Viewer,
    headers: &HeaderMap,
    customer: &Customer,
    formset: &OrderFormset,
) -> Result<Response> {
    let products = state.store.list_products().await?;

    let mut context = Context::new();
    context.insert("customer", customer);
    context.insert("formset", formset);
    context.insert("products", &products);
    state.templates.page("order_formset.html", context, viewer, headers)
}

async fn render_order_form(
    state: &AppState,
    viewer: &Viewer,
    headers: &HeaderMap,
    order: &Order,
    form: &OrderForm,
    errors: &FormErrors,
) -> Result<Response> {
    let customers = state.store.list_customers().await?;
    let products = state.store.list_products().await?;

    let mut context = Context::new();
    context.insert("order", order);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("customers", &customers);
    context.insert("products", &products);
    state.templates.page("order_form.html", context, viewer, headers)
}

pub async fn create_order_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let customer = require_customer(state.store.as_ref(), id).await?;

    render_formset(&state, &viewer, &headers, &customer, &OrderFormset::blank()).await
}

pub async fn create_order_submit(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let store = state.store.as_ref();
    let customer = require_customer(store, id).await?;

    match orders::create_orders(store, customer.id, OrderFormset::from_pairs(&pairs)).await? {
        Submission::Accepted(_) => Ok(Redirect::to("/").into_response()),
        Submission::Rejected(formset) => {
            render_formset(&state, &viewer, &headers, &customer, &formset).await
        }
    }
}

pub async fn update_order_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let order = require_order(state.store.as_ref(), id).await?;

    let form = OrderForm::from_order(&order);
    render_order_form(&state, &viewer, &headers, &order, &form, &FormErrors::default()).await
}

pub async fn update_order_submit(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
    Form(form): Form<OrderForm>,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let store = state.store.as_ref();
    let order = require_order(store, id).await?;

    match orders::update_order(store, order.id, &form).await? {
        Submission::Accepted(_) => Ok(Redirect::to("/").into_response()),
        Submission::Rejected(errors) => {
            render_order_form(&state, &viewer, &headers, &order, &form, &errors).await
        }
    }
}

pub async fn delete_order_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let order = require_order(state.store.as_ref(), id).await?;

    let mut context = Context::new();
    context.insert("order", &order);
    state.templates.page("delete.html", context, &viewer, &headers)
}

pub async fn delete_order_submit(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    uri: Uri,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let store = state.store.as_ref();
    let order = require_order(store, id).await?;

    store.delete_order(order.id).await?;
    Ok(Redirect::to("/").into_response())
}
