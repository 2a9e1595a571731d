use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use axum::Extension;
use tera::Context;

use crate::app::routes::path_of;
use crate::app::state::AppState;
use crate::core::access;
use crate::core::dashboard::{DashboardSummary, StatusCounts, RECENT_ORDERS};
use crate::core::filters::OrderFilterParams;
use crate::core::orders::require_customer;
use crate::domain::model::{Viewer, ADMIN_GROUP, CUSTOMER_GROUP};
use crate::utils::error::{AppError, Result};

pub async fn home(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let store = state.store.as_ref();

    let orders = store.list_orders().await?;
    let customers = store.list_customers().await?;
    let summary = DashboardSummary::compute(&orders, customers.len());

    let mut context = Context::new();
    context.insert("recent_orders", &orders[..orders.len().min(RECENT_ORDERS)]);
    context.insert("customers", &customers);
    context.insert("summary", &summary);
    state.templates.page("dashboard.html", context, &viewer, &headers)
}

pub async fn user_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
) -> Result<Response> {
    access::allowed_groups(&viewer, &[ADMIN_GROUP, CUSTOMER_GROUP])?;
    let user = viewer.user().ok_or(AppError::AccessDenied)?;
    let store = state.store.as_ref();

    let customer = store.customer_for_user(user.id).await?;
    let orders = match &customer {
        Some(customer) => store.orders_for_customer(customer.id).await?,
        None => Vec::new(),
    };

    let mut context = Context::new();
    context.insert("customer", &customer);
    context.insert("counts", &StatusCounts::tally(&orders));
    context.insert("orders", &orders);
    state.templates.page("user.html", context, &viewer, &headers)
}

pub async fn products(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;

    let products = state.store.list_products().await?;

    let mut context = Context::new();
    context.insert("products", &products);
    state.templates.page("products.html", context, &viewer, &headers)
}

pub async fn customer_detail(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    Query(params): Query<OrderFilterParams>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    access::admin_only(&viewer, path_of(&uri))?;
    let store = state.store.as_ref();

    let customer = require_customer(store, id).await?;
    let orders = store.orders_for_customer(customer.id).await?;
    let order_count = orders.len();

    let (filter, filter_errors) = params.build();
    let orders = filter.apply(orders);
    let products = store.list_products().await?;

    let mut context = Context::new();
    context.insert("customer", &customer);
    context.insert("orders", &orders);
    context.insert("order_count", &order_count);
    context.insert("filter", &params);
    context.insert("filter_errors", &filter_errors);
    context.insert("products", &products);
    state.templates.page("customer.html", context, &viewer, &headers)
}
