use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::routes::{accounts, dashboard, not_found, orders};
use crate::app::session::SessionLayer;
use crate::app::state::AppState;
use crate::domain::ports::Store;
use crate::utils::error::Result;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/register/",
            get(accounts::register_page).post(accounts::register_submit),
        )
        .route(
            "/login/",
            get(accounts::login_page).post(accounts::login_submit),
        )
        .route("/logout/", get(accounts::logout))
        .route("/", get(dashboard::home))
        .route("/user/", get(dashboard::user_page))
        .route("/products/", get(dashboard::products))
        .route("/customer/{id}/", get(dashboard::customer_detail))
        .route(
            "/create_order/{id}/",
            get(orders::create_order_page).post(orders::create_order_submit),
        )
        .route(
            "/update_order/{id}/",
            get(orders::update_order_page).post(orders::update_order_submit),
        )
        .route(
            "/delete_order/{id}/",
            get(orders::delete_order_page).post(orders::delete_order_submit),
        )
        .fallback(not_found)
        .layer(SessionLayer::new(state.store.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `address` and serves until Ctrl+C or SIGTERM.
pub async fn serve(state: Arc<AppState>, address: &str) -> Result<()> {
    let purge = tokio::spawn(purge_sessions(state.store.clone()));
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    info!("Server shut down");
    Ok(())
}

async fn purge_sessions(store: Arc<dyn Store>) {
    let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        match store.purge_expired_sessions().await {
            Ok(0) => {}
            Ok(removed) => info!("Purged {removed} expired sessions"),
            Err(e) => tracing::warn!("Session purge failed: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
