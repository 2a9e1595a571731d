//! Tower middleware that resolves the session cookie into a [`Viewer`].
//!
//! Every request leaves this layer with a `Viewer` in its extensions:
//! `Viewer::Authenticated` when the cookie names a live session, otherwise
//! `Viewer::Anonymous`. Storage failures are logged and treated as anonymous so
//! that public pages keep working.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::IntoResponse;
use tower::{Layer, Service};

use crate::app::cookies::{read_cookie, SESSION_COOKIE};
use crate::domain::model::Viewer;
use crate::domain::ports::Store;

#[derive(Clone)]
pub struct SessionLayer {
    store: Arc<dyn Store>,
}

impl SessionLayer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            store: self.store.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    store: Arc<dyn Store>,
}

impl<S> Service<Request<Body>> for SessionService<S>
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let store = self.store.clone();

        Box::pin(async move {
            let token = read_cookie(req.headers(), SESSION_COOKIE).map(str::to_string);
            let viewer = match token {
                Some(token) => resolve(store.as_ref(), &token).await,
                None => Viewer::Anonymous,
            };

            req.extensions_mut().insert(viewer);
            let resp = inner
                .call(req)
                .await
                .unwrap_or_else(|infallible| match infallible {});
            Ok(resp.into_response())
        })
    }
}

async fn resolve(store: &dyn Store, token: &str) -> Viewer {
    match store.resolve_session(token).await {
        Ok(Some(user)) => Viewer::Authenticated(user),
        Ok(None) => {
            tracing::debug!("Session cookie does not match a live session");
            Viewer::Anonymous
        }
        Err(e) => {
            tracing::warn!("Session lookup failed: {}", e);
            Viewer::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteStore;
    use crate::domain::model::NewUser;
    use crate::domain::ports::{SessionRepository, UserRepository};
    use axum::http::{header, StatusCode};
    use chrono::{Duration, Utc};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Inner service that records the viewer it was handed.
    #[derive(Clone)]
    struct CaptureViewer {
        seen: Arc<Mutex<Option<Viewer>>>,
    }

    impl Service<Request<Body>> for CaptureViewer {
        type Response = axum::response::Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let seen = self.seen.clone();
            Box::pin(async move {
                *seen.lock().unwrap() = req.extensions().get::<Viewer>().cloned();
                Ok((StatusCode::OK, "ok").into_response())
            })
        }
    }

    async fn run(store: Arc<dyn Store>, cookie: Option<&str>) -> Viewer {
        let seen = Arc::new(Mutex::new(None));
        let service = SessionLayer::new(store).layer(CaptureViewer { seen: seen.clone() });

        let mut builder = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let resp = service.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let viewer = seen.lock().unwrap().clone();
        viewer.expect("viewer should always be inserted")
    }

    #[tokio::test]
    async fn test_no_cookie_is_anonymous() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.unwrap());
        assert!(run(store, None).await.user().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.unwrap());
        assert!(run(store, Some("sessionid=nope")).await.user().is_none());
    }

    #[tokio::test]
    async fn test_live_session_injects_user_with_groups() {
        let sqlite = SqliteStore::in_memory().await.unwrap();
        let user = sqlite
            .create_user(NewUser {
                username: "staff".to_string(),
                email: None,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        sqlite.add_user_to_group(user.id, "admin").await.unwrap();
        let token = sqlite
            .create_session(user.id, Utc::now() + Duration::minutes(5))
            .await
            .unwrap();

        let store: Arc<dyn Store> = Arc::new(sqlite);
        let viewer = run(store, Some(&format!("sessionid={}", token))).await;
        let user = viewer.user().expect("authenticated");
        assert_eq!(user.username, "staff");
        assert!(user.is_admin());
    }
}
