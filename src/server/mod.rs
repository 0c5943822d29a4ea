//! HTTP surface: page routes, the JSON CRUD API, and the session gate.

pub mod api;
pub mod auth;
pub mod pages;
mod templates;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::error::Result;
use crate::store::EntryStore;
use auth::AuthState;

pub use auth::AuthenticatedIdentity;

/// Everything handlers need, injected rather than captured from enclosing
/// scope: the store behind its trait, and the account/session tables.
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
    pub auth: AuthState,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>, session_secret: impl Into<String>) -> SharedState {
        Arc::new(Self {
            store,
            auth: AuthState::new(session_secret.into()),
        })
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/form", get(pages::form))
        .route("/submit", post(pages::submit))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(pages::dashboard))
        .nest("/api", api::router())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: SharedState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let app = router(state);

    info!("Starting intake server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
