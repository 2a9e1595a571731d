// Web layer: routing, session middleware, cookies and page rendering.

pub mod cookies;
pub mod flash;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;
pub mod templates;

pub use server::{router, serve};
pub use state::AppState;
