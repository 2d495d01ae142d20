//! `docqa-server` exposes the document assistant over HTTP.
//! Each session accepts one document at a time and answers questions about it.

pub mod error;
pub mod protocol;
pub mod server;
pub mod sessions;

pub use server::{AppState, ServerConfig, app_router, run_server};
