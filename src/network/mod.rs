//! Network Module
//!
//! HTTP front end over the config service.
//!
//! ## Architecture
//! - axum router on a multi-threaded tokio runtime
//! - Store calls run on the blocking pool (`spawn_blocking`)
//! - Unmatched paths and methods answer with the JSON 404 body

mod handlers;
mod routes;
mod server;

pub use routes::{create_router, AppState};
pub use server::{shutdown_signal, Server};
