use axum::{routing::get, Router};

pub mod catalog;
pub mod common;
pub mod projects;
pub mod requisitions;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/projects", projects::router())
        .nest("/catalog", catalog::router())
        .nest("/requisitions", requisitions::router())
}
