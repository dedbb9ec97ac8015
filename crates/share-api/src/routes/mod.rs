pub mod instances;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// Routes mounted under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(pages::api_router())
        .merge(instances::router())
}
