use axum::Router;

use crate::state::AppState;

pub mod fallback;
pub mod search;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new().nest("/search", search::routes(state))
}

/// The complete application with its state applied.
pub fn app(state: AppState) -> Router {
    routes(&state).with_state(state)
}
