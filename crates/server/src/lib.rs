pub mod bootstrap;
pub mod error;
pub mod middleware;
pub mod sentiment;
pub mod slack;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::Router;

pub use state::AppState;

/// Every route the service exposes, gated by its middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(slack::router(state.clone()))
        .merge(sentiment::router(state.clone()))
        .with_state(state)
}
