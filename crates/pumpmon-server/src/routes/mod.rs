pub mod alerts;
pub mod chat;
pub mod dashboard;
pub mod health;
pub mod pumps;

use crate::state::AppState;
use axum::Router;

pub const API_PREFIX: &str = "/api/v1";

pub fn configure(state: AppState) -> Router {
    let api = Router::new()
        .merge(chat::routes(state.clone()))
        .merge(pumps::routes(state.clone()))
        .merge(dashboard::routes(state.clone()))
        .merge(alerts::routes(state));

    Router::new()
        .nest(API_PREFIX, api)
        .merge(health::routes())
}
