use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub mod ai;
pub mod automations;
pub mod campaigns;
pub mod events;
pub mod health;
pub mod preferences;
pub mod segments;
pub mod templates;

/// Everything under `/api/marketing` except the rate-limited AI routes,
/// which the caller nests with its own layer.
pub fn marketing_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(campaigns::overview))
        .nest("/campaigns", campaigns::router())
        .nest("/recipients", campaigns::recipients_router())
        .nest("/templates", templates::router())
        .nest("/segments", segments::router())
        .nest("/automations", automations::router())
        .nest("/events", events::router())
        .nest("/preferences", preferences::router())
}
