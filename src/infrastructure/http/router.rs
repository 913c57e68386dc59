use crate::infrastructure::http::controllers::templates;
use crate::infrastructure::http::middleware::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn build_router(state: AppState) -> Router {
    let template_routes = Router::new()
        .route(
            "/api/templates/current",
            get(templates::get_current_template).put(templates::save_template),
        )
        .route(
            "/api/templates/current/reset",
            post(templates::reset_template),
        )
        .route("/api/templates/versions", get(templates::list_versions))
        .route("/api/templates/versions/:id", get(templates::get_version))
        .route(
            "/api/templates/versions/:id/diff",
            get(templates::diff_version),
        )
        .route(
            "/api/templates/versions/:id/revert",
            post(templates::revert_to_version),
        )
        .route("/api/templates/render", post(templates::render_template))
        .route("/api/templates/diff", post(templates::diff_templates));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(template_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "Traidenis document template service"
}

async fn health_handler() -> &'static str {
    "OK"
}
