use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, get_url_handler, health_handler, index_page_handler, redirect_handler,
    shorten_form_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(index_page_handler))
            .route("/index.html", get(index_page_handler))
            .route("/shorten/", post(shorten_form_handler))
            .route("/health", get(health_handler))
            .route("/v1/urls", post(create_url_handler))
            .route("/v1/urls/{short_code}", get(get_url_handler))
            .route("/{short_code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
