use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/foods",
            get(handlers::list_foods)
                .post(handlers::create_food)
                .delete(handlers::delete_food)
                .fallback(handlers::foods_method_not_allowed),
        )
        .route("/api/foods/lookup", post(handlers::lookup_food))
        .route("/api/foods/suggest", get(handlers::suggest_foods))
        .route(
            "/api/water",
            get(handlers::get_water)
                .post(handlers::set_water)
                .fallback(handlers::water_method_not_allowed),
        )
        .route("/api/water/tap", post(handlers::tap_water))
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route(
            "/api/activities",
            get(handlers::list_activities)
                .post(handlers::create_activity)
                .delete(handlers::delete_activity),
        )
        .route("/api/activities/catalogue", get(handlers::activity_catalogue))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/reset", post(handlers::reset_day))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
