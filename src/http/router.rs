//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Crops
        .route(
            "/crops",
            get(handlers::list_crops).post(handlers::create_crop),
        )
        .route(
            "/crops/{crop_id}",
            get(handlers::get_crop)
                .put(handlers::update_crop)
                .delete(handlers::delete_crop),
        )
        // Yields
        .route(
            "/yields",
            get(handlers::list_yields).post(handlers::create_yield),
        )
        .route(
            "/yields/{yield_id}",
            get(handlers::get_yield)
                .put(handlers::update_yield)
                .delete(handlers::delete_yield),
        )
        // Soil readings
        .route(
            "/soil_readings",
            get(handlers::list_soil_readings).post(handlers::create_soil_reading),
        )
        .route(
            "/soil_readings/{reading_id}",
            get(handlers::get_soil_reading)
                .put(handlers::update_soil_reading)
                .delete(handlers::delete_soil_reading),
        )
        // Input usage
        .route(
            "/inputs",
            get(handlers::list_input_usage).post(handlers::create_input_usage),
        )
        .route(
            "/inputs/{input_id}",
            get(handlers::get_input_usage)
                .put(handlers::update_input_usage)
                .delete(handlers::delete_input_usage),
        )
        // Input costs
        .route(
            "/input_costs",
            get(handlers::list_input_costs).post(handlers::create_input_cost),
        )
        .route(
            "/input_costs/{cost_id}",
            get(handlers::get_input_cost)
                .put(handlers::update_input_cost)
                .delete(handlers::delete_input_cost),
        )
        // Weather
        .route(
            "/weather/fetch_and_store",
            post(handlers::fetch_and_store_weather),
        )
        .route("/weather/latest", get(handlers::latest_weather))
        // Reports
        .route(
            "/reports/total_yield_by_crop",
            get(handlers::total_yield_by_crop),
        )
        .route(
            "/reports/average_soil_parameters",
            get(handlers::average_soil_parameters),
        )
        .route(
            "/reports/total_input_cost_by_type",
            get(handlers::total_input_cost_by_type),
        )
        .route("/reports/yield_forecast", get(handlers::yield_forecast))
        .route(
            "/reports/export_all_data/csv",
            get(handlers::export_all_data_csv),
        )
        // Advice
        .route("/advice/farm_health", get(handlers::farm_health_advice))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FarmRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FarmRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}
