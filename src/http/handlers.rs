//! HTTP request handlers.
//!
//! Thin layer over the repository and services: parse the request, call the
//! operation, map errors through [`AppError`].

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::models::{
    CostByCategory, Crop, CropYieldForecast, CropYieldTotal, FarmAdvice, InputCost, InputUsage,
    NewCrop, NewInputCost, NewInputUsage, NewSoilReading, NewYieldRecord, SoilAverages,
    SoilReading, WeatherRecord, YieldRecord,
};
use crate::services::{advisor, export, weather};

// ---- health ----

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.repository.health_check().await.unwrap_or(false);
    Json(HealthResponse {
        status: "ok".to_string(),
        database,
    })
}

// ---- crops ----

pub async fn list_crops(State(state): State<AppState>) -> Result<Json<Vec<Crop>>, AppError> {
    Ok(Json(state.repository.list_crops().await?))
}

pub async fn get_crop(
    State(state): State<AppState>,
    Path(crop_id): Path<i32>,
) -> Result<Json<Crop>, AppError> {
    Ok(Json(state.repository.get_crop(crop_id).await?))
}

pub async fn create_crop(
    State(state): State<AppState>,
    Json(payload): Json<NewCrop>,
) -> Result<Json<Crop>, AppError> {
    Ok(Json(state.repository.create_crop(&payload).await?))
}

pub async fn update_crop(
    State(state): State<AppState>,
    Path(crop_id): Path<i32>,
    Json(payload): Json<NewCrop>,
) -> Result<Json<Crop>, AppError> {
    Ok(Json(state.repository.update_crop(crop_id, &payload).await?))
}

pub async fn delete_crop(
    State(state): State<AppState>,
    Path(crop_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_crop(crop_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- yields ----

pub async fn list_yields(
    State(state): State<AppState>,
) -> Result<Json<Vec<YieldRecord>>, AppError> {
    Ok(Json(state.repository.list_yields().await?))
}

pub async fn get_yield(
    State(state): State<AppState>,
    Path(yield_id): Path<i32>,
) -> Result<Json<YieldRecord>, AppError> {
    Ok(Json(state.repository.get_yield(yield_id).await?))
}

pub async fn create_yield(
    State(state): State<AppState>,
    Json(payload): Json<NewYieldRecord>,
) -> Result<Json<YieldRecord>, AppError> {
    Ok(Json(state.repository.create_yield(&payload).await?))
}

pub async fn update_yield(
    State(state): State<AppState>,
    Path(yield_id): Path<i32>,
    Json(payload): Json<NewYieldRecord>,
) -> Result<Json<YieldRecord>, AppError> {
    Ok(Json(
        state.repository.update_yield(yield_id, &payload).await?,
    ))
}

pub async fn delete_yield(
    State(state): State<AppState>,
    Path(yield_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_yield(yield_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- soil readings ----

pub async fn list_soil_readings(
    State(state): State<AppState>,
) -> Result<Json<Vec<SoilReading>>, AppError> {
    Ok(Json(state.repository.list_soil_readings().await?))
}

pub async fn get_soil_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<i32>,
) -> Result<Json<SoilReading>, AppError> {
    Ok(Json(state.repository.get_soil_reading(reading_id).await?))
}

pub async fn create_soil_reading(
    State(state): State<AppState>,
    Json(payload): Json<NewSoilReading>,
) -> Result<Json<SoilReading>, AppError> {
    Ok(Json(state.repository.create_soil_reading(&payload).await?))
}

pub async fn update_soil_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<i32>,
    Json(payload): Json<NewSoilReading>,
) -> Result<Json<SoilReading>, AppError> {
    Ok(Json(
        state
            .repository
            .update_soil_reading(reading_id, &payload)
            .await?,
    ))
}

pub async fn delete_soil_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_soil_reading(reading_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- input usage ----

pub async fn list_input_usage(
    State(state): State<AppState>,
) -> Result<Json<Vec<InputUsage>>, AppError> {
    Ok(Json(state.repository.list_input_usage().await?))
}

pub async fn get_input_usage(
    State(state): State<AppState>,
    Path(input_id): Path<i32>,
) -> Result<Json<InputUsage>, AppError> {
    Ok(Json(state.repository.get_input_usage(input_id).await?))
}

pub async fn create_input_usage(
    State(state): State<AppState>,
    Json(payload): Json<NewInputUsage>,
) -> Result<Json<InputUsage>, AppError> {
    Ok(Json(state.repository.create_input_usage(&payload).await?))
}

pub async fn update_input_usage(
    State(state): State<AppState>,
    Path(input_id): Path<i32>,
    Json(payload): Json<NewInputUsage>,
) -> Result<Json<InputUsage>, AppError> {
    Ok(Json(
        state
            .repository
            .update_input_usage(input_id, &payload)
            .await?,
    ))
}

pub async fn delete_input_usage(
    State(state): State<AppState>,
    Path(input_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_input_usage(input_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- input costs ----

pub async fn list_input_costs(
    State(state): State<AppState>,
) -> Result<Json<Vec<InputCost>>, AppError> {
    Ok(Json(state.repository.list_input_costs().await?))
}

pub async fn get_input_cost(
    State(state): State<AppState>,
    Path(cost_id): Path<i32>,
) -> Result<Json<InputCost>, AppError> {
    Ok(Json(state.repository.get_input_cost(cost_id).await?))
}

pub async fn create_input_cost(
    State(state): State<AppState>,
    Json(payload): Json<NewInputCost>,
) -> Result<Json<InputCost>, AppError> {
    Ok(Json(state.repository.create_input_cost(&payload).await?))
}

pub async fn update_input_cost(
    State(state): State<AppState>,
    Path(cost_id): Path<i32>,
    Json(payload): Json<NewInputCost>,
) -> Result<Json<InputCost>, AppError> {
    Ok(Json(
        state
            .repository
            .update_input_cost(cost_id, &payload)
            .await?,
    ))
}

pub async fn delete_input_cost(
    State(state): State<AppState>,
    Path(cost_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_input_cost(cost_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- weather ----

/// Fetch current conditions upstream and upsert today's weather record.
///
/// Upstream failures map to 502; persistence failures stay 500.
pub async fn fetch_and_store_weather(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<WeatherRecord>), AppError> {
    let config = state.weather.as_ref().ok_or_else(|| {
        AppError::Internal("OPENWEATHER_API_KEY is not configured".to_string())
    })?;

    let today = Local::now().date_naive();
    let record = weather::fetch_weather_record(&state.http_client, config, today).await?;
    let stored = state.repository.upsert_weather(&record).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn latest_weather(
    State(state): State<AppState>,
) -> Result<Json<WeatherRecord>, AppError> {
    let record = state
        .repository
        .latest_weather()
        .await?
        .ok_or_else(|| AppError::NotFound("No weather data found".to_string()))?;
    Ok(Json(record))
}

// ---- reports ----

pub async fn total_yield_by_crop(
    State(state): State<AppState>,
) -> Result<Json<Vec<CropYieldTotal>>, AppError> {
    Ok(Json(state.repository.total_yield_by_crop().await?))
}

pub async fn average_soil_parameters(
    State(state): State<AppState>,
) -> Result<Json<SoilAverages>, AppError> {
    Ok(Json(state.repository.average_soil_parameters().await?))
}

pub async fn total_input_cost_by_type(
    State(state): State<AppState>,
) -> Result<Json<Vec<CostByCategory>>, AppError> {
    Ok(Json(state.repository.total_cost_by_category().await?))
}

pub async fn yield_forecast(
    State(state): State<AppState>,
) -> Result<Json<Vec<CropYieldForecast>>, AppError> {
    Ok(Json(state.repository.yield_forecast().await?))
}

/// Dump every table as CSV, keyed by file name.
pub async fn export_all_data_csv(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let crops = state.repository.list_crops().await?;
    let yields = state.repository.list_yields().await?;
    let soil_readings = state.repository.list_soil_readings().await?;
    let input_usage = state.repository.list_input_usage().await?;
    let input_costs = state.repository.list_input_costs().await?;
    let weather = state.repository.list_weather().await?;

    let bundle = export::export_all(
        &crops,
        &yields,
        &soil_readings,
        &input_usage,
        &input_costs,
        &weather,
    )?;
    Ok(Json(bundle))
}

// ---- advice ----

pub async fn farm_health_advice(
    State(state): State<AppState>,
) -> Result<Json<Vec<FarmAdvice>>, AppError> {
    let latest = state.repository.latest_soil_reading().await?;
    Ok(Json(advisor::farm_health_advice(latest.as_ref())))
}
