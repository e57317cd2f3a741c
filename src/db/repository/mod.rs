//! Repository trait for the farm-monitoring schema.
//!
//! The trait is the abstract interface between the HTTP/service layers and
//! storage. Implementations live in [`crate::db::repositories`]: an in-memory
//! `LocalRepository` for tests and development, and a Diesel-backed
//! `PostgresRepository` for production.

use async_trait::async_trait;

use crate::models::{
    CostByCategory, Crop, CropYieldForecast, CropYieldTotal, InputCost, InputUsage, NewCrop,
    NewInputCost, NewInputUsage, NewSoilReading, NewWeatherRecord, NewYieldRecord, SoilAverages,
    SoilReading, WeatherRecord, YieldRecord,
};

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Storage interface covering the six farm tables plus the aggregate reports.
///
/// Update operations are full-row replaces; they return `NotFound` when the id
/// does not exist. Creates return the stored row with its assigned id and any
/// joined display fields resolved.
#[async_trait]
pub trait FarmRepository: Send + Sync {
    /// Verify the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ---- crops ----

    /// All crops, ordered by name ascending.
    async fn list_crops(&self) -> RepositoryResult<Vec<Crop>>;
    async fn get_crop(&self, crop_id: i32) -> RepositoryResult<Crop>;
    /// Insert a crop. Duplicate names yield `RepositoryError::Conflict`.
    async fn create_crop(&self, crop: &NewCrop) -> RepositoryResult<Crop>;
    async fn update_crop(&self, crop_id: i32, crop: &NewCrop) -> RepositoryResult<Crop>;
    async fn delete_crop(&self, crop_id: i32) -> RepositoryResult<()>;

    // ---- yields ----

    /// All yield records with their crop names, ordered by harvest date descending.
    async fn list_yields(&self) -> RepositoryResult<Vec<YieldRecord>>;
    async fn get_yield(&self, yield_id: i32) -> RepositoryResult<YieldRecord>;
    async fn create_yield(&self, record: &NewYieldRecord) -> RepositoryResult<YieldRecord>;
    async fn update_yield(
        &self,
        yield_id: i32,
        record: &NewYieldRecord,
    ) -> RepositoryResult<YieldRecord>;
    async fn delete_yield(&self, yield_id: i32) -> RepositoryResult<()>;

    // ---- soil readings ----

    /// All soil readings with crop names where linked, newest first.
    async fn list_soil_readings(&self) -> RepositoryResult<Vec<SoilReading>>;
    async fn get_soil_reading(&self, reading_id: i32) -> RepositoryResult<SoilReading>;
    async fn create_soil_reading(&self, reading: &NewSoilReading) -> RepositoryResult<SoilReading>;
    async fn update_soil_reading(
        &self,
        reading_id: i32,
        reading: &NewSoilReading,
    ) -> RepositoryResult<SoilReading>;
    async fn delete_soil_reading(&self, reading_id: i32) -> RepositoryResult<()>;
    /// The most recent soil reading by reading date, if any exists.
    async fn latest_soil_reading(&self) -> RepositoryResult<Option<SoilReading>>;

    // ---- input usage ----

    async fn list_input_usage(&self) -> RepositoryResult<Vec<InputUsage>>;
    async fn get_input_usage(&self, input_id: i32) -> RepositoryResult<InputUsage>;
    async fn create_input_usage(&self, usage: &NewInputUsage) -> RepositoryResult<InputUsage>;
    async fn update_input_usage(
        &self,
        input_id: i32,
        usage: &NewInputUsage,
    ) -> RepositoryResult<InputUsage>;
    async fn delete_input_usage(&self, input_id: i32) -> RepositoryResult<()>;

    // ---- input costs ----

    async fn list_input_costs(&self) -> RepositoryResult<Vec<InputCost>>;
    async fn get_input_cost(&self, cost_id: i32) -> RepositoryResult<InputCost>;
    async fn create_input_cost(&self, cost: &NewInputCost) -> RepositoryResult<InputCost>;
    async fn update_input_cost(
        &self,
        cost_id: i32,
        cost: &NewInputCost,
    ) -> RepositoryResult<InputCost>;
    async fn delete_input_cost(&self, cost_id: i32) -> RepositoryResult<()>;

    // ---- weather ----

    /// Insert-or-update keyed by `record_date`; a second ingest on the same
    /// calendar date overwrites the earlier record.
    async fn upsert_weather(&self, record: &NewWeatherRecord) -> RepositoryResult<WeatherRecord>;
    /// Most recent weather record by record date, if any exists.
    async fn latest_weather(&self) -> RepositoryResult<Option<WeatherRecord>>;
    /// Full weather table, ordered by id (export path).
    async fn list_weather(&self) -> RepositoryResult<Vec<WeatherRecord>>;

    // ---- reports ----

    /// Summed yield per (crop name, unit), ordered by total descending.
    /// Units are never converted; each (crop, unit) pair is its own row.
    async fn total_yield_by_crop(&self) -> RepositoryResult<Vec<CropYieldTotal>>;
    /// Averages of the five numeric soil columns; all null for an empty table.
    async fn average_soil_parameters(&self) -> RepositoryResult<SoilAverages>;
    /// Summed cost per (category, currency), ordered by total descending.
    async fn total_cost_by_category(&self) -> RepositoryResult<Vec<CostByCategory>>;
    /// Average yield per (crop, unit) including crops with no yield rows.
    async fn yield_forecast(&self) -> RepositoryResult<Vec<CropYieldForecast>>;
}
