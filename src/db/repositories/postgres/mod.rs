//! Postgres repository implementation using Diesel.
//!
//! This module implements `FarmRepository` against a Postgres database holding
//! the six farm-monitoring tables.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ErrorContext, FarmRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    CostByCategory, Crop, CropYieldForecast, CropYieldTotal, InputCost, InputUsage, NewCrop,
    NewInputCost, NewInputUsage, NewSoilReading, NewWeatherRecord, NewYieldRecord, SoilAverages,
    SoilReading, WeatherRecord, YieldRecord,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .or_else(|_| Self::compose_url_from_env())
            .map_err(|_| {
                "DATABASE_URL, PG_DATABASE_URL or the discrete PG_* variables must be set"
                    .to_string()
            })?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Compose a connection URL from the discrete `PG_HOST`, `PG_PORT`,
    /// `PG_DATABASE`, `PG_USER` and `PG_PASSWORD` variables.
    fn compose_url_from_env() -> Result<String, std::env::VarError> {
        let host = std::env::var("PG_HOST")?;
        let database = std::env::var("PG_DATABASE")?;
        let user = std::env::var("PG_USER")?;
        let password = std::env::var("PG_PASSWORD").unwrap_or_default();
        let port = std::env::var("PG_PORT").unwrap_or_else(|_| "5432".to_string());

        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            user, password, host, port, database
        ))
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                // Execute the operation
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn crop_from_row(row: CropRow) -> Crop {
    Crop {
        crop_id: row.crop_id,
        crop_name: row.crop_name,
        planting_season: row.planting_season,
        expected_yield_per_acre: row.expected_yield_per_acre,
    }
}

fn weather_from_row(row: WeatherRow) -> WeatherRecord {
    WeatherRecord {
        weather_id: row.weather_id,
        record_date: row.record_date,
        location: row.location,
        temperature_max_celsius: row.temperature_max_celsius,
        temperature_min_celsius: row.temperature_min_celsius,
        precipitation_mm: row.precipitation_mm,
        humidity_percentage: row.humidity_percentage,
        wind_speed_kph: row.wind_speed_kph,
        weather_description: row.weather_description,
    }
}

fn yield_from_row(row: YieldRow, crop_name: Option<String>) -> YieldRecord {
    YieldRecord {
        yield_id: row.yield_id,
        crop_id: row.crop_id,
        crop_name,
        harvest_date: row.harvest_date,
        actual_yield: row.actual_yield,
        unit: row.unit,
        field_location: row.field_location,
        notes: row.notes,
    }
}

fn soil_reading_from_row(row: SoilReadingRow, crop_name: Option<String>) -> SoilReading {
    SoilReading {
        reading_id: row.reading_id,
        crop_id: row.crop_id,
        crop_name,
        reading_date: row.reading_date,
        soil_moisture_percentage: row.soil_moisture_percentage,
        ph_level: row.ph_level,
        nitrogen_level_ppm: row.nitrogen_level_ppm,
        phosphorus_level_ppm: row.phosphorus_level_ppm,
        potassium_level_ppm: row.potassium_level_ppm,
        notes: row.notes,
    }
}

fn input_usage_from_row(row: InputUsageRow, crop_name: Option<String>) -> InputUsage {
    InputUsage {
        input_id: row.input_id,
        crop_id: row.crop_id,
        crop_name,
        usage_date: row.usage_date,
        input_type: row.input_type,
        input_name: row.input_name,
        quantity_used: row.quantity_used,
        unit: row.unit,
        field_location: row.field_location,
        notes: row.notes,
    }
}

fn input_cost_from_row(row: InputCostRow, input_type: Option<String>) -> InputCost {
    InputCost {
        cost_id: row.cost_id,
        input_id: row.input_id,
        input_type,
        cost_date: row.cost_date,
        item_name: row.item_name,
        cost_amount: row.cost_amount,
        currency: row.currency,
        notes: row.notes,
    }
}

fn new_crop_row(crop: &NewCrop) -> NewCropRow {
    NewCropRow {
        crop_name: crop.crop_name.clone(),
        planting_season: crop.planting_season.clone(),
        expected_yield_per_acre: crop.expected_yield_per_acre,
    }
}

fn new_yield_row(record: &NewYieldRecord) -> NewYieldRow {
    NewYieldRow {
        crop_id: record.crop_id,
        harvest_date: record.harvest_date,
        actual_yield: record.actual_yield,
        unit: record.unit.clone(),
        field_location: record.field_location.clone(),
        notes: record.notes.clone(),
    }
}

fn new_soil_reading_row(reading: &NewSoilReading) -> NewSoilReadingRow {
    NewSoilReadingRow {
        crop_id: reading.crop_id,
        reading_date: reading.reading_date,
        soil_moisture_percentage: reading.soil_moisture_percentage,
        ph_level: reading.ph_level,
        nitrogen_level_ppm: reading.nitrogen_level_ppm,
        phosphorus_level_ppm: reading.phosphorus_level_ppm,
        potassium_level_ppm: reading.potassium_level_ppm,
        notes: reading.notes.clone(),
    }
}

fn new_input_usage_row(usage: &NewInputUsage) -> NewInputUsageRow {
    NewInputUsageRow {
        crop_id: usage.crop_id,
        usage_date: usage.usage_date,
        input_type: usage.input_type.clone(),
        input_name: usage.input_name.clone(),
        quantity_used: usage.quantity_used,
        unit: usage.unit.clone(),
        field_location: usage.field_location.clone(),
        notes: usage.notes.clone(),
    }
}

fn new_input_cost_row(cost: &NewInputCost) -> NewInputCostRow {
    NewInputCostRow {
        input_id: cost.input_id,
        cost_date: cost.cost_date,
        item_name: cost.item_name.clone(),
        cost_amount: cost.cost_amount,
        currency: cost.currency.clone(),
        notes: cost.notes.clone(),
    }
}

fn lookup_crop_name(conn: &mut PgConnection, id: Option<i32>) -> RepositoryResult<Option<String>> {
    let Some(id) = id else {
        return Ok(None);
    };
    crops::table
        .filter(crops::crop_id.eq(id))
        .select(crops::crop_name)
        .first::<String>(conn)
        .optional()
        .map_err(map_diesel_error)
}

fn lookup_input_type(conn: &mut PgConnection, id: Option<i32>) -> RepositoryResult<Option<String>> {
    let Some(id) = id else {
        return Ok(None);
    };
    input_usage::table
        .filter(input_usage::input_id.eq(id))
        .select(input_usage::input_type)
        .first::<String>(conn)
        .optional()
        .map_err(map_diesel_error)
}

#[async_trait]
impl FarmRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    // ---- crops ----

    async fn list_crops(&self) -> RepositoryResult<Vec<Crop>> {
        self.with_conn(|conn| {
            let rows = crops::table
                .select(CropRow::as_select())
                .order(crops::crop_name.asc())
                .load::<CropRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(crop_from_row).collect())
        })
        .await
    }

    async fn get_crop(&self, crop_id: i32) -> RepositoryResult<Crop> {
        self.with_conn(move |conn| {
            let row = crops::table
                .filter(crops::crop_id.eq(crop_id))
                .select(CropRow::as_select())
                .first::<CropRow>(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("get_crop"))?;
            Ok(crop_from_row(row))
        })
        .await
    }

    async fn create_crop(&self, crop: &NewCrop) -> RepositoryResult<Crop> {
        let new_row = new_crop_row(crop);
        self.with_conn(move |conn| {
            // The unique index on crop_name surfaces duplicates as Conflict.
            let row: CropRow = diesel::insert_into(crops::table)
                .values(&new_row)
                .returning(CropRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("create_crop"))?;
            Ok(crop_from_row(row))
        })
        .await
    }

    async fn update_crop(&self, crop_id: i32, crop: &NewCrop) -> RepositoryResult<Crop> {
        let changes = new_crop_row(crop);
        self.with_conn(move |conn| {
            let row: CropRow = diesel::update(crops::table.filter(crops::crop_id.eq(crop_id)))
                .set(&changes)
                .returning(CropRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("update_crop"))?;
            Ok(crop_from_row(row))
        })
        .await
    }

    async fn delete_crop(&self, crop_id: i32) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(crops::table.filter(crops::crop_id.eq(crop_id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Crop {} not found",
                    crop_id
                )));
            }
            Ok(())
        })
        .await
    }

    // ---- yields ----

    async fn list_yields(&self) -> RepositoryResult<Vec<YieldRecord>> {
        self.with_conn(|conn| {
            let rows = yields::table
                .inner_join(crops::table)
                .select((YieldRow::as_select(), crops::crop_name))
                .order(yields::harvest_date.desc())
                .load::<(YieldRow, String)>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(row, name)| yield_from_row(row, Some(name)))
                .collect())
        })
        .await
    }

    async fn get_yield(&self, yield_id: i32) -> RepositoryResult<YieldRecord> {
        self.with_conn(move |conn| {
            let (row, name) = yields::table
                .inner_join(crops::table)
                .filter(yields::yield_id.eq(yield_id))
                .select((YieldRow::as_select(), crops::crop_name))
                .first::<(YieldRow, String)>(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("get_yield"))?;
            Ok(yield_from_row(row, Some(name)))
        })
        .await
    }

    async fn create_yield(&self, record: &NewYieldRecord) -> RepositoryResult<YieldRecord> {
        let new_row = new_yield_row(record);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: YieldRow = diesel::insert_into(yields::table)
                    .values(&new_row)
                    .returning(YieldRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)
                    .map_err(|e| e.with_operation("create_yield"))?;
                let crop_name = lookup_crop_name(conn, Some(row.crop_id))?;
                Ok(yield_from_row(row, crop_name))
            })
        })
        .await
    }

    async fn update_yield(
        &self,
        yield_id: i32,
        record: &NewYieldRecord,
    ) -> RepositoryResult<YieldRecord> {
        let changes = new_yield_row(record);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: YieldRow =
                    diesel::update(yields::table.filter(yields::yield_id.eq(yield_id)))
                        .set(&changes)
                        .returning(YieldRow::as_returning())
                        .get_result(conn)
                        .map_err(map_diesel_error)
                        .map_err(|e| e.with_operation("update_yield"))?;
                let crop_name = lookup_crop_name(conn, Some(row.crop_id))?;
                Ok(yield_from_row(row, crop_name))
            })
        })
        .await
    }

    async fn delete_yield(&self, yield_id: i32) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(yields::table.filter(yields::yield_id.eq(yield_id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Yield record {} not found",
                    yield_id
                )));
            }
            Ok(())
        })
        .await
    }

    // ---- soil readings ----

    async fn list_soil_readings(&self) -> RepositoryResult<Vec<SoilReading>> {
        self.with_conn(|conn| {
            let rows = soil_readings::table
                .left_join(crops::table)
                .select((SoilReadingRow::as_select(), crops::crop_name.nullable()))
                .order(soil_readings::reading_date.desc())
                .load::<(SoilReadingRow, Option<String>)>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(row, name)| soil_reading_from_row(row, name))
                .collect())
        })
        .await
    }

    async fn get_soil_reading(&self, reading_id: i32) -> RepositoryResult<SoilReading> {
        self.with_conn(move |conn| {
            let (row, name) = soil_readings::table
                .left_join(crops::table)
                .filter(soil_readings::reading_id.eq(reading_id))
                .select((SoilReadingRow::as_select(), crops::crop_name.nullable()))
                .first::<(SoilReadingRow, Option<String>)>(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("get_soil_reading"))?;
            Ok(soil_reading_from_row(row, name))
        })
        .await
    }

    async fn create_soil_reading(&self, reading: &NewSoilReading) -> RepositoryResult<SoilReading> {
        let new_row = new_soil_reading_row(reading);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: SoilReadingRow = diesel::insert_into(soil_readings::table)
                    .values(&new_row)
                    .returning(SoilReadingRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)
                    .map_err(|e| e.with_operation("create_soil_reading"))?;
                let crop_name = lookup_crop_name(conn, row.crop_id)?;
                Ok(soil_reading_from_row(row, crop_name))
            })
        })
        .await
    }

    async fn update_soil_reading(
        &self,
        reading_id: i32,
        reading: &NewSoilReading,
    ) -> RepositoryResult<SoilReading> {
        let changes = new_soil_reading_row(reading);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: SoilReadingRow = diesel::update(
                    soil_readings::table.filter(soil_readings::reading_id.eq(reading_id)),
                )
                .set(&changes)
                .returning(SoilReadingRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("update_soil_reading"))?;
                let crop_name = lookup_crop_name(conn, row.crop_id)?;
                Ok(soil_reading_from_row(row, crop_name))
            })
        })
        .await
    }

    async fn delete_soil_reading(&self, reading_id: i32) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                soil_readings::table.filter(soil_readings::reading_id.eq(reading_id)),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Soil reading {} not found",
                    reading_id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn latest_soil_reading(&self) -> RepositoryResult<Option<SoilReading>> {
        self.with_conn(|conn| {
            let row = soil_readings::table
                .left_join(crops::table)
                .select((SoilReadingRow::as_select(), crops::crop_name.nullable()))
                .order((
                    soil_readings::reading_date.desc(),
                    soil_readings::reading_id.desc(),
                ))
                .first::<(SoilReadingRow, Option<String>)>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(|(row, name)| soil_reading_from_row(row, name)))
        })
        .await
    }

    // ---- input usage ----

    async fn list_input_usage(&self) -> RepositoryResult<Vec<InputUsage>> {
        self.with_conn(|conn| {
            let rows = input_usage::table
                .left_join(crops::table)
                .select((InputUsageRow::as_select(), crops::crop_name.nullable()))
                .order(input_usage::usage_date.desc())
                .load::<(InputUsageRow, Option<String>)>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(row, name)| input_usage_from_row(row, name))
                .collect())
        })
        .await
    }

    async fn get_input_usage(&self, input_id: i32) -> RepositoryResult<InputUsage> {
        self.with_conn(move |conn| {
            let (row, name) = input_usage::table
                .left_join(crops::table)
                .filter(input_usage::input_id.eq(input_id))
                .select((InputUsageRow::as_select(), crops::crop_name.nullable()))
                .first::<(InputUsageRow, Option<String>)>(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("get_input_usage"))?;
            Ok(input_usage_from_row(row, name))
        })
        .await
    }

    async fn create_input_usage(&self, usage: &NewInputUsage) -> RepositoryResult<InputUsage> {
        let new_row = new_input_usage_row(usage);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: InputUsageRow = diesel::insert_into(input_usage::table)
                    .values(&new_row)
                    .returning(InputUsageRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)
                    .map_err(|e| e.with_operation("create_input_usage"))?;
                let crop_name = lookup_crop_name(conn, row.crop_id)?;
                Ok(input_usage_from_row(row, crop_name))
            })
        })
        .await
    }

    async fn update_input_usage(
        &self,
        input_id: i32,
        usage: &NewInputUsage,
    ) -> RepositoryResult<InputUsage> {
        let changes = new_input_usage_row(usage);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: InputUsageRow =
                    diesel::update(input_usage::table.filter(input_usage::input_id.eq(input_id)))
                        .set(&changes)
                        .returning(InputUsageRow::as_returning())
                        .get_result(conn)
                        .map_err(map_diesel_error)
                        .map_err(|e| e.with_operation("update_input_usage"))?;
                let crop_name = lookup_crop_name(conn, row.crop_id)?;
                Ok(input_usage_from_row(row, crop_name))
            })
        })
        .await
    }

    async fn delete_input_usage(&self, input_id: i32) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(input_usage::table.filter(input_usage::input_id.eq(input_id)))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Input usage record {} not found",
                    input_id
                )));
            }
            Ok(())
        })
        .await
    }

    // ---- input costs ----

    async fn list_input_costs(&self) -> RepositoryResult<Vec<InputCost>> {
        self.with_conn(|conn| {
            let rows = input_costs::table
                .left_join(input_usage::table)
                .select((InputCostRow::as_select(), input_usage::input_type.nullable()))
                .order(input_costs::cost_date.desc())
                .load::<(InputCostRow, Option<String>)>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(row, input_type)| input_cost_from_row(row, input_type))
                .collect())
        })
        .await
    }

    async fn get_input_cost(&self, cost_id: i32) -> RepositoryResult<InputCost> {
        self.with_conn(move |conn| {
            let (row, input_type) = input_costs::table
                .left_join(input_usage::table)
                .filter(input_costs::cost_id.eq(cost_id))
                .select((InputCostRow::as_select(), input_usage::input_type.nullable()))
                .first::<(InputCostRow, Option<String>)>(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("get_input_cost"))?;
            Ok(input_cost_from_row(row, input_type))
        })
        .await
    }

    async fn create_input_cost(&self, cost: &NewInputCost) -> RepositoryResult<InputCost> {
        let new_row = new_input_cost_row(cost);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: InputCostRow = diesel::insert_into(input_costs::table)
                    .values(&new_row)
                    .returning(InputCostRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)
                    .map_err(|e| e.with_operation("create_input_cost"))?;
                let input_type = lookup_input_type(conn, row.input_id)?;
                Ok(input_cost_from_row(row, input_type))
            })
        })
        .await
    }

    async fn update_input_cost(
        &self,
        cost_id: i32,
        cost: &NewInputCost,
    ) -> RepositoryResult<InputCost> {
        let changes = new_input_cost_row(cost);
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let row: InputCostRow =
                    diesel::update(input_costs::table.filter(input_costs::cost_id.eq(cost_id)))
                        .set(&changes)
                        .returning(InputCostRow::as_returning())
                        .get_result(conn)
                        .map_err(map_diesel_error)
                        .map_err(|e| e.with_operation("update_input_cost"))?;
                let input_type = lookup_input_type(conn, row.input_id)?;
                Ok(input_cost_from_row(row, input_type))
            })
        })
        .await
    }

    async fn delete_input_cost(&self, cost_id: i32) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(input_costs::table.filter(input_costs::cost_id.eq(cost_id)))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Input cost {} not found",
                    cost_id
                )));
            }
            Ok(())
        })
        .await
    }

    // ---- weather ----

    async fn upsert_weather(&self, record: &NewWeatherRecord) -> RepositoryResult<WeatherRecord> {
        let new_row = NewWeatherRow {
            record_date: record.record_date,
            location: record.location.clone(),
            temperature_max_celsius: record.temperature_max_celsius,
            temperature_min_celsius: record.temperature_min_celsius,
            precipitation_mm: record.precipitation_mm,
            humidity_percentage: record.humidity_percentage,
            wind_speed_kph: record.wind_speed_kph,
            weather_description: record.weather_description.clone(),
        };
        self.with_conn(move |conn| {
            let row: WeatherRow = diesel::insert_into(weather_data::table)
                .values(&new_row)
                .on_conflict(weather_data::record_date)
                .do_update()
                .set((
                    weather_data::location.eq(excluded(weather_data::location)),
                    weather_data::temperature_max_celsius
                        .eq(excluded(weather_data::temperature_max_celsius)),
                    weather_data::temperature_min_celsius
                        .eq(excluded(weather_data::temperature_min_celsius)),
                    weather_data::precipitation_mm.eq(excluded(weather_data::precipitation_mm)),
                    weather_data::humidity_percentage
                        .eq(excluded(weather_data::humidity_percentage)),
                    weather_data::wind_speed_kph.eq(excluded(weather_data::wind_speed_kph)),
                    weather_data::weather_description
                        .eq(excluded(weather_data::weather_description)),
                ))
                .returning(WeatherRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)
                .map_err(|e| e.with_operation("upsert_weather"))?;
            Ok(weather_from_row(row))
        })
        .await
    }

    async fn latest_weather(&self) -> RepositoryResult<Option<WeatherRecord>> {
        self.with_conn(|conn| {
            let row = weather_data::table
                .select(WeatherRow::as_select())
                .order((
                    weather_data::record_date.desc(),
                    weather_data::weather_id.desc(),
                ))
                .first::<WeatherRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(weather_from_row))
        })
        .await
    }

    async fn list_weather(&self) -> RepositoryResult<Vec<WeatherRecord>> {
        self.with_conn(|conn| {
            let rows = weather_data::table
                .select(WeatherRow::as_select())
                .order(weather_data::weather_id.asc())
                .load::<WeatherRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(weather_from_row).collect())
        })
        .await
    }

    // ---- reports ----

    async fn total_yield_by_crop(&self) -> RepositoryResult<Vec<CropYieldTotal>> {
        self.with_conn(|conn| {
            let rows: Vec<CropYieldTotalRow> = sql_query(
                "SELECT c.crop_name, SUM(y.actual_yield) AS total_yield, y.unit \
                 FROM yields y \
                 JOIN crops c ON y.crop_id = c.crop_id \
                 GROUP BY c.crop_name, y.unit \
                 ORDER BY total_yield DESC",
            )
            .load(conn)
            .map_err(map_diesel_error)?;

            Ok(rows
                .into_iter()
                .map(|r| CropYieldTotal {
                    crop_name: r.crop_name,
                    total_yield: r.total_yield,
                    unit: r.unit,
                })
                .collect())
        })
        .await
    }

    async fn average_soil_parameters(&self) -> RepositoryResult<SoilAverages> {
        self.with_conn(|conn| {
            let rows: Vec<SoilAveragesRow> = sql_query(
                "SELECT AVG(soil_moisture_percentage) AS avg_moisture, \
                        AVG(ph_level) AS avg_ph, \
                        AVG(nitrogen_level_ppm) AS avg_nitrogen, \
                        AVG(phosphorus_level_ppm) AS avg_phosphorus, \
                        AVG(potassium_level_ppm) AS avg_potassium \
                 FROM soil_readings",
            )
            .load(conn)
            .map_err(map_diesel_error)?;

            // AVG over an empty table yields a single all-null row.
            Ok(rows
                .into_iter()
                .next()
                .map(|r| SoilAverages {
                    avg_moisture: r.avg_moisture,
                    avg_ph: r.avg_ph,
                    avg_nitrogen: r.avg_nitrogen,
                    avg_phosphorus: r.avg_phosphorus,
                    avg_potassium: r.avg_potassium,
                })
                .unwrap_or_default())
        })
        .await
    }

    async fn total_cost_by_category(&self) -> RepositoryResult<Vec<CostByCategory>> {
        self.with_conn(|conn| {
            let rows: Vec<CostByCategoryRow> = sql_query(
                "SELECT COALESCE(u.input_type, ic.item_name) AS category, \
                        SUM(ic.cost_amount) AS total_cost, \
                        ic.currency \
                 FROM input_costs ic \
                 LEFT JOIN input_usage u ON ic.input_id = u.input_id \
                 GROUP BY COALESCE(u.input_type, ic.item_name), ic.currency \
                 ORDER BY total_cost DESC",
            )
            .load(conn)
            .map_err(map_diesel_error)?;

            Ok(rows
                .into_iter()
                .map(|r| CostByCategory {
                    category: r.category,
                    total_cost: r.total_cost,
                    currency: r.currency,
                })
                .collect())
        })
        .await
    }

    async fn yield_forecast(&self) -> RepositoryResult<Vec<CropYieldForecast>> {
        self.with_conn(|conn| {
            // LEFT JOIN keeps crops with no harvest history as all-null rows.
            let rows: Vec<YieldForecastRow> = sql_query(
                "SELECT c.crop_id, c.crop_name, \
                        AVG(y.actual_yield) AS average_yield, y.unit \
                 FROM crops c \
                 LEFT JOIN yields y ON y.crop_id = c.crop_id \
                 GROUP BY c.crop_id, c.crop_name, y.unit \
                 ORDER BY c.crop_name ASC, y.unit ASC NULLS LAST",
            )
            .load(conn)
            .map_err(map_diesel_error)?;

            Ok(rows
                .into_iter()
                .map(|r| CropYieldForecast {
                    crop_id: r.crop_id,
                    crop_name: r.crop_name,
                    average_yield: r.average_yield,
                    unit: r.unit,
                })
                .collect())
        })
        .await
    }
}
