//! Domain entities and typed report results.
//!
//! Each entity mirrors one table of the farm-monitoring schema. The `New*`
//! structs carry the client-supplied fields for creates and full-row updates;
//! the full structs add the database-assigned id plus any display fields
//! resolved through joins (e.g. `crop_name` on a yield record).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Crops
// =============================================================================

/// A cultivated crop. Crop names are unique across the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub crop_id: i32,
    pub crop_name: String,
    pub planting_season: Option<String>,
    pub expected_yield_per_acre: Option<f64>,
}

/// Payload for creating or replacing a crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCrop {
    pub crop_name: String,
    #[serde(default)]
    pub planting_season: Option<String>,
    #[serde(default)]
    pub expected_yield_per_acre: Option<f64>,
}

// =============================================================================
// Weather
// =============================================================================

/// A daily weather record, unique per `record_date` (upserted on conflict).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub weather_id: i32,
    pub record_date: NaiveDate,
    pub location: String,
    pub temperature_max_celsius: Option<f64>,
    pub temperature_min_celsius: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub humidity_percentage: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    pub weather_description: Option<String>,
}

/// Weather fields as extracted from the upstream API, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWeatherRecord {
    pub record_date: NaiveDate,
    pub location: String,
    pub temperature_max_celsius: Option<f64>,
    pub temperature_min_celsius: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub humidity_percentage: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    pub weather_description: Option<String>,
}

// =============================================================================
// Yields
// =============================================================================

/// A harvest record. Always belongs to a crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldRecord {
    pub yield_id: i32,
    pub crop_id: i32,
    /// Resolved from the crops table on reads.
    pub crop_name: Option<String>,
    pub harvest_date: NaiveDate,
    pub actual_yield: f64,
    pub unit: String,
    pub field_location: Option<String>,
    pub notes: Option<String>,
}

/// Payload for creating or replacing a yield record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewYieldRecord {
    pub crop_id: i32,
    pub harvest_date: NaiveDate,
    pub actual_yield: f64,
    pub unit: String,
    #[serde(default)]
    pub field_location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Soil readings
// =============================================================================

/// A soil probe reading, optionally associated with a crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub reading_id: i32,
    pub crop_id: Option<i32>,
    pub crop_name: Option<String>,
    pub reading_date: NaiveDate,
    pub soil_moisture_percentage: Option<f64>,
    pub ph_level: Option<f64>,
    pub nitrogen_level_ppm: Option<f64>,
    pub phosphorus_level_ppm: Option<f64>,
    pub potassium_level_ppm: Option<f64>,
    pub notes: Option<String>,
}

/// Payload for creating or replacing a soil reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSoilReading {
    #[serde(default)]
    pub crop_id: Option<i32>,
    pub reading_date: NaiveDate,
    #[serde(default)]
    pub soil_moisture_percentage: Option<f64>,
    #[serde(default)]
    pub ph_level: Option<f64>,
    #[serde(default)]
    pub nitrogen_level_ppm: Option<f64>,
    #[serde(default)]
    pub phosphorus_level_ppm: Option<f64>,
    #[serde(default)]
    pub potassium_level_ppm: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Input usage
// =============================================================================

/// An application of an input (fertilizer, pesticide, ...) to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputUsage {
    pub input_id: i32,
    pub crop_id: Option<i32>,
    pub crop_name: Option<String>,
    pub usage_date: NaiveDate,
    pub input_type: String,
    pub input_name: String,
    pub quantity_used: f64,
    pub unit: String,
    pub field_location: Option<String>,
    pub notes: Option<String>,
}

/// Payload for creating or replacing an input-usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInputUsage {
    #[serde(default)]
    pub crop_id: Option<i32>,
    pub usage_date: NaiveDate,
    pub input_type: String,
    pub input_name: String,
    pub quantity_used: f64,
    pub unit: String,
    #[serde(default)]
    pub field_location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Input costs
// =============================================================================

/// A cost entry, optionally traceable to an input-usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCost {
    pub cost_id: i32,
    pub input_id: Option<i32>,
    /// Resolved from the linked input-usage record on reads.
    pub input_type: Option<String>,
    pub cost_date: NaiveDate,
    pub item_name: String,
    pub cost_amount: f64,
    pub currency: String,
    pub notes: Option<String>,
}

/// Payload for creating or replacing an input cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInputCost {
    #[serde(default)]
    pub input_id: Option<i32>,
    pub cost_date: NaiveDate,
    pub item_name: String,
    pub cost_amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

// =============================================================================
// Reports
// =============================================================================

/// One row of the total-yield report: summed harvest per (crop, unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropYieldTotal {
    pub crop_name: String,
    pub total_yield: f64,
    pub unit: String,
}

/// Averages over every soil reading; all fields null when the table is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilAverages {
    pub avg_moisture: Option<f64>,
    pub avg_ph: Option<f64>,
    pub avg_nitrogen: Option<f64>,
    pub avg_phosphorus: Option<f64>,
    pub avg_potassium: Option<f64>,
}

/// One row of the cost report. The category is the linked input type when a
/// cost is traceable to a usage record, else the cost's own item name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostByCategory {
    pub category: String,
    pub total_cost: f64,
    pub currency: String,
}

/// Forecast row per (crop, unit). Crops with no yield history appear once
/// with a null average and null unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropYieldForecast {
    pub crop_id: i32,
    pub crop_name: String,
    pub average_yield: Option<f64>,
    pub unit: Option<String>,
}

// =============================================================================
// Advice
// =============================================================================

/// Severity tag on an advisory message. Informational only, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSeverity {
    Info,
    Warning,
    Success,
}

/// A single advisory message emitted by the farm-health engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmAdvice {
    pub message: String,
    #[serde(rename = "type")]
    pub severity: AdviceSeverity,
}

impl FarmAdvice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: AdviceSeverity::Info,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: AdviceSeverity::Warning,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: AdviceSeverity::Success,
        }
    }
}
