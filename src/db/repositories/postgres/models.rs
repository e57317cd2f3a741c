use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::{Float8, Int4, Nullable, Text};

use super::schema::{crops, input_costs, input_usage, soil_readings, weather_data, yields};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CropRow {
    pub crop_id: i32,
    pub crop_name: String,
    pub planting_season: Option<String>,
    pub expected_yield_per_acre: Option<f64>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crops)]
#[diesel(treat_none_as_null = true)]
pub struct NewCropRow {
    pub crop_name: String,
    pub planting_season: Option<String>,
    pub expected_yield_per_acre: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = weather_data)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WeatherRow {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = weather_data)]
pub struct NewWeatherRow {
    pub record_date: NaiveDate,
    pub location: String,
    pub temperature_max_celsius: Option<f64>,
    pub temperature_min_celsius: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub humidity_percentage: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    pub weather_description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = yields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct YieldRow {
    pub yield_id: i32,
    pub crop_id: i32,
    pub harvest_date: NaiveDate,
    pub actual_yield: f64,
    pub unit: String,
    pub field_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = yields)]
#[diesel(treat_none_as_null = true)]
pub struct NewYieldRow {
    pub crop_id: i32,
    pub harvest_date: NaiveDate,
    pub actual_yield: f64,
    pub unit: String,
    pub field_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = soil_readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SoilReadingRow {
    pub reading_id: i32,
    pub crop_id: Option<i32>,
    pub reading_date: NaiveDate,
    pub soil_moisture_percentage: Option<f64>,
    pub ph_level: Option<f64>,
    pub nitrogen_level_ppm: Option<f64>,
    pub phosphorus_level_ppm: Option<f64>,
    pub potassium_level_ppm: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = soil_readings)]
#[diesel(treat_none_as_null = true)]
pub struct NewSoilReadingRow {
    pub crop_id: Option<i32>,
    pub reading_date: NaiveDate,
    pub soil_moisture_percentage: Option<f64>,
    pub ph_level: Option<f64>,
    pub nitrogen_level_ppm: Option<f64>,
    pub phosphorus_level_ppm: Option<f64>,
    pub potassium_level_ppm: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = input_usage)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InputUsageRow {
    pub input_id: i32,
    pub crop_id: Option<i32>,
    pub usage_date: NaiveDate,
    pub input_type: String,
    pub input_name: String,
    pub quantity_used: f64,
    pub unit: String,
    pub field_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = input_usage)]
#[diesel(treat_none_as_null = true)]
pub struct NewInputUsageRow {
    pub crop_id: Option<i32>,
    pub usage_date: NaiveDate,
    pub input_type: String,
    pub input_name: String,
    pub quantity_used: f64,
    pub unit: String,
    pub field_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = input_costs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InputCostRow {
    pub cost_id: i32,
    pub input_id: Option<i32>,
    pub cost_date: NaiveDate,
    pub item_name: String,
    pub cost_amount: f64,
    pub currency: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = input_costs)]
#[diesel(treat_none_as_null = true)]
pub struct NewInputCostRow {
    pub input_id: Option<i32>,
    pub cost_date: NaiveDate,
    pub item_name: String,
    pub cost_amount: f64,
    pub currency: String,
    pub notes: Option<String>,
}

// Rows for the grouped report queries, which run as raw SQL.

#[derive(Debug, QueryableByName)]
pub struct CropYieldTotalRow {
    #[diesel(sql_type = Text)]
    pub crop_name: String,
    #[diesel(sql_type = Float8)]
    pub total_yield: f64,
    #[diesel(sql_type = Text)]
    pub unit: String,
}

#[derive(Debug, QueryableByName)]
pub struct SoilAveragesRow {
    #[diesel(sql_type = Nullable<Float8>)]
    pub avg_moisture: Option<f64>,
    #[diesel(sql_type = Nullable<Float8>)]
    pub avg_ph: Option<f64>,
    #[diesel(sql_type = Nullable<Float8>)]
    pub avg_nitrogen: Option<f64>,
    #[diesel(sql_type = Nullable<Float8>)]
    pub avg_phosphorus: Option<f64>,
    #[diesel(sql_type = Nullable<Float8>)]
    pub avg_potassium: Option<f64>,
}

#[derive(Debug, QueryableByName)]
pub struct CostByCategoryRow {
    #[diesel(sql_type = Text)]
    pub category: String,
    #[diesel(sql_type = Float8)]
    pub total_cost: f64,
    #[diesel(sql_type = Text)]
    pub currency: String,
}

#[derive(Debug, QueryableByName)]
pub struct YieldForecastRow {
    #[diesel(sql_type = Int4)]
    pub crop_id: i32,
    #[diesel(sql_type = Text)]
    pub crop_name: String,
    #[diesel(sql_type = Nullable<Float8>)]
    pub average_yield: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use diesel::pg::Pg;

    // Updates are full-row replaces: a changeset with `None` option fields
    // must still assign those columns (to NULL) rather than skipping them.

    #[test]
    fn crop_changeset_assigns_nulled_columns() {
        let changes = NewCropRow {
            crop_name: "Maize".to_string(),
            planting_season: None,
            expected_yield_per_acre: None,
        };
        let query = diesel::update(crops::table.filter(crops::crop_id.eq(1))).set(&changes);
        let sql = debug_query::<Pg, _>(&query).to_string();
        assert!(sql.contains("planting_season"));
        assert!(sql.contains("expected_yield_per_acre"));
    }

    #[test]
    fn yield_changeset_assigns_nulled_columns() {
        let changes = NewYieldRow {
            crop_id: 1,
            harvest_date: chrono::NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            actual_yield: 100.0,
            unit: "kg".to_string(),
            field_location: None,
            notes: None,
        };
        let query = diesel::update(yields::table.filter(yields::yield_id.eq(1))).set(&changes);
        let sql = debug_query::<Pg, _>(&query).to_string();
        assert!(sql.contains("field_location"));
        assert!(sql.contains("notes"));
    }

    #[test]
    fn soil_reading_changeset_assigns_nulled_columns() {
        let changes = NewSoilReadingRow {
            crop_id: None,
            reading_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            soil_moisture_percentage: None,
            ph_level: None,
            nitrogen_level_ppm: None,
            phosphorus_level_ppm: None,
            potassium_level_ppm: None,
            notes: None,
        };
        let query = diesel::update(
            soil_readings::table.filter(soil_readings::reading_id.eq(1)),
        )
        .set(&changes);
        let sql = debug_query::<Pg, _>(&query).to_string();
        assert!(sql.contains("crop_id"));
        assert!(sql.contains("ph_level"));
    }
}
