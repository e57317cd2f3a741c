//! In-memory repository for unit testing and local development.
//!
//! Stores each table as a `Vec` behind a `parking_lot::RwLock` and reproduces
//! the SQL semantics of the Postgres implementation: join resolution for
//! display fields, ordering of list results, group-and-aggregate reports, and
//! the weather upsert keyed by record date.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::super::repository::{FarmRepository, RepositoryError, RepositoryResult};
use crate::models::{
    CostByCategory, Crop, CropYieldForecast, CropYieldTotal, InputCost, InputUsage, NewCrop,
    NewInputCost, NewInputUsage, NewSoilReading, NewWeatherRecord, NewYieldRecord, SoilAverages,
    SoilReading, WeatherRecord, YieldRecord,
};

#[derive(Debug, Default)]
struct Tables {
    crops: Vec<Crop>,
    yields: Vec<YieldRecord>,
    soil_readings: Vec<SoilReading>,
    input_usage: Vec<InputUsage>,
    input_costs: Vec<InputCost>,
    weather: Vec<WeatherRecord>,
    next_id: i32,
}

impl Tables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn crop_name(&self, crop_id: Option<i32>) -> Option<String> {
        let id = crop_id?;
        self.crops
            .iter()
            .find(|c| c.crop_id == id)
            .map(|c| c.crop_name.clone())
    }

    fn input_type(&self, input_id: Option<i32>) -> Option<String> {
        let id = input_id?;
        self.input_usage
            .iter()
            .find(|u| u.input_id == id)
            .map(|u| u.input_type.clone())
    }
}

/// In-memory implementation of [`FarmRepository`].
#[derive(Debug, Default)]
pub struct LocalRepository {
    tables: RwLock<Tables>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: &str, id: i32) -> RepositoryError {
    RepositoryError::not_found(format!("{} {} not found", entity, id))
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[async_trait]
impl FarmRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    // ---- crops ----

    async fn list_crops(&self) -> RepositoryResult<Vec<Crop>> {
        let tables = self.tables.read();
        let mut crops = tables.crops.clone();
        crops.sort_by(|a, b| a.crop_name.cmp(&b.crop_name));
        Ok(crops)
    }

    async fn get_crop(&self, crop_id: i32) -> RepositoryResult<Crop> {
        let tables = self.tables.read();
        tables
            .crops
            .iter()
            .find(|c| c.crop_id == crop_id)
            .cloned()
            .ok_or_else(|| not_found("Crop", crop_id))
    }

    async fn create_crop(&self, crop: &NewCrop) -> RepositoryResult<Crop> {
        let mut tables = self.tables.write();
        if tables.crops.iter().any(|c| c.crop_name == crop.crop_name) {
            return Err(RepositoryError::conflict(format!(
                "Crop with name '{}' already exists",
                crop.crop_name
            )));
        }
        let crop_id = tables.allocate_id();
        let stored = Crop {
            crop_id,
            crop_name: crop.crop_name.clone(),
            planting_season: crop.planting_season.clone(),
            expected_yield_per_acre: crop.expected_yield_per_acre,
        };
        tables.crops.push(stored.clone());
        Ok(stored)
    }

    async fn update_crop(&self, crop_id: i32, crop: &NewCrop) -> RepositoryResult<Crop> {
        let mut tables = self.tables.write();
        if tables
            .crops
            .iter()
            .any(|c| c.crop_id != crop_id && c.crop_name == crop.crop_name)
        {
            return Err(RepositoryError::conflict(format!(
                "Another crop with name '{}' already exists",
                crop.crop_name
            )));
        }
        let entry = tables
            .crops
            .iter_mut()
            .find(|c| c.crop_id == crop_id)
            .ok_or_else(|| not_found("Crop", crop_id))?;
        entry.crop_name = crop.crop_name.clone();
        entry.planting_season = crop.planting_season.clone();
        entry.expected_yield_per_acre = crop.expected_yield_per_acre;
        Ok(entry.clone())
    }

    async fn delete_crop(&self, crop_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let before = tables.crops.len();
        tables.crops.retain(|c| c.crop_id != crop_id);
        if tables.crops.len() == before {
            return Err(not_found("Crop", crop_id));
        }
        Ok(())
    }

    // ---- yields ----

    async fn list_yields(&self) -> RepositoryResult<Vec<YieldRecord>> {
        let tables = self.tables.read();
        let mut records = tables.yields.clone();
        records.sort_by(|a, b| b.harvest_date.cmp(&a.harvest_date));
        Ok(records)
    }

    async fn get_yield(&self, yield_id: i32) -> RepositoryResult<YieldRecord> {
        let tables = self.tables.read();
        tables
            .yields
            .iter()
            .find(|y| y.yield_id == yield_id)
            .cloned()
            .ok_or_else(|| not_found("Yield record", yield_id))
    }

    async fn create_yield(&self, record: &NewYieldRecord) -> RepositoryResult<YieldRecord> {
        let mut tables = self.tables.write();
        let crop_name = tables.crop_name(Some(record.crop_id));
        let yield_id = tables.allocate_id();
        let stored = YieldRecord {
            yield_id,
            crop_id: record.crop_id,
            crop_name,
            harvest_date: record.harvest_date,
            actual_yield: record.actual_yield,
            unit: record.unit.clone(),
            field_location: record.field_location.clone(),
            notes: record.notes.clone(),
        };
        tables.yields.push(stored.clone());
        Ok(stored)
    }

    async fn update_yield(
        &self,
        yield_id: i32,
        record: &NewYieldRecord,
    ) -> RepositoryResult<YieldRecord> {
        let mut tables = self.tables.write();
        let crop_name = tables.crop_name(Some(record.crop_id));
        let entry = tables
            .yields
            .iter_mut()
            .find(|y| y.yield_id == yield_id)
            .ok_or_else(|| not_found("Yield record", yield_id))?;
        entry.crop_id = record.crop_id;
        entry.crop_name = crop_name;
        entry.harvest_date = record.harvest_date;
        entry.actual_yield = record.actual_yield;
        entry.unit = record.unit.clone();
        entry.field_location = record.field_location.clone();
        entry.notes = record.notes.clone();
        Ok(entry.clone())
    }

    async fn delete_yield(&self, yield_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let before = tables.yields.len();
        tables.yields.retain(|y| y.yield_id != yield_id);
        if tables.yields.len() == before {
            return Err(not_found("Yield record", yield_id));
        }
        Ok(())
    }

    // ---- soil readings ----

    async fn list_soil_readings(&self) -> RepositoryResult<Vec<SoilReading>> {
        let tables = self.tables.read();
        let mut readings = tables.soil_readings.clone();
        readings.sort_by(|a, b| b.reading_date.cmp(&a.reading_date));
        Ok(readings)
    }

    async fn get_soil_reading(&self, reading_id: i32) -> RepositoryResult<SoilReading> {
        let tables = self.tables.read();
        tables
            .soil_readings
            .iter()
            .find(|r| r.reading_id == reading_id)
            .cloned()
            .ok_or_else(|| not_found("Soil reading", reading_id))
    }

    async fn create_soil_reading(&self, reading: &NewSoilReading) -> RepositoryResult<SoilReading> {
        let mut tables = self.tables.write();
        let crop_name = tables.crop_name(reading.crop_id);
        let reading_id = tables.allocate_id();
        let stored = SoilReading {
            reading_id,
            crop_id: reading.crop_id,
            crop_name,
            reading_date: reading.reading_date,
            soil_moisture_percentage: reading.soil_moisture_percentage,
            ph_level: reading.ph_level,
            nitrogen_level_ppm: reading.nitrogen_level_ppm,
            phosphorus_level_ppm: reading.phosphorus_level_ppm,
            potassium_level_ppm: reading.potassium_level_ppm,
            notes: reading.notes.clone(),
        };
        tables.soil_readings.push(stored.clone());
        Ok(stored)
    }

    async fn update_soil_reading(
        &self,
        reading_id: i32,
        reading: &NewSoilReading,
    ) -> RepositoryResult<SoilReading> {
        let mut tables = self.tables.write();
        let crop_name = tables.crop_name(reading.crop_id);
        let entry = tables
            .soil_readings
            .iter_mut()
            .find(|r| r.reading_id == reading_id)
            .ok_or_else(|| not_found("Soil reading", reading_id))?;
        entry.crop_id = reading.crop_id;
        entry.crop_name = crop_name;
        entry.reading_date = reading.reading_date;
        entry.soil_moisture_percentage = reading.soil_moisture_percentage;
        entry.ph_level = reading.ph_level;
        entry.nitrogen_level_ppm = reading.nitrogen_level_ppm;
        entry.phosphorus_level_ppm = reading.phosphorus_level_ppm;
        entry.potassium_level_ppm = reading.potassium_level_ppm;
        entry.notes = reading.notes.clone();
        Ok(entry.clone())
    }

    async fn delete_soil_reading(&self, reading_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let before = tables.soil_readings.len();
        tables.soil_readings.retain(|r| r.reading_id != reading_id);
        if tables.soil_readings.len() == before {
            return Err(not_found("Soil reading", reading_id));
        }
        Ok(())
    }

    async fn latest_soil_reading(&self) -> RepositoryResult<Option<SoilReading>> {
        let tables = self.tables.read();
        Ok(tables
            .soil_readings
            .iter()
            .max_by_key(|r| (r.reading_date, r.reading_id))
            .cloned())
    }

    // ---- input usage ----

    async fn list_input_usage(&self) -> RepositoryResult<Vec<InputUsage>> {
        let tables = self.tables.read();
        let mut usage = tables.input_usage.clone();
        usage.sort_by(|a, b| b.usage_date.cmp(&a.usage_date));
        Ok(usage)
    }

    async fn get_input_usage(&self, input_id: i32) -> RepositoryResult<InputUsage> {
        let tables = self.tables.read();
        tables
            .input_usage
            .iter()
            .find(|u| u.input_id == input_id)
            .cloned()
            .ok_or_else(|| not_found("Input record", input_id))
    }

    async fn create_input_usage(&self, usage: &NewInputUsage) -> RepositoryResult<InputUsage> {
        let mut tables = self.tables.write();
        let crop_name = tables.crop_name(usage.crop_id);
        let input_id = tables.allocate_id();
        let stored = InputUsage {
            input_id,
            crop_id: usage.crop_id,
            crop_name,
            usage_date: usage.usage_date,
            input_type: usage.input_type.clone(),
            input_name: usage.input_name.clone(),
            quantity_used: usage.quantity_used,
            unit: usage.unit.clone(),
            field_location: usage.field_location.clone(),
            notes: usage.notes.clone(),
        };
        tables.input_usage.push(stored.clone());
        Ok(stored)
    }

    async fn update_input_usage(
        &self,
        input_id: i32,
        usage: &NewInputUsage,
    ) -> RepositoryResult<InputUsage> {
        let mut tables = self.tables.write();
        let crop_name = tables.crop_name(usage.crop_id);
        let entry = tables
            .input_usage
            .iter_mut()
            .find(|u| u.input_id == input_id)
            .ok_or_else(|| not_found("Input record", input_id))?;
        entry.crop_id = usage.crop_id;
        entry.crop_name = crop_name;
        entry.usage_date = usage.usage_date;
        entry.input_type = usage.input_type.clone();
        entry.input_name = usage.input_name.clone();
        entry.quantity_used = usage.quantity_used;
        entry.unit = usage.unit.clone();
        entry.field_location = usage.field_location.clone();
        entry.notes = usage.notes.clone();
        Ok(entry.clone())
    }

    async fn delete_input_usage(&self, input_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let before = tables.input_usage.len();
        tables.input_usage.retain(|u| u.input_id != input_id);
        if tables.input_usage.len() == before {
            return Err(not_found("Input record", input_id));
        }
        Ok(())
    }

    // ---- input costs ----

    async fn list_input_costs(&self) -> RepositoryResult<Vec<InputCost>> {
        let tables = self.tables.read();
        let mut costs = tables.input_costs.clone();
        costs.sort_by(|a, b| b.cost_date.cmp(&a.cost_date));
        Ok(costs)
    }

    async fn get_input_cost(&self, cost_id: i32) -> RepositoryResult<InputCost> {
        let tables = self.tables.read();
        tables
            .input_costs
            .iter()
            .find(|c| c.cost_id == cost_id)
            .cloned()
            .ok_or_else(|| not_found("Input cost record", cost_id))
    }

    async fn create_input_cost(&self, cost: &NewInputCost) -> RepositoryResult<InputCost> {
        let mut tables = self.tables.write();
        let input_type = tables.input_type(cost.input_id);
        let cost_id = tables.allocate_id();
        let stored = InputCost {
            cost_id,
            input_id: cost.input_id,
            input_type,
            cost_date: cost.cost_date,
            item_name: cost.item_name.clone(),
            cost_amount: cost.cost_amount,
            currency: cost.currency.clone(),
            notes: cost.notes.clone(),
        };
        tables.input_costs.push(stored.clone());
        Ok(stored)
    }

    async fn update_input_cost(
        &self,
        cost_id: i32,
        cost: &NewInputCost,
    ) -> RepositoryResult<InputCost> {
        let mut tables = self.tables.write();
        let input_type = tables.input_type(cost.input_id);
        let entry = tables
            .input_costs
            .iter_mut()
            .find(|c| c.cost_id == cost_id)
            .ok_or_else(|| not_found("Input cost record", cost_id))?;
        entry.input_id = cost.input_id;
        entry.input_type = input_type;
        entry.cost_date = cost.cost_date;
        entry.item_name = cost.item_name.clone();
        entry.cost_amount = cost.cost_amount;
        entry.currency = cost.currency.clone();
        entry.notes = cost.notes.clone();
        Ok(entry.clone())
    }

    async fn delete_input_cost(&self, cost_id: i32) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let before = tables.input_costs.len();
        tables.input_costs.retain(|c| c.cost_id != cost_id);
        if tables.input_costs.len() == before {
            return Err(not_found("Input cost record", cost_id));
        }
        Ok(())
    }

    // ---- weather ----

    async fn upsert_weather(&self, record: &NewWeatherRecord) -> RepositoryResult<WeatherRecord> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables
            .weather
            .iter_mut()
            .find(|w| w.record_date == record.record_date)
        {
            existing.location = record.location.clone();
            existing.temperature_max_celsius = record.temperature_max_celsius;
            existing.temperature_min_celsius = record.temperature_min_celsius;
            existing.precipitation_mm = record.precipitation_mm;
            existing.humidity_percentage = record.humidity_percentage;
            existing.wind_speed_kph = record.wind_speed_kph;
            existing.weather_description = record.weather_description.clone();
            return Ok(existing.clone());
        }
        let weather_id = tables.allocate_id();
        let stored = WeatherRecord {
            weather_id,
            record_date: record.record_date,
            location: record.location.clone(),
            temperature_max_celsius: record.temperature_max_celsius,
            temperature_min_celsius: record.temperature_min_celsius,
            precipitation_mm: record.precipitation_mm,
            humidity_percentage: record.humidity_percentage,
            wind_speed_kph: record.wind_speed_kph,
            weather_description: record.weather_description.clone(),
        };
        tables.weather.push(stored.clone());
        Ok(stored)
    }

    async fn latest_weather(&self) -> RepositoryResult<Option<WeatherRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .weather
            .iter()
            .max_by_key(|w| w.record_date)
            .cloned())
    }

    async fn list_weather(&self) -> RepositoryResult<Vec<WeatherRecord>> {
        let tables = self.tables.read();
        let mut records = tables.weather.clone();
        records.sort_by_key(|w| w.weather_id);
        Ok(records)
    }

    // ---- reports ----

    async fn total_yield_by_crop(&self) -> RepositoryResult<Vec<CropYieldTotal>> {
        let tables = self.tables.read();
        let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
        for y in &tables.yields {
            // Inner join: yields without a resolvable crop are skipped.
            let Some(crop_name) = tables.crop_name(Some(y.crop_id)) else {
                continue;
            };
            *totals.entry((crop_name, y.unit.clone())).or_insert(0.0) += y.actual_yield;
        }
        let mut rows: Vec<CropYieldTotal> = totals
            .into_iter()
            .map(|((crop_name, unit), total_yield)| CropYieldTotal {
                crop_name,
                total_yield,
                unit,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_yield
                .partial_cmp(&a.total_yield)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    async fn average_soil_parameters(&self) -> RepositoryResult<SoilAverages> {
        let tables = self.tables.read();
        let column = |f: fn(&SoilReading) -> Option<f64>| -> Vec<f64> {
            tables.soil_readings.iter().filter_map(f).collect()
        };
        Ok(SoilAverages {
            avg_moisture: average(&column(|r| r.soil_moisture_percentage)),
            avg_ph: average(&column(|r| r.ph_level)),
            avg_nitrogen: average(&column(|r| r.nitrogen_level_ppm)),
            avg_phosphorus: average(&column(|r| r.phosphorus_level_ppm)),
            avg_potassium: average(&column(|r| r.potassium_level_ppm)),
        })
    }

    async fn total_cost_by_category(&self) -> RepositoryResult<Vec<CostByCategory>> {
        let tables = self.tables.read();
        let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
        for c in &tables.input_costs {
            // Category falls back to the item name when the cost is not
            // traceable to a usage record.
            let category = tables
                .input_type(c.input_id)
                .unwrap_or_else(|| c.item_name.clone());
            *totals.entry((category, c.currency.clone())).or_insert(0.0) += c.cost_amount;
        }
        let mut rows: Vec<CostByCategory> = totals
            .into_iter()
            .map(|((category, currency), total_cost)| CostByCategory {
                category,
                total_cost,
                currency,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_cost
                .partial_cmp(&a.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    async fn yield_forecast(&self) -> RepositoryResult<Vec<CropYieldForecast>> {
        let tables = self.tables.read();
        let mut crops = tables.crops.clone();
        crops.sort_by(|a, b| a.crop_name.cmp(&b.crop_name));

        let mut rows = Vec::new();
        for crop in &crops {
            // Outer-join semantics: one group per (crop, unit), or a single
            // all-null group for crops with no yield history.
            let mut per_unit: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for y in tables.yields.iter().filter(|y| y.crop_id == crop.crop_id) {
                per_unit.entry(y.unit.clone()).or_default().push(y.actual_yield);
            }
            if per_unit.is_empty() {
                rows.push(CropYieldForecast {
                    crop_id: crop.crop_id,
                    crop_name: crop.crop_name.clone(),
                    average_yield: None,
                    unit: None,
                });
            } else {
                for (unit, values) in per_unit {
                    rows.push(CropYieldForecast {
                        crop_id: crop.crop_id,
                        crop_name: crop.crop_name.clone(),
                        average_yield: average(&values),
                        unit: Some(unit),
                    });
                }
            }
        }
        Ok(rows)
    }
}
