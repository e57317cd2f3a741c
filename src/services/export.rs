//! CSV serialization of the full dataset.
//!
//! Every table is rendered as one CSV document keyed by its file name
//! (`crops.csv`, `yields.csv`, ...). Rows are ordered by primary key and
//! columns alphabetically by name so exports diff cleanly between runs.
//! Floats are fixed to two decimals, dates are ISO `YYYY-MM-DD`, and nulls
//! become empty cells. Display fields resolved through joins (crop names on
//! yield rows, input types on cost rows) are not part of the table and are
//! left out. An empty table exports as an empty string, without a header.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{Crop, InputCost, InputUsage, SoilReading, WeatherRecord, YieldRecord};

/// Failure while rendering CSV output.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output was not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

fn float(value: f64) -> String {
    format!("{:.2}", value)
}

fn opt_float(value: Option<f64>) -> String {
    value.map(float).unwrap_or_default()
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_id(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Render the crops table. Columns: crop_id, crop_name,
/// expected_yield_per_acre, planting_season.
pub fn crops_csv(crops: &[Crop]) -> Result<String, ExportError> {
    if crops.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<&Crop> = crops.iter().collect();
    rows.sort_by_key(|c| c.crop_id);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "crop_id",
        "crop_name",
        "expected_yield_per_acre",
        "planting_season",
    ])?;
    for c in rows {
        writer.write_record([
            c.crop_id.to_string(),
            c.crop_name.clone(),
            opt_float(c.expected_yield_per_acre),
            opt_str(&c.planting_season),
        ])?;
    }
    finish(writer)
}

/// Render the yields table. Columns: actual_yield, crop_id, field_location,
/// harvest_date, notes, unit, yield_id.
pub fn yields_csv(records: &[YieldRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<&YieldRecord> = records.iter().collect();
    rows.sort_by_key(|r| r.yield_id);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "actual_yield",
        "crop_id",
        "field_location",
        "harvest_date",
        "notes",
        "unit",
        "yield_id",
    ])?;
    for r in rows {
        writer.write_record([
            float(r.actual_yield),
            r.crop_id.to_string(),
            opt_str(&r.field_location),
            r.harvest_date.to_string(),
            opt_str(&r.notes),
            r.unit.clone(),
            r.yield_id.to_string(),
        ])?;
    }
    finish(writer)
}

/// Render the soil readings table. Columns: crop_id, nitrogen_level_ppm,
/// notes, ph_level, phosphorus_level_ppm, potassium_level_ppm, reading_date,
/// reading_id, soil_moisture_percentage.
pub fn soil_readings_csv(readings: &[SoilReading]) -> Result<String, ExportError> {
    if readings.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<&SoilReading> = readings.iter().collect();
    rows.sort_by_key(|r| r.reading_id);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "crop_id",
        "nitrogen_level_ppm",
        "notes",
        "ph_level",
        "phosphorus_level_ppm",
        "potassium_level_ppm",
        "reading_date",
        "reading_id",
        "soil_moisture_percentage",
    ])?;
    for r in rows {
        writer.write_record([
            opt_id(r.crop_id),
            opt_float(r.nitrogen_level_ppm),
            opt_str(&r.notes),
            opt_float(r.ph_level),
            opt_float(r.phosphorus_level_ppm),
            opt_float(r.potassium_level_ppm),
            r.reading_date.to_string(),
            r.reading_id.to_string(),
            opt_float(r.soil_moisture_percentage),
        ])?;
    }
    finish(writer)
}

/// Render the input usage table. Columns: crop_id, field_location, input_id,
/// input_name, input_type, notes, quantity_used, unit, usage_date.
pub fn input_usage_csv(usage: &[InputUsage]) -> Result<String, ExportError> {
    if usage.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<&InputUsage> = usage.iter().collect();
    rows.sort_by_key(|u| u.input_id);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "crop_id",
        "field_location",
        "input_id",
        "input_name",
        "input_type",
        "notes",
        "quantity_used",
        "unit",
        "usage_date",
    ])?;
    for u in rows {
        writer.write_record([
            opt_id(u.crop_id),
            opt_str(&u.field_location),
            u.input_id.to_string(),
            u.input_name.clone(),
            u.input_type.clone(),
            opt_str(&u.notes),
            float(u.quantity_used),
            u.unit.clone(),
            u.usage_date.to_string(),
        ])?;
    }
    finish(writer)
}

/// Render the input costs table. Columns: cost_amount, cost_date, cost_id,
/// currency, input_id, item_name, notes.
pub fn input_costs_csv(costs: &[InputCost]) -> Result<String, ExportError> {
    if costs.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<&InputCost> = costs.iter().collect();
    rows.sort_by_key(|c| c.cost_id);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "cost_amount",
        "cost_date",
        "cost_id",
        "currency",
        "input_id",
        "item_name",
        "notes",
    ])?;
    for c in rows {
        writer.write_record([
            float(c.cost_amount),
            c.cost_date.to_string(),
            c.cost_id.to_string(),
            c.currency.clone(),
            opt_id(c.input_id),
            c.item_name.clone(),
            opt_str(&c.notes),
        ])?;
    }
    finish(writer)
}

/// Render the weather table. Columns: humidity_percentage, location,
/// precipitation_mm, record_date, temperature_max_celsius,
/// temperature_min_celsius, weather_description, weather_id, wind_speed_kph.
pub fn weather_csv(records: &[WeatherRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<&WeatherRecord> = records.iter().collect();
    rows.sort_by_key(|w| w.weather_id);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "humidity_percentage",
        "location",
        "precipitation_mm",
        "record_date",
        "temperature_max_celsius",
        "temperature_min_celsius",
        "weather_description",
        "weather_id",
        "wind_speed_kph",
    ])?;
    for w in rows {
        writer.write_record([
            opt_float(w.humidity_percentage),
            w.location.clone(),
            opt_float(w.precipitation_mm),
            w.record_date.to_string(),
            opt_float(w.temperature_max_celsius),
            opt_float(w.temperature_min_celsius),
            opt_str(&w.weather_description),
            w.weather_id.to_string(),
            opt_float(w.wind_speed_kph),
        ])?;
    }
    finish(writer)
}

/// Bundle every table into a file-name -> CSV map.
#[allow(clippy::too_many_arguments)]
pub fn export_all(
    crops: &[Crop],
    yields: &[YieldRecord],
    soil_readings: &[SoilReading],
    input_usage: &[InputUsage],
    input_costs: &[InputCost],
    weather: &[WeatherRecord],
) -> Result<BTreeMap<String, String>, ExportError> {
    let mut out = BTreeMap::new();
    out.insert("crops.csv".to_string(), crops_csv(crops)?);
    out.insert("yields.csv".to_string(), yields_csv(yields)?);
    out.insert(
        "soil_readings.csv".to_string(),
        soil_readings_csv(soil_readings)?,
    );
    out.insert("input_usage.csv".to_string(), input_usage_csv(input_usage)?);
    out.insert("input_costs.csv".to_string(), input_costs_csv(input_costs)?);
    out.insert("weather_data.csv".to_string(), weather_csv(weather)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_table_exports_as_empty_string() {
        assert_eq!(crops_csv(&[]).unwrap(), "");
        assert_eq!(weather_csv(&[]).unwrap(), "");
    }

    #[test]
    fn crops_rows_sorted_by_id_with_alphabetical_columns() {
        let crops = vec![
            Crop {
                crop_id: 2,
                crop_name: "Maize".into(),
                planting_season: None,
                expected_yield_per_acre: Some(1.5),
            },
            Crop {
                crop_id: 1,
                crop_name: "Yam".into(),
                planting_season: Some("Rainy".into()),
                expected_yield_per_acre: None,
            },
        ];
        let csv = crops_csv(&crops).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "crop_id,crop_name,expected_yield_per_acre,planting_season"
        );
        assert_eq!(lines.next().unwrap(), "1,Yam,,Rainy");
        assert_eq!(lines.next().unwrap(), "2,Maize,1.50,");
    }

    #[test]
    fn floats_are_fixed_to_two_decimals_and_dates_iso() {
        let records = vec![YieldRecord {
            yield_id: 7,
            crop_id: 3,
            crop_name: Some("Maize".into()),
            harvest_date: date(2024, 9, 30),
            actual_yield: 12.345,
            unit: "kg".into(),
            field_location: None,
            notes: None,
        }];
        let csv = yields_csv(&records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "actual_yield,crop_id,field_location,harvest_date,notes,unit,yield_id"
        );
        // crop_name is a joined display field and must not appear
        assert_eq!(lines.next().unwrap(), "12.35,3,,2024-09-30,,kg,7");
    }

    #[test]
    fn null_numerics_become_empty_cells() {
        let readings = vec![SoilReading {
            reading_id: 1,
            crop_id: None,
            crop_name: None,
            reading_date: date(2024, 5, 1),
            soil_moisture_percentage: Some(44.0),
            ph_level: None,
            nitrogen_level_ppm: None,
            phosphorus_level_ppm: None,
            potassium_level_ppm: None,
            notes: None,
        }];
        let csv = soil_readings_csv(&readings).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert_eq!(data_line, ",,,,,,2024-05-01,1,44.00");
    }

    #[test]
    fn export_all_produces_six_documents() {
        let bundle = export_all(&[], &[], &[], &[], &[], &[]).unwrap();
        let keys: Vec<&str> = bundle.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "crops.csv",
                "input_costs.csv",
                "input_usage.csv",
                "soil_readings.csv",
                "weather_data.csv",
                "yields.csv"
            ]
        );
        assert!(bundle.values().all(String::is_empty));
    }
}
