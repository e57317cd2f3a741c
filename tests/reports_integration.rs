//! Integration tests for the aggregate reports.

use chrono::NaiveDate;

use farm_monitor::db::repositories::LocalRepository;
use farm_monitor::db::repository::FarmRepository;
use farm_monitor::models::{NewCrop, NewInputCost, NewInputUsage, NewSoilReading, NewYieldRecord};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn crop(name: &str) -> NewCrop {
    NewCrop {
        crop_name: name.to_string(),
        planting_season: None,
        expected_yield_per_acre: None,
    }
}

fn harvest(crop_id: i32, amount: f64, unit: &str) -> NewYieldRecord {
    NewYieldRecord {
        crop_id,
        harvest_date: date(2024, 9, 1),
        actual_yield: amount,
        unit: unit.to_string(),
        field_location: None,
        notes: None,
    }
}

#[tokio::test]
async fn total_yield_groups_by_crop_and_unit() {
    let repo = LocalRepository::new();
    let maize = repo.create_crop(&crop("Maize")).await.unwrap();
    let yam = repo.create_crop(&crop("Yam")).await.unwrap();

    repo.create_yield(&harvest(maize.crop_id, 100.0, "kg"))
        .await
        .unwrap();
    repo.create_yield(&harvest(maize.crop_id, 50.0, "kg"))
        .await
        .unwrap();
    // Same crop, different unit: never converted, kept as its own row.
    repo.create_yield(&harvest(maize.crop_id, 3.0, "tonnes"))
        .await
        .unwrap();
    repo.create_yield(&harvest(yam.crop_id, 400.0, "kg"))
        .await
        .unwrap();

    let rows = repo.total_yield_by_crop().await.unwrap();
    assert_eq!(rows.len(), 3);

    // Ordered by total descending.
    assert_eq!(rows[0].crop_name, "Yam");
    assert_eq!(rows[0].total_yield, 400.0);
    assert_eq!(rows[1].crop_name, "Maize");
    assert_eq!(rows[1].total_yield, 150.0);
    assert_eq!(rows[1].unit, "kg");
    assert_eq!(rows[2].unit, "tonnes");
    assert_eq!(rows[2].total_yield, 3.0);
}

#[tokio::test]
async fn soil_averages_empty_table_is_all_null() {
    let repo = LocalRepository::new();
    let averages = repo.average_soil_parameters().await.unwrap();
    assert_eq!(averages.avg_moisture, None);
    assert_eq!(averages.avg_ph, None);
    assert_eq!(averages.avg_nitrogen, None);
    assert_eq!(averages.avg_phosphorus, None);
    assert_eq!(averages.avg_potassium, None);
}

#[tokio::test]
async fn soil_averages_ignore_nulls_per_column() {
    let repo = LocalRepository::new();
    repo.create_soil_reading(&NewSoilReading {
        crop_id: None,
        reading_date: date(2024, 5, 1),
        soil_moisture_percentage: Some(40.0),
        ph_level: Some(6.0),
        nitrogen_level_ppm: None,
        phosphorus_level_ppm: None,
        potassium_level_ppm: None,
        notes: None,
    })
    .await
    .unwrap();
    repo.create_soil_reading(&NewSoilReading {
        crop_id: None,
        reading_date: date(2024, 5, 2),
        soil_moisture_percentage: Some(60.0),
        ph_level: None,
        nitrogen_level_ppm: Some(80.0),
        phosphorus_level_ppm: None,
        potassium_level_ppm: None,
        notes: None,
    })
    .await
    .unwrap();

    let averages = repo.average_soil_parameters().await.unwrap();
    assert_eq!(averages.avg_moisture, Some(50.0));
    // A single non-null value averages to itself.
    assert_eq!(averages.avg_ph, Some(6.0));
    assert_eq!(averages.avg_nitrogen, Some(80.0));
    // Columns that are null everywhere stay null.
    assert_eq!(averages.avg_phosphorus, None);
}

#[tokio::test]
async fn cost_report_falls_back_to_item_name() {
    let repo = LocalRepository::new();
    let usage = repo
        .create_input_usage(&NewInputUsage {
            crop_id: None,
            usage_date: date(2024, 5, 10),
            input_type: "Fertilizer".to_string(),
            input_name: "NPK".to_string(),
            quantity_used: 50.0,
            unit: "kg".to_string(),
            field_location: None,
            notes: None,
        })
        .await
        .unwrap();

    repo.create_input_cost(&NewInputCost {
        input_id: Some(usage.input_id),
        cost_date: date(2024, 5, 11),
        item_name: "NPK bags".to_string(),
        cost_amount: 300.0,
        currency: "USD".to_string(),
        notes: None,
    })
    .await
    .unwrap();
    repo.create_input_cost(&NewInputCost {
        input_id: Some(usage.input_id),
        cost_date: date(2024, 6, 11),
        item_name: "More NPK".to_string(),
        cost_amount: 200.0,
        currency: "USD".to_string(),
        notes: None,
    })
    .await
    .unwrap();
    // Untraceable cost: category falls back to the item name.
    repo.create_input_cost(&NewInputCost {
        input_id: None,
        cost_date: date(2024, 5, 12),
        item_name: "Fuel".to_string(),
        cost_amount: 80.0,
        currency: "USD".to_string(),
        notes: None,
    })
    .await
    .unwrap();

    let rows = repo.total_cost_by_category().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "Fertilizer");
    assert_eq!(rows[0].total_cost, 500.0);
    assert_eq!(rows[1].category, "Fuel");
    assert_eq!(rows[1].total_cost, 80.0);
}

#[tokio::test]
async fn forecast_includes_crops_without_yields() {
    let repo = LocalRepository::new();
    let maize = repo.create_crop(&crop("Maize")).await.unwrap();
    let yam = repo.create_crop(&crop("Yam")).await.unwrap();

    repo.create_yield(&harvest(maize.crop_id, 100.0, "kg"))
        .await
        .unwrap();
    repo.create_yield(&harvest(maize.crop_id, 200.0, "kg"))
        .await
        .unwrap();

    let rows = repo.yield_forecast().await.unwrap();
    assert_eq!(rows.len(), 2);

    // Ordered by crop name ascending.
    assert_eq!(rows[0].crop_name, "Maize");
    assert_eq!(rows[0].average_yield, Some(150.0));
    assert_eq!(rows[0].unit.as_deref(), Some("kg"));

    assert_eq!(rows[1].crop_name, "Yam");
    assert_eq!(rows[1].crop_id, yam.crop_id);
    assert_eq!(rows[1].average_yield, None);
    assert_eq!(rows[1].unit, None);
}

#[tokio::test]
async fn forecast_splits_units_per_crop() {
    let repo = LocalRepository::new();
    let maize = repo.create_crop(&crop("Maize")).await.unwrap();

    repo.create_yield(&harvest(maize.crop_id, 100.0, "kg"))
        .await
        .unwrap();
    repo.create_yield(&harvest(maize.crop_id, 2.0, "tonnes"))
        .await
        .unwrap();

    let rows = repo.yield_forecast().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.crop_name == "Maize"));
    let units: Vec<Option<&str>> = rows.iter().map(|r| r.unit.as_deref()).collect();
    assert!(units.contains(&Some("kg")));
    assert!(units.contains(&Some("tonnes")));
}
