//! Integration tests for the repository contract, exercised through the
//! in-memory implementation.

use chrono::NaiveDate;

use farm_monitor::db::repositories::LocalRepository;
use farm_monitor::db::repository::{FarmRepository, RepositoryError};
use farm_monitor::models::{
    NewCrop, NewInputCost, NewInputUsage, NewSoilReading, NewWeatherRecord, NewYieldRecord,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_crop(name: &str) -> NewCrop {
    NewCrop {
        crop_name: name.to_string(),
        planting_season: Some("Rainy".to_string()),
        expected_yield_per_acre: Some(2.0),
    }
}

fn new_yield(crop_id: i32, harvest_date: NaiveDate, actual_yield: f64, unit: &str) -> NewYieldRecord {
    NewYieldRecord {
        crop_id,
        harvest_date,
        actual_yield,
        unit: unit.to_string(),
        field_location: None,
        notes: None,
    }
}

fn new_reading(reading_date: NaiveDate, moisture: Option<f64>) -> NewSoilReading {
    NewSoilReading {
        crop_id: None,
        reading_date,
        soil_moisture_percentage: moisture,
        ph_level: None,
        nitrogen_level_ppm: None,
        phosphorus_level_ppm: None,
        potassium_level_ppm: None,
        notes: None,
    }
}

fn new_weather(record_date: NaiveDate, location: &str) -> NewWeatherRecord {
    NewWeatherRecord {
        record_date,
        location: location.to_string(),
        temperature_max_celsius: Some(32.0),
        temperature_min_celsius: Some(23.0),
        precipitation_mm: Some(0.0),
        humidity_percentage: Some(60.0),
        wind_speed_kph: Some(12.0),
        weather_description: Some("clear sky".to_string()),
    }
}

#[tokio::test]
async fn crop_crud_roundtrip() {
    let repo = LocalRepository::new();

    let created = repo.create_crop(&new_crop("Maize")).await.unwrap();
    assert_eq!(created.crop_name, "Maize");
    assert!(created.crop_id > 0);

    let fetched = repo.get_crop(created.crop_id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = repo
        .update_crop(
            created.crop_id,
            &NewCrop {
                crop_name: "Maize".to_string(),
                planting_season: Some("Dry".to_string()),
                expected_yield_per_acre: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.planting_season.as_deref(), Some("Dry"));
    assert_eq!(updated.expected_yield_per_acre, None);

    repo.delete_crop(created.crop_id).await.unwrap();
    assert!(matches!(
        repo.get_crop(created.crop_id).await,
        Err(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn missing_ids_surface_as_not_found() {
    let repo = LocalRepository::new();

    assert!(matches!(
        repo.get_crop(999).await,
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        repo.update_crop(999, &new_crop("Ghost")).await,
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete_yield(999).await,
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete_soil_reading(999).await,
        Err(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn duplicate_crop_name_conflicts() {
    let repo = LocalRepository::new();
    repo.create_crop(&new_crop("Maize")).await.unwrap();

    assert!(matches!(
        repo.create_crop(&new_crop("Maize")).await,
        Err(RepositoryError::Conflict { .. })
    ));

    // Renaming a different crop onto a taken name conflicts too.
    let yam = repo.create_crop(&new_crop("Yam")).await.unwrap();
    assert!(matches!(
        repo.update_crop(yam.crop_id, &new_crop("Maize")).await,
        Err(RepositoryError::Conflict { .. })
    ));
}

#[tokio::test]
async fn crops_list_orders_by_name() {
    let repo = LocalRepository::new();
    repo.create_crop(&new_crop("Yam")).await.unwrap();
    repo.create_crop(&new_crop("Cassava")).await.unwrap();
    repo.create_crop(&new_crop("Maize")).await.unwrap();

    let names: Vec<String> = repo
        .list_crops()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.crop_name)
        .collect();
    assert_eq!(names, vec!["Cassava", "Maize", "Yam"]);
}

#[tokio::test]
async fn yields_resolve_crop_name_and_order_newest_first() {
    let repo = LocalRepository::new();
    let crop = repo.create_crop(&new_crop("Maize")).await.unwrap();

    let older = repo
        .create_yield(&new_yield(crop.crop_id, date(2024, 6, 1), 100.0, "kg"))
        .await
        .unwrap();
    let newer = repo
        .create_yield(&new_yield(crop.crop_id, date(2024, 9, 1), 150.0, "kg"))
        .await
        .unwrap();

    assert_eq!(older.crop_name.as_deref(), Some("Maize"));

    let listed = repo.list_yields().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].yield_id, newer.yield_id);
    assert_eq!(listed[1].yield_id, older.yield_id);
}

#[tokio::test]
async fn latest_soil_reading_picks_newest_date() {
    let repo = LocalRepository::new();
    assert!(repo.latest_soil_reading().await.unwrap().is_none());

    repo.create_soil_reading(&new_reading(date(2024, 5, 1), Some(30.0)))
        .await
        .unwrap();
    let newest = repo
        .create_soil_reading(&new_reading(date(2024, 7, 1), Some(55.0)))
        .await
        .unwrap();
    repo.create_soil_reading(&new_reading(date(2024, 6, 1), Some(45.0)))
        .await
        .unwrap();

    let latest = repo.latest_soil_reading().await.unwrap().unwrap();
    assert_eq!(latest.reading_id, newest.reading_id);
    assert_eq!(latest.soil_moisture_percentage, Some(55.0));
}

#[tokio::test]
async fn weather_upsert_overwrites_same_date() {
    let repo = LocalRepository::new();
    let day = date(2024, 6, 15);

    let first = repo.upsert_weather(&new_weather(day, "Wa")).await.unwrap();

    let mut second = new_weather(day, "Wa Municipal");
    second.temperature_max_celsius = Some(35.5);
    let overwritten = repo.upsert_weather(&second).await.unwrap();

    // Same row: the id is stable across the upsert.
    assert_eq!(overwritten.weather_id, first.weather_id);
    assert_eq!(overwritten.location, "Wa Municipal");
    assert_eq!(overwritten.temperature_max_celsius, Some(35.5));

    assert_eq!(repo.list_weather().await.unwrap().len(), 1);
}

#[tokio::test]
async fn latest_weather_uses_record_date_not_insertion_order() {
    let repo = LocalRepository::new();
    assert!(repo.latest_weather().await.unwrap().is_none());

    repo.upsert_weather(&new_weather(date(2024, 6, 16), "Wa"))
        .await
        .unwrap();
    repo.upsert_weather(&new_weather(date(2024, 6, 14), "Wa"))
        .await
        .unwrap();

    let latest = repo.latest_weather().await.unwrap().unwrap();
    assert_eq!(latest.record_date, date(2024, 6, 16));
}

#[tokio::test]
async fn input_cost_resolves_type_through_usage_link() {
    let repo = LocalRepository::new();
    let usage = repo
        .create_input_usage(&NewInputUsage {
            crop_id: None,
            usage_date: date(2024, 5, 10),
            input_type: "Fertilizer".to_string(),
            input_name: "NPK 15-15-15".to_string(),
            quantity_used: 50.0,
            unit: "kg".to_string(),
            field_location: None,
            notes: None,
        })
        .await
        .unwrap();

    let linked = repo
        .create_input_cost(&NewInputCost {
            input_id: Some(usage.input_id),
            cost_date: date(2024, 5, 11),
            item_name: "NPK bags".to_string(),
            cost_amount: 300.0,
            currency: "USD".to_string(),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(linked.input_type.as_deref(), Some("Fertilizer"));

    let unlinked = repo
        .create_input_cost(&NewInputCost {
            input_id: None,
            cost_date: date(2024, 5, 12),
            item_name: "Fuel".to_string(),
            cost_amount: 80.0,
            currency: "USD".to_string(),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(unlinked.input_type, None);
}
