//! Environment-driven configuration tests.

mod support;

use farm_monitor::db::RepositoryType;
use farm_monitor::services::weather::WeatherApiConfig;
use support::with_scoped_env;

#[test]
fn repository_type_defaults_to_local_without_database_url() {
    with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn repository_type_prefers_postgres_when_url_present() {
    with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/farm")),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn repository_type_env_var_wins_over_url() {
    with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/farm")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn weather_config_requires_api_key() {
    with_scoped_env(&[("OPENWEATHER_API_KEY", None)], || {
        assert!(WeatherApiConfig::from_env().is_err());
    });
}

#[test]
fn weather_config_defaults() {
    with_scoped_env(
        &[
            ("OPENWEATHER_API_KEY", Some("test-key")),
            ("OPENWEATHER_URL", None),
            ("FARM_LAT", None),
            ("FARM_LON", None),
        ],
        || {
            let config = WeatherApiConfig::from_env().unwrap();
            assert_eq!(config.api_key, "test-key");
            assert_eq!(
                config.api_url,
                "http://api.openweathermap.org/data/2.5/weather"
            );
            assert!((config.latitude - 10.06069).abs() < 1e-9);
            assert!((config.longitude + 2.50192).abs() < 1e-9);
        },
    );
}

#[test]
fn weather_config_honors_overrides() {
    with_scoped_env(
        &[
            ("OPENWEATHER_API_KEY", Some("test-key")),
            ("OPENWEATHER_URL", Some("http://localhost:9000/weather")),
            ("FARM_LAT", Some("51.5")),
            ("FARM_LON", Some("-0.12")),
        ],
        || {
            let config = WeatherApiConfig::from_env().unwrap();
            assert_eq!(config.api_url, "http://localhost:9000/weather");
            assert!((config.latitude - 51.5).abs() < 1e-9);
            assert!((config.longitude + 0.12).abs() < 1e-9);
        },
    );
}
