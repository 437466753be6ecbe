//! Configuration loading from files and the environment, and repository
//! selection from it.

mod support;

use std::io::Write;
use std::str::FromStr;

use chrono::Duration;
use meeting_planner::config::{AppConfig, ConfigError, CONFIG_PATH_ENV};
use meeting_planner::db::{RepositoryConfig, RepositoryFactory, RepositoryType};

const CLEAN_ENV: [(&str, Option<&str>); 6] = [
    ("HOST", None),
    ("PORT", None),
    ("SCHEDULING_TIMEZONE", None),
    ("REPOSITORY_TYPE", None),
    ("DATABASE_URL", None),
    ("PG_DATABASE_URL", None),
];

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn env_with<'a>(extra: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<_> = CLEAN_ENV.to_vec();
    changes.extend_from_slice(extra);
    changes
}

#[test]
fn load_reads_the_file_named_by_the_environment() {
    let file = write_config(
        r#"
[server]
port = 9123

[scheduling]
timezone = "Asia/Tokyo"
max_duration_minutes = 90
"#,
    );
    let path = file.path().to_str().unwrap().to_string();

    let config = support::with_scoped_env(
        &env_with(&[(CONFIG_PATH_ENV, Some(path.as_str()))]),
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.server.port, 9123);
    let (submission, preview) = config.scheduling.validators().unwrap();
    assert_eq!(submission.timezone(), chrono_tz::Asia::Tokyo);
    assert_eq!(submission.policy().max_duration, Duration::minutes(90));
    assert_eq!(preview.policy().max_duration, Duration::minutes(90));
}

#[test]
fn environment_overrides_the_file() {
    let file = write_config("[server]\nhost = \"10.0.0.1\"\nport = 9000\n");
    let path = file.path().to_str().unwrap().to_string();

    let config = support::with_scoped_env(
        &env_with(&[
            (CONFIG_PATH_ENV, Some(path.as_str())),
            ("PORT", Some("9001")),
            ("SCHEDULING_TIMEZONE", Some("Europe/Berlin")),
        ]),
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.server.bind_address(), "10.0.0.1:9001");
    assert_eq!(
        config.scheduling.timezone().unwrap(),
        chrono_tz::Europe::Berlin
    );
}

#[test]
fn invalid_timezone_from_environment_fails_load() {
    let file = write_config("");
    let path = file.path().to_str().unwrap().to_string();

    let result = support::with_scoped_env(
        &env_with(&[
            (CONFIG_PATH_ENV, Some(path.as_str())),
            ("SCHEDULING_TIMEZONE", Some("Nowhere/Special")),
        ]),
        AppConfig::load,
    );

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn oversized_minute_settings_are_rejected_not_panicking() {
    let file = write_config(&format!(
        "[scheduling]\nmax_duration_minutes = {}\n",
        i64::MAX
    ));
    let config = AppConfig::from_file(file.path()).unwrap();

    let err = config.scheduling.validators().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("max_duration_minutes"), "{}", err);
}

#[test]
fn grace_window_past_the_calendar_range_still_validates() {
    let file = write_config("[scheduling]\ngrace_window_minutes = 1000000000000\n");
    let config = AppConfig::from_file(file.path()).unwrap();

    let (submission, _) = config.scheduling.validators().unwrap();
    let result = submission.check(
        "2024-06-04T09:00",
        "2024-06-04T10:00",
        support::monday_morning(),
    );
    assert!(result.is_accepted(), "{:?}", result);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let result = support::with_scoped_env(
        &env_with(&[(CONFIG_PATH_ENV, Some("/nonexistent/meeting-planner.toml"))]),
        AppConfig::load,
    );
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn repository_type_from_env() {
    support::with_scoped_env(&CLEAN_ENV, || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });

    support::with_scoped_env(
        &env_with(&[("DATABASE_URL", Some("postgres://localhost/meetings"))]),
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );

    support::with_scoped_env(
        &env_with(&[
            ("DATABASE_URL", Some("postgres://localhost/meetings")),
            ("REPOSITORY_TYPE", Some("local")),
        ]),
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn repository_type_parse_errors_name_the_input() {
    let err = RepositoryType::from_str("mongo").unwrap_err();
    assert!(err.contains("Unknown repository type"));
    assert!(err.contains("mongo"));
}

#[tokio::test]
async fn factory_builds_local_store_from_config_file() {
    let file = write_config("[repository]\ntype = \"local\"\n");
    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn factory_rejects_unknown_repository_type() {
    let config: RepositoryConfig = toml::from_str("[repository]\ntype = \"redis\"\n").unwrap();
    let err = RepositoryFactory::from_repository_config(&config)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("Invalid repository type"));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn postgres_config_without_feature_is_refused() {
    let config: RepositoryConfig = toml::from_str(
        "[repository]\ntype = \"postgres\"\n[postgres]\ndatabase_url = \"postgres://x/y\"\n",
    )
    .unwrap();
    assert!(RepositoryFactory::from_repository_config(&config)
        .await
        .is_err());
}
