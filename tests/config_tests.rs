use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rust_decimal_macros::dec;

use taodiv::error::{ConfigError, Error};
use taodiv::infrastructure::config::cache::CacheBackend;
use taodiv::infrastructure::config::llm::LlmProvider;
use taodiv::infrastructure::config::trading::DispatcherBackend;
use taodiv::infrastructure::config::upstream::QuoteSource;
use taodiv::infrastructure::config::Config;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn write_temp_config(contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let suffix = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!("taodiv-config-test-{nanos}-{suffix}.toml"));
    fs::write(&path, contents).expect("write temp config");
    path
}

fn load(contents: &str) -> taodiv::error::Result<Config> {
    let path = write_temp_config(contents);
    let result = Config::load(&path);
    let _ = fs::remove_file(&path);
    result
}

#[test]
fn empty_file_uses_documented_defaults() {
    let config = load("").expect("defaults are valid");

    #[cfg(feature = "redis")]
    assert_eq!(config.cache.backend, CacheBackend::Redis);
    #[cfg(not(feature = "redis"))]
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.ttl(), Duration::from_secs(120));
    assert_eq!(config.upstream.source, QuoteSource::Gateway);
    assert_eq!(config.defaults.subnet_id, 18);
    assert_eq!(config.trading.unit_amount, dec!(0.01));
    assert_eq!(config.trading.dedup_window_secs, 60);
    assert_eq!(config.dispatcher.backend, DispatcherBackend::Sqlite);
    assert_eq!(config.llm.provider, LlmProvider::Chutes);
}

#[test]
fn full_file_round_trips_every_section() {
    let toml = r#"
[logging]
level = "debug"
format = "json"

[cache]
backend = "redis"
ttl_secs = 30
redis_url = "redis://cache:6379/2"
key_prefix = "divs"

[upstream]
source = "simulated"
simulated_latency_ms = 0
simulated_dividend = 99

[defaults]
subnet_id = 3
account_id = "5Hk"

[trading]
unit_amount = 0.05
dry_run = true

[dispatcher]
backend = "memory"
capacity = 50

[worker]
concurrency = 8

[worker.scoring_retry]
max_attempts = 5

[llm]
provider = "anthropic"

[database]
path = "/tmp/taodiv-test.db"
"#;

    let config = load(toml).expect("valid config");

    assert_eq!(config.logging.format, "json");
    assert_eq!(config.cache.backend, CacheBackend::Redis);
    assert_eq!(config.cache.key_prefix, "divs");
    assert_eq!(config.upstream.source, QuoteSource::Simulated);
    assert_eq!(config.upstream.simulated_dividend, 99);
    assert_eq!(config.defaults.subnet_id, 3);
    assert_eq!(config.trading.unit_amount, dec!(0.05));
    assert!(config.trading.dry_run);
    assert_eq!(config.dispatcher.backend, DispatcherBackend::Memory);
    assert_eq!(config.worker.concurrency, 8);
    assert_eq!(config.worker.scoring_retry.max_attempts, 5);
    assert_eq!(config.llm.provider, LlmProvider::Anthropic);
    assert_eq!(config.database.path, "/tmp/taodiv-test.db");

    let query = config.query_settings();
    assert_eq!(query.ttl, Duration::from_secs(30));
}

#[test]
fn config_rejects_zero_ttl() {
    match load("[cache]\nttl_secs = 0\n") {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "ttl_secs", ..
        })) => {}
        Err(err) => panic!("Expected invalid ttl error, got {err}"),
        Ok(config) => panic!("Expected zero ttl to be rejected, got {}", config.cache.ttl_secs),
    }
}

#[test]
fn config_rejects_non_positive_unit_amount() {
    match load("[trading]\nunit_amount = 0\n") {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "unit_amount",
            ..
        })) => {}
        other => panic!("Expected invalid unit_amount, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn config_rejects_missing_gateway_for_live_trading() {
    let toml = r#"
[upstream]
source = "simulated"
gateway_url = ""

[trading]
dry_run = false
"#;

    match load(toml) {
        Err(Error::Config(ConfigError::MissingField {
            field: "gateway_url",
        })) => {}
        other => panic!("Expected missing gateway_url, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn simulated_dry_run_needs_no_gateway() {
    let toml = r#"
[upstream]
source = "simulated"
gateway_url = ""

[trading]
dry_run = true
"#;

    assert!(load(toml).is_ok());
}

#[test]
fn config_rejects_inverted_retry_delays() {
    let toml = r#"
[worker.execution_retry]
initial_delay_ms = 5000
max_delay_ms = 100
"#;

    match load(toml) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "execution_retry",
            ..
        })) => {}
        other => panic!("Expected invalid execution_retry, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn config_rejects_unknown_backend() {
    match load("[cache]\nbackend = \"memcached\"\n") {
        Err(Error::Config(ConfigError::Parse(_))) => {}
        other => panic!("Expected parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let path = std::env::temp_dir().join("taodiv-config-test-does-not-exist.toml");
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn example_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
    let config = Config::load(&path).expect("example config loads");
    assert_eq!(config.worker.execution_retry.max_attempts, 2);
    assert_eq!(config.cache.key_prefix, "tao_dividend");
}
