use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::InactiveAccountWindow;
use crate::error::{FxaError, Result};
use crate::utils::get_env_with_prefix;

/// Main configuration for fxa-shared consumers
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub inactive_accounts: InactiveAccountsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Settings for the inactive account sweep.
///
/// Unset dates are derived when the window is built: `active_by` defaults to
/// `inactive_days` before now, `end` to `active_by`, and `start` to the Unix
/// epoch.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InactiveAccountsConfig {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_by_date: Option<DateTime<Utc>>,
    /// Days without activity before an account counts as inactive.
    #[serde(default = "default_inactive_days")]
    pub inactive_days: u32,
    /// Accounts fetched per query page.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for InactiveAccountsConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            active_by_date: None,
            inactive_days: default_inactive_days(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_inactive_days() -> u32 {
    2 * 365
}

fn default_batch_size() -> u64 {
    500
}

impl InactiveAccountsConfig {
    /// Resolve the sweep window relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns `FxaError::BadRequest` if the resolved range is empty.
    pub fn window(&self, now: DateTime<Utc>) -> Result<InactiveAccountWindow> {
        let active_by = self
            .active_by_date
            .unwrap_or_else(|| now - Duration::days(i64::from(self.inactive_days)));
        let end = self.end_date.unwrap_or(active_by);
        let start = self.start_date.unwrap_or(DateTime::UNIX_EPOCH);

        InactiveAccountWindow::new(
            start.timestamp_millis(),
            end.timestamp_millis(),
            active_by.timestamp_millis(),
        )
    }
}

/// Parse a date given as RFC 3339, `YYYY-MM-DD`, or epoch milliseconds.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    value.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
    errors: Vec<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            errors: Vec::new(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_inactive_accounts(mut self, inactive_accounts: InactiveAccountsConfig) -> Self {
        self.config.inactive_accounts = inactive_accounts;
        self
    }

    /// Load configuration from environment variables with FXA_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            match json.parse() {
                Ok(json) => self.config.logging.json = json,
                Err(_) => self.errors.push(format!("LOG_JSON is not a boolean: {}", json)),
            }
        }

        let inactive = &mut self.config.inactive_accounts;
        for (key, slot) in [
            ("INACTIVE_ACCOUNTS_START_DATE", &mut inactive.start_date),
            ("INACTIVE_ACCOUNTS_END_DATE", &mut inactive.end_date),
            ("INACTIVE_ACCOUNTS_ACTIVE_BY_DATE", &mut inactive.active_by_date),
        ] {
            if let Some(value) = get_env_with_prefix(key) {
                match parse_date(&value) {
                    Some(date) => *slot = Some(date),
                    None => self.errors.push(format!("{} is not a valid date: {}", key, value)),
                }
            }
        }
        if let Some(days) = get_env_with_prefix("INACTIVE_ACCOUNTS_DAYS") {
            match days.parse() {
                Ok(days) => inactive.inactive_days = days,
                Err(_) => self
                    .errors
                    .push(format!("INACTIVE_ACCOUNTS_DAYS is not a number: {}", days)),
            }
        }
        if let Some(size) = get_env_with_prefix("INACTIVE_ACCOUNTS_BATCH_SIZE") {
            match size.parse() {
                Ok(size) => inactive.batch_size = size,
                Err(_) => self
                    .errors
                    .push(format!("INACTIVE_ACCOUNTS_BATCH_SIZE is not a number: {}", size)),
            }
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns `FxaError::Config` if an environment value could not be parsed,
    /// the log level is unknown, or the batch size is zero.
    pub fn build(self) -> Result<Config> {
        if !self.errors.is_empty() {
            return Err(FxaError::config(self.errors.join("; ")));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(FxaError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.inactive_accounts.batch_size == 0 {
            return Err(FxaError::config("inactive account batch size must be at least 1"));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.inactive_accounts.inactive_days, 730);
        assert_eq!(config.inactive_accounts.batch_size, 500);
    }

    #[test]
    fn test_invalid_log_level() {
        let result = ConfigBuilder::new().with_log_level("loud").build();
        assert!(matches!(result, Err(FxaError::Config(_))));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-01"), Some(expected));
        assert_eq!(parse_date("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("1704067200000"), Some(expected));
        assert_eq!(parse_date("January 1st"), None);
    }

    #[test]
    fn test_window_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap();
        let window = InactiveAccountsConfig::default().window(now).unwrap();

        assert_eq!(window.active_by, Utc.with_ymd_and_hms(2024, 10, 18, 0, 0, 0).unwrap());
        assert_eq!(window.end, window.active_by);
        assert_eq!(window.start, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_window_explicit_dates() {
        let config = InactiveAccountsConfig {
            start_date: parse_date("2015-01-01"),
            end_date: parse_date("2016-01-01T12:00:00Z"),
            active_by_date: parse_date("2023-06-01"),
            ..Default::default()
        };
        let window = config.window(Utc::now()).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.active_by, Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_from_env_reports_bad_dates() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("FXA_INACTIVE_ACCOUNTS_END_DATE", "not-a-date");
        }
        let result = ConfigBuilder::new().from_env().build();
        unsafe {
            std::env::remove_var("FXA_INACTIVE_ACCOUNTS_END_DATE");
        }

        match result {
            Err(FxaError::Config(msg)) => assert!(msg.contains("INACTIVE_ACCOUNTS_END_DATE")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_env_reads_dates() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("FXA_INACTIVE_ACCOUNTS_START_DATE", "2019-05-01");
        }
        let config = ConfigBuilder::new().from_env().build();
        unsafe {
            std::env::remove_var("FXA_INACTIVE_ACCOUNTS_START_DATE");
        }

        let config = config.unwrap();
        assert_eq!(
            config.inactive_accounts.start_date,
            Some(Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_from_env_reports_bad_batch_size() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("FXA_INACTIVE_ACCOUNTS_BATCH_SIZE", "five hundred");
        }
        let result = ConfigBuilder::new().from_env().build();
        unsafe {
            std::env::remove_var("FXA_INACTIVE_ACCOUNTS_BATCH_SIZE");
        }

        match result {
            Err(FxaError::Config(msg)) => assert!(msg.contains("INACTIVE_ACCOUNTS_BATCH_SIZE")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_env_reports_bad_log_json() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("FXA_LOG_JSON", "yes please");
        }
        let result = ConfigBuilder::new().from_env().build();
        unsafe {
            std::env::remove_var("FXA_LOG_JSON");
        }

        match result {
            Err(FxaError::Config(msg)) => assert!(msg.contains("LOG_JSON")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
