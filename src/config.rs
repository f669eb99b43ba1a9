use std::env;
use std::str::FromStr;

/// Default document shown when no `DEFAULT_SHEET_URL` is configured.
pub const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/15Lh2DmXAnBr9Aw1YHlNW31Tj3M9yvf7po7k9hl1s434/edit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

/// How the background scheduler decides when to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Sidebar-controlled: manual refresh plus optional auto-refresh interval.
    Interactive,
    /// Forced refresh after a fixed long delay; no user control.
    Fixed,
}

impl RefreshMode {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for anything other than `interactive` or `fixed`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "interactive" | "manual" => Ok(Self::Interactive),
            "fixed" => Ok(Self::Fixed),
            _ => Err(ConfigError::Invalid {
                key: "REFRESH_MODE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Google Sheets API
    pub sheets_api_base_url: String,
    pub token_uri_override: Option<String>,
    pub service_account_json: Option<String>,
    pub service_account_file: String,
    pub request_timeout_seconds: u64,

    // Dashboard defaults (sidebar initial values)
    pub default_sheet_url: String,
    pub default_worksheet_name: String,
    pub default_refresh_interval_seconds: u64,
    pub default_auto_refresh: bool,

    // Refresh cycle
    pub refresh_mode: RefreshMode,
    pub fixed_refresh_delay_seconds: u64,
    pub refresh_retry_max: u32,
    pub refresh_retry_delay_seconds: u64,

    // Caching
    pub cache_ttl_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Application metadata
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheets_api_base_url: "https://sheets.googleapis.com/v4".to_string(),
            token_uri_override: None,
            service_account_json: None,
            service_account_file: "credentials.json".to_string(),
            request_timeout_seconds: 30,

            default_sheet_url: DEFAULT_SHEET_URL.to_string(),
            default_worksheet_name: "Sheet1".to_string(),
            default_refresh_interval_seconds: 5,
            default_auto_refresh: false,

            refresh_mode: RefreshMode::Interactive,
            fixed_refresh_delay_seconds: 30,
            refresh_retry_max: 0,
            refresh_retry_delay_seconds: 5,

            cache_ttl_seconds: 5,

            api_host: "0.0.0.0".to_string(),
            api_port: 8501,

            disable_rate_limiting: false,
            rate_limit_per_second: 1,
            rate_limit_burst: 10,

            deployment: Deployment::Local,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when unset or malformed.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Credentials are not required here: a missing key surfaces as an
    /// authentication error when the connection is first acquired.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `REFRESH_MODE` is set to an unknown value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let refresh_mode = match non_empty("REFRESH_MODE") {
            Some(mode) => RefreshMode::parse(&mode)?,
            None => defaults.refresh_mode,
        };

        Ok(Self {
            // Google Sheets API
            sheets_api_base_url: non_empty("SHEETS_API_BASE_URL")
                .unwrap_or(defaults.sheets_api_base_url),
            token_uri_override: non_empty("GOOGLE_TOKEN_URI"),
            service_account_json: non_empty("GOOGLE_SERVICE_ACCOUNT_JSON"),
            service_account_file: non_empty("GOOGLE_SERVICE_ACCOUNT_FILE")
                .unwrap_or(defaults.service_account_file),
            request_timeout_seconds: parsed(
                "SHEETS_REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),

            // Dashboard defaults
            default_sheet_url: non_empty("DEFAULT_SHEET_URL")
                .unwrap_or(defaults.default_sheet_url),
            default_worksheet_name: non_empty("DEFAULT_WORKSHEET_NAME")
                .unwrap_or(defaults.default_worksheet_name),
            default_refresh_interval_seconds: parsed::<u64>(
                "DEFAULT_REFRESH_INTERVAL_SECONDS",
                defaults.default_refresh_interval_seconds,
            )
            .clamp(1, 60),
            default_auto_refresh: parsed("DEFAULT_AUTO_REFRESH", defaults.default_auto_refresh),

            // Refresh cycle
            refresh_mode,
            fixed_refresh_delay_seconds: parsed(
                "FIXED_REFRESH_DELAY_SECONDS",
                defaults.fixed_refresh_delay_seconds,
            )
            .max(1),
            refresh_retry_max: parsed("REFRESH_RETRY_MAX", defaults.refresh_retry_max),
            refresh_retry_delay_seconds: parsed(
                "REFRESH_RETRY_DELAY_SECONDS",
                defaults.refresh_retry_delay_seconds,
            ),

            // Caching
            cache_ttl_seconds: parsed("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),

            // API settings
            api_host: non_empty("API_HOST").unwrap_or(defaults.api_host),
            api_port: parsed("API_PORT", defaults.api_port),

            // Rate limiting
            disable_rate_limiting: parsed("DISABLE_RATE_LIMITING", defaults.disable_rate_limiting),
            rate_limit_per_second: parsed("RATE_LIMIT_PER_SECOND", defaults.rate_limit_per_second)
                .max(1),
            rate_limit_burst: parsed("RATE_LIMIT_BURST", defaults.rate_limit_burst).max(1),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_mode_parses_known_values() {
        assert_eq!(RefreshMode::parse("fixed").unwrap(), RefreshMode::Fixed);
        assert_eq!(
            RefreshMode::parse("Interactive").unwrap(),
            RefreshMode::Interactive
        );
        assert!(matches!(
            RefreshMode::parse("hourly"),
            Err(ConfigError::Invalid { key: "REFRESH_MODE", .. })
        ));
    }

    #[test]
    fn defaults_match_dashboard_sidebar() {
        let config = Config::default();
        assert_eq!(config.cache_ttl_seconds, 5);
        assert_eq!(config.default_worksheet_name, "Sheet1");
        assert_eq!(config.default_refresh_interval_seconds, 5);
        assert!(!config.default_auto_refresh);
        assert_eq!(config.bind_address(), "0.0.0.0:8501");
    }
}
