use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use thiserror::Error;
use url::Url;

use crate::models::Timeframe;

pub const DEFAULT_SYMBOLS: &[&str] = &[
    "BTC/USDT", "ETH/USDT", "BNB/USDT", "SOL/USDT", "XRP/USDT", "DOGE/USDT", "AVAX/USDT",
    "TON/USDT", "ADA/USDT",
];
pub const DEFAULT_LOG_FILE: &str = "ema_signals.log";
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Slowest EMA period plus the extra bar needed for a two-bar tail.
pub const MIN_HISTORY_LIMIT: usize = 31;
/// Upper bound accepted by the klines endpoint.
pub const MAX_HISTORY_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How the polling loop waits between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadencePolicy {
    /// Sleep a fixed period after every cycle.
    Fixed(Duration),
    /// Wake at the top of the next clock hour, never sooner than `min_wait`.
    HourAligned { min_wait: Duration },
}

impl CadencePolicy {
    pub fn next_wait(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Self::Fixed(interval) => interval,
            Self::HourAligned { min_wait } => {
                let into_hour = u64::from(now.minute()) * 60 + u64::from(now.second());
                // leap seconds report nanoseconds above 1e9
                let nanos = u64::from(now.nanosecond()).min(999_999_999);
                let until_next = Duration::from_secs(3600 - into_hour) - Duration::from_nanos(nanos);
                until_next.max(min_wait)
            }
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub telegram_chat_id: i64,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    pub history_limit: usize,
    pub closed_candles_only: bool,
    pub error_threshold: u32,
    pub status_interval: Duration,
    pub ping_interval: Duration,
    pub fetch_timeout: Duration,
    pub cadence: CadencePolicy,
    pub base_url: Url,
    pub log_file: Option<PathBuf>,
    pub restart_backoff: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("take_profit_pct", &self.take_profit_pct)
            .field("stop_loss_pct", &self.stop_loss_pct)
            .field("symbols", &self.symbols)
            .field("timeframe", &self.timeframe)
            .field("history_limit", &self.history_limit)
            .field("closed_candles_only", &self.closed_candles_only)
            .field("error_threshold", &self.error_threshold)
            .field("status_interval", &self.status_interval)
            .field("ping_interval", &self.ping_interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("cadence", &self.cadence)
            .field("base_url", &self.base_url.as_str())
            .field("log_file", &self.log_file)
            .field("restart_backoff", &self.restart_backoff)
            .finish()
    }
}

impl Settings {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let token = required(&lookup, "TELEGRAM_TOKEN", &mut missing);
        let chat_id = required(&lookup, "TELEGRAM_CHAT_ID", &mut missing);
        let tp = required(&lookup, "TAKE_PROFIT_PERCENT", &mut missing);
        let sl = required(&lookup, "STOP_LOSS_PERCENT", &mut missing);

        let (Some(telegram_token), Some(chat_id), Some(tp), Some(sl)) = (token, chat_id, tp, sl)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let telegram_chat_id = parse_value::<i64>("TELEGRAM_CHAT_ID", &chat_id)?;
        let take_profit_pct = positive_pct("TAKE_PROFIT_PERCENT", &tp)?;
        let stop_loss_pct = positive_pct("STOP_LOSS_PERCENT", &sl)?;

        let symbols = match lookup("SYMBOLS") {
            Some(raw) => parse_symbols(&raw)?,
            None => DEFAULT_SYMBOLS.iter().map(|s| normalize_symbol(s)).collect(),
        };

        let timeframe = optional(&lookup, "TIMEFRAME", Timeframe::H1)?;

        let history_limit = optional(&lookup, "HISTORY_LIMIT", 150usize)?;
        if !(MIN_HISTORY_LIMIT..=MAX_HISTORY_LIMIT).contains(&history_limit) {
            return Err(invalid(
                "HISTORY_LIMIT",
                history_limit.to_string(),
                format!("must be between {MIN_HISTORY_LIMIT} and {MAX_HISTORY_LIMIT}"),
            ));
        }

        let closed_candles_only = optional(&lookup, "CLOSED_CANDLES_ONLY", false)?;

        let error_threshold = optional(&lookup, "ERROR_THRESHOLD", 5u32)?;
        if error_threshold == 0 {
            return Err(invalid("ERROR_THRESHOLD", "0".into(), "must be at least 1".into()));
        }

        let status_interval = seconds(&lookup, "STATUS_INTERVAL_SECS", 86_400)?;
        let ping_interval = seconds(&lookup, "PING_INTERVAL_SECS", 21_600)?;
        let fetch_timeout = seconds(&lookup, "FETCH_TIMEOUT_SECS", 30)?;
        let restart_backoff = Duration::from_secs(optional(&lookup, "RESTART_BACKOFF_SECS", 60u64)?);

        let cadence = match lookup("CADENCE").as_deref().map(str::trim) {
            None | Some("") | Some("fixed") => {
                CadencePolicy::Fixed(seconds(&lookup, "POLL_INTERVAL_SECS", 900)?)
            }
            Some("hourly") => CadencePolicy::HourAligned {
                min_wait: Duration::from_secs(optional(&lookup, "MIN_WAIT_SECS", 10u64)?),
            },
            Some(other) => {
                return Err(invalid(
                    "CADENCE",
                    other.to_string(),
                    "expected `fixed` or `hourly`".into(),
                ));
            }
        };

        let raw_url = lookup("BINANCE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(raw_url.trim())
            .map_err(|e| invalid("BINANCE_BASE_URL", raw_url.clone(), e.to_string()))?;

        Ok(Self {
            telegram_token,
            telegram_chat_id,
            take_profit_pct,
            stop_loss_pct,
            symbols,
            timeframe,
            history_limit,
            closed_candles_only,
            error_threshold,
            status_interval,
            ping_interval,
            fetch_timeout,
            cadence,
            base_url,
            log_file: log_file_from_lookup(&lookup),
            restart_backoff,
        })
    }
}

/// Log file path, resolved on its own so logging can start before the
/// rest of the configuration is validated. An empty value disables it.
pub fn log_file_from_env() -> Option<PathBuf> {
    dotenvy::dotenv().ok();
    log_file_from_lookup(|key| env::var(key).ok())
}

fn log_file_from_lookup<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("LOG_FILE") {
        Some(path) if path.trim().is_empty() => None,
        Some(path) => Some(PathBuf::from(path.trim())),
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    }
}

/// `BTC/USDT` and `btcusdt` both become `BTCUSDT`.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().replace('/', "").to_uppercase()
}

fn parse_symbols(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(normalize_symbol) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        return Err(invalid("SYMBOLS", raw.to_string(), "no symbols listed".into()));
    }
    Ok(symbols)
}

fn required<F>(lookup: &F, key: &str, missing: &mut Vec<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            missing.push(key.to_string());
            None
        }
    }
}

fn optional<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}

fn seconds<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = optional(lookup, key, default)?;
    if secs == 0 {
        return Err(invalid(key, "0".into(), "must be greater than zero".into()));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(key, raw.to_string(), e.to_string()))
}

fn positive_pct(key: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value = parse_value::<f64>(key, raw)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(key, raw.to_string(), "must be a positive number".into()))
    }
}

fn invalid(key: &'static str, value: String, reason: String) -> ConfigError {
    ConfigError::Invalid { key, value, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-1001234"),
            ("TAKE_PROFIT_PERCENT", "2"),
            ("STOP_LOSS_PERCENT", "1"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_lookup(lookup_from(&base())).unwrap();

        assert_eq!(settings.telegram_chat_id, -1001234);
        assert_eq!(settings.timeframe, Timeframe::H1);
        assert_eq!(settings.history_limit, 150);
        assert!(!settings.closed_candles_only);
        assert_eq!(settings.error_threshold, 5);
        assert_eq!(settings.fetch_timeout, Duration::from_secs(30));
        assert_eq!(settings.cadence, CadencePolicy::Fixed(Duration::from_secs(900)));
        assert_eq!(settings.symbols.len(), DEFAULT_SYMBOLS.len());
        assert_eq!(settings.symbols[0], "BTCUSDT");
        assert_eq!(settings.log_file, Some(PathBuf::from(DEFAULT_LOG_FILE)));
        assert_eq!(settings.base_url.as_str(), "https://api.binance.com/");
    }

    #[test]
    fn test_missing_required_keys_are_reported_together() {
        let err = Settings::from_lookup(lookup_from(&[("TELEGRAM_TOKEN", "x")])).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Missing(vec![
                "TELEGRAM_CHAT_ID".to_string(),
                "TAKE_PROFIT_PERCENT".to_string(),
                "STOP_LOSS_PERCENT".to_string(),
            ])
        );
    }

    #[test]
    fn test_blank_required_value_counts_as_missing() {
        let mut pairs = base();
        pairs[0] = ("TELEGRAM_TOKEN", "   ");
        let err = Settings::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["TELEGRAM_TOKEN".to_string()]));
    }

    #[test]
    fn test_non_numeric_chat_id_is_invalid() {
        let mut pairs = base();
        pairs[1] = ("TELEGRAM_CHAT_ID", "my-chat");
        let err = Settings::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TELEGRAM_CHAT_ID", .. }));
    }

    #[test]
    fn test_non_positive_percent_is_invalid() {
        let mut pairs = base();
        pairs[3] = ("STOP_LOSS_PERCENT", "0");
        let err = Settings::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STOP_LOSS_PERCENT", .. }));
    }

    #[test]
    fn test_symbols_are_normalized_and_deduplicated() {
        let mut pairs = base();
        pairs.push(("SYMBOLS", "btc/usdt, ETHUSDT,,BTCUSDT "));
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(settings.symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn test_history_limit_bounds() {
        let mut pairs = base();
        pairs.push(("HISTORY_LIMIT", "20"));
        let err = Settings::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "HISTORY_LIMIT", .. }));
    }

    #[test]
    fn test_hourly_cadence_and_disabled_log_file() {
        let mut pairs = base();
        pairs.push(("CADENCE", "hourly"));
        pairs.push(("MIN_WAIT_SECS", "15"));
        pairs.push(("LOG_FILE", ""));
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(
            settings.cadence,
            CadencePolicy::HourAligned {
                min_wait: Duration::from_secs(15)
            }
        );
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn test_closed_candles_flag() {
        let mut pairs = base();
        pairs.push(("CLOSED_CANDLES_ONLY", "true"));
        assert!(Settings::from_lookup(lookup_from(&pairs)).unwrap().closed_candles_only);

        pairs.pop();
        pairs.push(("CLOSED_CANDLES_ONLY", "yes"));
        let err = Settings::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CLOSED_CANDLES_ONLY", .. }));
    }

    #[test]
    fn test_unknown_cadence_is_invalid() {
        let mut pairs = base();
        pairs.push(("CADENCE", "sometimes"));
        let err = Settings::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CADENCE", .. }));
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let settings = Settings::from_lookup(lookup_from(&base())).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("123:abc"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_fixed_cadence_ignores_clock() {
        let policy = CadencePolicy::Fixed(Duration::from_secs(900));
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 59, 59).unwrap();
        assert_eq!(policy.next_wait(now), Duration::from_secs(900));
    }

    #[test]
    fn test_hour_aligned_waits_until_top_of_hour() {
        let policy = CadencePolicy::HourAligned {
            min_wait: Duration::from_secs(10),
        };
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(policy.next_wait(now), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_hour_aligned_respects_min_wait() {
        let policy = CadencePolicy::HourAligned {
            min_wait: Duration::from_secs(10),
        };
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 59, 57).unwrap();
        assert_eq!(policy.next_wait(now), Duration::from_secs(10));
    }
}
