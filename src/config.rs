use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid { key: String, value: String, reason: String },
    #[error("{0} is set but {1} is missing")]
    Incomplete(&'static str, &'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the order and cart slots.
    pub data_dir: PathBuf,
    /// Hosted backend; `None` runs against the in-memory backend.
    pub supabase: Option<SupabaseConfig>,
    pub low_stock_threshold: u32,
    pub delivery_fee: f64,
    pub recent_orders_limit: usize,
    pub mailbox_size: usize,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let supabase = match (lookup("SUPABASE_URL"), lookup("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            (Some(_), None) => return Err(ConfigError::Incomplete("SUPABASE_URL", "SUPABASE_ANON_KEY")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("SUPABASE_ANON_KEY", "SUPABASE_URL")),
            (None, None) => {
                warn!("SUPABASE_URL not set, using in-memory backend");
                None
            }
        };

        Ok(Self {
            data_dir: try_load(&lookup, "SIMPLE_DOUGH_DATA_DIR", "./data")?,
            supabase,
            low_stock_threshold: try_load(&lookup, "SIMPLE_DOUGH_LOW_STOCK_THRESHOLD", "5")?,
            delivery_fee: try_load(&lookup, "SIMPLE_DOUGH_DELIVERY_FEE", "50")?,
            recent_orders_limit: try_load(&lookup, "SIMPLE_DOUGH_RECENT_ORDERS", "5")?,
            mailbox_size: try_load(&lookup, "SIMPLE_DOUGH_MAILBOX_SIZE", "32")?,
        })
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse::<T>().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.supabase, None);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.delivery_fee, 50.0);
        assert_eq!(config.recent_orders_limit, 5);
        assert_eq!(config.mailbox_size, 32);
    }

    #[test]
    fn test_overrides_and_backend() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SIMPLE_DOUGH_DELIVERY_FEE", "75.5"),
        ]))
        .unwrap();
        assert_eq!(config.supabase.unwrap().anon_key, "anon");
        assert_eq!(config.delivery_fee, 75.5);
    }

    #[test]
    fn test_bad_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("SIMPLE_DOUGH_MAILBOX_SIZE", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "SIMPLE_DOUGH_MAILBOX_SIZE"));

        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")])).unwrap_err();
        assert_eq!(err, ConfigError::Incomplete("SUPABASE_URL", "SUPABASE_ANON_KEY"));
    }
}
