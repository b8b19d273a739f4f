use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN, MiningLimits};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    pub mining: MiningLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            difficulty: DEFAULT_DIFFICULTY,
            mining: MiningLimits::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unparsable values fall back to
    /// the defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port);
        let difficulty =
            parse_or(&lookup, "LEDGER_DIFFICULTY", defaults.difficulty).clamp(DIFF_MIN, DIFF_MAX);
        let timeout = parse_opt::<u64, _>(&lookup, "MINING_TIMEOUT_SECS").map(Duration::from_secs);
        let max_attempts = parse_opt(&lookup, "MINING_MAX_ATTEMPTS");

        Self {
            host,
            port,
            difficulty,
            mining: MiningLimits {
                timeout,
                max_attempts,
            },
        }
    }
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    parse_opt(lookup, key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::Settings;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]);
        assert_eq!(s, Settings::default());
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.port, 8080);
        assert_eq!(s.difficulty, 1);
        assert_eq!(s.mining.timeout, None);
        assert_eq!(s.mining.max_attempts, None);
    }

    #[test]
    fn reads_all_keys() {
        let s = settings(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("LEDGER_DIFFICULTY", "3"),
            ("MINING_TIMEOUT_SECS", "30"),
            ("MINING_MAX_ATTEMPTS", "1000000"),
        ]);
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 9000);
        assert_eq!(s.difficulty, 3);
        assert_eq!(s.mining.timeout, Some(Duration::from_secs(30)));
        assert_eq!(s.mining.max_attempts, Some(1_000_000));
    }

    #[test]
    fn bad_values_fall_back() {
        let s = settings(&[("PORT", "eighty"), ("MINING_TIMEOUT_SECS", "-1")]);
        assert_eq!(s.port, 8080);
        assert_eq!(s.mining.timeout, None);
    }

    #[test]
    fn difficulty_is_clamped() {
        assert_eq!(settings(&[("LEDGER_DIFFICULTY", "0")]).difficulty, 1);
        assert_eq!(settings(&[("LEDGER_DIFFICULTY", "40")]).difficulty, 6);
    }
}
