use std::str::FromStr;
use std::time::Duration;

/// How the store applies its own writes to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Apply locally first, reconcile with the server response, re-fetch on
    /// failure.
    Optimistic,
    /// Apply only what the server confirmed.
    Confirmed,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(WriteMode::Optimistic),
            "confirmed" => Ok(WriteMode::Confirmed),
            other => Err(format!(
                "Invalid write mode '{other}'. Must be one of: optimistic, confirmed"
            )),
        }
    }
}

/// Client store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Debounce delay of the autosave coordinator (default: 1 s).
    pub autosave_delay: Duration,
    /// Write strategy (default: optimistic).
    pub write_mode: WriteMode,
    /// Origin that share links are built on.
    pub share_base_url: String,
}

/// Default autosave debounce in milliseconds.
const DEFAULT_AUTOSAVE_MS: u64 = 1_000;

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(DEFAULT_AUTOSAVE_MS),
            write_mode: WriteMode::Optimistic,
            share_base_url: "http://localhost:5173".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `JOTPAD_AUTOSAVE_MS`    | `1000`                  |
    /// | `JOTPAD_WRITE_MODE`     | `optimistic`            |
    /// | `JOTPAD_SHARE_BASE_URL` | `http://localhost:5173` |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set to an unparseable value.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let autosave_ms: u64 = std::env::var("JOTPAD_AUTOSAVE_MS")
            .unwrap_or_else(|_| DEFAULT_AUTOSAVE_MS.to_string())
            .parse()
            .expect("JOTPAD_AUTOSAVE_MS must be a valid u64");

        let write_mode = match std::env::var("JOTPAD_WRITE_MODE") {
            Ok(value) => value
                .parse()
                .unwrap_or_else(|e: String| panic!("JOTPAD_WRITE_MODE: {e}")),
            Err(_) => defaults.write_mode,
        };

        let share_base_url =
            std::env::var("JOTPAD_SHARE_BASE_URL").unwrap_or(defaults.share_base_url);

        Self {
            autosave_delay: Duration::from_millis(autosave_ms),
            write_mode,
            share_base_url,
        }
    }
}
