//! Process configuration, read from the environment (and a `.env` file, loaded in `main`).
//!
//! | variable                 | default  |
//! |--------------------------|----------|
//! | `RELAY_PORT`             | `8888`   |
//! | `RELAY_TIMEOUT_SECS`     | `30`     |
//! | `RELAY_BODY_MODE`        | `stream` |
//! | `RELAY_FOLLOW_REDIRECTS` | `true`   |

use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the upstream body is handed back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyMode {
    /// forward chunks as soon as they arrive
    #[default]
    Stream,
    /// read the whole body as text, then reply in one go
    Buffered,
}

impl FromStr for BodyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" | "streaming" => Ok(Self::Stream),
            "buffer" | "buffered" => Ok(Self::Buffered),
            other => Err(format!("unknown body mode `{other}`")),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// `None` leaves the outbound call unbounded.
    pub timeout: Option<Duration>,
    pub body_mode: BodyMode,
    pub follow_redirects: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
            body_mode: BodyMode::default(),
            follow_redirects: true,
        }
    }
}

impl Config {
    /// read the config from the process environment.
    ///
    /// # Errors
    ///
    /// if a variable is set but can't be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// read the config through `lookup`, falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// if a variable is set but can't be parsed
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse(&lookup, "RELAY_PORT")?.unwrap_or(defaults.port);
        let timeout = match parse::<u64>(&lookup, "RELAY_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.timeout,
        };
        let body_mode = parse(&lookup, "RELAY_BODY_MODE")?.unwrap_or(defaults.body_mode);
        let follow_redirects =
            parse(&lookup, "RELAY_FOLLOW_REDIRECTS")?.unwrap_or(defaults.follow_redirects);

        Ok(Self {
            port,
            timeout,
            body_mode,
            follow_redirects,
        })
    }
}

fn parse<T>(lookup: impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigError {
            key,
            reason: err.to_string(),
            value,
        })
}
