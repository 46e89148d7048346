//! Timezone handling for calendar bucketing
//!
//! Job timestamps are stored in UTC; daily and hourly statistics are grouped
//! by the *display* timezone configured here. Resolution order: `--utc` flag,
//! `--timezone` argument, `TZ` environment variable, system timezone via
//! `iana-time-zone`, UTC as the last resort.

use crate::error::{CupstatError, Result};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

/// Timezone used for date grouping and display
#[derive(Debug, Clone, Copy)]
pub struct TimezoneConfig {
    /// The resolved timezone
    pub tz: Tz,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            tz: detect_local_timezone(),
        }
    }
}

impl TimezoneConfig {
    /// Resolve the timezone from CLI arguments
    pub fn from_cli(timezone: Option<&str>, use_utc: bool) -> Result<Self> {
        if use_utc {
            return Ok(Self { tz: Tz::UTC });
        }
        match timezone {
            Some(name) => {
                let tz = Tz::from_str(name).map_err(|_| {
                    CupstatError::InvalidTimezone(format!(
                        "'{name}'. Use a name like 'America/New_York', 'Europe/Lisbon', or 'UTC'"
                    ))
                })?;
                Ok(Self { tz })
            }
            None => Ok(Self::default()),
        }
    }

    /// Human-readable name of the resolved timezone
    pub fn display_name(&self) -> &str {
        self.tz.name()
    }
}

/// Best-effort detection of the system timezone, falling back to UTC
pub fn detect_local_timezone() -> Tz {
    if let Ok(name) = std::env::var("TZ")
        && let Ok(tz) = Tz::from_str(&name)
    {
        debug!("using timezone from TZ environment variable: {name}");
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(name) => Tz::from_str(&name).unwrap_or_else(|_| {
            debug!("unrecognized system timezone '{name}', falling back to UTC");
            Tz::UTC
        }),
        Err(e) => {
            debug!("could not detect system timezone ({e:?}), falling back to UTC");
            Tz::UTC
        }
    }
}
