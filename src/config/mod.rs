//! Startup configuration resolution.
//!
//! Every `configure_*` operation runs once, synchronously, on the startup
//! control path, and returns either a ready-to-use object or a descriptive
//! error. The resolved objects are shared read-only for the process
//! lifetime.

pub mod compress;
pub mod crypto;
pub mod delta;
pub mod finish;
pub mod limiter;
pub mod redacted;
pub mod result_error;
pub mod settings;
pub mod storage;
pub mod uploader;

use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::settings::{parse_bool_setting, Settings};
use tracing_subscriber::EnvFilter;

pub const PREVENT_WAL_OVERWRITE_SETTING: &str = "WALVAULT_PREVENT_WAL_OVERWRITE";
pub const LOG_LEVEL_SETTING: &str = "WALVAULT_LOG_LEVEL";

/// Advisory flag consumed by the archive collaborators; parsed here so a
/// malformed value fails at startup.
pub fn configure_prevent_wal_overwrite(settings: &dyn Settings) -> Result<bool> {
    match settings.lookup(PREVENT_WAL_OVERWRITE_SETTING) {
        None => Ok(false),
        Some(value) if value.is_empty() => Ok(false),
        Some(value) => parse_bool_setting(&value, PREVENT_WAL_OVERWRITE_SETTING),
    }
}

/// Forwards the configured log level to the tracing subscriber. An invalid
/// filter directive is an error; a second initialization keeps the first
/// subscriber.
pub fn configure_logging(settings: &dyn Settings) -> Result<()> {
    let filter = match settings.lookup(LOG_LEVEL_SETTING) {
        Some(directive) => {
            EnvFilter::try_new(&directive).map_err(|e| Error::ParseSetting {
                setting: LOG_LEVEL_SETTING,
                source: Box::new(e),
            })?
        }
        None => EnvFilter::new("info"),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::MapSettings;

    #[test]
    fn test_prevent_wal_overwrite_default() {
        assert!(!configure_prevent_wal_overwrite(&MapSettings::new()).unwrap());
    }

    #[test]
    fn test_prevent_wal_overwrite_parses() {
        let settings = MapSettings::new().set(PREVENT_WAL_OVERWRITE_SETTING, "true");
        assert!(configure_prevent_wal_overwrite(&settings).unwrap());

        let settings = MapSettings::new().set(PREVENT_WAL_OVERWRITE_SETTING, "false");
        assert!(!configure_prevent_wal_overwrite(&settings).unwrap());
    }

    #[test]
    fn test_prevent_wal_overwrite_malformed() {
        let settings = MapSettings::new().set(PREVENT_WAL_OVERWRITE_SETTING, "yep");
        let error = configure_prevent_wal_overwrite(&settings).unwrap_err();
        assert!(error.to_string().contains(PREVENT_WAL_OVERWRITE_SETTING));
    }

    #[test]
    fn test_configure_logging_rejects_invalid_directive() {
        let settings = MapSettings::new().set(LOG_LEVEL_SETTING, "not=a=filter");
        assert!(configure_logging(&settings).is_err());
    }

    #[test]
    fn test_configure_logging_accepts_level() {
        let settings = MapSettings::new().set(LOG_LEVEL_SETTING, "debug");
        assert!(configure_logging(&settings).is_ok());
    }
}
