//! Named string-valued settings consumed by every configuration step.
//!
//! The concrete source is injected (`&dyn Settings`), so the resolvers stay
//! free of global state and tests can supply an in-memory map.

use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use derive_more::From;
use std::collections::HashMap;

pub trait Settings {
    /// Returns the value of `name`, or `None` if the setting is not present.
    fn lookup(&self, name: &str) -> Option<String>;

    fn get_or_empty(&self, name: &str) -> String {
        self.lookup(name).unwrap_or_default()
    }
}

/// Settings backed by the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSettings;

impl Settings for EnvSettings {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory settings for programmatic configuration and tests.
#[derive(Clone, Debug, Default, From)]
pub struct MapSettings(HashMap<String, String>);

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl Settings for MapSettings {
    fn lookup(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

pub fn parse_u64_setting(value: &str, setting: &'static str) -> Result<u64> {
    value.parse::<u64>().map_err(|e| Error::ParseSetting {
        setting,
        source: Box::new(e),
    })
}

pub fn parse_bool_setting(value: &str, setting: &'static str) -> Result<bool> {
    value.parse::<bool>().map_err(|e| Error::ParseSetting {
        setting,
        source: Box::new(e),
    })
}
