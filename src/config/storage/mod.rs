//! Storage backend selection.
//!
//! Backends are described by an ordered adapter registry; the order of
//! `STORAGE_ADAPTERS` is the documented precedence contract, not an
//! accident. Resolution picks the first adapter whose activation setting is
//! present and never falls back to a later one, even when construction of
//! the chosen backend fails.

pub mod fs;
pub mod remote;

use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::result_error::WithMsg;
use crate::config::settings::Settings;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

pub const S3_PREFIX_SETTING: &str = "WALVAULT_S3_PREFIX";
pub const GS_PREFIX_SETTING: &str = "WALVAULT_GS_PREFIX";
pub const AZ_PREFIX_SETTING: &str = "WALVAULT_AZ_PREFIX";
pub const FILE_PREFIX_SETTING: &str = "WALVAULT_FILE_PREFIX";

/// Host part accepted (and stripped) in `file://localhost/path` prefixes.
pub const FILE_PREFIX_HOST: &str = "file://localhost";

/// Opaque handle to a storage namespace supporting object-level I/O.
pub trait Folder: Debug + Send + Sync {
    /// Short backend name, for logs and diagnostics.
    fn scheme(&self) -> &'static str;

    fn put_object(&self, name: &str, content: &[u8]) -> Result<()>;

    fn get_object(&self, name: &str) -> Result<Vec<u8>>;

    fn list_objects(&self) -> Result<Vec<String>>;

    fn exists(&self, name: &str) -> Result<bool>;
}

/// Constructor produced by an adapter's settings loader; consumes the
/// (preprocessed) activation prefix.
pub type FolderBuilder = Box<dyn FnOnce(&str) -> Result<Arc<dyn Folder>>>;

/// One storage backend: its activation setting, an optional prefix
/// preprocessor and a two-phase loader (validate settings, then build).
pub struct StorageAdapter {
    pub scheme: &'static str,
    pub prefix_setting: &'static str,
    prefix_preprocessor: Option<fn(&str) -> String>,
    load_settings: fn(&dyn Settings) -> Result<FolderBuilder>,
}

fn strip_file_host(prefix: &str) -> String {
    prefix
        .strip_prefix(FILE_PREFIX_HOST)
        .unwrap_or(prefix)
        .to_string()
}

/// Backend precedence order.
pub const STORAGE_ADAPTERS: [StorageAdapter; 4] = [
    StorageAdapter {
        scheme: "s3",
        prefix_setting: S3_PREFIX_SETTING,
        prefix_preprocessor: None,
        load_settings: remote::load_s3_settings,
    },
    StorageAdapter {
        scheme: "gcs",
        prefix_setting: GS_PREFIX_SETTING,
        prefix_preprocessor: None,
        load_settings: remote::load_gcs_settings,
    },
    StorageAdapter {
        scheme: "azure",
        prefix_setting: AZ_PREFIX_SETTING,
        prefix_preprocessor: None,
        load_settings: remote::load_azure_settings,
    },
    StorageAdapter {
        scheme: "file",
        prefix_setting: FILE_PREFIX_SETTING,
        prefix_preprocessor: Some(strip_file_host),
        load_settings: fs::load_file_settings,
    },
];

/// Splits `scheme://bucket/path` into bucket and path-within-bucket.
pub(crate) fn split_prefix(scheme: &'static str, prefix: &str) -> Result<(String, String)> {
    let rest = prefix
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| Error::InvalidPrefix {
            scheme,
            prefix: prefix.to_string(),
        })?;
    let (bucket, root) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(Error::InvalidPrefix {
            scheme,
            prefix: prefix.to_string(),
        });
    }
    Ok((bucket.to_string(), root.trim_end_matches('/').to_string()))
}

/// Resolves the storage folder: first adapter with a present activation
/// setting wins. If none is present, the error enumerates every skipped
/// activation setting so the operator knows what would activate a backend.
pub fn configure_folder(settings: &dyn Settings) -> Result<Arc<dyn Folder>> {
    let mut skipped_prefixes = Vec::new();
    for adapter in &STORAGE_ADAPTERS {
        let Some(prefix) = settings
            .lookup(adapter.prefix_setting)
            .filter(|p| !p.is_empty())
        else {
            skipped_prefixes.push(adapter.prefix_setting);
            continue;
        };
        let prefix = match adapter.prefix_preprocessor {
            Some(preprocess) => preprocess(&prefix),
            None => prefix,
        };
        let build = (adapter.load_settings)(settings)
            .with_msg(format!("failed to configure {} storage", adapter.scheme))?;
        let folder = build(&prefix)
            .with_msg(format!("failed to configure {} storage", adapter.scheme))?;
        info!("Using {} storage at {:?}", adapter.scheme, prefix);
        return Ok(folder);
    }
    Err(Error::UnconfiguredStorage(skipped_prefixes))
}
