//! Uploader assembly.
//!
//! Composes the resolved compressor, storage folder and delta folder into
//! one long-lived object. Assembly is all-or-nothing: any fatal sub-step
//! aborts it and no partial uploader is ever returned.

use crate::config::compress::{configure_compressor, CompressionMethod};
use crate::config::delta::{configure_wal_delta_usage, DeltaFolder};
use crate::config::finish::Finish;
use crate::config::result_error::result::Result;
use crate::config::result_error::WithMsg;
use crate::config::settings::Settings;
use crate::config::storage::{configure_folder, Folder};
use getset::{CopyGetters, Getters};
use std::io::{self, Read};
use std::sync::Arc;

/// Reusable archive uploader, constructed once at startup and shared by all
/// upload workers for the process lifetime.
#[derive(Debug, Getters, CopyGetters)]
pub struct Uploader {
    #[getset(get_copy = "pub")]
    compression: CompressionMethod,
    #[getset(get = "pub")]
    folder: Arc<dyn Folder>,
    #[getset(get = "pub")]
    delta_folder: Option<DeltaFolder>,
    #[getset(get_copy = "pub")]
    use_wal_delta: bool,
}

impl Uploader {
    pub fn new(
        compression: CompressionMethod,
        folder: Arc<dyn Folder>,
        delta_folder: Option<DeltaFolder>,
        use_wal_delta: bool,
    ) -> Self {
        Self {
            compression,
            folder,
            delta_folder,
            use_wal_delta,
        }
    }

    /// Compresses `source` and stores it as `<name>.<ext>`. Returns the
    /// stored object name.
    pub fn upload(&self, name: &str, mut source: impl Read) -> Result<String> {
        let mut compressor = self.compression.compressor(Vec::new());
        io::copy(&mut source, &mut compressor)?;
        let compressed = compressor.finish()?;
        let object_name = format!("{}.{}", name, self.compression.file_ext());
        self.folder.put_object(&object_name, &compressed)?;
        Ok(object_name)
    }
}

/// Assembles the uploader: storage folder, compressor, delta usage, in that
/// order, with no retries.
pub fn configure_uploader(settings: &dyn Settings) -> Result<Uploader> {
    let folder = configure_folder(settings).with_msg("failed to configure folder")?;

    let compression =
        configure_compressor(settings).with_msg("failed to configure compression")?;

    let (use_wal_delta, delta_folder) =
        configure_wal_delta_usage(settings).with_msg("failed to configure WAL Delta usage")?;

    Ok(Uploader::new(
        compression,
        folder,
        delta_folder,
        use_wal_delta,
    ))
}
