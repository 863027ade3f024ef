//! Delta-tracking folder resolution.
//!
//! Delta tracking is a performance optimization, not a correctness
//! requirement: if the bookkeeping folder cannot be opened, the feature is
//! disabled with a warning instead of failing configuration. Do not turn
//! that warning into an error.

use crate::config::result_error::result::Result;
use crate::config::settings::{parse_bool_setting, Settings};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const USE_WAL_DELTA_SETTING: &str = "WALVAULT_USE_WAL_DELTA";
pub const PGDATA_SETTING: &str = "PGDATA";

pub const DEFAULT_DATA_FOLDER_PATH: &str = "/tmp";
const DATA_FOLDER_NAME: &str = "walvault_data";

/// Local folder holding incremental-backup bookkeeping.
#[derive(Debug)]
pub struct DeltaFolder {
    path: PathBuf,
}

impl DeltaFolder {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open_write(&self, name: &str) -> io::Result<File> {
        File::create(self.path.join(name))
    }

    pub fn open_read(&self, name: &str) -> io::Result<File> {
        File::open(self.path.join(name))
    }

    /// Removes all bookkeeping files, keeping the folder itself.
    pub fn clean(&self) -> io::Result<()> {
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Computes the delta folder location: a `walvault_data` subdirectory of the
/// WAL directory under `PGDATA` (probing the two on-disk layouts), falling
/// back to the default temporary directory.
pub fn data_folder_path(settings: &dyn Settings) -> PathBuf {
    let base = match settings.lookup(PGDATA_SETTING) {
        None => PathBuf::from(DEFAULT_DATA_FOLDER_PATH),
        Some(pgdata) => {
            let pg_wal = Path::new(&pgdata).join("pg_wal");
            let pg_xlog = Path::new(&pgdata).join("pg_xlog");
            if pg_wal.exists() {
                pg_wal
            } else if pg_xlog.exists() {
                pg_xlog
            } else {
                PathBuf::from(DEFAULT_DATA_FOLDER_PATH)
            }
        }
    };
    base.join(DATA_FOLDER_NAME)
}

/// Resolves delta-tracking usage. A malformed flag is a parse error; a
/// folder that cannot be opened merely disables the feature.
pub fn configure_wal_delta_usage(
    settings: &dyn Settings,
) -> Result<(bool, Option<DeltaFolder>)> {
    let mut use_wal_delta = false;
    if let Some(value) = settings.lookup(USE_WAL_DELTA_SETTING) {
        use_wal_delta = parse_bool_setting(&value, USE_WAL_DELTA_SETTING)?;
    }
    if !use_wal_delta {
        return Ok((false, None));
    }
    let path = data_folder_path(settings);
    match DeltaFolder::open(&path) {
        Ok(folder) => Ok((true, Some(folder))),
        Err(e) => {
            warn!(
                "can't use wal delta feature because can't open delta data folder {:?} due to error: {}",
                path, e
            );
            Ok((false, None))
        }
    }
}
