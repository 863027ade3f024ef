//! External key-ring collaborator.
//!
//! The ring is only consulted when key material is configured by identifier
//! rather than inline or by path. Production use resolves identifiers
//! against a directory of armored key files.

use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::settings::Settings;
use std::path::PathBuf;

pub const KEY_RING_DIR_SETTING: &str = "WALVAULT_KEY_RING_DIR";

const DEFAULT_KEY_RING_SUBDIR: &str = ".walvault/keyring";

pub trait KeyRing {
    /// Returns the armored key material stored under `id`.
    fn export_key(&self, id: &str) -> Result<String>;
}

/// Key ring backed by a directory of armored key files, one file per id.
#[derive(Clone, Debug)]
pub struct DirKeyRing {
    dir: PathBuf,
}

impl DirKeyRing {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_settings(settings: &dyn Settings) -> Self {
        let dir = settings
            .lookup(KEY_RING_DIR_SETTING)
            .map(PathBuf::from)
            .or_else(|| {
                settings
                    .lookup("HOME")
                    .map(|home| PathBuf::from(home).join(DEFAULT_KEY_RING_SUBDIR))
            })
            .unwrap_or_else(|| PathBuf::from("/etc/walvault/keyring"));
        Self::new(dir)
    }
}

impl KeyRing for DirKeyRing {
    fn export_key(&self, id: &str) -> Result<String> {
        std::fs::read_to_string(self.dir.join(id)).map_err(|e| Error::KeyRingLookup {
            id: id.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::MapSettings;
    use tempfile::tempdir;

    #[test]
    fn test_dir_key_ring_exports_stored_key() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("backup-key"), "key material").unwrap();
        let ring = DirKeyRing::new(dir.path());
        assert_eq!(ring.export_key("backup-key").unwrap(), "key material");
    }

    #[test]
    fn test_missing_key_reports_id() {
        let dir = tempdir().unwrap();
        let ring = DirKeyRing::new(dir.path());
        let error = ring.export_key("absent").unwrap_err();
        match error {
            Error::KeyRingLookup { id, .. } => assert_eq!(id, "absent"),
            _ => panic!("Expected KeyRingLookup error"),
        }
    }

    #[test]
    fn test_ring_dir_from_settings() {
        let settings = MapSettings::new().set(KEY_RING_DIR_SETTING, "/srv/keys");
        assert_eq!(DirKeyRing::from_settings(&settings).dir, PathBuf::from("/srv/keys"));

        let settings = MapSettings::new().set("HOME", "/home/postgres");
        assert_eq!(
            DirKeyRing::from_settings(&settings).dir,
            PathBuf::from("/home/postgres/.walvault/keyring")
        );
    }
}
