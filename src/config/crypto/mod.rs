//! Crypter resolution.
//!
//! Encryption is off unless the passphrase setting is present at all; with
//! the gate open, key material is taken from a ranked list of sources with
//! early exit: inline text, then key file path, then key-ring identifier.

pub mod age;
pub mod keyring;

use crate::config::crypto::age::Crypter;
use crate::config::crypto::keyring::KeyRing;
use crate::config::finish::Finish;
use crate::config::redacted::RedactedString;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::result_error::WithMsg;
use crate::config::settings::Settings;
use ::age::stream::{StreamReader, StreamWriter};
use derive_more::From;
use io_enum::{Read, Write};
use std::io;
use std::io::{Read, Write};
use tracing::info;

pub const KEY_PASSPHRASE_SETTING: &str = "WALVAULT_KEY_PASSPHRASE";
pub const KEY_SETTING: &str = "WALVAULT_KEY";
pub const KEY_PATH_SETTING: &str = "WALVAULT_KEY_PATH";
pub const KEY_RING_ID_SETTING: &str = "WALVAULT_KEY_RING_ID";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySourceKind {
    Inline,
    File,
    Ring,
}

/// One resolved key-material source: where it came from and the raw setting value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySource {
    pub kind: KeySourceKind,
    pub value: String,
}

/// Ranked key-source strategies; earlier entries win.
const KEY_SOURCE_SETTINGS: [(KeySourceKind, &str); 3] = [
    (KeySourceKind::Inline, KEY_SETTING),
    (KeySourceKind::File, KEY_PATH_SETTING),
    (KeySourceKind::Ring, KEY_RING_ID_SETTING),
];

pub fn resolve_key_source(settings: &dyn Settings) -> Option<KeySource> {
    KEY_SOURCE_SETTINGS.iter().find_map(|(kind, setting)| {
        settings
            .lookup(setting)
            .filter(|v| !v.is_empty())
            .map(|value| KeySource { kind: *kind, value })
    })
}

/// Resolves the process-wide crypter, or `None` when encryption is off.
/// Absence of the passphrase setting disables encryption regardless of any
/// configured key material.
pub fn configure_crypter(
    settings: &dyn Settings,
    key_ring: &dyn KeyRing,
) -> Result<Option<Crypter>> {
    let Some(passphrase) = settings.lookup(KEY_PASSPHRASE_SETTING) else {
        return Ok(None);
    };
    let passphrase = RedactedString::builder().inner(passphrase).build();

    let Some(source) = resolve_key_source(settings) else {
        return Ok(None);
    };
    let material = match source.kind {
        KeySourceKind::Inline => source.value.into_bytes(),
        KeySourceKind::File => std::fs::read(&source.value)
            .map_err(Error::from)
            .with_msg(format!("failed to read key file {:?}", source.value))?,
        KeySourceKind::Ring => key_ring.export_key(&source.value)?.into_bytes(),
    };
    info!("Using encryption with {:?} key material", source.kind);
    Crypter::from_armored_key(&material, &passphrase, source.kind).map(Some)
}

/// Encrypting write-sink; `Plain` passes bytes through when no crypter is
/// configured. Must be finished on every exit path.
#[derive(Write, From)]
pub enum EncryptingWriter<W: Write> {
    Plain(W),
    Age(StreamWriter<W>),
}

impl<W: Write> Finish<W> for EncryptingWriter<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            EncryptingWriter::Plain(w) => Ok(w),
            EncryptingWriter::Age(w) => Finish::finish(w),
        }
    }
}

/// Decrypting read-source; stateful per call, not restartable.
#[derive(Read, From)]
pub enum DecryptingReader<R: Read> {
    Plain(R),
    Age(StreamReader<R>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::crypto::keyring::{DirKeyRing, KEY_RING_DIR_SETTING};
    use crate::config::settings::MapSettings;
    use ::age::secrecy::ExposeSecret;
    use tempfile::tempdir;

    fn generated_key_text() -> String {
        ::age::x25519::Identity::generate()
            .to_string()
            .expose_secret()
            .to_string()
    }

    #[test]
    fn test_key_source_precedence() {
        let settings = MapSettings::new()
            .set(KEY_SETTING, "inline material")
            .set(KEY_PATH_SETTING, "/keys/backup.key")
            .set(KEY_RING_ID_SETTING, "ring-id");
        let source = resolve_key_source(&settings).unwrap();
        assert_eq!(source.kind, KeySourceKind::Inline);
        assert_eq!(source.value, "inline material");

        let settings = MapSettings::new()
            .set(KEY_PATH_SETTING, "/keys/backup.key")
            .set(KEY_RING_ID_SETTING, "ring-id");
        assert_eq!(
            resolve_key_source(&settings).unwrap().kind,
            KeySourceKind::File
        );

        let settings = MapSettings::new().set(KEY_RING_ID_SETTING, "ring-id");
        assert_eq!(
            resolve_key_source(&settings).unwrap().kind,
            KeySourceKind::Ring
        );

        assert!(resolve_key_source(&MapSettings::new()).is_none());
    }

    #[test]
    fn test_no_passphrase_means_no_encryption() {
        let dir = tempdir().unwrap();
        let settings = MapSettings::new()
            .set(KEY_SETTING, generated_key_text())
            .set(KEY_PATH_SETTING, "/keys/backup.key")
            .set(KEY_RING_ID_SETTING, "ring-id");
        let ring = DirKeyRing::new(dir.path());
        assert!(configure_crypter(&settings, &ring).unwrap().is_none());
    }

    #[test]
    fn test_passphrase_without_key_material_means_no_encryption() {
        let dir = tempdir().unwrap();
        let settings = MapSettings::new().set(KEY_PASSPHRASE_SETTING, "secret_passphrase");
        let ring = DirKeyRing::new(dir.path());
        assert!(configure_crypter(&settings, &ring).unwrap().is_none());
    }

    #[test]
    fn test_inline_key_material() {
        let dir = tempdir().unwrap();
        let settings = MapSettings::new()
            .set(KEY_PASSPHRASE_SETTING, "secret_passphrase")
            .set(KEY_SETTING, generated_key_text());
        let ring = DirKeyRing::new(dir.path());
        let crypter = configure_crypter(&settings, &ring).unwrap().unwrap();
        assert_eq!(crypter.source(), KeySourceKind::Inline);
    }

    #[test]
    fn test_key_file_material() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("backup.key");
        std::fs::write(&key_path, generated_key_text()).unwrap();

        let settings = MapSettings::new()
            .set(KEY_PASSPHRASE_SETTING, "secret_passphrase")
            .set(KEY_PATH_SETTING, key_path.to_str().unwrap());
        let ring = DirKeyRing::new(dir.path());
        let crypter = configure_crypter(&settings, &ring).unwrap().unwrap();
        assert_eq!(crypter.source(), KeySourceKind::File);
    }

    #[test]
    fn test_missing_key_file_is_fatal() {
        let dir = tempdir().unwrap();
        let settings = MapSettings::new()
            .set(KEY_PASSPHRASE_SETTING, "secret_passphrase")
            .set(KEY_PATH_SETTING, "/nonexistent/backup.key");
        let ring = DirKeyRing::new(dir.path());
        let error = configure_crypter(&settings, &ring).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/backup.key"));
    }

    #[test]
    fn test_key_ring_material() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("wal-backups"), generated_key_text()).unwrap();

        let settings = MapSettings::new()
            .set(KEY_PASSPHRASE_SETTING, "secret_passphrase")
            .set(KEY_RING_ID_SETTING, "wal-backups")
            .set(KEY_RING_DIR_SETTING, dir.path().to_str().unwrap());
        let ring = DirKeyRing::from_settings(&settings);
        let crypter = configure_crypter(&settings, &ring).unwrap().unwrap();
        assert_eq!(crypter.source(), KeySourceKind::Ring);
    }

    #[test]
    fn test_plain_writer_round_trip() {
        let mut writer = EncryptingWriter::Plain(Vec::new());
        writer.write_all(b"clear bytes").unwrap();
        let sink = writer.finish().unwrap();
        assert_eq!(sink, b"clear bytes");

        let mut reader = DecryptingReader::Plain(sink.as_slice());
        let mut plain = Vec::new();
        reader.read_to_end(&mut plain).unwrap();
        assert_eq!(plain, b"clear bytes");
    }
}
