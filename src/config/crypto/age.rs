//! Streaming crypter backed by age key material.
//!
//! Key material is a text file of age recipient lines (`age1…`, public,
//! encryption only) and identity lines (`AGE-SECRET-KEY-1…`, private). The
//! material may itself be an age envelope locked by the configured
//! passphrase; unlocking failure is reported as an authentication error,
//! distinct from structurally malformed material.

use crate::config::crypto::{DecryptingReader, EncryptingWriter, KeySourceKind};
use crate::config::redacted::RedactedString;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::result_error::WithDebugObjectAndFnName;
use age::armor::ArmoredReader;
use age::secrecy::SecretString;
use age::x25519;
use std::fmt;
use std::io::{Read, Write};

const AGE_BINARY_MAGIC: &[u8] = b"age-encryption.org/v1";
const AGE_ARMOR_MAGIC: &[u8] = b"-----BEGIN AGE ENCRYPTED FILE-----";

/// Streaming encryption capability. Holds only key material; every
/// `encrypt`/`decrypt` call opens an independent session.
pub struct Crypter {
    source: KeySourceKind,
    recipients: Vec<x25519::Recipient>,
    identities: Vec<x25519::Identity>,
}

// Key material must never leak through diagnostics.
impl fmt::Debug for Crypter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crypter")
            .field("source", &self.source)
            .field("recipients", &self.recipients.len())
            .field("identities", &self.identities.len())
            .finish()
    }
}

fn is_locked(material: &[u8]) -> bool {
    material.starts_with(AGE_BINARY_MAGIC) || material.starts_with(AGE_ARMOR_MAGIC)
}

fn unlock_key_material(material: &[u8], passphrase: &RedactedString) -> Result<String> {
    let identity = age::scrypt::Identity::new(SecretString::from(passphrase.inner().clone()));
    let decryptor = age::Decryptor::new(ArmoredReader::new(material))
        .map_err(|e| Error::MalformedKey(e.to_string()))?;
    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys | age::DecryptError::DecryptionFailed => {
                Error::KeyAuthentication(e.to_string())
            }
            other => Error::MalformedKey(other.to_string()),
        })?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::KeyAuthentication(e.to_string()))?;
    Ok(text)
}

impl Crypter {
    /// Builds a crypter from armored key material. The passphrase is only
    /// consulted when the material itself is a locked envelope.
    pub fn from_armored_key(
        material: &[u8],
        passphrase: &RedactedString,
        source: KeySourceKind,
    ) -> Result<Self> {
        let text = if is_locked(material) {
            unlock_key_material(material, passphrase)?
        } else {
            std::str::from_utf8(material)
                .map_err(|_| Error::MalformedKey("key material is not valid UTF-8".into()))?
                .to_string()
        };

        let mut recipients: Vec<x25519::Recipient> = Vec::new();
        let mut identities: Vec<x25519::Identity> = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Ok(recipient) = line.parse::<x25519::Recipient>() {
                recipients.push(recipient);
            } else if let Ok(identity) = line.parse::<x25519::Identity>() {
                identities.push(identity);
            } else {
                return Err(Error::MalformedKey(
                    "unrecognized line in key material".into(),
                ));
            }
        }
        if recipients.is_empty() && identities.is_empty() {
            return Err(Error::MalformedKey(
                "key material holds no recipients or identities".into(),
            ));
        }

        // A private key always implies its own public half for encryption.
        for identity in &identities {
            let derived = identity.to_public();
            if !recipients.iter().any(|r| r.to_string() == derived.to_string()) {
                recipients.push(derived);
            }
        }

        Ok(Self {
            source,
            recipients,
            identities,
        })
    }

    pub fn source(&self) -> KeySourceKind {
        self.source
    }

    /// Opens an encrypting sink over `sink`. The returned writer must be
    /// finished on every exit path or the envelope is truncated.
    pub fn encrypt<W: Write>(&self, sink: W) -> Result<EncryptingWriter<W>> {
        let encryptor = age::Encryptor::with_recipients(
            self.recipients.iter().map(|r| r as &dyn age::Recipient),
        )
        .map_err(Error::from)
        .and_then(|encryptor| Ok(encryptor.wrap_output(sink)?))
        .with_debug_object_and_fn_name(self.source, "encrypt")?;
        Ok(EncryptingWriter::Age(encryptor))
    }

    /// Opens a decrypting source over `source`. The reader is stateful per
    /// call and validated only once fully drained.
    pub fn decrypt<R: Read>(&self, source: R) -> Result<DecryptingReader<R>> {
        if self.identities.is_empty() {
            return Err(Error::NoPrivateKey)
                .with_debug_object_and_fn_name(self.source, "decrypt");
        }
        let reader = age::Decryptor::new(source)
            .map_err(Error::from)
            .and_then(|decryptor| {
                Ok(decryptor.decrypt(self.identities.iter().map(|i| i as &dyn age::Identity))?)
            })
            .with_debug_object_and_fn_name(self.source, "decrypt")?;
        Ok(DecryptingReader::Age(reader))
    }
}
