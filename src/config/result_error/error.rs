use crate::config::result_error::{WithDebugObjectAndFnName, WithMsg};
use itertools::Itertools;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] opendal::Error),
    #[error(transparent)]
    Encrypt(#[from] age::EncryptError),
    #[error(transparent)]
    Decrypt(#[from] age::DecryptError),
    #[error("no storage is configured, please set one of the following settings: {}", .0.iter().join(", "))]
    UnconfiguredStorage(Vec<&'static str>),
    #[error("unknown compression method {requested:?}, supported methods are: {}", supported.iter().join(", "))]
    UnknownCompressionMethod {
        requested: String,
        supported: &'static [&'static str],
    },
    #[error("failed to parse {setting}: {source}")]
    ParseSetting {
        setting: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("missing setting {setting} required by {scheme} storage")]
    MissingAdapterSetting {
        scheme: &'static str,
        setting: &'static str,
    },
    #[error("invalid {scheme} storage prefix: {prefix:?}")]
    InvalidPrefix {
        scheme: &'static str,
        prefix: String,
    },
    #[error("malformed key material: {0}")]
    MalformedKey(String),
    #[error("passphrase failed to unlock key material: {0}")]
    KeyAuthentication(String),
    #[error("key material holds no private key, cannot decrypt")]
    NoPrivateKey,
    #[error("key ring lookup for {id:?} failed: {message}")]
    KeyRingLookup { id: String, message: String },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{:?} {} failed:\n{}", obj_debug, fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithDebugObjAndFnName {
        error: Box<Error>,
        obj_debug: Box<dyn Debug + Send>,
        fn_name: String,
    },
}

impl<S: Into<String>, O: Debug + Send + 'static> WithDebugObjectAndFnName<S, O> for Error {
    fn with_debug_object_and_fn_name(self, obj: O, fn_name: S) -> Self {
        Error::WithDebugObjAndFnName {
            error: Box::new(self),
            obj_debug: Box::new(obj),
            fn_name: fn_name.into(),
        }
    }
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}
