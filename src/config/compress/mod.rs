//! Compression codec registry and selection.
//!
//! The codecs themselves come from lz4_flex and liblzma; this module only
//! maps a configured method name onto one of them.

use crate::config::finish::Finish;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::settings::Settings;
use derive_more::From;
use io_enum::Write;
use liblzma::write::XzEncoder;
use lz4_flex::frame::FrameEncoder;
use std::io;
use std::io::Write;

pub const COMPRESSION_METHOD_SETTING: &str = "WALVAULT_COMPRESSION_METHOD";

/// Supported method names, in registry order. Reported on unknown-method errors.
pub const COMPRESSING_ALGORITHMS: &[&str] = &["lz4", "xz"];

const XZ_COMPRESSION_LEVEL: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionMethod {
    Lz4,
    Xz,
}

impl Default for CompressionMethod {
    fn default() -> Self {
        CompressionMethod::Lz4
    }
}

impl CompressionMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lz4" => Some(CompressionMethod::Lz4),
            "xz" => Some(CompressionMethod::Xz),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompressionMethod::Lz4 => "lz4",
            CompressionMethod::Xz => "xz",
        }
    }

    pub fn file_ext(&self) -> &'static str {
        self.name()
    }

    pub fn compressor<W: Write>(&self, writer: W) -> Compressor<W> {
        match self {
            CompressionMethod::Lz4 => FrameEncoder::new(writer).into(),
            CompressionMethod::Xz => XzEncoder::new(writer, XZ_COMPRESSION_LEVEL).into(),
        }
    }
}

#[derive(Write, From)]
pub enum Compressor<W: Write> {
    Lz4(FrameEncoder<W>),
    Xz(XzEncoder<W>),
}

impl<W: Write> Finish<W> for Compressor<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Compressor::Lz4(w) => Finish::finish(w),
            Compressor::Xz(w) => Finish::finish(w),
        }
    }
}

/// Selects the compression method by name, defaulting to lz4.
pub fn configure_compressor(settings: &dyn Settings) -> Result<CompressionMethod> {
    let method = settings.get_or_empty(COMPRESSION_METHOD_SETTING);
    if method.is_empty() {
        return Ok(CompressionMethod::default());
    }
    CompressionMethod::from_name(&method).ok_or(Error::UnknownCompressionMethod {
        requested: method,
        supported: COMPRESSING_ALGORITHMS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::MapSettings;
    use std::io::Read;

    #[test]
    fn test_default_method_is_lz4() {
        let settings = MapSettings::new();
        assert_eq!(
            configure_compressor(&settings).unwrap(),
            CompressionMethod::Lz4
        );
    }

    #[test]
    fn test_configured_method_is_selected() {
        let settings = MapSettings::new().set(COMPRESSION_METHOD_SETTING, "xz");
        assert_eq!(
            configure_compressor(&settings).unwrap(),
            CompressionMethod::Xz
        );
    }

    #[test]
    fn test_unknown_method_lists_supported() {
        let settings = MapSettings::new().set(COMPRESSION_METHOD_SETTING, "zip");
        let error = configure_compressor(&settings).unwrap_err();
        match &error {
            Error::UnknownCompressionMethod { requested, .. } => assert_eq!(requested, "zip"),
            _ => panic!("Expected UnknownCompressionMethod error"),
        }
        assert!(error.to_string().contains("lz4"));
        assert!(error.to_string().contains("xz"));
    }

    #[test]
    fn test_lz4_compressor_round_trip() {
        let mut compressor = CompressionMethod::Lz4.compressor(Vec::new());
        compressor.write_all(b"wal segment bytes").unwrap();
        let compressed = compressor.finish().unwrap();

        let mut decoder = lz4_flex::frame::FrameDecoder::new(compressed.as_slice());
        let mut plain = Vec::new();
        decoder.read_to_end(&mut plain).unwrap();
        assert_eq!(plain, b"wal segment bytes");
    }
}
