//! # walvault
//!
//! Configuration and assembly core for a PostgreSQL WAL archiving tool.
//!
//! ## Features
//!
//! - **Storage backends**: S3, GCS, Azure Blob and local filesystem,
//!   resolved by a fixed-precedence adapter registry
//! - **Compression**: LZ4 (default) and XZ streaming codecs
//! - **Encryption**: optional streaming age encryption with inline, file or
//!   key-ring key material
//! - **Delta tracking**: best-effort local bookkeeping folder for
//!   incremental backups
//! - **Rate limiting**: token-bucket limits for disk and network transfers
//!
//! ## Quick Start
//!
//! ```no_run
//! use walvault::config::settings::EnvSettings;
//! use walvault::config::uploader::configure_uploader;
//!
//! let settings = EnvSettings;
//! let uploader = configure_uploader(&settings)?;
//! uploader.upload("000000010000000000000001", std::io::empty())?;
//! # Ok::<(), walvault::config::result_error::error::Error>(())
//! ```

pub mod config;
