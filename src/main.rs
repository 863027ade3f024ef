use clap::Parser;
use std::process::exit;
use tracing::{error, info};
use walvault::config::crypto::configure_crypter;
use walvault::config::crypto::keyring::DirKeyRing;
use walvault::config::limiter::configure_limiters;
use walvault::config::result_error::result::Result;
use walvault::config::settings::{EnvSettings, Settings};
use walvault::config::uploader::configure_uploader;
use walvault::config::{configure_logging, configure_prevent_wal_overwrite};

/// Resolve and validate the WAL archiving configuration
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Also report resolved paths and limits in detail
    #[arg(short, long)]
    verbose: bool,
}

fn check(settings: &dyn Settings, verbose: bool) -> Result<()> {
    let limits = configure_limiters(settings)?;
    if let Some(disk) = &limits.disk {
        info!(
            "Disk rate limit: {} bytes/sec, burst {}",
            disk.rate(),
            disk.burst()
        );
    }
    if let Some(network) = &limits.network {
        info!(
            "Network rate limit: {} bytes/sec, burst {}",
            network.rate(),
            network.burst()
        );
    }

    let prevent_overwrite = configure_prevent_wal_overwrite(settings)?;
    info!("Prevent WAL overwrite: {}", prevent_overwrite);

    let key_ring = DirKeyRing::from_settings(settings);
    match configure_crypter(settings, &key_ring)? {
        Some(crypter) => info!("Encryption: enabled ({:?} key material)", crypter.source()),
        None => info!("Encryption: disabled"),
    }

    let uploader = configure_uploader(settings)?;
    info!(
        "Uploader ready: {} storage, {} compression, delta tracking {}",
        uploader.folder().scheme(),
        uploader.compression().name(),
        if uploader.use_wal_delta() { "on" } else { "off" }
    );
    if verbose {
        if let Some(delta_folder) = uploader.delta_folder() {
            info!("Delta folder: {:?}", delta_folder.path());
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    let settings = EnvSettings;

    if let Err(e) = configure_logging(&settings) {
        eprintln!("{e}");
        exit(1);
    }

    if let Err(e) = check(&settings, args.verbose) {
        error!("{e}");
        exit(1);
    }
}
