//! Startup helpers.
//!
//! # Responsibilities
//! - Locate the executable's directory, the base for default paths
//! - Resolve relative CLI paths against that directory
//! - Make sure the rules directory exists
//! - Print the startup banner

use std::io;
use std::path::{Path, PathBuf};

/// Default config file name, next to the executable.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default rules directory name, next to the executable.
pub const DEFAULT_RULES_DIR: &str = "rules";

/// Directory containing the running executable.
pub fn executable_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))
}

/// `path` if absolute, otherwise `path` under `base`. `None` yields `base/default`.
pub fn resolve_path(base: &Path, path: Option<&Path>, default: &str) -> PathBuf {
    match path {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => base.join(p),
        None => base.join(default),
    }
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        tracing::info!(dir = %dir.display(), "Created directory");
    }
    Ok(())
}

/// Log the startup banner.
pub fn print_banner() {
    tracing::info!("########################################");
    tracing::info!("mock-host v{}: local rule-based mock web server", env!("CARGO_PKG_VERSION"));
    tracing::info!("For local debugging and testing only. Write your own rules to check your data.");
    tracing::info!("Do not expose this server on a public network.");
    tracing::info!("########################################");
}
