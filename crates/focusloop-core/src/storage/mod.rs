mod config;
pub mod store;

pub use config::Config;
pub use store::{HistoryRecord, SessionStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/focusloop[-dev]/` based on FOCUSLOOP_ENV.
///
/// FOCUSLOOP_DATA_DIR overrides the location outright (used by tests to
/// isolate state); FOCUSLOOP_ENV=dev switches to the development
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FOCUSLOOP_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSLOOP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusloop-dev")
    } else {
        base_dir.join("focusloop")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
