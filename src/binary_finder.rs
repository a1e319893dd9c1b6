//! Locating the native nsearch executable
//!
//! Works in development, after cargo install, and with system installs.

use crate::error::{NsearchError, Result};
use std::path::PathBuf;

/// Environment variable overriding the engine location.
pub const BINARY_ENV: &str = "NSEARCH_BIN";

/// Find an engine binary by name
///
/// Search order:
/// 1. `$NSEARCH_BIN` (path to the executable itself)
/// 2. Same directory as current executable (cargo install)
/// 3. System PATH
pub fn find_binary(name: &str) -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(BINARY_ENV).map(PathBuf::from) {
        if path.is_file() {
            return Ok(path);
        }
        log::warn!(
            "{BINARY_ENV}={} does not point to a file, searching elsewhere",
            path.display()
        );
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let binary = exe_dir.join(name);
            if binary.is_file() {
                return Ok(binary);
            }
        }
    }

    if let Ok(path) = which::which(name) {
        return Ok(path);
    }

    Err(NsearchError::BinaryNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        let err = find_binary("nsearch-rs-no-such-engine").unwrap_err();
        assert!(matches!(err, NsearchError::BinaryNotFound(name) if name == "nsearch-rs-no-such-engine"));
    }
}
