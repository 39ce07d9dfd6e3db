//! `.env` discovery
//!
//! Priority order (highest to lowest):
//! 1. Variables already set in the process environment
//! 2. ./.env in the current directory
//! 3. ~/.roster/.env
//!
//! dotenvy never overwrites a variable that is already set, so loading in
//! this order gives the priorities above.

use std::path::{Path, PathBuf};

/// Get the roster config directory path (~/.roster)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".roster"))
}

/// Load `.env` files, returning the paths that were applied.
///
/// Runs before tracing is initialized (the files may set `RUST_LOG`), so the
/// caller logs the result.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }

    if let Some(dir) = config_dir() {
        if let Some(path) = load_env_file(&dir.join(".env")) {
            loaded.push(path);
        }
    }

    loaded
}

/// Apply one `.env` file if it exists and parses
fn load_env_file(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    dotenvy::from_path(path).ok().map(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(&dir.path().join(".env")).is_none());
    }

    #[test]
    fn env_file_fills_unset_vars_without_overriding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "ROSTER_TEST_DOTENV_FRESH=from-file").unwrap();
        writeln!(file, "ROSTER_TEST_DOTENV_PRESET=from-file").unwrap();
        drop(file);

        std::env::set_var("ROSTER_TEST_DOTENV_PRESET", "from-env");

        assert_eq!(load_env_file(&path), Some(path.clone()));
        assert_eq!(std::env::var("ROSTER_TEST_DOTENV_FRESH").unwrap(), "from-file");
        assert_eq!(std::env::var("ROSTER_TEST_DOTENV_PRESET").unwrap(), "from-env");
    }
}
