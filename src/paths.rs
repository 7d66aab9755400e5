//! Path resolution for stack files and state
//!
//! # Environment Variables
//!
//! - `STACKGRAPH_STACK` - Stack file to load
//! - `STACKGRAPH_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For stack_file():
//! 1. `-f/--file` flag (clap also reads `STACKGRAPH_STACK` into it)
//! 2. `./stack.toml`
//!
//! For state_dir():
//! 1. `--state-dir` flag or `STACKGRAPH_STATE_DIR`
//! 2. `XDG_STATE_HOME/stackgraph` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\stackgraph`
//!    - macOS/Linux: `~/.local/state/stackgraph`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the stack file
pub const ENV_STACK_FILE: &str = "STACKGRAPH_STACK";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "STACKGRAPH_STATE_DIR";

/// Stack file used when none is given
pub const DEFAULT_STACK_FILE: &str = "stack.toml";

const APP_DIR: &str = "stackgraph";

/// Resolve the stack file path
pub fn stack_file(flag: Option<&Path>) -> PathBuf {
    match flag {
        Some(path) => expand(&path.to_string_lossy()),
        None => PathBuf::from(DEFAULT_STACK_FILE),
    }
}

/// Resolve the state directory
pub fn state_dir(flag: Option<&Path>) -> Result<PathBuf> {
    state_dir_with(flag, |key| std::env::var(key).ok())
}

fn state_dir_with(flag: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    // 1. Flag (or STACKGRAPH_STATE_DIR through clap)
    if let Some(dir) = flag {
        let path = expand(&dir.to_string_lossy());
        log::debug!("Using state dir from flag: {}", path.display());
        return Ok(path);
    }

    // 2. Check XDG_STATE_HOME
    if let Some(xdg_state) = env("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. Platform default
    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            let path = local_app_data.join(APP_DIR);
            log::debug!("Using Windows state dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
