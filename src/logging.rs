//=========================================================================
// Logging
//=========================================================================
//
// Installs `env_logger` behind the `log` facade.
//
// Filter: `RUST_LOG` if set, otherwise `info` (or `debug` when the
// settings ask for debug output). Output goes to stderr, or appends to
// `Settings::log_path` when one is configured.
//
// Installation is first-wins: hosts that set up their own logger keep it.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fs::OpenOptions;

//=== External Crates =====================================================

use env_logger::{Builder, Env, Target};
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::config::Settings;

/// Installs the bridge logger. Returns `false` if a logger was already set.
pub fn init(settings: &Settings) -> bool {
    let default_filter = if settings.debug() { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));

    let mut open_failure = None;
    if let Some(path) = settings.log_path() {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => open_failure = Some((path, e)),
        }
    }

    let installed = builder.try_init().is_ok();
    if installed {
        debug!(target: "logging", "Logger installed (default filter: {})", default_filter);
    }

    // Reported once a logger exists, falling back to stderr
    if let Some((path, e)) = open_failure {
        warn!(target: "logging", "Cannot open log file {}: {}", path.display(), e);
    }
    installed
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unopenable_log_file_does_not_block_init() {
        let settings = Settings::builder()
            .with_log_path("/definitely/not/here/stoa.log")
            .build();
        let _ = init(&settings);
        assert!(!init(&settings), "Logger must only install once");
    }

    #[test]
    fn second_init_is_refused() {
        let settings = Settings::builder().build();
        let _ = init(&settings);
        assert!(!init(&settings), "Logger must only install once");
    }
}
