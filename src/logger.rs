use std::fs::File;
use std::io::Result as IoResult;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)))
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `verbosity`. With `log_file`, events go to that file
/// instead of stderr. Only the first installed subscriber takes effect; once
/// one is set, later calls are no-ops and never create or truncate
/// `log_file`.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> IoResult<()> {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("subscriber already installed; keeping it");
        return Ok(());
    }
    let builder = tracing_subscriber::fmt().with_env_filter(filter(verbosity));
    if let Some(path) = log_file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        // Ignore error if already set; keep the first subscriber.
        let _ = builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }

    // One test: the subscriber is process-global.
    #[test]
    fn first_init_wins_and_later_log_files_are_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("csvcol.log");
        init(2, Some(&path)).expect("init logging");
        assert!(path.exists());

        let other = dir.path().join("other.log");
        std::fs::write(&other, "keep me\n").expect("seed log file");
        init(0, Some(&other)).expect("second init");
        assert_eq!(std::fs::read_to_string(&other).expect("read"), "keep me\n");

        let unborn = dir.path().join("nested").join("never.log");
        init(0, Some(&unborn)).expect("third init");
        assert!(!unborn.exists());
    }
}
