//! Diagnostics for the questionnaire shell.
//!
//! Logs go to stderr so prompts on stdout stay readable and scriptable.
//! `QA_LOG` takes an `EnvFilter` directive and overrides the level picked
//! from the command line.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "QA_LOG";

/// Level used when `QA_LOG` is not set.
pub fn level_for(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

pub fn init_logging(verbose: bool) {
    let filter = build_env_filter(level_for(verbose));
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!(
            "warn,greentic_qa={level},qa_flow={level},qa_spec={level}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_the_default_level() {
        assert_eq!(level_for(false), Level::WARN);
        assert_eq!(level_for(true), Level::DEBUG);
    }
}
