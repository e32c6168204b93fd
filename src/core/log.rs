use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Targets and levels applied for the given verbosity.
pub fn log_targets(verbose: bool) -> Targets {
    if verbose {
        Targets::new()
            .with_target("fintrack", LevelFilter::DEBUG)
            .with_target("reqwest", LevelFilter::DEBUG)
            .with_target("fjall", LevelFilter::INFO)
    } else {
        Targets::new().with_target("fintrack", LevelFilter::WARN)
    }
}

/// Installs the global subscriber writing to stderr so table output on
/// stdout stays clean. `RUST_LOG` narrows it further.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(log_targets(verbose))
        .with(env_filter)
        .init();
}
