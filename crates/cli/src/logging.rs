use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when neither RUST_LOG nor `log.filter` is set
pub const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber. `log` records from the library crates are
/// forwarded through the tracing-log bridge. Returns false if a subscriber
/// was already installed.
pub fn init(configured: Option<&str>) -> bool {
    let env_filter = build_filter(configured);

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true),
    );

    subscriber.try_init().is_ok()
}

/// RUST_LOG first, then the configured filter, then [`DEFAULT_FILTER`].
fn build_filter(configured: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if let Some(spec) = configured {
        match EnvFilter::try_new(spec) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("warning: ignoring log.filter {:?}: {}", spec, e),
        }
    }
    EnvFilter::new(DEFAULT_FILTER)
}
