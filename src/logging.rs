use tracing_subscriber::{fmt, EnvFilter};

/// Install the fmt subscriber, honouring `RUST_LOG` and defaulting to `info`.
pub fn init() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .try_init();
}
