use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the global subscriber once. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str, json: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
        let result = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        if let Err(e) = result {
            tracing::warn!("Logging was already initialized: {}", e);
        }
    });
}
