//! Logging helper
//!
//! Used by the demos and tests to implement consistent logging

// Imports
use {
	std::env,
	tracing::level_filters::LevelFilter,
	tracing_subscriber::{EnvFilter, prelude::*},
};

/// Initializes logging.
///
/// The filter defaults to `INFO` and may be overridden with `RUST_LOG`.
/// Colors are enabled unless `RUST_LOG_COLOR` is set to something other
/// than `1`, `yes` or `true`.
///
/// Calling this more than once does nothing.
pub fn init() {
	let log_use_color = env::var("RUST_LOG_COLOR").map_or(true, |value| {
		matches!(value.trim().to_uppercase().as_str(), "1" | "YES" | "TRUE")
	});

	let filter = EnvFilter::builder()
		.with_default_directive(LevelFilter::INFO.into())
		.from_env_lossy();
	let layer = tracing_subscriber::fmt::layer()
		.with_ansi(log_use_color)
		.with_test_writer()
		.with_filter(filter);

	// Note: Tests all call this, so only the first call may install the subscriber.
	_ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(test)]
mod test {
	#[test]
	fn init_twice() {
		super::init();
		super::init();
		tracing::info!("Logger initialized twice");
	}
}
