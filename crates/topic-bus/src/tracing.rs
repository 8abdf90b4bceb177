//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter driven by
//! `RUST_LOG`.
//!
//! ```bash
//! # Lifecycle events only
//! RUST_LOG=info cargo run
//!
//! # Every publication with its scoped topic and subscriber count
//! RUST_LOG=debug cargo run
//!
//! # Subscribe/unsubscribe traffic as well
//! RUST_LOG=topic_bus=trace cargo run
//! ```
//!
//! The bus logs each publication at `debug` with the scoped `topic` and the number
//! of `subscribers`, and each failed handler at `warn`:
//!
//! ```text
//! DEBUG Publish topic="PANEL/RELOAD" subscribers=2
//! WARN Subscriber failed topic="PANEL/RELOAD" error=Handler rejected payload: stale
//! ```

/// Installs the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
