//! Log setup for binaries and tests.
//!
//! All of the crate logs through [tracing] with one target per subsystem,
//! so interleaved tasks can be told apart by target and task id:
//!
//! * `polltask::task`: state transitions of any task,
//! * `polltask::dns`: receive attempts of DNS resolution tasks,
//! * `polltask::reactor`: scheduling ticks,
//! * `polltask::session`: queries sent by a session,
//! * `polltask::cache`: cache insertions and expiry.
use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by polltask.
///
/// Use the RUST_LOG environment variable to override the defaults.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
///
/// Or to log every receive attempt of DNS tasks only:
///   RUST_LOG=polltask::dns=TRACE
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}
