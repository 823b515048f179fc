//! Cooperative, poll-driven tasks for a transparent proxy.
//!
//! This crate provides a small framework for asynchronous operations that
//! are driven by repeatedly polling them from an event loop rather than by
//! an async runtime. Each operation is a task with a unique id that is
//! either running or has reached a terminal state. Once terminal, it holds
//! a write-once result consisting of an optional value and an integer
//! status and, if the owner asked for it, has invoked a completion
//! callback with that result exactly once.
//!
//! The one concrete task provided is a [`DnsQuery`][dns::DnsQuery] that
//! waits for the response to a DNS query sent by its owner, typically a
//! [`DnsSession`][session::DnsSession].
//!
//! # Modules
//!
//! * [task] contains the task state machine, task ids, the result channel,
//!   and completion callbacks,
//! * [socket] defines how tasks read from the sockets of their owners,
//! * [wire] parses DNS responses and composes queries,
//! * [dns] contains the DNS resolution task,
//! * [reactor] drives a set of tasks from a single thread,
//! * [session] is the owner side of DNS tasks, and
#![cfg_attr(feature = "cache", doc = "* [cache]")]
#![cfg_attr(not(feature = "cache"), doc = "* cache")]
//!   caches resolved responses.
//!
//! # Reference of Feature Flags
//!
//! * `net`: Enables the tokio based [`DnsSession`][session::DnsSession],
//!   the socket implementations for tokio's sockets, and
//!   `Reactor::run_until_idle`. Enabled by default.
//! * `cache`: Enables the response cache based on
//!   [moka](https://github.com/moka-rs/moka). Enabled by default.
//! * `serde`: Enables deserializing a [`Config`][config::Config] through
//!   [serde](https://serde.rs/).
//! * `logging`: Adds `logging::init_logging` which sets up a
//!   [tracing-subscriber](https://github.com/tokio-rs/tracing) reading
//!   its filter from the `RUST_LOG` environment variable.

#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "cache")]
pub mod cache;
pub mod clock;
pub mod config;
pub mod dns;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod reactor;
pub mod session;
pub mod socket;
pub mod task;
pub mod wire;

pub use self::config::Config;
pub use self::error::Error;
pub use self::task::{AsyncTask, Pollable, Status, TaskEnv, TaskId, TaskState};
