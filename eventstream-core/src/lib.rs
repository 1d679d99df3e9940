//! # eventstream-core
//!
//! Core library for Webscale EventStream - a best-effort login event forwarder.
//!
//! This library provides:
//! - The login observer and its event envelope
//! - An HTTP transport for the clickstream collector
//! - Narrow traits for the host collaborators it consumes
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eventstream_core::context::{StaticCookies, StaticModules, StaticRequest};
//! use eventstream_core::forwarder::{
//!     Collaborators, Customer, HttpTransport, LoginEventForwarder, LoginSuccess,
//!     SyncLoginEventForwarder,
//! };
//! use eventstream_core::logging::TracingLogSink;
//! use eventstream_core::Config;
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let deps = Collaborators {
//!     config: Arc::new(config.eventstream.clone()),
//!     store: Arc::new(config.store.to_store(None)),
//!     request: Arc::new(StaticRequest::new()),
//!     cookies: Arc::new(StaticCookies::new()),
//!     modules: Arc::new(StaticModules::new()),
//!     logger: Arc::new(TracingLogSink),
//!     transport: Arc::new(HttpTransport::new().expect("failed to build transport")),
//! };
//!
//! let forwarder = LoginEventForwarder::new(deps, config.payload.cookie_name.clone());
//! let forwarder = SyncLoginEventForwarder::new(forwarder).expect("failed to create runtime");
//! forwarder.on_login_success(&LoginSuccess::for_customer(Customer::new(42, "jane@example.com")));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use forwarder::{LoginEventForwarder, Outcome, SyncLoginEventForwarder};

// Public modules
pub mod config;
pub mod context;
pub mod error;
pub mod forwarder;
pub mod logging;
pub mod mocks;
