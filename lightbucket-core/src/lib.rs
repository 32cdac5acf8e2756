//! # lightbucket-core
//!
//! Core library for lightbucket - reports completed light frames from an
//! imaging session to the Lightbucket service.
//!
//! This library provides:
//! - Capture event and sequence types supplied by the imaging host
//! - Report construction, including JPEG thumbnails
//! - Authenticated delivery to the Lightbucket API
//! - Configuration with encrypted credentials and hot reload
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lightbucket_core::delivery::{DeliveryClient, LoggingNotifier};
//! use lightbucket_core::pipeline::{CaptureWatcher, Reporter};
//! use lightbucket_core::settings::ConfigStore;
//!
//! # async fn run(event: lightbucket_core::capture::CaptureEvent) -> lightbucket_core::Result<()> {
//! let store = ConfigStore::open_default()?;
//! let _watch = store.watch()?;
//!
//! let client = DeliveryClient::new(Arc::new(LoggingNotifier))?;
//! let watcher = CaptureWatcher::new(Reporter::new(store.settings(), client));
//!
//! if let Some(dispatch) = watcher.on_image_saved(event) {
//!     let _ = dispatch.await;
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};

// Public modules
pub mod capture;
pub mod config;
pub mod credentials;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod settings;
