//! Delivery to the Lightbucket API
//!
//! ## Usage
//!
//! Enable reporting in `~/.config/lightbucket/config.toml` and store
//! credentials with `lightbucket set-credentials`:
//!
//! ```toml
//! [lightbucket]
//! enabled = true
//! username = "your-username"
//! api_key = "<encrypted>"
//! base_url = "https://app.lightbucket.co"
//! ```

mod client;
mod notifier;

pub use client::{DeliveryClient, DeliveryOutcome, REQUEST_TIMEOUT};
pub use notifier::{LoggingNotifier, NoopNotifier, Notifier};
