//! Core types for fitview-state
//!
//! A single-writer, path-addressed reactive store. State lives in one
//! `serde_json::Value` tree addressed by dot-delimited paths such as
//! `"charts.isRendered"` or `"fitFile.metrics"`.
//!
//! # Core Concepts
//!
//! - **PathStore**: the tree plus `get_state`/`set_state`/`update_state`
//! - **Subscriptions**: ordered callbacks per path, disposed explicitly
//! - **Middleware**: interceptors that may rewrite a value before commit
//! - **Computed**: memoized values invalidated by dependency paths
//!
//! # Basic Example
//!
//! ```
//! use fitview_state_core::prelude::*;
//! use serde_json::json;
//!
//! let store = PathStore::new();
//! store.use_middleware(LoggingMiddleware);
//!
//! let sub = store.subscribe("ui.theme", |change| {
//!     println!("theme is now {:?}", change.new_value);
//!     Ok(())
//! });
//!
//! store.set_state("ui.theme", json!("dark"), ChangeOptions::source("Settings"));
//! assert_eq!(store.get_state("ui.theme"), Some(json!("dark")));
//!
//! sub.unsubscribe();
//! ```
//!
//! # Ordering
//!
//! All writes and notifications run synchronously on the calling thread.
//! For one write, the whole middleware chain runs before any subscriber.
//! Subscribers of a path run in registration order, and a write issued from
//! inside a subscriber is fully processed (its own subscribers included)
//! before the next sibling subscriber runs.

pub mod computed;
pub mod config;
pub mod debug;
pub mod error;
pub mod middleware;
pub mod path;
pub mod registry;
pub mod store;
pub mod testing;

pub use computed::{use_computed, use_state, Computed, StateSetter};
pub use config::{NotifyPolicy, StoreConfig};
pub use error::{CallbackError, CallbackResult, Result, StateError};
pub use middleware::{ChainOutcome, LoggingMiddleware, Middleware, MiddlewareChain};
pub use registry::{Change, SubscriberFn, Subscription, SubscriptionId, SubscriptionRegistry};
pub use store::{ChangeOptions, PathStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::computed::{use_computed, use_state, Computed, StateSetter};
    pub use crate::config::{NotifyPolicy, StoreConfig};
    pub use crate::error::{CallbackError, CallbackResult};
    pub use crate::middleware::{LoggingMiddleware, Middleware, MiddlewareChain};
    pub use crate::registry::{Change, Subscription};
    pub use crate::store::{ChangeOptions, PathStore};
}
